//! Probe body shaping and execution

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::request::DiscoveryTarget;
use crate::transport::{HttpResponse, Transport, TransportError};

/// Concrete request shape chosen for a proposed body
#[derive(Debug, Clone, PartialEq)]
pub enum ProbePlan {
    /// Proposed object sent unchanged
    Single(Value),
    /// Batch endpoint: payload is always an array
    Batch(Value),
    /// Single array-valued key: try the bare array, fall back to the object
    DirectArray {
        key: String,
        direct: Value,
        wrapped: Value,
    },
}

impl ProbePlan {
    /// Decide the request shape for `proposed` against `url`
    pub fn build(proposed: &Map<String, Value>, url: &str) -> Self {
        let lower = url.to_lowercase();
        if lower.contains("batch") || lower.contains("bulk") {
            let item = match proposed.get("item") {
                Some(item @ Value::Object(_)) => item.clone(),
                _ => Value::Object(proposed.clone()),
            };
            return ProbePlan::Batch(Value::Array(vec![item]));
        }

        if proposed.len() == 1 {
            if let Some((key, Value::Array(items))) = proposed.iter().next() {
                return ProbePlan::DirectArray {
                    key: key.clone(),
                    direct: Value::Array(items.clone()),
                    wrapped: Value::Object(proposed.clone()),
                };
            }
        }

        ProbePlan::Single(Value::Object(proposed.clone()))
    }
}

/// Payload actually sent and what came back
#[derive(Debug)]
pub struct ProbeOutcome {
    pub payload: Value,
    pub result: Result<HttpResponse, TransportError>,
}

/// Send the probe(s) a plan calls for.
///
/// A `DirectArray` plan costs one or two requests: the bare array is
/// accepted on any status below 400, otherwise the wrapped object is sent.
pub async fn execute<T: Transport + ?Sized>(
    transport: &T,
    target: &DiscoveryTarget,
    plan: ProbePlan,
) -> ProbeOutcome {
    match plan {
        ProbePlan::Single(payload) => send(transport, target, payload).await,
        ProbePlan::Batch(payload) => {
            debug!("batch endpoint, sending array payload");
            send(transport, target, payload).await
        }
        ProbePlan::DirectArray {
            key,
            direct,
            wrapped,
        } => {
            info!("array payload under '{}', trying direct array first", key);
            let attempt = send(transport, target, direct).await;
            let accepted = match &attempt.result {
                Ok(response) if response.status < 400 => true,
                Ok(response) => {
                    debug!("direct array rejected with {}", response.status);
                    false
                }
                Err(e) => {
                    debug!("direct array failed: {}", e);
                    false
                }
            };
            if accepted {
                return attempt;
            }
            info!("falling back to wrapped object under '{}'", key);
            send(transport, target, wrapped).await
        }
    }
}

async fn send<T: Transport + ?Sized>(
    transport: &T,
    target: &DiscoveryTarget,
    payload: Value,
) -> ProbeOutcome {
    let result = transport
        .send(&target.method, &target.url, &target.headers, &payload)
        .await;
    ProbeOutcome { payload, result }
}
