//! Discovery run inputs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::{DiscoveryError, Result};

/// Inbound "start discovery" request as received over the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverRequest {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub initial_body: Option<Map<String, Value>>,
    #[serde(default)]
    pub max_iterations: Option<u32>,
}

/// Validated target of one discovery run
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryTarget {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub initial_body: Map<String, Value>,
    pub max_iterations: u32,
}

impl DiscoverRequest {
    /// Apply defaults and validate the URL.
    ///
    /// A blank method and a zero iteration budget both fall back to the
    /// given defaults.
    pub fn into_target(self, default_method: &str, default_max: u32) -> Result<DiscoveryTarget> {
        let url = self.url.trim().to_string();
        if url.is_empty() {
            return Err(DiscoveryError::InvalidTarget("url is required".to_string()));
        }
        reqwest::Url::parse(&url)
            .map_err(|e| DiscoveryError::InvalidTarget(format!("invalid url '{}': {}", url, e)))?;

        let method = self
            .method
            .map(|m| m.trim().to_uppercase())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| default_method.to_uppercase());

        let max_iterations = match self.max_iterations {
            Some(n) if n > 0 => n,
            _ => default_max,
        };

        Ok(DiscoveryTarget {
            method,
            url,
            headers: self.headers,
            initial_body: self.initial_body.unwrap_or_default(),
            max_iterations,
        })
    }
}
