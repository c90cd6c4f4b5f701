//! Probe transport
//!
//! The discovery loop only needs "send method+url+headers+body, receive
//! status+body+headers"; `HttpTransport` is the reqwest implementation.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// Probe could not be sent or no response was received
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("invalid header {0}")]
    InvalidHeader(String),

    #[error("failed to execute request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("failed to marshal request body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Response to one probe
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub headers: HashMap<String, Vec<String>>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: HashMap::new(),
        }
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Issues probe requests against the target endpoint
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        method: &str,
        url: &str,
        headers: &HashMap<String, String>,
        body: &Value,
    ) -> Result<HttpResponse, TransportError>;
}

/// reqwest-backed transport with a fixed client-side timeout
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn from_secs(timeout_secs: u64) -> Result<Self, TransportError> {
        Self::new(Duration::from_secs(timeout_secs))
    }
}

fn build_headers(headers: &HashMap<String, String>) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::new();
    map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| TransportError::InvalidHeader(format!("name '{}'", name)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| TransportError::InvalidHeader(format!("value for '{}'", name)))?;
        map.insert(header_name, header_value);
    }

    Ok(map)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: &str,
        url: &str,
        headers: &HashMap<String, String>,
        body: &Value,
    ) -> Result<HttpResponse, TransportError> {
        let method = Method::from_bytes(method.to_uppercase().as_bytes())
            .map_err(|_| TransportError::InvalidMethod(method.to_string()))?;

        let mut request = self
            .client
            .request(method.clone(), url)
            .headers(build_headers(headers)?);
        if !body.is_null() {
            request = request.body(serde_json::to_vec(body)?);
        }

        debug!("→ {} {}", method, url);
        trace!("→ body: {}", body);

        let response = request.send().await?;
        let status = response.status().as_u16();

        let mut response_headers: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                response_headers
                    .entry(name.as_str().to_string())
                    .or_default()
                    .push(value.to_string());
            }
        }

        let bytes = response.bytes().await?;
        debug!("← {} ({} bytes)", status, bytes.len());

        Ok(HttpResponse {
            status,
            body: bytes.to_vec(),
            headers: response_headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(201, "").is_success());
        assert!(HttpResponse::new(299, "").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
        assert!(!HttpResponse::new(400, "").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
    }

    #[test]
    fn test_body_helpers() {
        let response = HttpResponse::new(201, r#"{"id":1}"#);
        assert_eq!(response.body_text(), r#"{"id":1}"#);
        assert_eq!(response.json().unwrap()["id"], 1);
        assert!(HttpResponse::new(500, "oops").json().is_none());
    }

    #[test]
    fn test_build_headers_defaults_content_type() {
        let headers = build_headers(&HashMap::new()).unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_build_headers_caller_overrides() {
        let mut custom = HashMap::new();
        custom.insert("Content-Type".to_string(), "application/vnd.api+json".to_string());
        custom.insert("Authorization".to_string(), "Bearer t".to_string());

        let headers = build_headers(&custom).unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/vnd.api+json");
        assert_eq!(headers["authorization"], "Bearer t");
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_build_headers_rejects_bad_name() {
        let mut custom = HashMap::new();
        custom.insert("bad header".to_string(), "x".to_string());
        assert!(matches!(
            build_headers(&custom),
            Err(TransportError::InvalidHeader(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_method() {
        let transport = HttpTransport::from_secs(1).unwrap();
        let result = transport
            .send("GE T", "http://127.0.0.1:1/", &HashMap::new(), &Value::Null)
            .await;
        assert!(matches!(result, Err(TransportError::InvalidMethod(m)) if m == "GE T"));
    }
}
