//! Shared fakes for discovery integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use mockall::mock;
use schemaprobe_discovery::{DiscoveryTarget, HttpResponse, Transport, TransportError};
use schemaprobe_provider::{ChatParams, ChatResponse, Message, Provider, ProviderError};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

mock! {
    pub Provider {}

    #[async_trait]
    impl Provider for Provider {
        async fn chat(&self, params: ChatParams) -> Result<ChatResponse, ProviderError>;
        fn default_model(&self) -> String;
        fn is_configured(&self) -> bool;
    }
}

mock! {
    pub Transport {}

    #[async_trait]
    impl Transport for Transport {
        async fn send(
            &self,
            method: &str,
            url: &str,
            headers: &HashMap<String, String>,
            body: &Value,
        ) -> Result<HttpResponse, TransportError>;
    }
}

/// Conversations seen by a scripted provider, one entry per call
pub type Transcript = Arc<Mutex<Vec<Vec<Message>>>>;

/// Provider mock that answers with `replies` in order and records every
/// conversation it was sent
pub fn scripted_provider(replies: Vec<Value>) -> (MockProvider, Transcript) {
    let transcript: Transcript = Arc::new(Mutex::new(Vec::new()));
    let seen = transcript.clone();
    let mut replies: VecDeque<String> = replies.into_iter().map(|r| r.to_string()).collect();

    let mut provider = MockProvider::new();
    provider.expect_is_configured().return_const(true);
    provider
        .expect_default_model()
        .return_const("deepseek-chat".to_string());
    provider.expect_chat().returning(move |params| {
        seen.lock().unwrap().push(params.messages.clone());
        let reply = replies
            .pop_front()
            .unwrap_or_else(|| json!({"action": "complete", "body": {}}).to_string());
        Ok(ChatResponse::text(reply))
    });

    (provider, transcript)
}

pub fn modify(body: Value) -> Value {
    json!({"action": "modify_fields", "body": body, "explanation": "probe"})
}

pub fn complete() -> Value {
    json!({"action": "complete", "body": {}, "explanation": "done"})
}

pub fn target(url: impl Into<String>, max_iterations: u32) -> DiscoveryTarget {
    DiscoveryTarget {
        method: "POST".to_string(),
        url: url.into(),
        headers: HashMap::new(),
        initial_body: Map::new(),
        max_iterations,
    }
}
