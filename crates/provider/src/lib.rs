//! Reasoning collaborator contract
//!
//! Role-tagged conversation messages, the `Provider` trait consumed by the
//! discovery loop, and an OpenAI-compatible chat-completions client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use thiserror::Error;
use tracing::{debug, trace};

pub mod alternation;
pub mod openai;

pub use alternation::{reshape_alternating, CONTINUATION_PROMPT};
pub use openai::OpenAiCompatProvider;

/// Reasoning service errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request to reasoning service failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed reasoning service payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reasoning service rejected request: {0}")]
    Api(String),

    #[error("no API key configured for reasoning service")]
    NoApiKey,

    #[error("reasoning service returned no completion choices")]
    InvalidResponse,

    #[error("reasoning service rate limited the request")]
    RateLimited,
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Conversation role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        f.write_str(s)
    }
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Token accounting reported by the service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Completion returned for one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    #[serde(default)]
    pub finish_reason: String,
    #[serde(default)]
    pub usage: Usage,
}

impl ChatResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            finish_reason: "stop".to_string(),
            usage: Usage::default(),
        }
    }
}

/// Parameters for one completion request
#[derive(Debug, Clone)]
pub struct ChatParams {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            model: String::new(),
            messages: Vec::new(),
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

/// Text-completion service proposing the next discovery action
#[async_trait]
pub trait Provider: Send + Sync {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse>;
    fn default_model(&self) -> String;
    fn is_configured(&self) -> bool;
}

/// Log a conversation at trace level, one line per turn
pub fn trace_messages(messages: &[Message]) {
    debug!("sending {} messages to reasoning service", messages.len());
    for (i, m) in messages.iter().enumerate() {
        trace!("[{}] {}: {}", i, m.role, m.content);
    }
}
