//! OpenAI-compatible chat-completions client
//!
//! Talks to DeepSeek by default; OpenRouter keys and bases are detected the
//! same way any other compatible endpoint is configured.

use crate::*;
use reqwest::Client;
use serde_json::json;

const DEEPSEEK_API_BASE: &str = "https://api.deepseek.com";
const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

/// Chat-completions client for DeepSeek, OpenRouter or any compatible base
pub struct OpenAiCompatProvider {
    client: Client,
    api_key: String,
    api_base: String,
    default_model: String,
    is_openrouter: bool,
    alternating_roles: bool,
}

impl OpenAiCompatProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        let api_key = api_key.into();
        let is_openrouter = api_key.starts_with("sk-or-")
            || api_base
                .as_ref()
                .map(|b| b.contains("openrouter"))
                .unwrap_or(false);

        let api_base = api_base
            .unwrap_or_else(|| {
                if is_openrouter {
                    OPENROUTER_API_BASE.to_string()
                } else {
                    DEEPSEEK_API_BASE.to_string()
                }
            })
            .trim_end_matches('/')
            .to_string();

        let default_model = default_model.unwrap_or_else(|| {
            if is_openrouter {
                "deepseek/deepseek-chat".to_string()
            } else {
                "deepseek-chat".to_string()
            }
        });

        Self {
            client: Client::new(),
            api_key,
            api_base,
            default_model,
            is_openrouter,
            alternating_roles: false,
        }
    }

    /// Reshape every conversation into strict user/assistant alternation
    /// before sending it
    pub fn with_alternating_roles(mut self, enabled: bool) -> Self {
        self.alternating_roles = enabled;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn is_openrouter(&self) -> bool {
        self.is_openrouter
    }

    fn build_request(&self, params: &ChatParams) -> serde_json::Value {
        let model = if params.model.is_empty() {
            self.default_model.clone()
        } else {
            params.model.clone()
        };

        let messages = if self.alternating_roles {
            reshape_alternating(&params.messages)
        } else {
            params.messages.clone()
        };

        json!({
            "model": model,
            "messages": messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
            "stream": false,
        })
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<ChatResponse> {
        if let Some(message) = json["error"]["message"].as_str() {
            return Err(ProviderError::Api(message.to_string()));
        }

        let choice = json["choices"]
            .get(0)
            .ok_or(ProviderError::InvalidResponse)?;
        let content = choice["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let finish_reason = choice["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();

        let usage = if let Some(usage) = json["usage"].as_object() {
            let count = |key: &str| usage.get(key).and_then(|v| v.as_u64()).unwrap_or(0) as u32;
            Usage {
                prompt_tokens: count("prompt_tokens"),
                completion_tokens: count("completion_tokens"),
                total_tokens: count("total_tokens"),
            }
        } else {
            Usage::default()
        };

        Ok(ChatResponse {
            content,
            finish_reason,
            usage,
        })
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiCompatProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
        if !self.is_configured() {
            return Err(ProviderError::NoApiKey);
        }

        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request(&params);
        trace_messages(&params.messages);
        trace!("◆ POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }
            let error = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| format!("status {}: {}", status.as_u16(), text));
            return Err(ProviderError::Api(error));
        }

        let json: serde_json::Value = serde_json::from_str(&text)?;
        let parsed = self.parse_response(json)?;
        debug!(
            "◆ completion received: {} chars, {} tokens",
            parsed.content.len(),
            parsed.usage.total_tokens
        );
        Ok(parsed)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
