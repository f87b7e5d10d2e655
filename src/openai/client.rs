use std::time::Duration;

use clap::ValueEnum;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use super::types::{ChatCompletionRequest, ChatCompletionResponse, ErrorEnvelope, Message};
use crate::config::ApiKey;

const API_BASE: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("OPENAI_API_KEY not set. Get one at https://platform.openai.com/api-keys")]
    ApiKeyNotSet,

    #[error("completion API rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("completion API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("completion API returned no text")]
    EmptyResponse,

    #[error("completion network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(ValueEnum, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Higher-capability model (gpt-4o)
    #[default]
    Standard,
    /// Cheaper, faster model (gpt-4o-mini)
    Fast,
}

impl ModelTier {
    pub fn model_id(self) -> &'static str {
        match self {
            ModelTier::Standard => "gpt-4o",
            ModelTier::Fast => "gpt-4o-mini",
        }
    }
}

/// Single-turn chat completion at temperature 0.
/// Implemented by `OpenAiClient` for production; mock implementations used in tests.
pub trait CompletionProvider {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: ApiKey,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(http: Client, api_key: ApiKey) -> Result<Self, CompletionError> {
        if api_key.expose().trim().is_empty() {
            return Err(CompletionError::ApiKeyNotSet);
        }
        Ok(Self {
            http,
            api_key,
            base_url: API_BASE.to_string(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey::new("test-key"),
            base_url: base_url.to_string(),
        }
    }
}

impl CompletionProvider for OpenAiClient {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatCompletionRequest {
            model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };

        debug_assert!(
            url.starts_with("https://") || cfg!(test),
            "API key must only be sent over HTTPS"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or_else(|| {
                    let end = text.floor_char_boundary(200);
                    format!("HTTP {status}: {}", &text[..end])
                });
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                warn!("OpenAI API rate limited");
                return Err(CompletionError::RateLimited(message));
            }
            warn!(status = %status, "OpenAI API error");
            return Err(CompletionError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let body: ChatCompletionResponse = response.json().await?;

        if let Some(err) = body.error {
            let message = err
                .message
                .or(err.code)
                .or(err.kind)
                .unwrap_or_else(|| "Unknown error".to_string());
            warn!(error = %message, "OpenAI API error in 200 response");
            return Err(CompletionError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)?;

        debug!(model, chars = text.len(), "completion received");
        Ok(text)
    }
}
