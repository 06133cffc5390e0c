//! LLM client abstraction and its HTTP implementation.
//!
//! Agents only see [`CompletionClient`]: one prompt in, one raw completion
//! out, no retry at this layer. The error split matters more than the
//! transport: a [`ConfigurationError`] means the integration itself is
//! broken (bad credentials, unreachable endpoint) and must surface to the
//! boundary untouched, while an [`LlmError::Call`] is a per-call problem
//! the owning agent reports as its own stage failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{LlmSettings, ModelSettings};

/// The LLM integration is non-functional. Non-retryable; indicates a
/// deployment defect rather than a content problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("LLM configuration error: {0}")]
pub struct ConfigurationError(pub String);

#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// A single round trip failed or returned unusable content.
    #[error("{0}")]
    Call(String),
}

/// Single completion round trip consumed by agents.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Clone)]
pub struct HttpLlmClient {
    http: Client,
    base_url: String,
    api_key: String,
    user_agent: String,
    model: String,
    max_tokens: u32,
}

impl HttpLlmClient {
    pub fn new(llm: &LlmSettings, models: &ModelSettings) -> Result<Self, ConfigurationError> {
        Self::with_base_url(llm, models, llm.base_url.clone())
    }

    pub fn with_base_url(
        llm: &LlmSettings,
        models: &ModelSettings,
        base_url: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let sanitized_base = base_url.into().trim_end_matches('/').to_string();
        if sanitized_base.is_empty() {
            return Err(ConfigurationError("Base URL cannot be empty".to_string()));
        }
        if llm.api_key.trim().is_empty() {
            return Err(ConfigurationError("API key is not set".to_string()));
        }

        let timeout = Duration::from_secs(llm.timeout_secs);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ConfigurationError(format!("Failed to build HTTP client: {error}")))?;

        Ok(Self {
            http,
            base_url: sanitized_base,
            api_key: llm.api_key.clone(),
            user_agent: llm.user_agent.clone(),
            model: models.model.clone(),
            max_tokens: models.max_tokens,
        })
    }

    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .header("User-Agent", &self.user_agent)
            .json(&request)
            .send()
            .await
            .map_err(|error| {
                if error.is_connect() {
                    LlmError::Configuration(ConfigurationError(format!(
                        "Chat completions endpoint is unreachable: {error}"
                    )))
                } else {
                    LlmError::Call(format!("Failed to send chat completion request: {error}"))
                }
            })?;

        match response.status() {
            reqwest::StatusCode::OK => response
                .json::<ChatCompletionResponse>()
                .await
                .map_err(|error| {
                    LlmError::Call(format!(
                        "Failed to parse chat completion response JSON: {error}"
                    ))
                }),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(LlmError::Configuration(ConfigurationError(
                    "Invalid API key. Please check your API key configuration.".to_string(),
                )))
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                let error_text = response.text().await.unwrap_or_default();
                Err(LlmError::Call(format!(
                    "Rate limit exceeded. Please wait before trying again. (API response: {error_text})"
                )))
            }
            reqwest::StatusCode::BAD_REQUEST => {
                let error_text = response.text().await.unwrap_or_default();
                Err(LlmError::Call(format!("Invalid request: {error_text}")))
            }
            reqwest::StatusCode::INTERNAL_SERVER_ERROR
            | reqwest::StatusCode::SERVICE_UNAVAILABLE => Err(LlmError::Call(
                "Completion service is temporarily unavailable. Please try again later."
                    .to_string(),
            )),
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                Err(LlmError::Call(format!(
                    "API error (status {status}): {error_text}"
                )))
            }
        }
    }
}

#[async_trait]
impl CompletionClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "sending completion request");

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: ChatMessageRole::User,
                content: prompt.to_string(),
            }],
            max_tokens: Some(self.max_tokens),
            temperature: Some(0.2),
        };

        let response = self.chat_completion(request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Call("Completion returned no choices".to_string()))?;

        let content = choice.message.content;
        if content.trim().is_empty() {
            return Err(LlmError::Call("Completion content was empty".to_string()));
        }

        debug!(response_len = content.len(), "completion received");
        Ok(content)
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: ChatMessageRole,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
enum ChatMessageRole {
    User,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: String,
}
