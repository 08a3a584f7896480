//! Direct REST client for the Claude messages API.
//!
//! Calls the API without any CLI dependency and masks transient overloads
//! behind the bounded retry in [`crate::retry`].
//! Configuration priority: ~/.config/ledgermap/secret.json > environment variables

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::warn;

use crate::config;
use crate::error::UpstreamError;
use crate::retry::{self, RetryPolicy};

const DEFAULT_CLAUDE_MODEL: &str = "claude-3-5-sonnet-20241022";
const BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4000;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// The status the API uses to shed load. The only HTTP status worth retrying.
const STATUS_OVERLOADED: u16 = 529;

/// One role-tagged message in a conversation, most recent last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Anything that can turn a conversation into completion text.
///
/// The application layer only ever sees this trait, so tests substitute
/// scripted implementations and the HTTP client stays in one place.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends one prompt exchange and returns the generated text.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        system: Option<&str>,
    ) -> Result<String, UpstreamError>;
}

/// Client for the Claude HTTP API with bounded retry on transient failures.
///
/// The underlying connection pool is created lazily on the first call and
/// shared across calls (and across clones of the surrounding `Arc`); calls
/// are independent and stateless aside from that pool. Callers should
/// [`close`](ClaudeApiClient::close) the client on shutdown.
pub struct ClaudeApiClient {
    http: OnceCell<Client>,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ClaudeApiClient {
    /// Creates a new client with the provided API key and default settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: OnceCell::new(),
            api_key: api_key.into(),
            model: DEFAULT_CLAUDE_MODEL.to_string(),
            base_url: BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Loads configuration from ~/.config/ledgermap/secret.json or environment variables.
    ///
    /// Priority:
    /// 1. ~/.config/ledgermap/secret.json
    /// 2. Environment variables (ANTHROPIC_API_KEY or CLAUDE_API_KEY, CLAUDE_MODEL_NAME)
    ///
    /// Model name defaults to `claude-3-5-sonnet-20241022` if not specified.
    pub fn try_from_env() -> Result<Self, UpstreamError> {
        if let Ok(secret_config) = config::load_secret_config() {
            if let Some(claude_config) = secret_config.claude {
                let model = claude_config
                    .model_name
                    .unwrap_or_else(|| DEFAULT_CLAUDE_MODEL.to_string());
                return Ok(Self::new(claude_config.api_key).with_model(model));
            }
        }

        let api_key = env::var("ANTHROPIC_API_KEY")
            .or_else(|_| env::var("CLAUDE_API_KEY"))
            .map_err(|_| {
                UpstreamError::Config(
                    "API key not found in ~/.config/ledgermap/secret.json or environment variables"
                        .to_string(),
                )
            })?;

        let model = env::var("CLAUDE_MODEL_NAME").unwrap_or_else(|_| DEFAULT_CLAUDE_MODEL.to_string());
        Ok(Self::new(api_key).with_model(model))
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Points the client at a different endpoint (test servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the per-request network timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the retry schedule.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Releases the pooled connections. The next call would lazily create a
    /// fresh pool, so this is only meaningful at shutdown.
    pub fn close(&mut self) {
        self.http.take();
    }

    fn http(&self) -> Result<&Client, UpstreamError> {
        self.http.get_or_try_init(|| {
            Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|err| UpstreamError::Config(format!("failed to build HTTP client: {err}")))
        })
    }

    async fn send_request(&self, body: &CreateMessageRequest) -> Result<String, UpstreamError> {
        let response = self
            .http()?
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| UpstreamError::Transport {
                message: format!("Claude API request failed: {err}"),
                retryable: err.is_timeout() || err.is_connect(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read Claude error body".to_string());
            if status.as_u16() == STATUS_OVERLOADED {
                warn!(%status, "Claude API overloaded");
            }
            return Err(map_http_error(status, body_text));
        }

        let parsed: CreateMessageResponse = response
            .json()
            .await
            .map_err(|err| UpstreamError::Malformed(format!("failed to parse Claude response: {err}")))?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl CompletionClient for ClaudeApiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        system: Option<&str>,
    ) -> Result<String, UpstreamError> {
        let request = CreateMessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: messages.to_vec(),
            system: system.map(str::to_string),
        };

        retry::with_backoff(self.retry, || self.send_request(&request)).await
    }
}

#[derive(Serialize)]
struct CreateMessageRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlockResponse>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlockResponse {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    r#type: String,
    message: String,
}

fn extract_text_response(response: CreateMessageResponse) -> Result<String, UpstreamError> {
    response
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlockResponse::Text { text } => Some(text),
            ContentBlockResponse::Other => None,
        })
        .ok_or(UpstreamError::EmptyCompletion)
}

fn map_http_error(status: StatusCode, body: String) -> UpstreamError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    UpstreamError::Api {
        status: status.as_u16(),
        message,
        retryable: status.as_u16() == STATUS_OVERLOADED,
    }
}
