//! Error types for the upstream completion service.

use thiserror::Error;

/// Failures from the upstream completion API or its transport.
///
/// Retryability is decided once, where the error is constructed at the
/// transport boundary; the retry loop only ever consults
/// [`UpstreamError::is_retryable`] and never inspects message text.
#[derive(Error, Debug, Clone)]
pub enum UpstreamError {
    /// Non-success HTTP status from the completion API.
    #[error("completion API returned {status}: {message}")]
    Api {
        status: u16,
        message: String,
        retryable: bool,
    },

    /// The request never produced an HTTP response (connect failure, timeout).
    #[error("completion request failed: {message}")]
    Transport { message: String, retryable: bool },

    /// A success response whose body did not match the expected shape.
    #[error("malformed completion response: {0}")]
    Malformed(String),

    /// A well-formed success response that carried no generated text.
    #[error("completion response contained no generated text")]
    EmptyCompletion,

    /// A retryable failure survived every allowed attempt.
    #[error("completion API still failing after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// Missing or unusable client configuration.
    #[error("completion client configuration error: {0}")]
    Config(String),
}

impl UpstreamError {
    /// Whether the failure is transient and worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { retryable, .. } | Self::Transport { retryable, .. } => *retryable,
            Self::Malformed(_) | Self::EmptyCompletion | Self::RetriesExhausted { .. } | Self::Config(_) => false,
        }
    }
}
