//! Outbound LLM interaction layer for LedgerMap.
//!
//! Owns the one place this system talks to the outside world: the Claude
//! messages API. Everything above this crate works against the
//! [`CompletionClient`] trait and the typed [`UpstreamError`], so transient
//! upstream weather (overloads, timeouts) is handled here and nowhere else.

pub mod claude_api_client;
pub mod config;
pub mod error;
pub mod retry;

pub use claude_api_client::{ChatMessage, ClaudeApiClient, CompletionClient};
pub use error::UpstreamError;
pub use retry::RetryPolicy;
