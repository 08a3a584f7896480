//! Error types for the mapping and advisor use cases.

use ledgermap_interaction::UpstreamError;
use thiserror::Error;

/// Failures surfaced by the application layer.
///
/// A batch fails as a whole: the first account whose completion call cannot
/// be recovered aborts the run with [`MappingError::Account`]. Parsing never
/// contributes errors here; malformed completion text degrades to default
/// field values instead.
#[derive(Error, Debug)]
pub enum MappingError {
    /// A single account's completion call failed, aborting the batch.
    #[error("mapping failed for account '{source_code}': {source}")]
    Account {
        source_code: String,
        #[source]
        source: UpstreamError,
    },

    /// An advisor completion call failed.
    #[error("completion failed: {0}")]
    Completion(#[from] UpstreamError),

    /// No uploaded ledger exists for the session id.
    #[error("no uploaded ledger for session '{0}'")]
    SessionNotFound(String),

    /// The user message was empty or whitespace.
    #[error("message cannot be empty")]
    EmptyMessage,

    /// A prompt template failed to render.
    #[error("prompt rendering failed: {0}")]
    Prompt(String),
}
