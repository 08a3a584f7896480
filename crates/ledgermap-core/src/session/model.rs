//! Session domain models.

use crate::account::Account;
use crate::mapping::{BatchStatus, BatchSummary, MappingResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An uploaded ledger held for the lifetime of a session.
///
/// Created once when a file is uploaded, read by later chat and mapping
/// calls, never mutated. The file parsing itself happens upstream; this
/// model only carries the already-parsed rows plus enough raw context for
/// the advisor prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedLedger {
    /// Original filename as uploaded.
    pub filename: String,
    /// Parsed accounts, one per file row.
    pub accounts: Vec<Account>,
    /// Upload timestamp (RFC 3339).
    pub upload_time: String,
    pub account_count: usize,
    /// Column names of the uploaded file.
    pub columns: Vec<String>,
    /// A small sample of raw rows, kept for prompt context.
    #[serde(default)]
    pub raw_data_sample: Vec<HashMap<String, String>>,
}

impl UploadedLedger {
    /// Builds the session value for a freshly uploaded file, stamping the
    /// upload time and account count.
    pub fn new(
        filename: impl Into<String>,
        accounts: Vec<Account>,
        columns: Vec<String>,
        raw_data_sample: Vec<HashMap<String, String>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            account_count: accounts.len(),
            accounts,
            upload_time: chrono::Utc::now().to_rfc3339(),
            columns,
            raw_data_sample,
        }
    }
}

/// Live progress of one mapping batch.
///
/// The orchestrator writes an updated record after every account, so a
/// caller can observe a batch while it runs and read partial results (and
/// the failure message) after an aborted one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub status: BatchStatus,
    /// Batch start timestamp (RFC 3339).
    pub started_at: String,
    pub total_accounts: usize,
    pub processed_accounts: usize,
    /// Results completed so far, in source order.
    pub results: Vec<MappingResult>,
    /// Present once the batch completes.
    pub summary: Option<BatchSummary>,
    /// Present once the batch fails.
    pub error: Option<String>,
}

impl BatchRecord {
    /// Creates the initial record for a batch that is about to start.
    pub fn new(total_accounts: usize) -> Self {
        Self {
            status: BatchStatus::Processing,
            started_at: chrono::Utc::now().to_rfc3339(),
            total_accounts,
            processed_accounts: 0,
            results: Vec::new(),
            summary: None,
            error: None,
        }
    }
}
