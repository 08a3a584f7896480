//! Batch mapping use case.
//!
//! Drives one batch of source accounts through the completion client and the
//! suggestion parser, strictly sequentially, and keeps a live progress record
//! in the batch store while it runs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ledgermap_core::Account;
use ledgermap_core::mapping::{BatchStatus, BatchSummary, MappingOutcome, MappingResult};
use ledgermap_core::session::{BatchRecord, BatchStore};
use ledgermap_core::suggestion::{self, ParsedSuggestion};
use ledgermap_interaction::{ChatMessage, CompletionClient};
use tokio::time::sleep;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::MappingError;
use crate::prompt;

/// Pause between consecutive completion calls, to respect upstream rate limits.
const INTER_CALL_DELAY: Duration = Duration::from_secs(3);

/// Threshold used when the caller does not supply one.
pub const DEFAULT_CONFIDENCE_THRESHOLD: u8 = 80;

/// One batch of source accounts to map against a candidate target chart.
#[derive(Debug, Clone)]
pub struct MappingRequest {
    /// Accounts to map, in the order results will be produced.
    pub source_accounts: Vec<Account>,
    /// Candidate target accounts, all of them offered for every source.
    pub target_accounts: Vec<Account>,
    /// Free-text context forwarded into every prompt.
    pub mapping_context: Option<String>,
    pub confidence_threshold: u8,
}

impl MappingRequest {
    pub fn new(source_accounts: Vec<Account>, target_accounts: Vec<Account>) -> Self {
        Self {
            source_accounts,
            target_accounts,
            mapping_context: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.mapping_context = Some(context.into());
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: u8) -> Self {
        self.confidence_threshold = threshold;
        self
    }
}

/// Orchestrates mapping batches.
///
/// Accounts are processed one at a time, deliberately: the upstream service
/// rate-limits, so there is no per-batch concurrency and a fixed delay sits
/// between consecutive calls. A batch either completes for every account or
/// fails as a whole on the first unrecoverable one; partial progress stays
/// readable through [`MappingUseCase::status`] either way.
pub struct MappingUseCase {
    client: Arc<dyn CompletionClient>,
    batches: Arc<dyn BatchStore>,
}

impl MappingUseCase {
    pub fn new(client: Arc<dyn CompletionClient>, batches: Arc<dyn BatchStore>) -> Self {
        Self { client, batches }
    }

    /// Maps every source account in `request` under a fresh session id.
    pub async fn map_accounts(&self, request: MappingRequest) -> Result<MappingOutcome, MappingError> {
        self.map_accounts_with_session(Uuid::new_v4().to_string(), request)
            .await
    }

    /// Maps a batch under a caller-supplied session id, so the caller can
    /// poll [`MappingUseCase::status`] for that id while the batch runs (and
    /// after it fails).
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Account`] as soon as any account's completion
    /// call fails beyond recovery; results computed before the failure are
    /// not returned, but remain visible on the batch record.
    pub async fn map_accounts_with_session(
        &self,
        session_id: String,
        request: MappingRequest,
    ) -> Result<MappingOutcome, MappingError> {
        let started = Instant::now();
        let total = request.source_accounts.len();

        let mut record = BatchRecord::new(total);
        self.batches.put(&session_id, record.clone()).await;

        let mut results: Vec<MappingResult> = Vec::with_capacity(total);
        for (index, source) in request.source_accounts.iter().enumerate() {
            info!(
                session_id = %session_id,
                account = %source.code,
                "mapping account {}/{}",
                index + 1,
                total
            );

            let account_started = Instant::now();
            let parsed = match self.map_single(source, &request).await {
                Ok(parsed) => parsed,
                Err(err) => {
                    record.status = BatchStatus::Failed;
                    record.error = Some(err.to_string());
                    self.batches.put(&session_id, record).await;
                    error!(session_id = %session_id, account = %source.code, error = %err, "batch aborted");
                    return Err(err);
                }
            };

            let result = MappingResult {
                source_code: source.code.clone(),
                target_code: parsed.mapping,
                confidence: parsed.confidence,
                reasoning: parsed.reasoning,
                alternatives: parsed.alternatives,
                processing_time: account_started.elapsed().as_secs_f64(),
            };

            results.push(result.clone());
            record.processed_accounts = index + 1;
            record.results.push(result);
            self.batches.put(&session_id, record.clone()).await;

            if index + 1 < total {
                sleep(INTER_CALL_DELAY).await;
            }
        }

        let summary = BatchSummary::compute(
            &results,
            request.confidence_threshold,
            started.elapsed().as_secs_f64(),
        );
        record.status = BatchStatus::Completed;
        record.summary = Some(summary.clone());
        self.batches.put(&session_id, record).await;

        info!(
            session_id = %session_id,
            total = summary.total_mappings,
            average_confidence = summary.average_confidence,
            "batch completed"
        );

        Ok(MappingOutcome {
            session_id,
            results,
            summary,
            status: BatchStatus::Completed,
        })
    }

    /// Current progress of a batch: live while it runs, final afterwards.
    pub async fn status(&self, session_id: &str) -> Option<BatchRecord> {
        self.batches.get(session_id).await
    }

    async fn map_single(
        &self,
        source: &Account,
        request: &MappingRequest,
    ) -> Result<ParsedSuggestion, MappingError> {
        let prompt = prompt::render_mapping_prompt(
            source,
            &request.target_accounts,
            request.mapping_context.as_deref(),
        )?;
        let messages = [ChatMessage::user(prompt)];

        let text = self
            .client
            .complete(&messages, None)
            .await
            .map_err(|err| MappingError::Account {
                source_code: source.code.clone(),
                source: err,
            })?;

        Ok(suggestion::parse_suggestion(&text))
    }
}
