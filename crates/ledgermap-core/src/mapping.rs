//! Mapping results and batch aggregates.

use serde::{Deserialize, Serialize};

/// Lifecycle of a mapping batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Processing,
    Completed,
    Failed,
}

/// The structured outcome of mapping one source account.
///
/// Produced once per source account per batch and never mutated afterwards.
/// `confidence` is always within [0, 100]; the parser clamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    /// Code of the source account that was mapped.
    pub source_code: String,
    /// Suggested target account code, or "UNKNOWN" when the model gave none.
    pub target_code: String,
    /// Model-reported confidence, 0-100. Not independently verified.
    pub confidence: u8,
    /// The model's explanation for the suggestion.
    pub reasoning: String,
    /// Alternative target codes, best first. Never contains the "None"
    /// placeholder the prompt asks for.
    pub alternatives: Vec<String>,
    /// Wall-clock seconds spent on this account's completion call.
    pub processing_time: f64,
}

/// Aggregate statistics over one batch of mapping results.
///
/// Recomputed fresh per batch; not persisted beyond the batch record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_mappings: usize,
    /// Results with confidence at or above the caller's threshold.
    pub high_confidence_mappings: usize,
    /// Arithmetic mean confidence rounded to one decimal, 0.0 for an empty batch.
    pub average_confidence: f64,
    /// Total batch wall-clock seconds rounded to two decimals.
    pub processing_time: f64,
    /// Echo of the threshold the counts were computed against.
    pub confidence_threshold: u8,
}

impl BatchSummary {
    /// Computes the summary for a finished batch.
    pub fn compute(results: &[MappingResult], confidence_threshold: u8, elapsed_secs: f64) -> Self {
        let high_confidence_mappings = results
            .iter()
            .filter(|r| r.confidence >= confidence_threshold)
            .count();

        let average_confidence = if results.is_empty() {
            0.0
        } else {
            let sum: u32 = results.iter().map(|r| u32::from(r.confidence)).sum();
            round_to(f64::from(sum) / results.len() as f64, 1)
        };

        Self {
            total_mappings: results.len(),
            high_confidence_mappings,
            average_confidence,
            processing_time: round_to(elapsed_secs, 2),
            confidence_threshold,
        }
    }
}

/// The full result shape handed back to the embedding layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingOutcome {
    pub session_id: String,
    pub results: Vec<MappingResult>,
    pub summary: BatchSummary,
    pub status: BatchStatus,
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
