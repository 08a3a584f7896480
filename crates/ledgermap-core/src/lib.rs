//! Core domain layer for LedgerMap.
//!
//! This crate holds the domain models shared across the workspace: ledger
//! accounts, mapping results and batch aggregates, per-session stores for
//! uploaded ledgers and running batches, and the parser that turns a model's
//! free-text mapping suggestion into a structured record.
//!
//! It knows nothing about HTTP or the upstream completion API; those live in
//! `ledgermap-interaction` and `ledgermap-application`.

pub mod account;
pub mod mapping;
pub mod session;
pub mod suggestion;

pub use account::Account;
pub use mapping::{BatchStatus, BatchSummary, MappingOutcome, MappingResult};
pub use suggestion::{ParsedSuggestion, parse_suggestion};
