//! Per-session state: uploaded ledgers and running mapping batches.

pub mod model;
pub mod store;

pub use model::{BatchRecord, UploadedLedger};
pub use store::{BatchStore, InMemoryBatchStore, InMemoryUploadStore, UploadStore};
