//! Application layer for LedgerMap.
//!
//! This crate provides the use cases that coordinate the domain layer and
//! the completion client: the batch mapping orchestrator and the
//! conversational mapping advisor.

pub mod advisor;
pub mod error;
pub mod mapping_usecase;
pub mod prompt;

pub use advisor::{
    AccountClass, ChatRequest, MappingAdvisor, MappingPattern, ReferenceAccount, ReferenceChart,
};
pub use error::MappingError;
pub use mapping_usecase::{MappingRequest, MappingUseCase};
