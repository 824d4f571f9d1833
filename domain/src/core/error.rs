//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown slot: {0}")]
    UnknownSlot(String),

    #[error("Invalid provider: {0}")]
    InvalidProvider(String),

    #[error("Invalid merge timeout: {0} (use -1, 0 or a positive number of seconds)")]
    InvalidTimeout(i64),

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Invalid output format: {0} (use full, synthesis or json)")]
    InvalidOutputFormat(String),
}
