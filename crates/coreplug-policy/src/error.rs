//! Error types for the policy crate.

use thiserror::Error;

/// Result type alias for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors that can occur when configuring the decision engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("threshold level {0} out of range, must be strictly between 0 and 100")]
    LevelOutOfRange(u32),

    #[error("expected {expected} threshold levels, got {got}")]
    LevelCount { expected: usize, got: usize },
}
