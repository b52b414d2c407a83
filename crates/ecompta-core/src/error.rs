//! # Error Types
//!
//! Construction-time failures for core value types. Lifecycle transition
//! failures live in `ecompta-state`.

use thiserror::Error;

/// Error raised when a core value cannot be constructed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A field failed validation (bad code, inverted date range, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// A timestamp string could not be parsed or was not UTC.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
