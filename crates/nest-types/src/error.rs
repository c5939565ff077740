use thiserror::Error;

/// Errors produced by type conversions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("row must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
