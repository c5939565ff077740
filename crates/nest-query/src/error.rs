use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable code for "single row requested, zero rows matched".
pub const NOT_FOUND_CODE: &str = "PGRST116";

/// Expected, checkable failure returned inside a [`Response`](crate::Response).
///
/// This is data, not an `Err`: callers branch on [`ApiError::code`] the same
/// way they would against the real backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ApiError {
    /// The single-read not-found error.
    pub fn not_found(table: &str) -> Self {
        Self {
            code: NOT_FOUND_CODE.into(),
            message: "Row not found".into(),
            details: Some(format!("0 rows returned from {table}")),
            hint: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code == NOT_FOUND_CODE
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Unexpected failure while executing a plan.
///
/// Surfaces as `Err` from [`QueryBuilder::execute`](crate::QueryBuilder::execute),
/// never as a `{ data, error }` pair.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("store error: {0}")]
    Store(#[from] nest_store::StoreError),
}

/// Result alias for query execution.
pub type QueryResult<T> = Result<T, QueryError>;
