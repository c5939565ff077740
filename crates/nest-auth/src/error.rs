/// Errors produced by the auth emulator.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Table or snapshot storage failed.
    #[error("store error: {0}")]
    Store(#[from] nest_store::StoreError),

    /// The session snapshot could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal lock was poisoned by a panicking subscriber or writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Convenience alias used throughout the auth crate.
pub type AuthResult<T> = Result<T, AuthError>;
