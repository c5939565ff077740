/// Errors from table and snapshot storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A thread panicked while holding a store lock.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// The snapshot key cannot be mapped onto the backing store.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// I/O error from the file-backed snapshot store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Atomic replacement of a snapshot file failed.
    #[error("failed to persist {key}: {reason}")]
    Persist { key: String, reason: String },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
