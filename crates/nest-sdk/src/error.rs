use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("store error: {0}")]
    Store(#[from] nest_store::StoreError),

    #[error("auth error: {0}")]
    Auth(#[from] nest_auth::AuthError),

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

pub type SdkResult<T> = Result<T, SdkError>;
