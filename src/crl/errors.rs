use thiserror::Error;

use crate::cache::CacheError;

/// CRL-related errors
#[derive(Error, Debug)]
pub enum CrlError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Revocation log is corrupt: {0}")]
    Corrupt(String),

    #[error("Revocation store is not initialized")]
    NotInitialized,
}

/// Convenient Result type alias
pub type CrlResult<T> = Result<T, CrlError>;
