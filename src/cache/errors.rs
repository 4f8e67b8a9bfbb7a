use crate::cache::{CacheKey, store::CacheStoreError};

/// Cache errors.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("Cached artifact not found: {0}")]
    NotFound(CacheKey),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] CacheStoreError),
}

pub type CacheResult<T> = Result<T, CacheError>;
