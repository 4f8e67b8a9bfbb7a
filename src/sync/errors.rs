use thiserror::Error;

use crate::cache::CacheError;
use crate::crl::CrlError;
use crate::remote::RemoteError;

/// Synchronisation errors
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Gateway error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("CRL error: {0}")]
    Crl(#[from] CrlError),

    #[error("Revocation feed restarted {0} times in one run")]
    TooManyRestarts(usize),
}

pub type SyncResult<T> = Result<T, SyncError>;
