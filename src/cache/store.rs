use async_trait::async_trait;
use chrono::{DateTime, Utc};
use color_eyre::Report;
use std::error::Error as StdError;
use std::fmt;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

type Result<T> = std::result::Result<T, CacheStoreError>;

/// Error type for cache backend operations.
#[derive(Debug)]
pub struct CacheStoreError {
    error: Report,
}

impl CacheStoreError {
    pub fn new<T>(error: T) -> Self
    where
        T: StdError + Send + Sync + 'static,
    {
        Self {
            error: Report::new(error),
        }
    }

    pub fn msg<T>(message: T) -> Self
    where
        T: fmt::Debug + fmt::Display + Send + Sync + 'static,
    {
        Self {
            error: Report::msg(message),
        }
    }
}

impl StdError for CacheStoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.error.source()
    }
}

impl fmt::Display for CacheStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl From<std::io::Error> for CacheStoreError {
    fn from(error: std::io::Error) -> Self {
        Self {
            error: Report::new(error),
        }
    }
}

/// Abstract interface for cache storage backends.
#[async_trait]
pub trait CacheBackend: Send + Sync + Clone + 'static {
    /// Makes sure the backing location exists.
    async fn prepare(&self) -> Result<()>;

    /// Overwrites the named blob and refreshes its last-write timestamp.
    async fn save(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Loads the named blob, if it exists.
    async fn load(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Returns the last-write timestamp of the named blob, if it exists.
    async fn last_write(&self, name: &str) -> Result<Option<DateTime<Utc>>>;

    /// Deletes the named blob. Deleting a missing blob is not an error.
    async fn delete(&self, name: &str) -> Result<()>;
}
