use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::debug;

use crate::cache::store::{CacheBackend, Result};

/// A cache backend keeping one file per artifact inside a folder.
///
/// The last-write timestamp is the file modification time.
#[derive(Debug, Clone)]
pub struct FileStore {
    folder: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(folder: P) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Full path of a named artifact.
    pub fn path(&self, name: &str) -> PathBuf {
        self.folder.join(name)
    }
}

#[async_trait]
impl CacheBackend for FileStore {
    async fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.folder).await?;
        Ok(())
    }

    async fn save(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.path(name);
        // Write to temporary file first, then rename atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, data).await?;
        fs::rename(&temp_path, &path).await?;
        debug!("Wrote {:?}", path);
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path(name)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn last_write(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        match fs::metadata(self.path(name)).await {
            Ok(metadata) => Ok(Some(DateTime::<Utc>::from(metadata.modified()?))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.path(name)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
