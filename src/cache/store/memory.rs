use crate::cache::store::{CacheBackend, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Entry {
    data: Vec<u8>,
    written_at: DateTime<Utc>,
}

/// An in-memory cache backend.
///
/// Useful for testing and development.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a blob with an explicit last-write timestamp.
    pub fn save_at(&self, name: &str, data: &[u8], written_at: DateTime<Utc>) {
        self.entries.insert(
            name.to_string(),
            Entry {
                data: data.to_vec(),
                written_at,
            },
        );
    }
}

#[async_trait]
impl CacheBackend for MemoryStore {
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }

    async fn save(&self, name: &str, data: &[u8]) -> Result<()> {
        self.save_at(name, data, Utc::now());
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(name).map(|entry| entry.data.clone()))
    }

    async fn last_write(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.entries.get(name).map(|entry| entry.written_at))
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.entries.remove(name);
        Ok(())
    }
}
