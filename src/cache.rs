//! Temporal cache for the artifacts downloaded from the DGC gateway.
//!
//! Every artifact is an opaque blob stored under a [`CacheKey`]. The backend
//! records when each blob was last written, which drives the staleness check:
//! an artifact needs refreshing when it was never stored or when its last write
//! is older than the update window (24 hours by default).

mod errors;

pub mod store;

pub use errors::{CacheError, CacheResult};
pub use store::{CacheBackend, CacheStoreError, FileStore, MemoryStore};

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::crl::CrlCursor;

pub(crate) const UPDATE_WINDOW_HOURS: i64 = 24;

/// Named artifacts kept in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Progress cursor of the revocation feed.
    CrlStatus,
    /// Validation rules (gateway settings list).
    Rules,
    /// Index of the currently valid signer key identifiers.
    SignatureList,
    /// Signer certificates keyed by kid.
    Signatures,
}

impl CacheKey {
    /// Name of the artifact inside the backend.
    pub fn file_name(&self) -> &'static str {
        match self {
            CacheKey::CrlStatus => "crl.json",
            CacheKey::Rules => "rules.json",
            CacheKey::SignatureList => "signatureslist.json",
            CacheKey::Signatures => "signatures.json",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Cache of downloaded artifacts with staleness tracking.
#[derive(Debug, Clone)]
pub struct Cache<Store: CacheBackend> {
    store: Store,
    update_window: Duration,
}

impl<Store: CacheBackend> Cache<Store> {
    /// Creates a cache over the given backend with the default 24 hour window.
    pub fn new(store: Store) -> Self {
        Self {
            store,
            update_window: Duration::hours(UPDATE_WINDOW_HOURS),
        }
    }

    /// Overrides the freshness window.
    pub fn with_update_window(mut self, window: Duration) -> Self {
        self.update_window = window;
        self
    }

    pub fn update_window(&self) -> Duration {
        self.update_window
    }

    /// Prepares the backend and writes the cold-start CRL cursor if none exists.
    pub async fn initialize(&self) -> CacheResult<()> {
        self.store.prepare().await?;
        if self
            .store
            .load(CacheKey::CrlStatus.file_name())
            .await?
            .is_none()
        {
            info!("No CRL status found, starting from {}", CrlCursor::default());
            self.store_crl_status(CrlCursor::default()).await?;
        }
        Ok(())
    }

    /// Overwrites an artifact. The backend refreshes its last-write timestamp.
    pub async fn store(&self, key: CacheKey, data: &[u8]) -> CacheResult<()> {
        self.store.save(key.file_name(), data).await?;
        debug!("Stored {} ({} bytes)", key, data.len());
        Ok(())
    }

    /// Reads an artifact, failing with [`CacheError::NotFound`] if it was never stored.
    pub async fn read(&self, key: CacheKey) -> CacheResult<Vec<u8>> {
        self.store
            .load(key.file_name())
            .await?
            .ok_or(CacheError::NotFound(key))
    }

    pub async fn read_json<T: DeserializeOwned>(&self, key: CacheKey) -> CacheResult<T> {
        let data = self.read(key).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    pub async fn store_json<T: Serialize>(&self, key: CacheKey, value: &T) -> CacheResult<()> {
        let data = serde_json::to_vec(value)?;
        self.store(key, &data).await
    }

    /// Returns when the artifact was last written, if ever.
    pub async fn last_write(&self, key: CacheKey) -> CacheResult<Option<DateTime<Utc>>> {
        Ok(self.store.last_write(key.file_name()).await?)
    }

    /// Whether the artifact must be fetched again.
    pub async fn needs_update(&self, key: CacheKey) -> bool {
        self.needs_update_at(key, Utc::now()).await
    }

    /// Staleness check against an explicit clock.
    ///
    /// Any failure to read the timestamp counts as stale.
    pub async fn needs_update_at(&self, key: CacheKey, now: DateTime<Utc>) -> bool {
        match self.last_write(key).await {
            Ok(Some(written_at)) => written_at + self.update_window <= now,
            Ok(None) => true,
            Err(e) => {
                debug!("Could not read timestamp of {key}: {e}");
                true
            }
        }
    }

    /// Replaces an artifact with a default value.
    pub async fn reset(&self, key: CacheKey, default: &[u8]) -> CacheResult<()> {
        info!("Resetting {key}");
        self.store(key, default).await
    }

    pub async fn crl_status(&self) -> CacheResult<CrlCursor> {
        self.read_json(CacheKey::CrlStatus).await
    }

    pub async fn store_crl_status(&self, cursor: CrlCursor) -> CacheResult<()> {
        self.store_json(CacheKey::CrlStatus, &cursor).await
    }

    pub async fn rules(&self) -> CacheResult<Vec<u8>> {
        self.read(CacheKey::Rules).await
    }

    pub async fn signatures(&self) -> CacheResult<Vec<u8>> {
        self.read(CacheKey::Signatures).await
    }

    pub async fn signature_list(&self) -> CacheResult<Vec<u8>> {
        self.read(CacheKey::SignatureList).await
    }

    pub async fn store_rules(&self, data: &[u8]) -> CacheResult<()> {
        self.store(CacheKey::Rules, data).await
    }

    pub async fn store_signatures(&self, data: &[u8]) -> CacheResult<()> {
        self.store(CacheKey::Signatures, data).await
    }

    pub async fn store_signatures_list(&self, data: &[u8]) -> CacheResult<()> {
        self.store(CacheKey::SignatureList, data).await
    }

    pub async fn need_rules_update(&self) -> bool {
        self.needs_update(CacheKey::Rules).await
    }

    pub async fn need_signatures_update(&self) -> bool {
        self.needs_update(CacheKey::Signatures).await
    }

    pub async fn need_signatures_list_update(&self) -> bool {
        self.needs_update(CacheKey::SignatureList).await
    }
}
