use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::cache::{Cache, CacheBackend};

use super::errors::CrlResult;
use super::store::RevocationStore;
use super::types::{CrlCursor, CrlDelta, UvciHash};

/// State guarded together so readers never see a cursor that disagrees with the set.
#[derive(Debug)]
struct CrlState<Revoked> {
    cursor: CrlCursor,
    revoked: Revoked,
}

/// Local mirror of the revocation feed.
///
/// Reads (`is_revoked`, `current_cursor`) run concurrently. Mutations
/// (`apply_delta`, `reset`) are serialised and hold the write lock for their
/// whole duration, so a reader observes either the state before a delta or
/// the state after it.
pub struct CrlSyncEngine<Store: CacheBackend, Revoked: RevocationStore> {
    cache: Cache<Store>,
    state: RwLock<CrlState<Revoked>>,
    /// Mutex to prevent concurrent updates
    update_mutex: Mutex<()>,
}

impl<Store: CacheBackend, Revoked: RevocationStore> CrlSyncEngine<Store, Revoked> {
    /// Creates an engine. Call [`initialize`](Self::initialize) before use.
    pub fn new(cache: Cache<Store>, revoked: Revoked) -> Self {
        Self {
            cache,
            state: RwLock::new(CrlState {
                cursor: CrlCursor::default(),
                revoked,
            }),
            update_mutex: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &Cache<Store> {
        &self.cache
    }

    /// Loads or cold-initialises the cursor and prepares the revoked set.
    pub async fn initialize(&self) -> CrlResult<()> {
        let _lock = self.update_mutex.lock().await;

        self.cache.initialize().await?;
        let cursor = self.cache.crl_status().await?;

        let mut state = self.state.write().await;
        state.revoked.setup().await?;
        state.cursor = cursor;

        info!(
            "CRL engine ready at {} with {} revoked identifiers",
            cursor,
            state.revoked.len()
        );
        Ok(())
    }

    /// Applies one delta from the feed and advances the cursor.
    ///
    /// The set mutation is persisted before the cursor. When any step fails
    /// the cursor is left where it was; replaying the same delta is harmless.
    #[instrument(skip(self, delta), fields(added = delta.added.len(), removed = delta.removed.len(), cursor = %delta.cursor))]
    pub async fn apply_delta(&self, delta: CrlDelta) -> CrlResult<()> {
        let _lock = self.update_mutex.lock().await;
        let mut state = self.state.write().await;

        if delta.cursor.version < state.cursor.version {
            warn!(
                "Cursor moves backwards from {} to {}",
                state.cursor, delta.cursor
            );
        }

        state
            .revoked
            .store_revoked(&delta.added, &delta.removed)
            .await?;
        self.cache.store_crl_status(delta.cursor).await?;
        state.cursor = delta.cursor;

        debug!(
            "Applied CRL delta, {} identifiers revoked",
            state.revoked.len()
        );
        Ok(())
    }

    /// Checks a raw UVCI against the revoked set.
    pub async fn is_revoked(&self, uvci: &str) -> CrlResult<bool> {
        self.is_hash_revoked(&UvciHash::from_uvci(uvci)).await
    }

    pub async fn is_hash_revoked(&self, hash: &UvciHash) -> CrlResult<bool> {
        let state = self.state.read().await;
        let revoked = state.revoked.is_revoked(hash).await?;
        if revoked {
            info!("UVCI with hash {} is revoked", hash);
        }
        Ok(revoked)
    }

    pub async fn current_cursor(&self) -> CrlCursor {
        self.state.read().await.cursor
    }

    pub async fn revoked_count(&self) -> usize {
        self.state.read().await.revoked.len()
    }

    /// Clears the revoked set and rewinds the cursor to cold start.
    pub async fn reset(&self) -> CrlResult<()> {
        let _lock = self.update_mutex.lock().await;
        let mut state = self.state.write().await;

        // Rewind first so a failed clean can only leave stale entries behind
        self.cache.store_crl_status(CrlCursor::default()).await?;
        state.cursor = CrlCursor::default();
        state.revoked.clean().await?;

        info!("CRL state reset to {}", state.cursor);
        Ok(())
    }

    /// Releases the resources held by the revocation store.
    pub async fn teardown(&self) -> CrlResult<()> {
        let _lock = self.update_mutex.lock().await;
        self.state.write().await.revoked.teardown().await
    }
}
