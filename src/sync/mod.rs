//! Keeps the cached validation resources and the revocation mirror current.

mod errors;

pub use errors::{SyncError, SyncResult};

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, instrument, warn};

use crate::cache::{CacheBackend, CacheKey};
use crate::crl::{CrlSyncEngine, RevocationStore};
use crate::remote::{CrlSource, CrlUpdate, ResourceSource};

/// Restarts tolerated within a single CRL run before giving up.
const MAX_RESTARTS: usize = 3;

/// What a synchronisation run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub rules_updated: bool,
    pub signature_list_updated: bool,
    pub signatures_updated: bool,
    pub crl: CrlSyncReport,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrlSyncReport {
    pub chunks_applied: usize,
    pub restarts: usize,
}

/// Refreshes stale resources from the gateway and drains the revocation feed.
pub struct Synchronizer<Store: CacheBackend, Revoked: RevocationStore, Remote> {
    engine: Arc<CrlSyncEngine<Store, Revoked>>,
    remote: Remote,
}

impl<Store, Revoked, Remote> Synchronizer<Store, Revoked, Remote>
where
    Store: CacheBackend,
    Revoked: RevocationStore,
    Remote: CrlSource + ResourceSource + 'static,
{
    pub fn new(engine: Arc<CrlSyncEngine<Store, Revoked>>, remote: Remote) -> Self {
        Self { engine, remote }
    }

    pub fn engine(&self) -> &Arc<CrlSyncEngine<Store, Revoked>> {
        &self.engine
    }

    /// Refreshes every stale resource, then brings the revocation mirror up to date.
    #[instrument(skip(self))]
    pub async fn update_all(&self) -> SyncResult<SyncReport> {
        let cache = self.engine.cache();
        let mut report = SyncReport::default();

        if cache.need_rules_update().await {
            let settings = self.remote.fetch_rule_table().await?;
            cache.store_json(CacheKey::Rules, &settings).await?;
            info!("Stored {} rule settings", settings.len());
            report.rules_updated = true;
        } else {
            debug!("Rules are fresh, skipping download");
        }

        if cache.need_signatures_list_update().await {
            let kids = self.remote.fetch_signature_list_index().await?;
            cache.store_json(CacheKey::SignatureList, &kids).await?;
            info!("Stored signature list with {} kids", kids.len());
            report.signature_list_updated = true;
        } else {
            debug!("Signature list is fresh, skipping download");
        }

        if cache.need_signatures_update().await {
            let certificates = self.remote.fetch_trust_list().await?;
            cache.store_json(CacheKey::Signatures, &certificates).await?;
            info!("Stored {} signer certificates", certificates.len());
            report.signatures_updated = true;
        } else {
            debug!("Signer certificates are fresh, skipping download");
        }

        report.crl = self.sync_crl().await?;
        Ok(report)
    }

    /// Applies chunks until the feed reports no update.
    ///
    /// A restart signal, or a chunk whose version differs from the one being
    /// downloaded, rewinds the mirror to cold start. The version being
    /// downloaded is persisted in the cursor, so an interrupted run resumes
    /// only while the feed still serves it.
    #[instrument(skip(self))]
    pub async fn sync_crl(&self) -> SyncResult<CrlSyncReport> {
        let mut report = CrlSyncReport::default();
        let mut target: Option<u64> = None;

        loop {
            let cursor = self.engine.current_cursor().await;
            let expected = cursor.target.or(target);
            let chunk = match self.remote.fetch_next_chunk(cursor).await? {
                CrlUpdate::NoUpdate => break,
                CrlUpdate::Chunk(chunk)
                    if expected.is_none_or(|version| version == chunk.version) =>
                {
                    chunk
                }
                CrlUpdate::Chunk(chunk) => {
                    warn!(
                        "Revocation feed moved to version {} during download",
                        chunk.version
                    );
                    self.restart(&mut report).await?;
                    target = None;
                    continue;
                }
                CrlUpdate::Restart => {
                    self.restart(&mut report).await?;
                    target = None;
                    continue;
                }
            };

            target = (!chunk.is_last()).then_some(chunk.version);
            debug!(
                "Applying chunk {}/{} of version {}",
                chunk.chunk, chunk.last_chunk, chunk.version
            );
            self.engine.apply_delta(chunk.delta).await?;
            report.chunks_applied += 1;
        }

        info!(
            "Revocation mirror at {} with {} identifiers",
            self.engine.current_cursor().await,
            self.engine.revoked_count().await
        );
        Ok(report)
    }

    async fn restart(&self, report: &mut CrlSyncReport) -> SyncResult<()> {
        report.restarts += 1;
        if report.restarts > MAX_RESTARTS {
            return Err(SyncError::TooManyRestarts(report.restarts));
        }
        warn!("Restarting revocation download from cold start");
        self.engine.reset().await?;
        Ok(())
    }

    /// Runs [`update_all`](Self::update_all) every `period` on a background task.
    pub fn start(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        debug!(
            "Starting synchroniser with interval of {} seconds",
            period.as_secs()
        );

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.tick().await; // First tick completes immediately

            loop {
                ticker.tick().await;
                debug!("Running scheduled synchronisation");

                match self.update_all().await {
                    Ok(report) => debug!("Scheduled synchronisation done: {:?}", report),
                    Err(e) => error!("Scheduled synchronisation failed: {}", e),
                }
            }
        })
    }
}
