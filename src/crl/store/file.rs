use std::{
    collections::HashSet,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{
    fs::{self, File, OpenOptions},
    io::AsyncWriteExt,
};
use tracing::{debug, info, warn};

use crate::crl::{
    errors::{CrlError, CrlResult},
    store::RevocationStore,
    types::UvciHash,
};

/// File name of the log inside the cache folder.
pub const REVOKED_LOG_FILE: &str = "revoked_uvci.log";

/// Number of log records after which the log is rewritten as a single snapshot.
const COMPACTION_THRESHOLD: usize = 256;

/// One line of the revocation log.
#[derive(Debug, Serialize, Deserialize)]
struct LogRecord {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    added: Vec<UvciHash>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    removed: Vec<UvciHash>,
}

/// A revocation store persisted as an append-only delta log.
///
/// Each applied delta is one JSON line. The in-memory set is rebuilt from the
/// log on setup; a truncated trailing line left by an interrupted write is
/// dropped, any other unreadable line makes the log corrupt. A failed append
/// is cut off before the next one, and the log is compacted once it holds
/// more than [`COMPACTION_THRESHOLD`] records.
#[derive(Debug)]
pub struct FileRevocationStore {
    path: PathBuf,
    revoked: HashSet<UvciHash>,
    log: Option<File>,
    /// Length of the log up to its last complete record.
    committed_len: u64,
    /// Records in the log since the last compaction.
    records: usize,
}

impl FileRevocationStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            revoked: HashSet::new(),
            log: None,
            committed_len: 0,
            records: 0,
        }
    }

    /// Store kept next to the other cached artifacts.
    pub fn in_folder<P: AsRef<Path>>(folder: P) -> Self {
        Self::new(folder.as_ref().join(REVOKED_LOG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn replay(&mut self) -> CrlResult<usize> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.revoked.clear();
                self.committed_len = 0;
                self.records = 0;
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        let mut revoked = HashSet::new();
        let mut records = 0;
        let mut valid_len = 0;
        let lines: Vec<&str> = content.split_inclusive('\n').collect();

        for (index, line) in lines.iter().enumerate() {
            let is_last = index + 1 == lines.len();
            if !line.ends_with('\n') && is_last {
                warn!("Dropping truncated record at the end of {:?}", self.path);
                break;
            }
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                let record: LogRecord = serde_json::from_str(trimmed).map_err(|e| {
                    CrlError::Corrupt(format!("line {} of {:?}: {e}", index + 1, self.path))
                })?;
                revoked.extend(record.added);
                for hash in &record.removed {
                    revoked.remove(hash);
                }
                records += 1;
            }
            valid_len += line.len();
        }

        if valid_len < content.len() {
            let file = OpenOptions::new().write(true).open(&self.path).await?;
            file.set_len(valid_len as u64).await?;
            file.sync_all().await?;
        }

        self.revoked = revoked;
        self.committed_len = valid_len as u64;
        self.records = records;
        Ok(records)
    }

    /// Rewrites the log as a single snapshot record.
    pub async fn compact(&mut self) -> CrlResult<()> {
        let mut added: Vec<UvciHash> = self.revoked.iter().cloned().collect();
        added.sort();
        let mut content = Vec::new();
        if !added.is_empty() {
            content = serde_json::to_vec(&LogRecord {
                added,
                removed: Vec::new(),
            })?;
            content.push(b'\n');
        }

        self.replace_log(&content).await?;
        self.records = usize::from(!content.is_empty());

        info!(
            "Compacted revocation log to {} identifiers",
            self.revoked.len()
        );
        Ok(())
    }

    /// Swaps the log for a new file holding `content`.
    ///
    /// The current handle is kept until the new file is in place, so a
    /// failure leaves the store writable.
    async fn replace_log(&mut self, content: &[u8]) -> CrlResult<()> {
        let temp_path = self.path.with_extension("tmp");
        match fs::remove_file(&temp_path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }

        let mut file = open_log(&temp_path).await?;
        file.write_all(content).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &self.path).await?;

        self.log = Some(file);
        self.committed_len = content.len() as u64;
        Ok(())
    }
}

async fn open_log(path: &Path) -> CrlResult<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    Ok(OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?)
}

#[async_trait]
impl RevocationStore for FileRevocationStore {
    async fn setup(&mut self) -> CrlResult<()> {
        let records = self.replay().await?;
        self.log = Some(open_log(&self.path).await?);
        info!(
            "Loaded {} revoked identifiers from {} log records",
            self.revoked.len(),
            records
        );

        if records > COMPACTION_THRESHOLD {
            self.compact().await?;
        }
        Ok(())
    }

    async fn store_revoked(&mut self, added: &[UvciHash], removed: &[UvciHash]) -> CrlResult<()> {
        if added.is_empty() && removed.is_empty() {
            return Ok(());
        }

        let committed_len = self.committed_len;
        let log = self.log.as_mut().ok_or(CrlError::NotInitialized)?;
        let mut line = serde_json::to_vec(&LogRecord {
            added: added.to_vec(),
            removed: removed.to_vec(),
        })?;
        line.push(b'\n');

        // Drop whatever a failed append left behind
        if log.metadata().await?.len() != committed_len {
            warn!("Discarding incomplete record at the end of {:?}", self.path);
            log.set_len(committed_len).await?;
        }

        // Durable before visible
        let written = match log.write_all(&line).await {
            Ok(()) => log.sync_data().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(rollback) = log.set_len(committed_len).await {
                warn!("Could not roll back partial record: {}", rollback);
            }
            return Err(e.into());
        }

        self.committed_len += line.len() as u64;
        self.records += 1;
        self.revoked.extend(added.iter().cloned());
        for hash in removed {
            self.revoked.remove(hash);
        }
        debug!(
            "Logged {} insertions and {} deletions",
            added.len(),
            removed.len()
        );

        // The delta is already durable; a failed compaction only delays the next one
        if self.records > COMPACTION_THRESHOLD {
            if let Err(e) = self.compact().await {
                warn!("Compaction of {:?} failed: {}", self.path, e);
            }
        }
        Ok(())
    }

    async fn is_revoked(&self, hash: &UvciHash) -> CrlResult<bool> {
        Ok(self.revoked.contains(hash))
    }

    async fn clean(&mut self) -> CrlResult<()> {
        self.replace_log(&[]).await?;
        self.records = 0;
        self.revoked.clear();
        info!("Revocation log cleared");
        Ok(())
    }

    async fn teardown(&mut self) -> CrlResult<()> {
        if let Some(log) = self.log.take() {
            log.sync_all().await?;
        }
        debug!("Revocation log closed");
        Ok(())
    }

    fn len(&self) -> usize {
        self.revoked.len()
    }
}
