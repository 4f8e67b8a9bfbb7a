mod client;
mod errors;

pub use client::DgcClient;
pub use errors::{RemoteError, RemoteResult};

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::crl::{CrlCursor, CrlDelta};
use crate::rules::RuleSetting;

/// One chunk of the revocation feed, ready to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrlChunk {
    /// Feed version the chunk belongs to.
    pub version: u64,
    pub chunk: u64,
    pub last_chunk: u64,
    /// Delta carrying the cursor to persist once applied.
    pub delta: CrlDelta,
}

impl CrlChunk {
    pub fn is_last(&self) -> bool {
        self.chunk >= self.last_chunk
    }
}

/// What the feed has to offer for a given cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrlUpdate {
    /// Local mirror is current.
    NoUpdate,
    Chunk(CrlChunk),
    /// Partial progress no longer matches the feed; start over from cold.
    Restart,
}

/// Remote revocation feed.
#[async_trait]
pub trait CrlSource: Send + Sync {
    async fn fetch_next_chunk(&self, cursor: CrlCursor) -> RemoteResult<CrlUpdate>;
}

/// Remote validation resources cached locally.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    /// Validity offsets as a settings list.
    async fn fetch_rule_table(&self) -> RemoteResult<Vec<RuleSetting>>;

    /// Kids of the signer certificates currently considered valid.
    async fn fetch_signature_list_index(&self) -> RemoteResult<Vec<String>>;

    /// Signer certificates as `kid -> base64(DER)`.
    async fn fetch_trust_list(&self) -> RemoteResult<BTreeMap<String, String>>;
}
