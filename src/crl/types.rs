use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Progress marker into the remote revocation feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrlCursor {
    /// Next chunk to request, starting at 1.
    pub chunk: u64,
    /// Feed version fully applied so far.
    pub version: u64,
    /// Feed version being downloaded while chunks of it remain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u64>,
}

impl CrlCursor {
    pub fn new(chunk: u64, version: u64) -> Self {
        Self {
            chunk,
            version,
            target: None,
        }
    }

    /// Cursor in the middle of a download towards `target`.
    pub fn downloading(chunk: u64, version: u64, target: u64) -> Self {
        Self {
            chunk,
            version,
            target: Some(target),
        }
    }

    /// Whether some chunks of a version were applied but not all of them.
    pub fn is_in_progress(&self) -> bool {
        self.chunk > 1
    }

    pub fn is_cold_start(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for CrlCursor {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl fmt::Display for CrlCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            Some(target) => write!(
                f,
                "{{chunk: {}, version: {}, target: {}}}",
                self.chunk, self.version, target
            ),
            None => write!(f, "{{chunk: {}, version: {}}}", self.chunk, self.version),
        }
    }
}

/// SHA-256 digest of a UVCI, base64 encoded.
///
/// Raw identifiers never reach storage; only this form is persisted and compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UvciHash(String);

impl UvciHash {
    /// Hashes a raw UVCI.
    pub fn from_uvci(uvci: &str) -> Self {
        let digest = Sha256::digest(uvci.as_bytes());
        Self(STANDARD.encode(digest))
    }

    /// Wraps an already hashed identifier, as delivered by the revocation feed.
    pub fn from_encoded<T: Into<String>>(encoded: T) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UvciHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One unit of change from the revocation feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrlDelta {
    pub added: Vec<UvciHash>,
    pub removed: Vec<UvciHash>,
    /// Cursor to persist once the delta is applied.
    pub cursor: CrlCursor,
}

impl CrlDelta {
    pub fn new(added: Vec<UvciHash>, removed: Vec<UvciHash>, cursor: CrlCursor) -> Self {
        Self {
            added,
            removed,
            cursor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
