//! Certificate Revocation List (CRL) synchronisation.
//!
//! Keeps a local mirror of the remote, chunked revocation feed so that
//! certificates can be checked offline.
//!
//! # Features
//! - Progress cursor `{chunk, version}` persisted in the [`Cache`](crate::cache::Cache)
//! - Revoked identifiers stored only as SHA-256 digests
//! - All-or-nothing application of each delta
//! - Full reset for resynchronisation

mod engine;
mod errors;
pub mod store;
mod types;

// Re-export public types
pub use engine::CrlSyncEngine;
pub use errors::{CrlError, CrlResult};
pub use store::{FileRevocationStore, MemoryRevocationStore, RevocationStore};
pub use types::{CrlCursor, CrlDelta, UvciHash};
