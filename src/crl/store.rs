use async_trait::async_trait;

use super::{errors::CrlResult, types::UvciHash};

mod file;
mod memory;

pub use file::FileRevocationStore;
pub use memory::MemoryRevocationStore;

/// Abstract interface for the revoked-identifier set.
///
/// Implementations only ever see hashed identifiers.
#[async_trait]
pub trait RevocationStore: Send + Sync + 'static {
    /// Acquires resources and loads persisted state.
    async fn setup(&mut self) -> CrlResult<()>;

    /// Adds and removes identifiers as a single unit.
    ///
    /// On error the store must be left exactly as it was before the call.
    async fn store_revoked(&mut self, added: &[UvciHash], removed: &[UvciHash]) -> CrlResult<()>;

    /// Checks whether the hashed identifier is revoked.
    async fn is_revoked(&self, hash: &UvciHash) -> CrlResult<bool>;

    /// Removes every identifier.
    async fn clean(&mut self) -> CrlResult<()>;

    /// Releases held resources. The store can be set up again afterwards.
    async fn teardown(&mut self) -> CrlResult<()>;

    /// Number of revoked identifiers currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
