use std::collections::HashSet;

use async_trait::async_trait;

use crate::crl::{errors::CrlResult, store::RevocationStore, types::UvciHash};

/// An in-memory revocation store.
///
/// Useful for testing and development.
#[derive(Debug, Default, Clone)]
pub struct MemoryRevocationStore {
    revoked: HashSet<UvciHash>,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn setup(&mut self) -> CrlResult<()> {
        Ok(())
    }

    async fn store_revoked(&mut self, added: &[UvciHash], removed: &[UvciHash]) -> CrlResult<()> {
        self.revoked.extend(added.iter().cloned());
        for hash in removed {
            self.revoked.remove(hash);
        }
        Ok(())
    }

    async fn is_revoked(&self, hash: &UvciHash) -> CrlResult<bool> {
        Ok(self.revoked.contains(hash))
    }

    async fn clean(&mut self) -> CrlResult<()> {
        self.revoked.clear();
        Ok(())
    }

    async fn teardown(&mut self) -> CrlResult<()> {
        Ok(())
    }

    fn len(&self) -> usize {
        self.revoked.len()
    }
}
