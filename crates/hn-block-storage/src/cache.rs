//! # Chain-State Cache
//!
//! In-memory copy of the single chain-state row. Writable by the assembler
//! only; everyone else reads. May lag storage by at most the one block
//! currently being committed; a miss falls through to storage.

use parking_lot::RwLock;
use shared_types::BlockchainState;

/// Process-wide chain-state cache.
#[derive(Default)]
pub struct ChainStateCache {
    inner: RwLock<Option<BlockchainState>>,
}

impl ChainStateCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> Option<BlockchainState> {
        self.inner.read().clone()
    }

    pub fn set(&self, state: BlockchainState) {
        *self.inner.write() = Some(state);
    }

    /// Drop the cached copy; next reader falls through to storage.
    pub fn invalidate(&self) {
        *self.inner.write() = None;
    }
}
