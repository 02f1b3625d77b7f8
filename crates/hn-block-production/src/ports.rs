//! # Scheduler Ports
//!
//! Outbound interfaces the scheduler drives: the mempool snapshot and the
//! block assembler. Both are trait objects so tests can substitute fakes.

use async_trait::async_trait;
use shared_types::{DomainError, ValidatedTransaction};

/// Source of pending transactions (the mempool).
pub trait PendingSource: Send + Sync {
    /// Snapshot up to the configured block capacity, FIFO.
    fn drain_pending(&self) -> Vec<ValidatedTransaction>;
}

impl PendingSource for hn_mempool::Mempool {
    fn drain_pending(&self) -> Vec<ValidatedTransaction> {
        // Inherent method; same name, same semantics.
        hn_mempool::Mempool::drain_pending(self)
    }
}

/// The block assembler (component E).
#[async_trait]
pub trait BlockAssembler: Send + Sync {
    /// Assemble and commit the next block from the given snapshot.
    /// Completion implies the storage commit; `BlockCreated` follows on
    /// the bus.
    async fn assemble(&self, pending: Vec<ValidatedTransaction>) -> Result<(), DomainError>;
}
