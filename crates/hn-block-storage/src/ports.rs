//! # Assembler Ports
//!
//! The assembler's one outbound dependency besides storage: removing
//! committed transactions from the pending pool.

use shared_types::TransactionId;

/// Sink for committed transaction ids.
pub trait PendingRemover: Send + Sync {
    fn remove_committed(&self, ids: &[TransactionId]);
}

impl PendingRemover for hn_mempool::Mempool {
    fn remove_committed(&self, ids: &[TransactionId]) {
        self.remove(ids);
    }
}
