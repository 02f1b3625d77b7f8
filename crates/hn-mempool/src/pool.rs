//! # Pending Pool
//!
//! FIFO queue of validated transactions awaiting block inclusion.
//!
//! ## Invariants
//!
//! - No duplicate transaction ids (checked in `add()`).
//! - `snapshot()` returns transactions in acceptance order.
//! - Entries leave the pool only through `remove()`, after a block commits.

use shared_types::{TransactionId, ValidatedTransaction};
use std::collections::{HashMap, VecDeque};

/// Pool configuration.
#[derive(Debug, Clone)]
pub struct MempoolConfig {
    /// Maximum transactions returned by one drain (block capacity).
    pub max_block_size: usize,
    /// Maximum transactions held before rejecting submissions.
    pub max_pool_size: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_block_size: 100,
            max_pool_size: 10_000,
        }
    }
}

/// Error adding to the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Transaction already present (idempotent at the service layer).
    Duplicate(TransactionId),
    /// Pool at capacity.
    Full { capacity: usize },
}

/// FIFO pool of validated transactions.
#[derive(Debug, Default)]
pub struct PendingPool {
    by_id: HashMap<TransactionId, ValidatedTransaction>,
    fifo: VecDeque<TransactionId>,
}

impl PendingPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn contains(&self, id: &TransactionId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Append a transaction in acceptance order.
    pub fn add(
        &mut self,
        tx: ValidatedTransaction,
        max_pool_size: usize,
    ) -> Result<(), PoolError> {
        if self.by_id.contains_key(&tx.id) {
            return Err(PoolError::Duplicate(tx.id));
        }
        if self.by_id.len() >= max_pool_size {
            return Err(PoolError::Full {
                capacity: max_pool_size,
            });
        }
        self.fifo.push_back(tx.id);
        self.by_id.insert(tx.id, tx);
        Ok(())
    }

    /// Snapshot up to `max` transactions in FIFO order. Entries remain
    /// owned by the pool until `remove()`.
    #[must_use]
    pub fn snapshot(&self, max: usize) -> Vec<ValidatedTransaction> {
        self.fifo
            .iter()
            .take(max)
            .filter_map(|id| self.by_id.get(id))
            .cloned()
            .collect()
    }

    /// Remove committed transactions.
    pub fn remove(&mut self, ids: &[TransactionId]) {
        for id in ids {
            if self.by_id.remove(id).is_some() {
                self.fifo.retain(|queued| queued != id);
            }
        }
    }
}
