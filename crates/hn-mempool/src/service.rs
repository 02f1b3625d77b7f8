//! # Mempool Service
//!
//! Accepts signed transactions, dispatches them to the content handler for
//! their payload kind, and queues the resulting validated transactions for
//! block inclusion. Emits `TransactionReceived` on every acceptance.

use crate::handlers::HandlerRegistry;
use crate::pool::{MempoolConfig, PendingPool, PoolError};
use parking_lot::Mutex;
use shared_bus::{EventPublisher, InMemoryEventBus, NodeEvent};
use shared_types::{DomainError, SignedTransaction, TransactionId, ValidatedTransaction};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub tx_id: TransactionId,
    /// True when the transaction was already queued (idempotent resubmit).
    pub duplicate: bool,
}

/// The mempool: validation front door and FIFO queue.
pub struct Mempool {
    config: MempoolConfig,
    pool: Mutex<PendingPool>,
    registry: HandlerRegistry,
    bus: Arc<InMemoryEventBus>,
    shutdown: watch::Receiver<bool>,
}

impl Mempool {
    #[must_use]
    pub fn new(
        config: MempoolConfig,
        registry: HandlerRegistry,
        bus: Arc<InMemoryEventBus>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        info!(
            handlers = registry.len(),
            max_block_size = config.max_block_size,
            "Mempool initialized"
        );
        Self {
            config,
            pool: Mutex::new(PendingPool::new()),
            registry,
            bus,
            shutdown,
        }
    }

    /// Validate, co-sign, and queue a signed transaction.
    ///
    /// Rejections are returned to the submitter and are not retried.
    pub async fn submit(&self, tx: SignedTransaction) -> Result<SubmitReceipt, DomainError> {
        if *self.shutdown.borrow() {
            return Err(DomainError::Cancelled);
        }
        let tx_id = tx.id;
        let kind = tx.payload_kind();

        // Idempotence: a queued transaction is already accepted.
        if self.pool.lock().contains(&tx_id) {
            debug!(%tx_id, "Duplicate submission ignored");
            return Ok(SubmitReceipt {
                tx_id,
                duplicate: true,
            });
        }

        let handler = self
            .registry
            .lookup(kind)
            .ok_or(DomainError::UnknownPayloadKind(kind))?;
        let validated = handler.validate_and_cosign(tx).await?;

        match self
            .pool
            .lock()
            .add(validated, self.config.max_pool_size)
        {
            Ok(()) => {}
            Err(PoolError::Duplicate(_)) => {
                // Raced with an identical submission; still idempotent.
                return Ok(SubmitReceipt {
                    tx_id,
                    duplicate: true,
                });
            }
            Err(PoolError::Full { capacity }) => {
                warn!(%tx_id, capacity, "Mempool full, rejecting");
                return Err(DomainError::StorageConflict(format!(
                    "mempool at capacity ({capacity})"
                )));
            }
        }

        debug!(%tx_id, %kind, "Transaction accepted");
        self.bus
            .publish(NodeEvent::TransactionReceived {
                tx_id,
                payload_kind: kind,
            })
            .await;
        Ok(SubmitReceipt {
            tx_id,
            duplicate: false,
        })
    }

    /// Snapshot up to `max_block_size` pending transactions in FIFO order.
    /// Entries remain in the pool until [`Mempool::remove`].
    #[must_use]
    pub fn drain_pending(&self) -> Vec<ValidatedTransaction> {
        self.pool.lock().snapshot(self.config.max_block_size)
    }

    /// Remove transactions included in a committed block.
    pub fn remove(&self, committed_ids: &[TransactionId]) {
        self.pool.lock().remove(committed_ids);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.lock().is_empty()
    }
}
