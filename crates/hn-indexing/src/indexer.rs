//! # Transaction Indexer
//!
//! Consumes `BlockCreated`, walks the block's transactions in order, and
//! dispatches each to every matching strategy, awaiting completion before
//! moving on so downstream projections observe block order. After the last
//! transaction it publishes `BlockIndexingCompleted`.
//!
//! A strategy failure is logged with `(block_index, tx_id, kind)` and the
//! transaction is recorded as indexed-with-error so it is never retried.

use crate::strategy::StrategyRegistry;
use async_trait::async_trait;
use hn_storage::{IndexingErrorRecord, ReadScope as _, SharedStorage, WriteScope as _};
use shared_bus::{
    EventFilter, EventPublisher, EventSubscriber, EventTopic, InMemoryEventBus, NodeEvent,
};
use shared_types::{Block, DomainError, ValidatedTransaction};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Component F: the transaction indexer.
pub struct TransactionIndexer {
    storage: SharedStorage,
    registry: StrategyRegistry,
    bus: Arc<InMemoryEventBus>,
}

impl TransactionIndexer {
    #[must_use]
    pub fn new(
        storage: SharedStorage,
        registry: StrategyRegistry,
        bus: Arc<InMemoryEventBus>,
    ) -> Self {
        info!(strategies = registry.len(), "Transaction indexer initialized");
        Self {
            storage,
            registry,
            bus,
        }
    }

    /// Index one block: every transaction, in block order.
    pub async fn index_block(&self, block: &Block) -> Result<(), DomainError> {
        for tx in &block.transactions {
            self.index_transaction(block.block_index, tx).await?;
        }
        debug!(block_index = block.block_index, "Block indexing completed");
        self.bus
            .publish(NodeEvent::BlockIndexingCompleted {
                block_index: block.block_index,
            })
            .await;
        Ok(())
    }

    async fn index_transaction(
        &self,
        block_index: u64,
        tx: &ValidatedTransaction,
    ) -> Result<(), DomainError> {
        // Never retry a transaction already recorded as failed.
        {
            let read = self.storage.read().await?;
            if read.indexing_error(tx.id).await?.is_some() {
                debug!(tx_id = %tx.id, "Skipping transaction indexed-with-error");
                return Ok(());
            }
        }

        for strategy in self.registry.matching(tx) {
            if let Err(e) = strategy.handle(block_index, tx).await {
                let kind = e.kind_name();
                warn!(
                    block_index,
                    tx_id = %tx.id,
                    strategy = strategy.name(),
                    kind,
                    error = %e,
                    "Indexing strategy failed"
                );
                self.record_failure(block_index, tx, kind).await?;
                self.bus
                    .publish(NodeEvent::TransactionIndexingFailed {
                        block_index,
                        tx_id: tx.id,
                        kind,
                    })
                    .await;
                // Remaining strategies are skipped for this transaction.
                break;
            }
        }
        Ok(())
    }

    async fn record_failure(
        &self,
        block_index: u64,
        tx: &ValidatedTransaction,
        kind: &str,
    ) -> Result<(), DomainError> {
        let mut scope = self.storage.begin_write().await?;
        scope.record_indexing_error(IndexingErrorRecord {
            tx_id: tx.id,
            block_index,
            kind: kind.to_string(),
        });
        scope.commit().await
    }
}

/// Bus adapter: one block at a time, in publication (block-index) order.
pub struct IndexerSubscriber {
    indexer: Arc<TransactionIndexer>,
}

impl IndexerSubscriber {
    #[must_use]
    pub fn new(indexer: Arc<TransactionIndexer>) -> Self {
        Self { indexer }
    }
}

#[async_trait]
impl EventSubscriber for IndexerSubscriber {
    fn name(&self) -> &'static str {
        "transaction-indexer"
    }

    fn filter(&self) -> EventFilter {
        EventFilter::topics(vec![EventTopic::BlockStorage])
    }

    async fn handle(&self, event: NodeEvent) -> Result<(), DomainError> {
        if let NodeEvent::BlockCreated { block } = event {
            self.indexer.index_block(&block).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::IndexStrategy;
    use hn_storage::MemoryStorage;
    use shared_bus::EventFilter;
    use shared_types::payload::{RewardPayload, KIND_REWARD};
    use shared_types::{
        Address, BlockId, Bytes32, SignatureBytes, Token, TransactionId, TransactionPayload,
        UserSignature, ValidatorSignature,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn reward_tx(tag: u8) -> ValidatedTransaction {
        ValidatedTransaction {
            id: TransactionId([tag; 16]),
            timestamp: chrono::Utc::now(),
            payload: TransactionPayload::Reward(RewardPayload {
                token: Token::native(),
                precision: 9,
                amount: "1.000000000".parse().unwrap(),
                to: Address([tag; 32]),
            }),
            user_signature: UserSignature {
                signatory: Address([tag; 32]),
                signature: SignatureBytes([0; 64]),
            },
            validator_signature: ValidatorSignature {
                validator: Address([1; 32]),
                signature: SignatureBytes([0; 64]),
            },
        }
    }

    fn block_with(transactions: Vec<ValidatedTransaction>) -> Block {
        Block {
            block_id: BlockId::generate(),
            block_index: 7,
            previous_block_id: BlockId::generate(),
            next_block_id: BlockId::generate(),
            timestamp: chrono::Utc::now(),
            transactions,
            hash: Bytes32::ZERO,
        }
    }

    struct CountingStrategy {
        count: AtomicUsize,
        fail_on: Option<TransactionId>,
    }

    #[async_trait]
    impl IndexStrategy for Arc<CountingStrategy> {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn can_handle(&self, tx: &ValidatedTransaction) -> bool {
            tx.payload_kind() == KIND_REWARD
        }

        async fn handle(
            &self,
            _block_index: u64,
            tx: &ValidatedTransaction,
        ) -> Result<(), DomainError> {
            if self.fail_on == Some(tx.id) {
                return Err(DomainError::StorageConflict("induced".to_string()));
            }
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn indexer_with(
        strategy: Arc<CountingStrategy>,
    ) -> (TransactionIndexer, SharedStorage, Arc<InMemoryEventBus>) {
        let storage: SharedStorage = MemoryStorage::shared();
        let bus = Arc::new(InMemoryEventBus::new());
        let mut registry = StrategyRegistry::new();
        registry.register(Arc::new(strategy));
        (
            TransactionIndexer::new(Arc::clone(&storage), registry, Arc::clone(&bus)),
            storage,
            bus,
        )
    }

    #[tokio::test]
    async fn test_all_transactions_dispatched_and_completion_emitted() {
        let strategy = Arc::new(CountingStrategy {
            count: AtomicUsize::new(0),
            fail_on: None,
        });
        let (indexer, _storage, bus) = indexer_with(Arc::clone(&strategy));
        let mut sub = bus.subscribe(EventFilter::all());

        let block = block_with(vec![reward_tx(1), reward_tx(2), reward_tx(3)]);
        indexer.index_block(&block).await.unwrap();

        assert_eq!(strategy.count.load(Ordering::SeqCst), 3);
        let event = sub.recv().await.unwrap();
        assert!(matches!(
            event,
            NodeEvent::BlockIndexingCompleted { block_index: 7 }
        ));
    }

    #[tokio::test]
    async fn test_failure_recorded_and_block_continues() {
        let strategy = Arc::new(CountingStrategy {
            count: AtomicUsize::new(0),
            fail_on: Some(TransactionId([2; 16])),
        });
        let (indexer, storage, bus) = indexer_with(Arc::clone(&strategy));
        let mut sub = bus.subscribe(EventFilter::all());

        let block = block_with(vec![reward_tx(1), reward_tx(2), reward_tx(3)]);
        indexer.index_block(&block).await.unwrap();

        // Tx 1 and 3 indexed; 2 recorded as failed.
        assert_eq!(strategy.count.load(Ordering::SeqCst), 2);
        let read = storage.read().await.unwrap();
        let record = read
            .indexing_error(TransactionId([2; 16]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.block_index, 7);

        assert!(matches!(
            sub.recv().await.unwrap(),
            NodeEvent::TransactionIndexingFailed { .. }
        ));
        assert!(matches!(
            sub.recv().await.unwrap(),
            NodeEvent::BlockIndexingCompleted { .. }
        ));
    }

    #[tokio::test]
    async fn test_failed_transaction_not_retried() {
        let strategy = Arc::new(CountingStrategy {
            count: AtomicUsize::new(0),
            fail_on: Some(TransactionId([2; 16])),
        });
        let (indexer, _storage, _bus) = indexer_with(Arc::clone(&strategy));

        let block = block_with(vec![reward_tx(2)]);
        indexer.index_block(&block).await.unwrap();
        // Re-indexing the same block skips the recorded failure.
        indexer.index_block(&block).await.unwrap();
        assert_eq!(strategy.count.load(Ordering::SeqCst), 0);
    }
}
