//! # Index Strategies
//!
//! A strategy consumes one validated transaction from a finalized block and
//! mutates its projection inside its own writable scope. Registration is
//! data-driven: the indexer walks the registered list and runs every
//! strategy whose `can_handle` matches, in registration order.

use async_trait::async_trait;
use shared_types::{DomainError, ValidatedTransaction};
use std::sync::Arc;

/// Projection mutator for one family of payload kinds.
#[async_trait]
pub trait IndexStrategy: Send + Sync {
    /// Stable name used in log fields and error records.
    fn name(&self) -> &'static str;

    /// Whether this strategy applies to the transaction.
    fn can_handle(&self, tx: &ValidatedTransaction) -> bool;

    /// Apply the transaction to the projection. Runs in its own writable
    /// scope; an error is recorded as indexed-with-error and never halts
    /// block processing.
    async fn handle(
        &self,
        block_index: u64,
        tx: &ValidatedTransaction,
    ) -> Result<(), DomainError>;
}

/// Ordered strategy list, populated at startup.
#[derive(Default, Clone)]
pub struct StrategyRegistry {
    strategies: Vec<Arc<dyn IndexStrategy>>,
}

impl StrategyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, strategy: Arc<dyn IndexStrategy>) {
        self.strategies.push(strategy);
    }

    /// All strategies matching the transaction, in registration order.
    #[must_use]
    pub fn matching(&self, tx: &ValidatedTransaction) -> Vec<Arc<dyn IndexStrategy>> {
        self.strategies
            .iter()
            .filter(|s| s.can_handle(tx))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
