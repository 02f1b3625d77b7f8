//! Reward projection: credit the recipient's balance.

use crate::strategy::IndexStrategy;
use async_trait::async_trait;
use hn_storage::{ReadScope as _, SharedStorage, WriteScope as _};
use shared_types::payload::KIND_REWARD;
use shared_types::{DomainError, TransactionPayload, ValidatedTransaction};

pub struct RewardStrategy {
    storage: SharedStorage,
}

impl RewardStrategy {
    #[must_use]
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl IndexStrategy for RewardStrategy {
    fn name(&self) -> &'static str {
        "reward"
    }

    fn can_handle(&self, tx: &ValidatedTransaction) -> bool {
        tx.payload_kind() == KIND_REWARD
    }

    async fn handle(
        &self,
        _block_index: u64,
        tx: &ValidatedTransaction,
    ) -> Result<(), DomainError> {
        let TransactionPayload::Reward(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("not a reward".to_string()));
        };
        let read = self.storage.read().await?;
        let balance = read.balance(payload.to, payload.token.clone()).await?;
        let updated = balance.credited(payload.amount).ok_or_else(|| {
            DomainError::StorageConflict("balance overflow".to_string())
        })?;

        let mut scope = self.storage.begin_write().await?;
        scope.upsert_balance(updated);
        scope.commit().await
    }
}
