//! Profile projection.

use crate::strategy::IndexStrategy;
use async_trait::async_trait;
use hn_storage::{ReadScope as _, SharedStorage, WriteScope as _};
use shared_types::payload::KIND_REGISTER_PROFILE;
use shared_types::{DomainError, Profile, TransactionPayload, ValidatedTransaction};

pub struct ProfileStrategy {
    storage: SharedStorage,
}

impl ProfileStrategy {
    #[must_use]
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl IndexStrategy for ProfileStrategy {
    fn name(&self) -> &'static str {
        "profile"
    }

    fn can_handle(&self, tx: &ValidatedTransaction) -> bool {
        tx.payload_kind() == KIND_REGISTER_PROFILE
    }

    async fn handle(
        &self,
        block_index: u64,
        tx: &ValidatedTransaction,
    ) -> Result<(), DomainError> {
        let TransactionPayload::RegisterProfile(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("not a profile".to_string()));
        };
        let mut scope = self.storage.begin_write().await?;
        scope.upsert_profile(Profile {
            address: payload.address,
            display_name: payload.display_name.clone(),
            public_key: payload.public_key,
            registered_at_block: block_index,
        });
        scope.commit().await
    }
}
