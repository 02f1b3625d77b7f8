//! Feed message projection.

use crate::strategy::IndexStrategy;
use async_trait::async_trait;
use hn_storage::{ReadScope as _, SharedStorage, WriteScope as _};
use shared_bus::{EventPublisher, InMemoryEventBus, NodeEvent};
use shared_types::payload::{KIND_NEW_FEED_MESSAGE, KIND_NEW_GROUP_FEED_MESSAGE};
use shared_types::{DomainError, FeedMessage, TransactionPayload, ValidatedTransaction};
use std::sync::Arc;

/// Writes message rows for both plain and group feed messages and emits
/// `FeedMessageIndexed`.
pub struct FeedMessageStrategy {
    storage: SharedStorage,
    bus: Arc<InMemoryEventBus>,
}

impl FeedMessageStrategy {
    #[must_use]
    pub fn new(storage: SharedStorage, bus: Arc<InMemoryEventBus>) -> Self {
        Self { storage, bus }
    }
}

#[async_trait]
impl IndexStrategy for FeedMessageStrategy {
    fn name(&self) -> &'static str {
        "feed-message"
    }

    fn can_handle(&self, tx: &ValidatedTransaction) -> bool {
        matches!(
            tx.payload_kind(),
            k if k == KIND_NEW_FEED_MESSAGE || k == KIND_NEW_GROUP_FEED_MESSAGE
        )
    }

    async fn handle(
        &self,
        block_index: u64,
        tx: &ValidatedTransaction,
    ) -> Result<(), DomainError> {
        let message = match &tx.payload {
            TransactionPayload::NewFeedMessage(p) => FeedMessage {
                message_id: p.message_id,
                feed_id: p.feed_id,
                encrypted_content: p.content.clone(),
                author_address: tx.user_signature.signatory,
                timestamp: tx.timestamp,
                block_index,
                reply_to: p.reply_to,
                key_generation: p.key_generation,
                author_commitment: p.author_commitment,
            },
            TransactionPayload::NewGroupFeedMessage(p) => FeedMessage {
                message_id: p.message_id,
                feed_id: p.feed_id,
                encrypted_content: p.content.clone(),
                author_address: tx.user_signature.signatory,
                timestamp: tx.timestamp,
                block_index,
                reply_to: p.reply_to,
                key_generation: Some(p.key_generation),
                author_commitment: Some(p.author_commitment),
            },
            _ => {
                return Err(DomainError::MalformedPayload(
                    "message strategy received non-message payload".to_string(),
                ))
            }
        };
        let feed_id = message.feed_id;
        let message_id = message.message_id;

        let mut scope = self.storage.begin_write().await?;
        scope.insert_message(message);
        scope.commit().await?;

        self.bus
            .publish(NodeEvent::FeedMessageIndexed {
                feed_id,
                message_id,
            })
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hn_storage::MemoryStorage;
    use shared_types::payload::NewGroupFeedMessagePayload;
    use shared_types::{
        Address, Bytes32, FeedId, FeedMessageId, SignatureBytes, TransactionId, UserSignature,
        ValidatorSignature,
    };

    #[tokio::test]
    async fn test_group_message_row_written() {
        let storage = MemoryStorage::shared();
        let bus = Arc::new(InMemoryEventBus::new());
        let strategy = FeedMessageStrategy::new(Arc::clone(&storage), Arc::clone(&bus));
        let mut sub = bus.subscribe(shared_bus::EventFilter::all());

        let author = Address([3; 32]);
        let feed_id = FeedId([1; 16]);
        let message_id = FeedMessageId::generate();
        let tx = ValidatedTransaction {
            id: TransactionId::generate(),
            timestamp: chrono::Utc::now(),
            payload: TransactionPayload::NewGroupFeedMessage(NewGroupFeedMessagePayload {
                message_id,
                feed_id,
                content: "ciphertext".into(),
                reply_to: None,
                key_generation: 2,
                author_commitment: Bytes32([7; 32]),
            }),
            user_signature: UserSignature {
                signatory: author,
                signature: SignatureBytes([0; 64]),
            },
            validator_signature: ValidatorSignature {
                validator: Address([1; 32]),
                signature: SignatureBytes([0; 64]),
            },
        };
        strategy.handle(9, &tx).await.unwrap();

        let read = storage.read().await.unwrap();
        let message = read.message(message_id).await.unwrap().unwrap();
        assert_eq!(message.block_index, 9);
        assert_eq!(message.key_generation, Some(2));
        assert_eq!(message.author_commitment, Some(Bytes32([7; 32])));

        assert!(matches!(
            sub.recv().await.unwrap(),
            NodeEvent::FeedMessageIndexed { .. }
        ));
    }
}
