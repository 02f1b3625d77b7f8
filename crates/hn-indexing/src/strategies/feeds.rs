//! Personal and chat feed projections.

use crate::strategy::IndexStrategy;
use async_trait::async_trait;
use hn_storage::{ReadScope as _, SharedStorage, WriteScope as _};
use shared_types::payload::{KIND_NEW_CHAT_FEED, KIND_NEW_PERSONAL_FEED};
use shared_types::{
    DomainError, Feed, FeedParticipant, FeedType, ParticipantRole, TransactionPayload,
    ValidatedTransaction,
};

pub struct PersonalFeedStrategy {
    storage: SharedStorage,
}

impl PersonalFeedStrategy {
    #[must_use]
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl IndexStrategy for PersonalFeedStrategy {
    fn name(&self) -> &'static str {
        "personal-feed"
    }

    fn can_handle(&self, tx: &ValidatedTransaction) -> bool {
        tx.payload_kind() == KIND_NEW_PERSONAL_FEED
    }

    async fn handle(
        &self,
        block_index: u64,
        tx: &ValidatedTransaction,
    ) -> Result<(), DomainError> {
        let TransactionPayload::NewPersonalFeed(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("not a personal feed".to_string()));
        };
        let mut scope = self.storage.begin_write().await?;
        scope.upsert_feed(Feed {
            feed_id: payload.feed_id,
            title: payload.title.clone(),
            feed_type: FeedType::Personal,
            description: String::new(),
            is_public: false,
            created_at_block: block_index,
            current_key_generation: 1,
        });
        scope.upsert_participant(FeedParticipant {
            feed_id: payload.feed_id,
            participant_address: tx.user_signature.signatory,
            role: ParticipantRole::Owner,
            encrypted_feed_key: payload.encrypted_feed_key.clone(),
            key_generation: 1,
        });
        scope.commit().await
    }
}

pub struct ChatFeedStrategy {
    storage: SharedStorage,
}

impl ChatFeedStrategy {
    #[must_use]
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl IndexStrategy for ChatFeedStrategy {
    fn name(&self) -> &'static str {
        "chat-feed"
    }

    fn can_handle(&self, tx: &ValidatedTransaction) -> bool {
        tx.payload_kind() == KIND_NEW_CHAT_FEED
    }

    async fn handle(
        &self,
        block_index: u64,
        tx: &ValidatedTransaction,
    ) -> Result<(), DomainError> {
        let TransactionPayload::NewChatFeed(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("not a chat feed".to_string()));
        };
        let creator = tx.user_signature.signatory;
        let mut scope = self.storage.begin_write().await?;
        scope.upsert_feed(Feed {
            feed_id: payload.feed_id,
            title: String::new(),
            feed_type: FeedType::Chat,
            description: String::new(),
            is_public: false,
            created_at_block: block_index,
            current_key_generation: 1,
        });
        for entry in &payload.participants {
            scope.upsert_participant(FeedParticipant {
                feed_id: payload.feed_id,
                participant_address: entry.address,
                role: if entry.address == creator {
                    ParticipantRole::Owner
                } else {
                    ParticipantRole::Member
                },
                encrypted_feed_key: entry.encrypted_feed_key.clone(),
                key_generation: 1,
            });
        }
        scope.commit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hn_storage::MemoryStorage;
    use shared_types::payload::{
        FeedParticipantEntry, NewChatFeedPayload, NewPersonalFeedPayload,
    };
    use shared_types::{
        Address, FeedId, SignatureBytes, TransactionId, UserSignature, ValidatorSignature,
    };

    fn validated(payload: TransactionPayload, signatory: Address) -> ValidatedTransaction {
        ValidatedTransaction {
            id: TransactionId::generate(),
            timestamp: chrono::Utc::now(),
            payload,
            user_signature: UserSignature {
                signatory,
                signature: SignatureBytes([0; 64]),
            },
            validator_signature: ValidatorSignature {
                validator: Address([1; 32]),
                signature: SignatureBytes([0; 64]),
            },
        }
    }

    #[tokio::test]
    async fn test_personal_feed_created_with_owner() {
        let storage = MemoryStorage::shared();
        let strategy = PersonalFeedStrategy::new(std::sync::Arc::clone(&storage));
        let owner = Address([3; 32]);
        let feed_id = FeedId([1; 16]);
        let tx = validated(
            TransactionPayload::NewPersonalFeed(NewPersonalFeedPayload {
                feed_id,
                title: "notes".into(),
                feed_type: FeedType::Personal,
                encrypted_feed_key: "enc".into(),
            }),
            owner,
        );
        strategy.handle(2, &tx).await.unwrap();

        let read = storage.read().await.unwrap();
        let feed = read.feed(feed_id).await.unwrap().unwrap();
        assert_eq!(feed.feed_type, FeedType::Personal);
        assert_eq!(feed.created_at_block, 2);
        let participants = read.participants(feed_id).await.unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].role, ParticipantRole::Owner);
    }

    #[tokio::test]
    async fn test_chat_feed_has_two_participants() {
        let storage = MemoryStorage::shared();
        let strategy = ChatFeedStrategy::new(std::sync::Arc::clone(&storage));
        let alice = Address([3; 32]);
        let bob = Address([4; 32]);
        let feed_id = FeedId([2; 16]);
        let tx = validated(
            TransactionPayload::NewChatFeed(NewChatFeedPayload {
                feed_id,
                feed_type: FeedType::Chat,
                participants: vec![
                    FeedParticipantEntry {
                        feed_id,
                        address: alice,
                        encrypted_feed_key: "a".into(),
                    },
                    FeedParticipantEntry {
                        feed_id,
                        address: bob,
                        encrypted_feed_key: "b".into(),
                    },
                ],
            }),
            alice,
        );
        strategy.handle(3, &tx).await.unwrap();

        let read = storage.read().await.unwrap();
        let participants = read.participants(feed_id).await.unwrap();
        assert_eq!(participants.len(), 2);
        let creator = read.participant(feed_id, alice).await.unwrap().unwrap();
        assert_eq!(creator.role, ParticipantRole::Owner);
    }
}
