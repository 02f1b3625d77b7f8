//! Group feed lifecycle projections.
//!
//! One strategy covers the whole family: create, join, add, leave, ban,
//! unban, block, unblock, promote, key rotation, title, description,
//! delete. Every operation runs in its own writable scope.

use crate::strategy::IndexStrategy;
use async_trait::async_trait;
use hn_storage::{ReadScope as _, SharedStorage, WriteScope as _};
use shared_bus::{EventPublisher, InMemoryEventBus, NodeEvent};
use shared_types::payload::*;
use shared_types::{
    Address, DomainError, Feed, FeedId, FeedParticipant, FeedType, GroupFeedKeyGeneration,
    MemberEncryptedKey, ParticipantRole, PayloadKind, TransactionPayload, ValidatedTransaction,
};
use std::sync::Arc;
use tracing::debug;

const GROUP_KINDS: [PayloadKind; 13] = [
    KIND_NEW_GROUP_FEED,
    KIND_JOIN_GROUP_FEED,
    KIND_ADD_MEMBER_TO_GROUP,
    KIND_LEAVE_GROUP_FEED,
    KIND_BAN_FROM_GROUP,
    KIND_UNBAN_FROM_GROUP,
    KIND_BLOCK_MEMBER,
    KIND_UNBLOCK_MEMBER,
    KIND_PROMOTE_TO_ADMIN,
    KIND_GROUP_KEY_ROTATION,
    KIND_UPDATE_GROUP_TITLE,
    KIND_UPDATE_GROUP_DESCRIPTION,
    KIND_DELETE_GROUP_FEED,
];

pub struct GroupFeedLifecycleStrategy {
    storage: SharedStorage,
    bus: Arc<InMemoryEventBus>,
}

impl GroupFeedLifecycleStrategy {
    #[must_use]
    pub fn new(storage: SharedStorage, bus: Arc<InMemoryEventBus>) -> Self {
        Self { storage, bus }
    }

    async fn require_feed(&self, feed_id: FeedId) -> Result<Feed, DomainError> {
        let read = self.storage.read().await?;
        read.feed(feed_id)
            .await?
            .ok_or(DomainError::UnknownFeed(feed_id))
    }

    async fn require_participant(
        &self,
        feed_id: FeedId,
        address: Address,
    ) -> Result<FeedParticipant, DomainError> {
        let read = self.storage.read().await?;
        read.participant(feed_id, address)
            .await?
            .ok_or(DomainError::NotMember(address, feed_id))
    }

    async fn set_role(
        &self,
        feed_id: FeedId,
        address: Address,
        role: ParticipantRole,
    ) -> Result<(), DomainError> {
        let mut participant = self.require_participant(feed_id, address).await?;
        participant.role = role;
        let mut scope = self.storage.begin_write().await?;
        scope.upsert_participant(participant);
        scope.commit().await
    }

    async fn create(
        &self,
        block_index: u64,
        creator: Address,
        payload: &NewGroupFeedPayload,
    ) -> Result<(), DomainError> {
        let mut scope = self.storage.begin_write().await?;
        scope.upsert_feed(Feed {
            feed_id: payload.feed_id,
            title: payload.title.clone(),
            feed_type: FeedType::Group,
            description: payload.description.clone(),
            is_public: payload.is_public,
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

    async fn add_member(
        &self,
        feed_id: FeedId,
        member: Address,
        encrypted_feed_key: String,
    ) -> Result<(), DomainError> {
        let feed = self.require_feed(feed_id).await?;
        let mut scope = self.storage.begin_write().await?;
        scope.upsert_participant(FeedParticipant {
            feed_id,
            participant_address: member,
            role: ParticipantRole::Member,
            encrypted_feed_key,
            key_generation: feed.current_key_generation,
        });
        scope.commit().await
    }

    async fn rotate_keys(&self, payload: &GroupKeyRotationPayload) -> Result<(), DomainError> {
        let mut feed = self.require_feed(payload.feed_id).await?;
        feed.current_key_generation = payload.new_generation;

        let read = self.storage.read().await?;
        let participants = read.participants(payload.feed_id).await?;
        drop(read);

        let mut scope = self.storage.begin_write().await?;
        scope.upsert_feed(feed);
        scope.insert_key_generation(GroupFeedKeyGeneration {
            feed_id: payload.feed_id,
            generation: payload.new_generation,
            valid_from_block: payload.valid_from_block,
            trigger: payload.trigger,
            encrypted_keys: payload
                .encrypted_keys
                .iter()
                .map(|k| MemberEncryptedKey {
                    member: k.member,
                    encrypted_key: k.encrypted_key.clone(),
                })
                .collect(),
        });
        // Re-key every member carried by the rotation; banned members are
        // outside the eligible set and receive nothing.
        for rotated in &payload.encrypted_keys {
            if let Some(mut participant) = participants
                .iter()
                .find(|p| p.participant_address == rotated.member)
                .cloned()
            {
                if !participant.role.in_key_set() {
                    continue;
                }
                participant.encrypted_feed_key = rotated.encrypted_key.clone();
                participant.key_generation = payload.new_generation;
                scope.upsert_participant(participant);
            }
        }
        scope.commit().await
    }
}

#[async_trait]
impl IndexStrategy for GroupFeedLifecycleStrategy {
    fn name(&self) -> &'static str {
        "group-feed-lifecycle"
    }

    fn can_handle(&self, tx: &ValidatedTransaction) -> bool {
        GROUP_KINDS.contains(&tx.payload_kind())
    }

    async fn handle(
        &self,
        block_index: u64,
        tx: &ValidatedTransaction,
    ) -> Result<(), DomainError> {
        debug!(tx_id = %tx.id, kind = %tx.payload_kind(), "Applying group lifecycle operation");
        match &tx.payload {
            TransactionPayload::NewGroupFeed(p) => {
                self.create(block_index, tx.user_signature.signatory, p).await
            }
            TransactionPayload::JoinGroupFeed(p) => {
                self.add_member(p.feed_id, p.user_address, String::new()).await
            }
            TransactionPayload::AddMemberToGroup(p) => {
                self.add_member(p.feed_id, p.new_member, p.new_member_encrypt_key.clone())
                    .await
            }
            TransactionPayload::LeaveGroupFeed(p) => {
                let mut scope = self.storage.begin_write().await?;
                scope.remove_participant(p.feed_id, p.user_address);
                scope.commit().await
            }
            TransactionPayload::BanFromGroup(p) => {
                self.set_role(p.feed_id, p.banned, ParticipantRole::Banned).await?;
                self.bus
                    .publish(NodeEvent::UserBannedFromGroup {
                        feed_id: p.feed_id,
                        banned: p.banned,
                    })
                    .await;
                Ok(())
            }
            TransactionPayload::UnbanFromGroup(p) => {
                self.set_role(p.feed_id, p.unbanned, ParticipantRole::Member).await
            }
            TransactionPayload::BlockMember(p) => {
                self.set_role(p.feed_id, p.blocked, ParticipantRole::Blocked).await
            }
            TransactionPayload::UnblockMember(p) => {
                self.set_role(p.feed_id, p.unblocked, ParticipantRole::Member).await
            }
            TransactionPayload::PromoteToAdmin(p) => {
                self.set_role(p.feed_id, p.member, ParticipantRole::Admin).await
            }
            TransactionPayload::GroupKeyRotation(p) => self.rotate_keys(p).await,
            TransactionPayload::UpdateGroupTitle(p) => {
                let mut feed = self.require_feed(p.feed_id).await?;
                feed.title = p.new_title.clone();
                let mut scope = self.storage.begin_write().await?;
                scope.upsert_feed(feed);
                scope.commit().await
            }
            TransactionPayload::UpdateGroupDescription(p) => {
                let mut feed = self.require_feed(p.feed_id).await?;
                feed.description = p.new_description.clone();
                let mut scope = self.storage.begin_write().await?;
                scope.upsert_feed(feed);
                scope.commit().await
            }
            TransactionPayload::DeleteGroupFeed(p) => {
                let mut scope = self.storage.begin_write().await?;
                scope.delete_feed(p.feed_id);
                scope.commit().await
            }
            _ => Err(DomainError::MalformedPayload(
                "group strategy received unrelated payload".to_string(),
            )),
        }
    }
}
