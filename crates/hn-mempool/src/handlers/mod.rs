//! # Content Handlers
//!
//! One handler per payload kind. A handler performs payload-specific
//! validation against current projections and, on success, co-signs the
//! transaction as the producer, promoting it to `Validated`.
//!
//! Registration is data-driven: the registry maps kind UUID to handler and
//! is populated once at startup.

mod feeds;
mod funds;
mod group;
mod messages;
mod profile;
mod reward;

pub use feeds::{NewChatFeedHandler, NewPersonalFeedHandler};
pub use funds::FundsTransferHandler;
pub use group::{
    AddMemberToGroupHandler, BanFromGroupHandler, BlockMemberHandler, DeleteGroupFeedHandler,
    GroupKeyRotationHandler, JoinGroupFeedHandler, LeaveGroupFeedHandler, NewGroupFeedHandler,
    PromoteToAdminHandler, UnbanFromGroupHandler, UnblockMemberHandler,
    UpdateGroupDescriptionHandler, UpdateGroupTitleHandler,
};
pub use messages::{NewFeedMessageHandler, NewGroupFeedMessageHandler};
pub use profile::RegisterProfileHandler;
pub use reward::RewardHandler;

use async_trait::async_trait;
use hn_credentials::{verify_address_signature, ProducerIdentity};
use hn_storage::{ReadScope as _, SharedStorage};
use shared_types::{
    Address, DomainError, Feed, FeedId, FeedParticipant, PayloadKind, SignedTransaction,
    ValidatedTransaction, ValidatorSignature,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Payload-specific validation and producer co-signing.
#[async_trait]
pub trait ContentHandler: Send + Sync {
    /// Whether this handler accepts the given payload kind.
    fn can_validate(&self, kind: PayloadKind) -> bool;

    /// Validate the payload and co-sign on success.
    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError>;
}

/// Shared dependencies handed to every handler.
#[derive(Clone)]
pub struct HandlerContext {
    pub storage: SharedStorage,
    pub producer: Arc<ProducerIdentity>,
}

impl HandlerContext {
    /// Verify the user signature over the transaction's signing bytes.
    pub fn verify_user_signature(&self, tx: &SignedTransaction) -> Result<(), DomainError> {
        let bytes = tx
            .signing_bytes()
            .map_err(|e| DomainError::MalformedPayload(e.to_string()))?;
        verify_address_signature(
            &tx.user_signature.signatory,
            &bytes,
            &tx.user_signature.signature,
        )
    }

    /// Co-sign the user signature, promoting the transaction.
    #[must_use]
    pub fn cosign(&self, tx: SignedTransaction) -> ValidatedTransaction {
        let signature = self.producer.co_sign(&tx.user_signature.signature);
        let validator = self.producer.address();
        tx.into_validated(ValidatorSignature {
            validator,
            signature,
        })
    }

    /// Look up a feed or reject with `UnknownFeed`.
    pub async fn require_feed(&self, feed_id: FeedId) -> Result<Feed, DomainError> {
        let read = self.storage.read().await?;
        read.feed(feed_id)
            .await?
            .ok_or(DomainError::UnknownFeed(feed_id))
    }

    /// Look up a participant or reject with `NotMember`.
    pub async fn require_participant(
        &self,
        feed_id: FeedId,
        address: Address,
    ) -> Result<FeedParticipant, DomainError> {
        let read = self.storage.read().await?;
        read.participant(feed_id, address)
            .await?
            .ok_or(DomainError::NotMember(address, feed_id))
    }

    /// Require an admin-capable participant.
    pub async fn require_admin(
        &self,
        feed_id: FeedId,
        address: Address,
    ) -> Result<FeedParticipant, DomainError> {
        let participant = self.require_participant(feed_id, address).await?;
        if !participant.role.is_admin() {
            return Err(DomainError::UnauthorizedForRole(address, feed_id));
        }
        Ok(participant)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixtures for handler tests.

    use super::HandlerContext;
    use hn_credentials::ProducerIdentity;
    use hn_storage::{MemoryStorage, WriteScope};
    use shared_types::{
        Address, Feed, FeedId, FeedParticipant, FeedType, ParticipantRole, SignedTransaction,
        TransactionPayload, UnsignedTransaction, UserSignature,
    };
    use std::sync::Arc;

    const PRODUCER_SECRET: [u8; 32] = [0x42; 32];

    /// Fresh context over empty storage, plus a signer for the producer key.
    pub async fn test_ctx() -> (HandlerContext, ProducerIdentity) {
        let ctx = HandlerContext {
            storage: MemoryStorage::shared(),
            producer: Arc::new(ProducerIdentity::from_secret_bytes(PRODUCER_SECRET)),
        };
        (ctx, ProducerIdentity::from_secret_bytes(PRODUCER_SECRET))
    }

    /// A user keypair derived from a tag byte.
    #[must_use]
    pub fn user(tag: u8) -> ProducerIdentity {
        ProducerIdentity::from_secret_bytes([tag; 32])
    }

    /// Build a signed transaction over `payload` using `signer`'s key.
    #[must_use]
    pub fn signed_tx(signer: &ProducerIdentity, payload: TransactionPayload) -> SignedTransaction {
        let unsigned = UnsignedTransaction::new(chrono::Utc::now(), payload);
        let bytes = unsigned.signing_bytes().expect("payload serializes");
        let signature = signer.sign(&bytes);
        unsigned.into_signed(UserSignature {
            signatory: signer.address(),
            signature,
        })
    }

    /// Seed a feed with participants at given roles.
    pub async fn seed_feed(
        ctx: &HandlerContext,
        feed_id: FeedId,
        feed_type: FeedType,
        members: &[(Address, ParticipantRole)],
    ) {
        let mut scope = ctx.storage.begin_write().await.expect("write scope");
        scope.upsert_feed(Feed {
            feed_id,
            title: "seeded".into(),
            feed_type,
            description: String::new(),
            is_public: true,
            created_at_block: 0,
            current_key_generation: 1,
        });
        for (address, role) in members {
            scope.upsert_participant(FeedParticipant {
                feed_id,
                participant_address: *address,
                role: *role,
                encrypted_feed_key: "enc".into(),
                key_generation: 1,
            });
        }
        scope.commit().await.expect("commit");
    }
}

/// Kind-to-handler mapping populated at startup.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<PayloadKind, Arc<dyn ContentHandler>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a payload kind. Later registrations replace
    /// earlier ones for the same kind.
    pub fn register(&mut self, kind: PayloadKind, handler: Arc<dyn ContentHandler>) {
        debug_assert!(handler.can_validate(kind));
        self.handlers.insert(kind, handler);
    }

    #[must_use]
    pub fn lookup(&self, kind: PayloadKind) -> Option<Arc<dyn ContentHandler>> {
        self.handlers.get(&kind).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Register the built-in handler set for every known payload kind
    /// except reaction votes, which are contributed by the reaction
    /// subsystem.
    #[must_use]
    pub fn with_builtin_handlers(ctx: &HandlerContext) -> Self {
        use shared_types::payload as kinds;
        let mut registry = Self::new();
        registry.register(kinds::KIND_REWARD, Arc::new(RewardHandler::new(ctx.clone())));
        registry.register(
            kinds::KIND_FUNDS_TRANSFER,
            Arc::new(FundsTransferHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_REGISTER_PROFILE,
            Arc::new(RegisterProfileHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_NEW_PERSONAL_FEED,
            Arc::new(NewPersonalFeedHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_NEW_CHAT_FEED,
            Arc::new(NewChatFeedHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_NEW_GROUP_FEED,
            Arc::new(NewGroupFeedHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_JOIN_GROUP_FEED,
            Arc::new(JoinGroupFeedHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_ADD_MEMBER_TO_GROUP,
            Arc::new(AddMemberToGroupHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_LEAVE_GROUP_FEED,
            Arc::new(LeaveGroupFeedHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_BAN_FROM_GROUP,
            Arc::new(BanFromGroupHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_UNBAN_FROM_GROUP,
            Arc::new(UnbanFromGroupHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_BLOCK_MEMBER,
            Arc::new(BlockMemberHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_UNBLOCK_MEMBER,
            Arc::new(UnblockMemberHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_PROMOTE_TO_ADMIN,
            Arc::new(PromoteToAdminHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_GROUP_KEY_ROTATION,
            Arc::new(GroupKeyRotationHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_UPDATE_GROUP_TITLE,
            Arc::new(UpdateGroupTitleHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_UPDATE_GROUP_DESCRIPTION,
            Arc::new(UpdateGroupDescriptionHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_DELETE_GROUP_FEED,
            Arc::new(DeleteGroupFeedHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_NEW_FEED_MESSAGE,
            Arc::new(NewFeedMessageHandler::new(ctx.clone())),
        );
        registry.register(
            kinds::KIND_NEW_GROUP_FEED_MESSAGE,
            Arc::new(NewGroupFeedMessageHandler::new(ctx.clone())),
        );
        registry
    }
}
