//! Group feed lifecycle validation.
//!
//! One handler per operation: create, join, add, ban, unban, block,
//! unblock, promote, key rotation, title, description, delete. All admin
//! operations require the signatory to hold an admin-capable role in the
//! target feed at validation time.

use super::{ContentHandler, HandlerContext};
use async_trait::async_trait;
use hn_storage::ReadScope as _;
use shared_types::payload::*;
use shared_types::{
    Address, DomainError, Feed, FeedId, FeedType, ParticipantRole, PayloadKind,
    SignedTransaction, TransactionPayload, ValidatedTransaction,
};

async fn require_group(ctx: &HandlerContext, feed_id: FeedId) -> Result<Feed, DomainError> {
    let feed = ctx.require_feed(feed_id).await?;
    if feed.feed_type != FeedType::Group {
        return Err(DomainError::MalformedPayload(format!(
            "feed {feed_id} is not a group feed"
        )));
    }
    Ok(feed)
}

/// Signatory must match the payload's admin field and hold an admin role.
async fn require_acting_admin(
    ctx: &HandlerContext,
    tx: &SignedTransaction,
    feed_id: FeedId,
    admin: Address,
) -> Result<(), DomainError> {
    if tx.user_signature.signatory != admin {
        return Err(DomainError::BadUserSignature);
    }
    require_group(ctx, feed_id).await?;
    ctx.require_admin(feed_id, admin).await?;
    Ok(())
}

// =============================================================================
// CREATE / JOIN / ADD
// =============================================================================

pub struct NewGroupFeedHandler {
    ctx: HandlerContext,
}

impl NewGroupFeedHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for NewGroupFeedHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_NEW_GROUP_FEED
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::NewGroupFeed(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("wrong payload".to_string()));
        };
        if payload.title.trim().is_empty() {
            return Err(DomainError::MalformedPayload("empty title".to_string()));
        }
        if payload.participants.is_empty() {
            return Err(DomainError::MalformedPayload(
                "group feed without participants".to_string(),
            ));
        }
        let signatory = tx.user_signature.signatory;
        if !payload.participants.iter().any(|p| p.address == signatory) {
            return Err(DomainError::NotMember(signatory, payload.feed_id));
        }
        let read = self.ctx.storage.read().await?;
        if read.feed(payload.feed_id).await?.is_some() {
            return Err(DomainError::StorageConflict(format!(
                "feed {} already exists",
                payload.feed_id
            )));
        }
        Ok(self.ctx.cosign(tx))
    }
}

pub struct JoinGroupFeedHandler {
    ctx: HandlerContext,
}

impl JoinGroupFeedHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for JoinGroupFeedHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_JOIN_GROUP_FEED
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::JoinGroupFeed(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("wrong payload".to_string()));
        };
        if tx.user_signature.signatory != payload.user_address {
            return Err(DomainError::BadUserSignature);
        }
        let feed = require_group(&self.ctx, payload.feed_id).await?;
        if !feed.is_public && payload.invitation_signature.is_none() {
            return Err(DomainError::UnauthorizedForRole(
                payload.user_address,
                payload.feed_id,
            ));
        }
        let read = self.ctx.storage.read().await?;
        if let Some(existing) = read.participant(payload.feed_id, payload.user_address).await? {
            return Err(match existing.role {
                // A ban is lifted only by an admin's unban.
                ParticipantRole::Banned => {
                    DomainError::UnauthorizedForRole(payload.user_address, payload.feed_id)
                }
                _ => DomainError::StorageConflict("already a participant".to_string()),
            });
        }
        Ok(self.ctx.cosign(tx))
    }
}

pub struct AddMemberToGroupHandler {
    ctx: HandlerContext,
}

impl AddMemberToGroupHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for AddMemberToGroupHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_ADD_MEMBER_TO_GROUP
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::AddMemberToGroup(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("wrong payload".to_string()));
        };
        require_acting_admin(&self.ctx, &tx, payload.feed_id, payload.admin).await?;
        let read = self.ctx.storage.read().await?;
        if read
            .participant(payload.feed_id, payload.new_member)
            .await?
            .is_some()
        {
            return Err(DomainError::StorageConflict(
                "already a participant".to_string(),
            ));
        }
        Ok(self.ctx.cosign(tx))
    }
}

pub struct LeaveGroupFeedHandler {
    ctx: HandlerContext,
}

impl LeaveGroupFeedHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for LeaveGroupFeedHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_LEAVE_GROUP_FEED
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::LeaveGroupFeed(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("wrong payload".to_string()));
        };
        if tx.user_signature.signatory != payload.user_address {
            return Err(DomainError::BadUserSignature);
        }
        require_group(&self.ctx, payload.feed_id).await?;
        let participant = self
            .ctx
            .require_participant(payload.feed_id, payload.user_address)
            .await?;
        if participant.role == ParticipantRole::Owner {
            // The owner deletes the feed instead of leaving it.
            return Err(DomainError::UnauthorizedForRole(
                payload.user_address,
                payload.feed_id,
            ));
        }
        Ok(self.ctx.cosign(tx))
    }
}

// =============================================================================
// MODERATION
// =============================================================================

pub struct BanFromGroupHandler {
    ctx: HandlerContext,
}

impl BanFromGroupHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for BanFromGroupHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_BAN_FROM_GROUP
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::BanFromGroup(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("wrong payload".to_string()));
        };
        require_acting_admin(&self.ctx, &tx, payload.feed_id, payload.admin).await?;
        let target = self
            .ctx
            .require_participant(payload.feed_id, payload.banned)
            .await?;
        if target.role == ParticipantRole::Owner {
            return Err(DomainError::UnauthorizedForRole(
                payload.admin,
                payload.feed_id,
            ));
        }
        Ok(self.ctx.cosign(tx))
    }
}

pub struct UnbanFromGroupHandler {
    ctx: HandlerContext,
}

impl UnbanFromGroupHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for UnbanFromGroupHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_UNBAN_FROM_GROUP
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::UnbanFromGroup(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("wrong payload".to_string()));
        };
        require_acting_admin(&self.ctx, &tx, payload.feed_id, payload.admin).await?;
        let target = self
            .ctx
            .require_participant(payload.feed_id, payload.unbanned)
            .await?;
        if target.role != ParticipantRole::Banned {
            return Err(DomainError::MalformedPayload(
                "unban target is not banned".to_string(),
            ));
        }
        Ok(self.ctx.cosign(tx))
    }
}

pub struct BlockMemberHandler {
    ctx: HandlerContext,
}

impl BlockMemberHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for BlockMemberHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_BLOCK_MEMBER
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::BlockMember(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("wrong payload".to_string()));
        };
        require_acting_admin(&self.ctx, &tx, payload.feed_id, payload.admin).await?;
        let target = self
            .ctx
            .require_participant(payload.feed_id, payload.blocked)
            .await?;
        if target.role == ParticipantRole::Owner {
            return Err(DomainError::UnauthorizedForRole(
                payload.admin,
                payload.feed_id,
            ));
        }
        Ok(self.ctx.cosign(tx))
    }
}

pub struct UnblockMemberHandler {
    ctx: HandlerContext,
}

impl UnblockMemberHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for UnblockMemberHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_UNBLOCK_MEMBER
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::UnblockMember(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("wrong payload".to_string()));
        };
        require_acting_admin(&self.ctx, &tx, payload.feed_id, payload.admin).await?;
        let target = self
            .ctx
            .require_participant(payload.feed_id, payload.unblocked)
            .await?;
        if target.role != ParticipantRole::Blocked {
            return Err(DomainError::MalformedPayload(
                "unblock target is not blocked".to_string(),
            ));
        }
        Ok(self.ctx.cosign(tx))
    }
}

pub struct PromoteToAdminHandler {
    ctx: HandlerContext,
}

impl PromoteToAdminHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for PromoteToAdminHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_PROMOTE_TO_ADMIN
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::PromoteToAdmin(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("wrong payload".to_string()));
        };
        require_acting_admin(&self.ctx, &tx, payload.feed_id, payload.admin).await?;
        let target = self
            .ctx
            .require_participant(payload.feed_id, payload.member)
            .await?;
        if target.role != ParticipantRole::Member {
            return Err(DomainError::MalformedPayload(format!(
                "cannot promote a participant with role {:?}",
                target.role
            )));
        }
        Ok(self.ctx.cosign(tx))
    }
}

// =============================================================================
// KEY ROTATION & METADATA
// =============================================================================

pub struct GroupKeyRotationHandler {
    ctx: HandlerContext,
}

impl GroupKeyRotationHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for GroupKeyRotationHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_GROUP_KEY_ROTATION
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::GroupKeyRotation(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("wrong payload".to_string()));
        };
        let feed = require_group(&self.ctx, payload.feed_id).await?;
        self.ctx
            .require_admin(payload.feed_id, tx.user_signature.signatory)
            .await?;
        if payload.new_generation != payload.previous_generation + 1 {
            return Err(DomainError::MalformedPayload(format!(
                "generation must advance by one ({} -> {})",
                payload.previous_generation, payload.new_generation
            )));
        }
        if payload.previous_generation != feed.current_key_generation {
            return Err(DomainError::StorageConflict(format!(
                "rotation from generation {} but feed is at {}",
                payload.previous_generation, feed.current_key_generation
            )));
        }
        if payload.encrypted_keys.is_empty() {
            return Err(DomainError::MalformedPayload(
                "rotation with no re-encrypted keys".to_string(),
            ));
        }
        Ok(self.ctx.cosign(tx))
    }
}

pub struct UpdateGroupTitleHandler {
    ctx: HandlerContext,
}

impl UpdateGroupTitleHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for UpdateGroupTitleHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_UPDATE_GROUP_TITLE
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::UpdateGroupTitle(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("wrong payload".to_string()));
        };
        require_acting_admin(&self.ctx, &tx, payload.feed_id, payload.admin).await?;
        if payload.new_title.trim().is_empty() {
            return Err(DomainError::MalformedPayload("empty title".to_string()));
        }
        Ok(self.ctx.cosign(tx))
    }
}

pub struct UpdateGroupDescriptionHandler {
    ctx: HandlerContext,
}

impl UpdateGroupDescriptionHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for UpdateGroupDescriptionHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_UPDATE_GROUP_DESCRIPTION
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::UpdateGroupDescription(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("wrong payload".to_string()));
        };
        require_acting_admin(&self.ctx, &tx, payload.feed_id, payload.admin).await?;
        Ok(self.ctx.cosign(tx))
    }
}

pub struct DeleteGroupFeedHandler {
    ctx: HandlerContext,
}

impl DeleteGroupFeedHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for DeleteGroupFeedHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_DELETE_GROUP_FEED
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::DeleteGroupFeed(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("wrong payload".to_string()));
        };
        require_acting_admin(&self.ctx, &tx, payload.feed_id, payload.admin).await?;
        Ok(self.ctx.cosign(tx))
    }
}
