//! Feed message validation.

use super::{ContentHandler, HandlerContext};
use async_trait::async_trait;
use shared_types::payload::{KIND_NEW_FEED_MESSAGE, KIND_NEW_GROUP_FEED_MESSAGE};
use shared_types::{
    DomainError, FeedType, PayloadKind, SignedTransaction, TransactionPayload,
    ValidatedTransaction,
};

/// Messages to personal and chat feeds. The author must be a participant
/// with a posting-capable role.
pub struct NewFeedMessageHandler {
    ctx: HandlerContext,
}

impl NewFeedMessageHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for NewFeedMessageHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_NEW_FEED_MESSAGE
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::NewFeedMessage(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("wrong payload".to_string()));
        };
        if payload.content.is_empty() {
            return Err(DomainError::MalformedPayload("empty content".to_string()));
        }
        self.ctx.require_feed(payload.feed_id).await?;
        let author = tx.user_signature.signatory;
        let participant = self.ctx.require_participant(payload.feed_id, author).await?;
        if !participant.role.can_post() {
            return Err(DomainError::UnauthorizedForRole(author, payload.feed_id));
        }
        Ok(self.ctx.cosign(tx))
    }
}

/// Messages to group feeds: same participant checks plus the key
/// generation must be the feed's current one, so members never post
/// under a stale key.
pub struct NewGroupFeedMessageHandler {
    ctx: HandlerContext,
}

impl NewGroupFeedMessageHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for NewGroupFeedMessageHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_NEW_GROUP_FEED_MESSAGE
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::NewGroupFeedMessage(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("wrong payload".to_string()));
        };
        if payload.content.is_empty() {
            return Err(DomainError::MalformedPayload("empty content".to_string()));
        }
        let feed = self.ctx.require_feed(payload.feed_id).await?;
        if feed.feed_type != FeedType::Group {
            return Err(DomainError::MalformedPayload(
                "group message to non-group feed".to_string(),
            ));
        }
        let author = tx.user_signature.signatory;
        let participant = self.ctx.require_participant(payload.feed_id, author).await?;
        if !participant.role.can_post() {
            return Err(DomainError::UnauthorizedForRole(author, payload.feed_id));
        }
        if payload.key_generation != feed.current_key_generation {
            return Err(DomainError::MalformedPayload(format!(
                "message under key generation {} but feed is at {}",
                payload.key_generation, feed.current_key_generation
            )));
        }
        Ok(self.ctx.cosign(tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{seed_feed, signed_tx, test_ctx, user};
    use shared_types::payload::{NewFeedMessagePayload, NewGroupFeedMessagePayload};
    use shared_types::{Bytes32, FeedId, FeedMessageId, ParticipantRole};

    fn feed_id() -> FeedId {
        FeedId([0xAA; 16])
    }

    #[tokio::test]
    async fn test_member_can_post() {
        let (ctx, _) = test_ctx().await;
        let author = user(2);
        seed_feed(
            &ctx,
            feed_id(),
            FeedType::Chat,
            &[(author.address(), ParticipantRole::Member)],
        )
        .await;

        let handler = NewFeedMessageHandler::new(ctx);
        let payload = TransactionPayload::NewFeedMessage(NewFeedMessagePayload {
            message_id: FeedMessageId::generate(),
            feed_id: feed_id(),
            content: "ciphertext".into(),
            reply_to: None,
            key_generation: None,
            author_commitment: None,
        });
        assert!(handler
            .validate_and_cosign(signed_tx(&author, payload))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_blocked_member_cannot_post() {
        let (ctx, _) = test_ctx().await;
        let author = user(2);
        seed_feed(
            &ctx,
            feed_id(),
            FeedType::Chat,
            &[(author.address(), ParticipantRole::Blocked)],
        )
        .await;

        let handler = NewFeedMessageHandler::new(ctx);
        let payload = TransactionPayload::NewFeedMessage(NewFeedMessagePayload {
            message_id: FeedMessageId::generate(),
            feed_id: feed_id(),
            content: "ciphertext".into(),
            reply_to: None,
            key_generation: None,
            author_commitment: None,
        });
        assert!(matches!(
            handler.validate_and_cosign(signed_tx(&author, payload)).await,
            Err(DomainError::UnauthorizedForRole(..))
        ));
    }

    #[tokio::test]
    async fn test_non_member_cannot_post() {
        let (ctx, _) = test_ctx().await;
        let stranger = user(2);
        seed_feed(&ctx, feed_id(), FeedType::Chat, &[]).await;

        let handler = NewFeedMessageHandler::new(ctx);
        let payload = TransactionPayload::NewFeedMessage(NewFeedMessagePayload {
            message_id: FeedMessageId::generate(),
            feed_id: feed_id(),
            content: "ciphertext".into(),
            reply_to: None,
            key_generation: None,
            author_commitment: None,
        });
        assert!(matches!(
            handler
                .validate_and_cosign(signed_tx(&stranger, payload))
                .await,
            Err(DomainError::NotMember(..))
        ));
    }

    #[tokio::test]
    async fn test_group_message_stale_generation_rejected() {
        let (ctx, _) = test_ctx().await;
        let author = user(2);
        seed_feed(
            &ctx,
            feed_id(),
            FeedType::Group,
            &[(author.address(), ParticipantRole::Member)],
        )
        .await;

        let handler = NewGroupFeedMessageHandler::new(ctx);
        // Seeded feed sits at generation 1.
        let payload = TransactionPayload::NewGroupFeedMessage(NewGroupFeedMessagePayload {
            message_id: FeedMessageId::generate(),
            feed_id: feed_id(),
            content: "ciphertext".into(),
            reply_to: None,
            key_generation: 0,
            author_commitment: Bytes32([7; 32]),
        });
        assert!(matches!(
            handler.validate_and_cosign(signed_tx(&author, payload)).await,
            Err(DomainError::MalformedPayload(_))
        ));
    }

    #[tokio::test]
    async fn test_group_message_current_generation_accepted() {
        let (ctx, _) = test_ctx().await;
        let author = user(2);
        seed_feed(
            &ctx,
            feed_id(),
            FeedType::Group,
            &[(author.address(), ParticipantRole::Member)],
        )
        .await;

        let handler = NewGroupFeedMessageHandler::new(ctx);
        let payload = TransactionPayload::NewGroupFeedMessage(NewGroupFeedMessagePayload {
            message_id: FeedMessageId::generate(),
            feed_id: feed_id(),
            content: "ciphertext".into(),
            reply_to: None,
            key_generation: 1,
            author_commitment: Bytes32([7; 32]),
        });
        assert!(handler
            .validate_and_cosign(signed_tx(&author, payload))
            .await
            .is_ok());
    }
}
