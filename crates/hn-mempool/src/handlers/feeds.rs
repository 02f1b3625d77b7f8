//! Personal and chat feed creation validation.

use super::{ContentHandler, HandlerContext};
use async_trait::async_trait;
use hn_storage::ReadScope as _;
use shared_types::payload::{KIND_NEW_CHAT_FEED, KIND_NEW_PERSONAL_FEED};
use shared_types::{
    DomainError, FeedType, PayloadKind, SignedTransaction, TransactionPayload,
    ValidatedTransaction,
};

/// Validates personal feed creation: one owner, fresh feed id.
pub struct NewPersonalFeedHandler {
    ctx: HandlerContext,
}

impl NewPersonalFeedHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for NewPersonalFeedHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_NEW_PERSONAL_FEED
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::NewPersonalFeed(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload(
                "personal feed handler received wrong payload".to_string(),
            ));
        };
        if payload.feed_type != FeedType::Personal {
            return Err(DomainError::MalformedPayload(format!(
                "personal feed created with type {:?}",
                payload.feed_type
            )));
        }
        if payload.title.trim().is_empty() {
            return Err(DomainError::MalformedPayload("empty title".to_string()));
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

/// Validates chat feed creation: exactly two participants, the signatory
/// being one of them.
pub struct NewChatFeedHandler {
    ctx: HandlerContext,
}

impl NewChatFeedHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for NewChatFeedHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_NEW_CHAT_FEED
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::NewChatFeed(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload(
                "chat feed handler received wrong payload".to_string(),
            ));
        };
        if payload.feed_type != FeedType::Chat {
            return Err(DomainError::MalformedPayload(format!(
                "chat feed created with type {:?}",
                payload.feed_type
            )));
        }
        if payload.participants.len() != 2 {
            return Err(DomainError::MalformedPayload(format!(
                "chat feed requires exactly two participants, got {}",
                payload.participants.len()
            )));
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{seed_feed, signed_tx, test_ctx, user};
    use shared_types::payload::{
        FeedParticipantEntry, NewChatFeedPayload, NewPersonalFeedPayload,
    };
    use shared_types::{FeedId, ParticipantRole};

    #[tokio::test]
    async fn test_personal_feed_accepted() {
        let (ctx, _) = test_ctx().await;
        let alice = user(3);
        let handler = NewPersonalFeedHandler::new(ctx);
        let tx = signed_tx(
            &alice,
            TransactionPayload::NewPersonalFeed(NewPersonalFeedPayload {
                feed_id: FeedId([1; 16]),
                title: "notes".into(),
                feed_type: FeedType::Personal,
                encrypted_feed_key: "enc".into(),
            }),
        );
        assert!(handler.validate_and_cosign(tx).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_feed_id_rejected() {
        let (ctx, _) = test_ctx().await;
        let alice = user(3);
        let feed = FeedId([1; 16]);
        seed_feed(&ctx, feed, FeedType::Personal, &[(alice.address(), ParticipantRole::Owner)])
            .await;
        let handler = NewPersonalFeedHandler::new(ctx);
        let tx = signed_tx(
            &alice,
            TransactionPayload::NewPersonalFeed(NewPersonalFeedPayload {
                feed_id: feed,
                title: "notes".into(),
                feed_type: FeedType::Personal,
                encrypted_feed_key: "enc".into(),
            }),
        );
        assert!(matches!(
            handler.validate_and_cosign(tx).await,
            Err(DomainError::StorageConflict(_))
        ));
    }

    fn chat_payload(feed_id: FeedId, members: &[shared_types::Address]) -> TransactionPayload {
        TransactionPayload::NewChatFeed(NewChatFeedPayload {
            feed_id,
            feed_type: FeedType::Chat,
            participants: members
                .iter()
                .map(|address| FeedParticipantEntry {
                    feed_id,
                    address: *address,
                    encrypted_feed_key: "enc".into(),
                })
                .collect(),
        })
    }

    #[tokio::test]
    async fn test_chat_feed_requires_two_participants() {
        let (ctx, _) = test_ctx().await;
        let alice = user(3);
        let handler = NewChatFeedHandler::new(ctx);
        let tx = signed_tx(&alice, chat_payload(FeedId([2; 16]), &[alice.address()]));
        assert!(matches!(
            handler.validate_and_cosign(tx).await,
            Err(DomainError::MalformedPayload(_))
        ));
    }

    #[tokio::test]
    async fn test_chat_feed_signatory_must_participate() {
        let (ctx, _) = test_ctx().await;
        let alice = user(3);
        let handler = NewChatFeedHandler::new(ctx);
        let tx = signed_tx(
            &alice,
            chat_payload(FeedId([2; 16]), &[user(4).address(), user(5).address()]),
        );
        assert!(matches!(
            handler.validate_and_cosign(tx).await,
            Err(DomainError::NotMember(..))
        ));
    }

    #[tokio::test]
    async fn test_chat_feed_accepted() {
        let (ctx, _) = test_ctx().await;
        let alice = user(3);
        let handler = NewChatFeedHandler::new(ctx);
        let tx = signed_tx(
            &alice,
            chat_payload(FeedId([2; 16]), &[alice.address(), user(4).address()]),
        );
        assert!(handler.validate_and_cosign(tx).await.is_ok());
    }
}
