//! Profile registration validation.

use super::{ContentHandler, HandlerContext};
use async_trait::async_trait;
use shared_types::payload::KIND_REGISTER_PROFILE;
use shared_types::{
    DomainError, PayloadKind, SignedTransaction, TransactionPayload, ValidatedTransaction,
};

/// Validates profile registrations. Re-registering updates the existing
/// profile, so the only checks are self-signing and a non-empty name.
pub struct RegisterProfileHandler {
    ctx: HandlerContext,
}

impl RegisterProfileHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for RegisterProfileHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_REGISTER_PROFILE
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::RegisterProfile(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload(
                "profile handler received non-profile payload".to_string(),
            ));
        };
        if tx.user_signature.signatory != payload.address {
            return Err(DomainError::BadUserSignature);
        }
        if payload.display_name.trim().is_empty() {
            return Err(DomainError::MalformedPayload(
                "empty display name".to_string(),
            ));
        }
        Ok(self.ctx.cosign(tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{signed_tx, test_ctx, user};
    use shared_types::payload::RegisterProfilePayload;
    use shared_types::Bytes32;

    #[tokio::test]
    async fn test_self_registration_accepted() {
        let (ctx, _) = test_ctx().await;
        let alice = user(3);
        let handler = RegisterProfileHandler::new(ctx);
        let tx = signed_tx(
            &alice,
            TransactionPayload::RegisterProfile(RegisterProfilePayload {
                address: alice.address(),
                display_name: "alice".into(),
                public_key: Bytes32([1; 32]),
            }),
        );
        assert!(handler.validate_and_cosign(tx).await.is_ok());
    }

    #[tokio::test]
    async fn test_registering_for_someone_else_rejected() {
        let (ctx, _) = test_ctx().await;
        let alice = user(3);
        let mallory = user(4);
        let handler = RegisterProfileHandler::new(ctx);
        let tx = signed_tx(
            &mallory,
            TransactionPayload::RegisterProfile(RegisterProfilePayload {
                address: alice.address(),
                display_name: "alice".into(),
                public_key: Bytes32([1; 32]),
            }),
        );
        assert!(matches!(
            handler.validate_and_cosign(tx).await,
            Err(DomainError::BadUserSignature)
        ));
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let (ctx, _) = test_ctx().await;
        let alice = user(3);
        let handler = RegisterProfileHandler::new(ctx);
        let tx = signed_tx(
            &alice,
            TransactionPayload::RegisterProfile(RegisterProfilePayload {
                address: alice.address(),
                display_name: "   ".into(),
                public_key: Bytes32([1; 32]),
            }),
        );
        assert!(matches!(
            handler.validate_and_cosign(tx).await,
            Err(DomainError::MalformedPayload(_))
        ));
    }
}
