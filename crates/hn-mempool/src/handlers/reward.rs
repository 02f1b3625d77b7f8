//! Producer reward validation.

use super::{ContentHandler, HandlerContext};
use async_trait::async_trait;
use shared_types::payload::KIND_REWARD;
use shared_types::{
    DomainError, PayloadKind, SignedTransaction, TransactionPayload, ValidatedTransaction,
    AMOUNT_PRECISION,
};

/// Accepts reward payloads issued by the block producer itself.
pub struct RewardHandler {
    ctx: HandlerContext,
}

impl RewardHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for RewardHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_REWARD
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::Reward(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload(
                "reward handler received non-reward payload".to_string(),
            ));
        };
        // Only the producer may mint rewards.
        if tx.user_signature.signatory != self.ctx.producer.address() {
            return Err(DomainError::BadUserSignature);
        }
        if payload.precision != AMOUNT_PRECISION {
            return Err(DomainError::MalformedPayload(format!(
                "reward precision {} (expected {AMOUNT_PRECISION})",
                payload.precision
            )));
        }
        if payload.amount.is_zero() {
            return Err(DomainError::MalformedPayload(
                "zero-amount reward".to_string(),
            ));
        }
        Ok(self.ctx.cosign(tx))
    }
}
