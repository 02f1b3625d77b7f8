//! Funds transfer validation.

use super::{ContentHandler, HandlerContext};
use async_trait::async_trait;
use hn_storage::ReadScope as _;
use shared_types::payload::KIND_FUNDS_TRANSFER;
use shared_types::{
    DomainError, PayloadKind, SignedTransaction, TransactionPayload, ValidatedTransaction,
};

/// Validates transfers: signatory owns the source address and the source
/// balance covers the amount at validation time. The balance is checked
/// again at indexing, which is authoritative.
pub struct FundsTransferHandler {
    ctx: HandlerContext,
}

impl FundsTransferHandler {
    #[must_use]
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ContentHandler for FundsTransferHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_FUNDS_TRANSFER
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::FundsTransfer(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload(
                "funds handler received non-transfer payload".to_string(),
            ));
        };
        if tx.user_signature.signatory != payload.from {
            return Err(DomainError::BadUserSignature);
        }
        if payload.from == payload.to {
            return Err(DomainError::MalformedPayload(
                "self-transfer".to_string(),
            ));
        }
        if payload.amount.is_zero() {
            return Err(DomainError::MalformedPayload(
                "zero-amount transfer".to_string(),
            ));
        }
        self.ctx.require_feed(payload.feed_id).await?;

        let read = self.ctx.storage.read().await?;
        let balance = read.balance(payload.from, payload.token.clone()).await?;
        if balance.amount() < payload.amount {
            return Err(DomainError::InsufficientFunds {
                token: payload.token.clone(),
                required: payload.amount,
                available: balance.amount(),
            });
        }
        Ok(self.ctx.cosign(tx))
    }
}
