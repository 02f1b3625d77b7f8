//! Funds transfer projection: debit source, credit destination.

use crate::strategy::IndexStrategy;
use async_trait::async_trait;
use hn_storage::{ReadScope as _, SharedStorage, WriteScope as _};
use shared_types::payload::KIND_FUNDS_TRANSFER;
use shared_types::{DomainError, TransactionPayload, ValidatedTransaction};

pub struct FundsTransferStrategy {
    storage: SharedStorage,
}

impl FundsTransferStrategy {
    #[must_use]
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl IndexStrategy for FundsTransferStrategy {
    fn name(&self) -> &'static str {
        "funds-transfer"
    }

    fn can_handle(&self, tx: &ValidatedTransaction) -> bool {
        tx.payload_kind() == KIND_FUNDS_TRANSFER
    }

    async fn handle(
        &self,
        _block_index: u64,
        tx: &ValidatedTransaction,
    ) -> Result<(), DomainError> {
        let TransactionPayload::FundsTransfer(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload("not a transfer".to_string()));
        };

        // The indexing-time balance is authoritative; validation may have
        // raced earlier transfers in the same block.
        let read = self.storage.read().await?;
        let source = read.balance(payload.from, payload.token.clone()).await?;
        let debited = source
            .debited(payload.amount)
            .ok_or(DomainError::InsufficientFunds {
                token: payload.token.clone(),
                required: payload.amount,
                available: source.amount(),
            })?;
        let destination = read.balance(payload.to, payload.token.clone()).await?;
        let credited = destination.credited(payload.amount).ok_or_else(|| {
            DomainError::StorageConflict("balance overflow".to_string())
        })?;
        drop(read);

        let mut scope = self.storage.begin_write().await?;
        scope.upsert_balance(debited);
        scope.upsert_balance(credited);
        scope.commit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hn_storage::{MemoryStorage, WriteScope};
    use shared_types::payload::FundsTransferPayload;
    use shared_types::{
        Address, Amount, BalanceRecord, FeedId, SignatureBytes, Token, TransactionId,
        UserSignature, ValidatorSignature,
    };

    fn transfer_tx(from: Address, to: Address, amount: &str) -> ValidatedTransaction {
        ValidatedTransaction {
            id: TransactionId::generate(),
            timestamp: chrono::Utc::now(),
            payload: TransactionPayload::FundsTransfer(FundsTransferPayload {
                token: Token::native(),
                precision: 9,
                amount: amount.parse().unwrap(),
                from,
                to,
                feed_id: FeedId([1; 16]),
            }),
            user_signature: UserSignature {
                signatory: from,
                signature: SignatureBytes([0; 64]),
            },
            validator_signature: ValidatorSignature {
                validator: Address([1; 32]),
                signature: SignatureBytes([0; 64]),
            },
        }
    }

    #[tokio::test]
    async fn test_transfer_moves_funds() {
        let storage = MemoryStorage::shared();
        let from = Address([3; 32]);
        let to = Address([4; 32]);
        let mut scope = storage.begin_write().await.unwrap();
        scope.upsert_balance(BalanceRecord {
            address: from,
            token: Token::native(),
            balance: Amount::from_tokens(10),
        });
        scope.commit().await.unwrap();

        let strategy = FundsTransferStrategy::new(std::sync::Arc::clone(&storage));
        strategy
            .handle(1, &transfer_tx(from, to, "4.000000000"))
            .await
            .unwrap();

        let read = storage.read().await.unwrap();
        assert_eq!(
            read.balance(from, Token::native()).await.unwrap().amount(),
            "6.000000000".parse::<Amount>().unwrap()
        );
        assert_eq!(
            read.balance(to, Token::native()).await.unwrap().amount(),
            "4.000000000".parse::<Amount>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_insufficient_funds_fails_without_mutation() {
        let storage = MemoryStorage::shared();
        let from = Address([3; 32]);
        let to = Address([4; 32]);

        let strategy = FundsTransferStrategy::new(std::sync::Arc::clone(&storage));
        let result = strategy.handle(1, &transfer_tx(from, to, "4.000000000")).await;
        assert!(matches!(result, Err(DomainError::InsufficientFunds { .. })));

        let read = storage.read().await.unwrap();
        assert!(read.balance(to, Token::native()).await.unwrap().amount().is_zero());
    }
}
