//! # Reaction Index Strategies
//!
//! Contributions to the transaction indexer: the reaction-vote strategy
//! (tally mutation) and the membership-registration strategy, which picks
//! author commitments off group messages and appends them to the feed's
//! membership tree. Both register through the same strategy registry as
//! the built-in projections.

use crate::membership::MembershipService;
use crate::tally::TallyService;
use async_trait::async_trait;
use hn_indexing::IndexStrategy;
use shared_types::payload::{
    KIND_NEW_FEED_MESSAGE, KIND_NEW_GROUP_FEED_MESSAGE, KIND_REACTION_VOTE,
};
use shared_types::{Bytes32, DomainError, FeedId, TransactionPayload, ValidatedTransaction};
use std::sync::Arc;
use tracing::debug;

/// Applies validated reaction votes to the homomorphic tally.
pub struct ReactionVoteStrategy {
    tally: Arc<TallyService>,
}

impl ReactionVoteStrategy {
    #[must_use]
    pub fn new(tally: Arc<TallyService>) -> Self {
        Self { tally }
    }
}

#[async_trait]
impl IndexStrategy for ReactionVoteStrategy {
    fn name(&self) -> &'static str {
        "reaction-vote"
    }

    fn can_handle(&self, tx: &ValidatedTransaction) -> bool {
        tx.payload_kind() == KIND_REACTION_VOTE
    }

    async fn handle(
        &self,
        block_index: u64,
        tx: &ValidatedTransaction,
    ) -> Result<(), DomainError> {
        let TransactionPayload::ReactionVote(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload(
                "reaction strategy received non-vote payload".to_string(),
            ));
        };
        self.tally.apply_vote(block_index, tx.id, payload).await?;
        Ok(())
    }
}

/// Registers author commitments carried on feed messages.
///
/// Runs alongside the message-row strategy for the same transaction; a
/// commitment already present is not an error, it simply leaves the tree
/// unchanged.
pub struct MembershipRegistrationStrategy {
    membership: Arc<MembershipService>,
}

impl MembershipRegistrationStrategy {
    #[must_use]
    pub fn new(membership: Arc<MembershipService>) -> Self {
        Self { membership }
    }

    fn commitment_of(tx: &ValidatedTransaction) -> Option<(FeedId, Bytes32)> {
        match &tx.payload {
            TransactionPayload::NewFeedMessage(p) => {
                p.author_commitment.map(|c| (p.feed_id, c))
            }
            TransactionPayload::NewGroupFeedMessage(p) => {
                Some((p.feed_id, p.author_commitment))
            }
            _ => None,
        }
    }
}

#[async_trait]
impl IndexStrategy for MembershipRegistrationStrategy {
    fn name(&self) -> &'static str {
        "membership-registration"
    }

    fn can_handle(&self, tx: &ValidatedTransaction) -> bool {
        let kind = tx.payload_kind();
        (kind == KIND_NEW_FEED_MESSAGE || kind == KIND_NEW_GROUP_FEED_MESSAGE)
            && Self::commitment_of(tx).is_some()
    }

    async fn handle(
        &self,
        block_index: u64,
        tx: &ValidatedTransaction,
    ) -> Result<(), DomainError> {
        let Some((feed_id, commitment)) = Self::commitment_of(tx) else {
            return Ok(());
        };
        match self.membership.register(feed_id, commitment, block_index).await {
            Ok((root, leaf_index)) => {
                debug!(%feed_id, leaf_index, root = %root, "Commitment registered from message");
                Ok(())
            }
            Err(DomainError::DuplicateCommitment(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::MembershipConfig;
    use hn_storage::{MemoryStorage, ReadScope as _};
    use shared_bus::InMemoryEventBus;
    use shared_types::payload::NewGroupFeedMessagePayload;
    use shared_types::{
        Address, FeedMessageId, SignatureBytes, TransactionId, UserSignature,
        ValidatorSignature,
    };

    fn group_message_tx(feed: u8, commitment: u8) -> ValidatedTransaction {
        ValidatedTransaction {
            id: TransactionId::generate(),
            timestamp: chrono::Utc::now(),
            payload: TransactionPayload::NewGroupFeedMessage(NewGroupFeedMessagePayload {
                message_id: FeedMessageId::generate(),
                feed_id: FeedId([feed; 16]),
                content: "c".into(),
                reply_to: None,
                key_generation: 1,
                author_commitment: Bytes32([commitment; 32]),
            }),
            user_signature: UserSignature {
                signatory: Address([1; 32]),
                signature: SignatureBytes([0; 64]),
            },
            validator_signature: ValidatorSignature {
                validator: Address([2; 32]),
                signature: SignatureBytes([0; 64]),
            },
        }
    }

    #[tokio::test]
    async fn test_commitment_registered_once() {
        let storage = MemoryStorage::shared();
        let membership = Arc::new(MembershipService::new(
            MembershipConfig {
                depth: 8,
                grace_window: 3,
            },
            Arc::clone(&storage),
        ));
        let strategy = MembershipRegistrationStrategy::new(Arc::clone(&membership));

        let tx = group_message_tx(1, 5);
        assert!(strategy.can_handle(&tx));
        strategy.handle(1, &tx).await.unwrap();
        // Second message from the same author: duplicate is fine.
        strategy.handle(2, &group_message_tx(1, 5)).await.unwrap();

        let read = storage.read().await.unwrap();
        assert_eq!(
            read.member_commitments(FeedId([1; 16])).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_vote_strategy_dispatches_to_tally() {
        use crate::elgamal::tests::sample_vote;
        use shared_types::payload::ReactionVotePayload;
        use shared_types::ProofBytes;

        let storage = MemoryStorage::shared();
        let bus = Arc::new(InMemoryEventBus::new());
        let tally = Arc::new(TallyService::new(Arc::clone(&storage), bus));
        let strategy = ReactionVoteStrategy::new(tally);

        let stored = sample_vote(1).to_stored();
        let payload = ReactionVotePayload {
            message_id: FeedMessageId([7; 16]),
            feed_id: FeedId([1; 16]),
            proof: ProofBytes(vec![1]),
            nullifier: Bytes32([3; 32]),
            ciphertext_c1_x: stored.c1_x,
            ciphertext_c1_y: stored.c1_y,
            ciphertext_c2_x: stored.c2_x,
            ciphertext_c2_y: stored.c2_y,
            merkle_root: Bytes32([4; 32]),
            author_commitment: Bytes32([5; 32]),
            circuit_version: 1,
            encrypted_backup: None,
        };
        let tx = ValidatedTransaction {
            id: TransactionId::generate(),
            timestamp: chrono::Utc::now(),
            payload: TransactionPayload::ReactionVote(Box::new(payload)),
            user_signature: UserSignature {
                signatory: Address([1; 32]),
                signature: SignatureBytes([0; 64]),
            },
            validator_signature: ValidatorSignature {
                validator: Address([2; 32]),
                signature: SignatureBytes([0; 64]),
            },
        };
        assert!(strategy.can_handle(&tx));
        strategy.handle(3, &tx).await.unwrap();

        let read = storage.read().await.unwrap();
        let row = read.tally(FeedMessageId([7; 16])).await.unwrap().unwrap();
        assert_eq!(row.total_count, 1);
    }
}
