//! # Reaction Vote Content Handler
//!
//! Mempool-side validation for reaction votes: signature, feed existence,
//! merkle root within the grace window, nullifier consistency, ciphertext
//! well-formedness, and proof verification under the named circuit
//! version. Tally mutation happens later, at indexing.

use crate::elgamal::VoteCiphertexts;
use crate::membership::MembershipService;
use crate::verifier::VerifierRegistry;
use async_trait::async_trait;
use hn_mempool::{ContentHandler, HandlerContext};
use hn_storage::ReadScope as _;
use shared_types::payload::KIND_REACTION_VOTE;
use shared_types::{
    DomainError, PayloadKind, SignedTransaction, TallyCiphertexts, TransactionPayload,
    ValidatedTransaction,
};
use std::sync::Arc;

pub struct ReactionVoteHandler {
    ctx: HandlerContext,
    membership: Arc<MembershipService>,
    verifier: Arc<VerifierRegistry>,
}

impl ReactionVoteHandler {
    #[must_use]
    pub fn new(
        ctx: HandlerContext,
        membership: Arc<MembershipService>,
        verifier: Arc<VerifierRegistry>,
    ) -> Self {
        Self {
            ctx,
            membership,
            verifier,
        }
    }
}

#[async_trait]
impl ContentHandler for ReactionVoteHandler {
    fn can_validate(&self, kind: PayloadKind) -> bool {
        kind == KIND_REACTION_VOTE
    }

    async fn validate_and_cosign(
        &self,
        tx: SignedTransaction,
    ) -> Result<ValidatedTransaction, DomainError> {
        self.ctx.verify_user_signature(&tx)?;
        let TransactionPayload::ReactionVote(ref payload) = tx.payload else {
            return Err(DomainError::MalformedPayload(
                "reaction handler received non-vote payload".to_string(),
            ));
        };

        self.ctx.require_feed(payload.feed_id).await?;
        self.membership
            .validate_root(payload.feed_id, payload.merkle_root)
            .await?;

        // Every ciphertext point must be on the curve before it can touch
        // a tally.
        VoteCiphertexts::from_stored(&TallyCiphertexts {
            c1_x: payload.ciphertext_c1_x,
            c1_y: payload.ciphertext_c1_y,
            c2_x: payload.ciphertext_c2_x,
            c2_y: payload.ciphertext_c2_y,
        })?;

        // A nullifier may recur only against its own message.
        let read = self.ctx.storage.read().await?;
        if let Some(record) = read.nullifier(payload.nullifier).await? {
            if record.message_id != payload.message_id {
                return Err(DomainError::NullifierReuseOnOtherMessage);
            }
        }
        drop(read);

        self.verifier.verify(payload)?;
        Ok(self.ctx.cosign(tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elgamal::tests::sample_vote;
    use crate::membership::MembershipConfig;
    use crate::verifier::{CircuitVersionState, ProofSystem};
    use hn_credentials::ProducerIdentity;
    use hn_storage::{MemoryStorage, SharedStorage, WriteScope};
    use shared_types::payload::ReactionVotePayload;
    use shared_types::{
        Bytes32, Feed, FeedId, FeedMessageId, FeedType, ProofBytes, UnsignedTransaction,
        UserSignature,
    };

    struct AlwaysValid;
    impl ProofSystem for AlwaysValid {
        fn verify(&self, _proof: &[u8], _inputs: &[ark_bn254::Fr]) -> bool {
            true
        }
    }

    struct Rig {
        handler: ReactionVoteHandler,
        membership: Arc<MembershipService>,
        storage: SharedStorage,
        user: ProducerIdentity,
    }

    async fn rig() -> Rig {
        let storage: SharedStorage = MemoryStorage::shared();
        let ctx = HandlerContext {
            storage: Arc::clone(&storage),
            producer: Arc::new(ProducerIdentity::from_secret_bytes([0x42; 32])),
        };
        let membership = Arc::new(MembershipService::new(
            MembershipConfig {
                depth: 8,
                grace_window: 3,
            },
            Arc::clone(&storage),
        ));
        let mut verifier = VerifierRegistry::new();
        verifier.register(1, CircuitVersionState::Current, Box::new(AlwaysValid));
        verifier.register(0, CircuitVersionState::Vulnerable, Box::new(AlwaysValid));

        let mut scope = storage.begin_write().await.unwrap();
        scope.upsert_feed(Feed {
            feed_id: FeedId([1; 16]),
            title: "group".into(),
            feed_type: FeedType::Group,
            description: String::new(),
            is_public: true,
            created_at_block: 0,
            current_key_generation: 1,
        });
        scope.commit().await.unwrap();

        Rig {
            handler: ReactionVoteHandler::new(
                ctx,
                Arc::clone(&membership),
                Arc::new(verifier),
            ),
            membership,
            storage,
            user: ProducerIdentity::from_secret_bytes([7; 32]),
        }
    }

    fn signed_vote(rig: &Rig, root: Bytes32, version: u32) -> SignedTransaction {
        let stored = sample_vote(1).to_stored();
        let payload = TransactionPayload::ReactionVote(Box::new(ReactionVotePayload {
            message_id: FeedMessageId([7; 16]),
            feed_id: FeedId([1; 16]),
            proof: ProofBytes(vec![1, 2, 3]),
            nullifier: Bytes32([3; 32]),
            ciphertext_c1_x: stored.c1_x,
            ciphertext_c1_y: stored.c1_y,
            ciphertext_c2_x: stored.c2_x,
            ciphertext_c2_y: stored.c2_y,
            merkle_root: root,
            author_commitment: Bytes32([5; 32]),
            circuit_version: version,
            encrypted_backup: None,
        }));
        let unsigned = UnsignedTransaction::new(chrono::Utc::now(), payload);
        let bytes = unsigned.signing_bytes().unwrap();
        let signature = rig.user.sign(&bytes);
        unsigned.into_signed(UserSignature {
            signatory: rig.user.address(),
            signature,
        })
    }

    #[tokio::test]
    async fn test_valid_vote_cosigned() {
        let rig = rig().await;
        let (root, _) = rig
            .membership
            .register(FeedId([1; 16]), Bytes32([5; 32]), 1)
            .await
            .unwrap();
        let tx = signed_vote(&rig, root, 1);
        assert!(rig.handler.validate_and_cosign(tx).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_root_rejected() {
        let rig = rig().await;
        let tx = signed_vote(&rig, Bytes32([0xAB; 32]), 1);
        assert!(matches!(
            rig.handler.validate_and_cosign(tx).await,
            Err(DomainError::UnknownMerkleRoot(_))
        ));
    }

    #[tokio::test]
    async fn test_vulnerable_circuit_rejected() {
        let rig = rig().await;
        let (root, _) = rig
            .membership
            .register(FeedId([1; 16]), Bytes32([5; 32]), 1)
            .await
            .unwrap();
        let tx = signed_vote(&rig, root, 0);
        assert!(matches!(
            rig.handler.validate_and_cosign(tx).await,
            Err(DomainError::VulnerableCircuit(0))
        ));
    }

    #[tokio::test]
    async fn test_cross_message_nullifier_rejected() {
        let rig = rig().await;
        let (root, _) = rig
            .membership
            .register(FeedId([1; 16]), Bytes32([5; 32]), 1)
            .await
            .unwrap();

        // Record the nullifier against a different message.
        let mut scope = rig.storage.begin_write().await.unwrap();
        scope.upsert_nullifier(shared_types::ReactionNullifier {
            nullifier: Bytes32([3; 32]),
            message_id: FeedMessageId([99; 16]),
            vote: sample_vote(1).to_stored(),
            encrypted_backup: None,
            updated_at: chrono::Utc::now(),
        });
        scope.commit().await.unwrap();

        let tx = signed_vote(&rig, root, 1);
        assert!(matches!(
            rig.handler.validate_and_cosign(tx).await,
            Err(DomainError::NullifierReuseOnOtherMessage)
        ));
    }
}
