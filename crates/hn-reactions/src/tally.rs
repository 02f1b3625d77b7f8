//! # Homomorphic Tally & Nullifier Store
//!
//! Per message, six ElGamal ciphertexts aggregated additively. The
//! nullifier store decides what a vote means:
//!
//! - unseen nullifier, no tally → first vote: store the vote ciphertexts,
//!   `total_count = 1`
//! - unseen nullifier, tally exists → new voter: `tally ⊕ vote`,
//!   `total_count += 1`
//! - seen nullifier on the same message → vote change:
//!   `tally ⊖ old ⊕ new`, `total_count` unchanged
//! - seen nullifier on a different message → rejected
//!
//! All three mutating paths run under the message's stripe lock; the
//! global `version` is allocated as `max(existing) + 1` under a dedicated
//! allocation lock inside the critical section.

use crate::elgamal::VoteCiphertexts;
use hn_storage::{ReadScope as _, SharedStorage, WriteScope as _};
use shared_bus::{EventPublisher, InMemoryEventBus, NodeEvent};
use shared_types::payload::ReactionVotePayload;
use shared_types::{
    DomainError, FeedMessageId, ReactionNullifier, ReactionTally, ReactionTransactionRecord,
    TransactionId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// What a processed vote did to the tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallyOutcome {
    Created { version: u64 },
    NewVoter { version: u64 },
    VoteChanged { version: u64 },
}

/// Component G.3 + G.4: nullifier store and tally updates.
pub struct TallyService {
    storage: SharedStorage,
    bus: Arc<InMemoryEventBus>,
    /// Key-striped per-message locks; cross-message updates run in
    /// parallel. Valid because this node is the sole writer.
    message_locks: parking_lot::Mutex<HashMap<FeedMessageId, Arc<Mutex<()>>>>,
    /// Serialises `max(existing) + 1` version allocation.
    version_lock: Mutex<()>,
}

impl TallyService {
    #[must_use]
    pub fn new(storage: SharedStorage, bus: Arc<InMemoryEventBus>) -> Self {
        Self {
            storage,
            bus,
            message_locks: parking_lot::Mutex::new(HashMap::new()),
            version_lock: Mutex::new(()),
        }
    }

    fn message_lock(&self, message_id: FeedMessageId) -> Arc<Mutex<()>> {
        Arc::clone(
            self.message_locks
                .lock()
                .entry(message_id)
                .or_default(),
        )
    }

    /// Apply one validated reaction vote.
    pub async fn apply_vote(
        &self,
        block_index: u64,
        tx_id: TransactionId,
        payload: &ReactionVotePayload,
    ) -> Result<TallyOutcome, DomainError> {
        let vote = VoteCiphertexts::from_stored(&shared_types::TallyCiphertexts {
            c1_x: payload.ciphertext_c1_x,
            c1_y: payload.ciphertext_c1_y,
            c2_x: payload.ciphertext_c2_x,
            c2_y: payload.ciphertext_c2_y,
        })?;

        let lock = self.message_lock(payload.message_id);
        let _guard = lock.lock().await;

        let read = self.storage.read().await?;
        let known_nullifier = read.nullifier(payload.nullifier).await?;
        let existing_tally = read.tally(payload.message_id).await?;
        drop(read);

        if let Some(ref record) = known_nullifier {
            if record.message_id != payload.message_id {
                return Err(DomainError::NullifierReuseOnOtherMessage);
            }
        }

        let now = hn_storage::now();
        let version = self.next_version().await?;

        let (ciphertexts, total_count, outcome) = match (known_nullifier, existing_tally) {
            (None, None) => (vote, 1, TallyOutcome::Created { version }),
            (None, Some(tally)) => {
                let current = VoteCiphertexts::from_stored(&tally.ciphertexts)?;
                (
                    current.add(&vote),
                    tally.total_count + 1,
                    TallyOutcome::NewVoter { version },
                )
            }
            (Some(record), Some(tally)) => {
                let current = VoteCiphertexts::from_stored(&tally.ciphertexts)?;
                let previous = VoteCiphertexts::from_stored(&record.vote)?;
                (
                    current.sub(&previous).add(&vote),
                    tally.total_count,
                    TallyOutcome::VoteChanged { version },
                )
            }
            (Some(_), None) => {
                // A recorded nullifier without a tally row cannot happen
                // through this service.
                return Err(DomainError::StorageConflict(
                    "nullifier recorded without tally".to_string(),
                ));
            }
        };

        let mut scope = self.storage.begin_write().await?;
        scope.upsert_tally(ReactionTally {
            message_id: payload.message_id,
            feed_id: payload.feed_id,
            ciphertexts: ciphertexts.to_stored(),
            total_count,
            version,
            last_updated: now,
        });
        scope.upsert_nullifier(ReactionNullifier {
            nullifier: payload.nullifier,
            message_id: payload.message_id,
            vote: vote.to_stored(),
            encrypted_backup: payload.encrypted_backup.clone(),
            updated_at: now,
        });
        scope.insert_reaction_record(ReactionTransactionRecord {
            id: tx_id,
            block_index,
            feed_id: payload.feed_id,
            message_id: payload.message_id,
            nullifier: payload.nullifier,
            ciphertexts: vote.to_stored(),
            zk_proof: payload.proof.clone(),
            circuit_version: payload.circuit_version,
            created_at: now,
        });
        scope.commit().await?;

        debug!(message_id = %payload.message_id, version, ?outcome, "Tally updated");
        let event = match outcome {
            TallyOutcome::Created { version } => NodeEvent::ReactionTallyCreated {
                message_id: payload.message_id,
                version,
            },
            TallyOutcome::NewVoter { version } | TallyOutcome::VoteChanged { version } => {
                NodeEvent::ReactionTallyUpdated {
                    message_id: payload.message_id,
                    version,
                }
            }
        };
        self.bus.publish(event).await;
        Ok(outcome)
    }

    async fn next_version(&self) -> Result<u64, DomainError> {
        let _guard = self.version_lock.lock().await;
        let read = self.storage.read().await?;
        Ok(read.max_tally_version().await? + 1)
    }

    /// Incremental sync: tallies with `version > since_version` for the
    /// given feeds, ascending, at most 1000.
    pub async fn tallies_since(
        &self,
        feed_ids: &[shared_types::FeedId],
        since_version: u64,
    ) -> Result<Vec<ReactionTally>, DomainError> {
        let read = self.storage.read().await?;
        read.tallies_since(feed_ids, since_version).await
    }
}
