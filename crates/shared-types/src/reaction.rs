//! # Reaction Rows
//!
//! Persisted rows of the anonymous reaction subsystem: homomorphic tallies,
//! nullifiers, merkle root history, member commitments, and the audit row
//! kept per reaction transaction.

use crate::{Bytes32, FeedId, FeedMessageId, ProofBytes, Timestamp, EMOJI_SLOTS};
use serde::{Deserialize, Serialize};

/// The six ElGamal ciphertexts of a tally or a single vote, stored as
/// coordinate arrays (each point is an (x, y) pair on Baby JubJub).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyCiphertexts {
    pub c1_x: [Bytes32; EMOJI_SLOTS],
    pub c1_y: [Bytes32; EMOJI_SLOTS],
    pub c2_x: [Bytes32; EMOJI_SLOTS],
    pub c2_y: [Bytes32; EMOJI_SLOTS],
}

/// Per-message reaction tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionTally {
    pub message_id: FeedMessageId,
    pub feed_id: FeedId,
    pub ciphertexts: TallyCiphertexts,
    /// Number of distinct nullifiers recorded against this message.
    pub total_count: u64,
    /// Globally monotonic; allocated as max(existing)+1.
    pub version: u64,
    pub last_updated: Timestamp,
}

/// A recorded nullifier and the vote it currently stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionNullifier {
    pub nullifier: Bytes32,
    pub message_id: FeedMessageId,
    /// The ciphertexts to subtract on a vote change.
    pub vote: TallyCiphertexts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_backup: Option<String>,
    pub updated_at: Timestamp,
}

/// One entry of the append-only merkle root log for a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleRootHistory {
    pub feed_id: FeedId,
    pub merkle_root: Bytes32,
    pub block_index: u64,
    pub created_at: Timestamp,
}

/// A member commitment registered in a feed's membership tree.
///
/// Leaf index equals the rank of `registered_at` within the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMemberCommitment {
    pub feed_id: FeedId,
    pub user_commitment: Bytes32,
    pub registered_at: Timestamp,
}

/// Audit row persisted for every indexed reaction transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionTransactionRecord {
    pub id: crate::TransactionId,
    pub block_index: u64,
    pub feed_id: FeedId,
    pub message_id: FeedMessageId,
    pub nullifier: Bytes32,
    pub ciphertexts: TallyCiphertexts,
    pub zk_proof: ProofBytes,
    pub circuit_version: u32,
    pub created_at: Timestamp,
}
