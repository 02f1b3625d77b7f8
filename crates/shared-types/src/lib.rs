//! # Shared Types - Core Domain Entities
//!
//! Defines the entities that flow between HushNode subsystems: opaque
//! identifiers, fixed-precision amounts, the transaction lifecycle, the
//! payload-kind registry, blocks and chain state, and the query-serving
//! projections (balances, feeds, messages, reaction tallies).
//!
//! ## Clusters
//!
//! - **Identity**: `Address`, `Bytes32`, `SignatureBytes`
//! - **Chain**: `Block`, `BlockchainState`, transaction lifecycle
//! - **Payloads**: `PayloadKind`, `TransactionPayload` and per-kind structs
//! - **Projections**: `AddressBalance`, `Feed`, `FeedMessage`, reaction rows

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod amount;
pub mod balance;
pub mod block;
pub mod common;
pub mod errors;
pub mod feed;
pub mod ids;
pub mod payload;
pub mod reaction;
pub mod transaction;

pub use amount::Amount;
pub use balance::{AddressBalance, BalanceRecord};
pub use block::{Block, BlockchainState};
pub use common::{Address, Bytes32, ProofBytes, SignatureBytes, Timestamp, Token};
pub use errors::DomainError;
pub use feed::{
    Feed, FeedMessage, FeedParticipant, FeedType, GroupFeedKeyGeneration, KeyRotationTrigger,
    MemberEncryptedKey, ParticipantRole, Profile,
};
pub use ids::{BlockId, BlockchainStateId, FeedId, FeedMessageId, TransactionId};
pub use payload::{PayloadKind, TransactionPayload};
pub use reaction::{
    FeedMemberCommitment, MerkleRootHistory, ReactionNullifier, ReactionTally,
    ReactionTransactionRecord, TallyCiphertexts,
};
pub use transaction::{
    SignedTransaction, Transaction, TransactionState, UnsignedTransaction, UserSignature,
    ValidatedTransaction, ValidatorSignature,
};

/// Number of fractional digits carried by every [`Amount`].
pub const AMOUNT_PRECISION: u32 = 9;

/// Number of emoji slots in a reaction tally.
pub const EMOJI_SLOTS: usize = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision() {
        assert_eq!(AMOUNT_PRECISION, 9);
    }

    #[test]
    fn test_emoji_slots() {
        assert_eq!(EMOJI_SLOTS, 6);
    }
}
