//! # Commitments and Nullifiers
//!
//! A commitment is a public, un-linkable stand-in for a user in a feed's
//! membership tree; a nullifier reveals vote-uniqueness without revealing
//! identity. Both are Poseidon outputs over the BN254 scalar field.

use crate::encoding::{fr_from_bytes, fr_from_id, fr_to_bytes};
use crate::poseidon::{hash2, hash4};
use ark_bn254::Fr;
use ark_ff::Zero;
use shared_types::{Bytes32, FeedId, FeedMessageId};

/// Domain tag bound into every reaction nullifier.
pub const NULLIFIER_DOMAIN: u64 = 1;

/// `Poseidon(user_secret)` — the membership-tree leaf for a user.
#[must_use]
pub fn commitment(user_secret: &Bytes32) -> Bytes32 {
    fr_to_bytes(&hash2(fr_from_bytes(user_secret), Fr::zero()))
}

/// `Poseidon(user_secret, message_id, feed_id, domain)` — one per
/// (user, message) pair.
#[must_use]
pub fn nullifier(
    user_secret: &Bytes32,
    message_id: &FeedMessageId,
    feed_id: &FeedId,
) -> Bytes32 {
    fr_to_bytes(&hash4(
        fr_from_bytes(user_secret),
        fr_from_id(message_id.as_bytes()),
        fr_from_id(feed_id.as_bytes()),
        Fr::from(NULLIFIER_DOMAIN),
    ))
}
