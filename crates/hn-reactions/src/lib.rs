//! # Anonymous Reaction Subsystem
//!
//! Zero-knowledge anonymous reactions: per-feed membership trees with
//! Poseidon-hashed commitments, Groth16 proof verification over BN254,
//! a nullifier store for vote-uniqueness, and additively-homomorphic
//! ElGamal tallies on Baby JubJub.
//!
//! ## Sub-components
//!
//! - [`membership`] — commitment registry, merkle roots, grace window
//! - [`verifier`] — versioned Groth16 verification
//! - [`tally`] — nullifier store and homomorphic tally updates
//! - [`curve`] / [`poseidon`] / [`elgamal`] — the underlying arithmetic
//!
//! The subsystem plugs into the rest of the node through
//! [`handler::ReactionVoteHandler`] (mempool validation) and the two
//! index strategies in [`strategies`].

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod curve;
pub mod elgamal;
pub mod encoding;
pub mod grain;
pub mod handler;
pub mod identity;
pub mod membership;
pub mod poseidon;
pub mod strategies;
pub mod tally;
pub mod verifier;

pub use curve::Point;
pub use elgamal::{Ciphertext, VoteCiphertexts};
pub use handler::ReactionVoteHandler;
pub use identity::{commitment, nullifier};
pub use membership::{MembershipConfig, MembershipProof, MembershipService};
pub use strategies::{MembershipRegistrationStrategy, ReactionVoteStrategy};
pub use tally::{TallyOutcome, TallyService};
pub use verifier::{CircuitVersionState, Groth16Backend, ProofSystem, VerifierRegistry};
