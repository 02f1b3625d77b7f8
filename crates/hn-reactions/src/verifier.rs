//! # Groth16 Proof Verifier
//!
//! Verifies reaction proofs over BN254 against versioned verifying keys.
//! Every key version is in one of three states: *current*, *supported*
//! (accepted with a deprecation warning), or *vulnerable* (rejected even
//! when the proof verifies).
//!
//! ## Public inputs
//!
//! 29 field elements, in order: `nullifier`, `c1.x[0..6]`, `c1.y[0..6]`,
//! `c2.x[0..6]`, `c2.y[0..6]`, `message_id`, `feed_pk`, `merkle_root`,
//! `author_commitment`.

use crate::encoding::{fr_from_bytes, fr_from_id};
use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof};
use ark_serialize::CanonicalDeserialize;
use shared_types::payload::ReactionVotePayload;
use shared_types::{DomainError, EMOJI_SLOTS};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Lifecycle state of a circuit version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitVersionState {
    Current,
    Supported,
    Vulnerable,
}

/// Pairing backend, separated so the version-state policy is testable
/// without a trusted setup.
pub trait ProofSystem: Send + Sync {
    /// Whether `proof_bytes` verifies against this key for the inputs.
    fn verify(&self, proof_bytes: &[u8], public_inputs: &[Fr]) -> bool;
}

/// Groth16/BN254 backend over a prepared verifying key.
pub struct Groth16Backend {
    pvk: PreparedVerifyingKey<Bn254>,
}

impl Groth16Backend {
    #[must_use]
    pub fn new(pvk: PreparedVerifyingKey<Bn254>) -> Self {
        Self { pvk }
    }
}

impl ProofSystem for Groth16Backend {
    fn verify(&self, proof_bytes: &[u8], public_inputs: &[Fr]) -> bool {
        let Ok(proof) = Proof::<Bn254>::deserialize_compressed(proof_bytes) else {
            return false;
        };
        Groth16::<Bn254>::verify_proof(&self.pvk, &proof, public_inputs).unwrap_or(false)
    }
}

/// Versioned verifier registry.
pub struct VerifierRegistry {
    versions: HashMap<u32, (CircuitVersionState, Box<dyn ProofSystem>)>,
}

impl VerifierRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            versions: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        version: u32,
        state: CircuitVersionState,
        system: Box<dyn ProofSystem>,
    ) {
        self.versions.insert(version, (state, system));
    }

    /// Assemble the public input vector for a vote.
    #[must_use]
    pub fn public_inputs(payload: &ReactionVotePayload) -> Vec<Fr> {
        let mut inputs = Vec::with_capacity(5 + 4 * EMOJI_SLOTS);
        inputs.push(fr_from_bytes(&payload.nullifier));
        for coords in [
            &payload.ciphertext_c1_x,
            &payload.ciphertext_c1_y,
            &payload.ciphertext_c2_x,
            &payload.ciphertext_c2_y,
        ] {
            for value in coords {
                inputs.push(fr_from_bytes(value));
            }
        }
        inputs.push(fr_from_id(payload.message_id.as_bytes()));
        // The feed's reaction key is bound through the feed identifier.
        inputs.push(fr_from_id(payload.feed_id.as_bytes()));
        inputs.push(fr_from_bytes(&payload.merkle_root));
        inputs.push(fr_from_bytes(&payload.author_commitment));
        inputs
    }

    /// Verify a vote's proof under the version it names.
    pub fn verify(&self, payload: &ReactionVotePayload) -> Result<(), DomainError> {
        let Some((state, system)) = self.versions.get(&payload.circuit_version) else {
            warn!(version = payload.circuit_version, "Unknown circuit version");
            return Err(DomainError::InvalidProof);
        };

        let inputs = Self::public_inputs(payload);
        if !system.verify(payload.proof.as_slice(), &inputs) {
            return Err(DomainError::InvalidProof);
        }

        match state {
            CircuitVersionState::Current => Ok(()),
            CircuitVersionState::Supported => {
                warn!(
                    version = payload.circuit_version,
                    "Proof from deprecated circuit version accepted"
                );
                Ok(())
            }
            CircuitVersionState::Vulnerable => {
                debug!(
                    version = payload.circuit_version,
                    "Proof verified against vulnerable circuit; rejected"
                );
                Err(DomainError::VulnerableCircuit(payload.circuit_version))
            }
        }
    }
}

impl Default for VerifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}
