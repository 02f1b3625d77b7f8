//! # Credential & Identity Store
//!
//! Holds the block-producer signing key and verifies user signatures.
//! Addresses are Ed25519 public keys, so verification needs no directory
//! lookup: the signatory's address *is* the verifying key.
//!
//! Credential material arrives from the configuration loader (an external
//! collaborator); this crate only consumes raw key bytes.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use shared_types::{Address, DomainError, SignatureBytes};
use tracing::debug;

/// Errors constructing an identity from raw bytes.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("producer secret must be 32 bytes of hex")]
    MalformedSecret,
}

/// The block producer's signing identity.
pub struct ProducerIdentity {
    signing_key: SigningKey,
    address: Address,
}

impl ProducerIdentity {
    /// Build from the 32-byte Ed25519 secret.
    #[must_use]
    pub fn from_secret_bytes(secret: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&secret);
        let address = Address(signing_key.verifying_key().to_bytes());
        debug!(producer = %address, "Producer identity loaded");
        Self {
            signing_key,
            address,
        }
    }

    /// Build from a hex-encoded secret, as carried in configuration.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, CredentialError> {
        let bytes = hex::decode(secret_hex).map_err(|_| CredentialError::MalformedSecret)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CredentialError::MalformedSecret)?;
        Ok(Self::from_secret_bytes(arr))
    }

    /// The producer's address (its public key).
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign arbitrary bytes with the producer key.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> SignatureBytes {
        SignatureBytes(self.signing_key.sign(message).to_bytes())
    }

    /// Co-sign a user signature, producing the validator signature carried
    /// by every validated transaction.
    #[must_use]
    pub fn co_sign(&self, user_signature: &SignatureBytes) -> SignatureBytes {
        self.sign(user_signature.as_bytes())
    }

    /// Verify this producer's own signature (used when re-checking
    /// validated transactions read back from storage).
    pub fn verify_own(
        &self,
        message: &[u8],
        signature: &SignatureBytes,
    ) -> Result<(), DomainError> {
        verify_with_key(
            &self.signing_key.verifying_key(),
            message,
            signature,
            DomainError::BadValidatorSignature,
        )
    }
}

/// Verify a signature against the signatory's address.
pub fn verify_address_signature(
    address: &Address,
    message: &[u8],
    signature: &SignatureBytes,
) -> Result<(), DomainError> {
    let key = VerifyingKey::from_bytes(address.as_bytes())
        .map_err(|_| DomainError::BadUserSignature)?;
    verify_with_key(&key, message, signature, DomainError::BadUserSignature)
}

fn verify_with_key(
    key: &VerifyingKey,
    message: &[u8],
    signature: &SignatureBytes,
    on_failure: DomainError,
) -> Result<(), DomainError> {
    let sig = Signature::from_bytes(signature.as_bytes());
    key.verify(message, &sig).map_err(|_| on_failure)
}
