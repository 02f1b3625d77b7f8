//! # Transaction Lifecycle
//!
//! A transaction progresses `Unsigned → Signed(by user) → Validated(by
//! producer)`; regressing is impossible because each state is a distinct
//! type and promotion consumes the prior state. The wire envelope is a JSON
//! object tagged by `payload_kind` and `state`.

use crate::{
    Address, Bytes32, DomainError, PayloadKind, SignatureBytes, Timestamp, TransactionId,
    TransactionPayload,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A user's signature over a transaction's signing bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSignature {
    pub signatory: Address,
    pub signature: SignatureBytes,
}

/// The producer's co-signature over the user signature bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSignature {
    pub validator: Address,
    pub signature: SignatureBytes,
}

/// Lifecycle tag carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionState {
    Signed,
    Validated,
}

/// A transaction before the author has signed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub id: TransactionId,
    pub timestamp: Timestamp,
    pub payload: TransactionPayload,
}

impl UnsignedTransaction {
    #[must_use]
    pub fn new(timestamp: Timestamp, payload: TransactionPayload) -> Self {
        Self {
            id: TransactionId::generate(),
            timestamp,
            payload,
        }
    }

    /// Canonical bytes the user signs: id, kind, timestamp, payload JSON.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        signing_bytes(self.id, self.payload.kind(), &self.timestamp, &self.payload)
    }

    /// Attach the user signature, promoting to [`SignedTransaction`].
    #[must_use]
    pub fn into_signed(self, user_signature: UserSignature) -> SignedTransaction {
        SignedTransaction {
            id: self.id,
            timestamp: self.timestamp,
            payload: self.payload,
            user_signature,
        }
    }
}

/// A user-signed transaction, as submitted to the mempool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub id: TransactionId,
    pub timestamp: Timestamp,
    pub payload: TransactionPayload,
    pub user_signature: UserSignature,
}

impl SignedTransaction {
    #[must_use]
    pub fn payload_kind(&self) -> PayloadKind {
        self.payload.kind()
    }

    /// The bytes covered by the user signature.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        signing_bytes(self.id, self.payload.kind(), &self.timestamp, &self.payload)
    }

    /// SHA-256 digest of the signing bytes; used in block hashing.
    pub fn digest(&self) -> Result<Bytes32, serde_json::Error> {
        Ok(digest_of(&self.signing_bytes()?))
    }

    /// Attach the producer co-signature, promoting to [`ValidatedTransaction`].
    #[must_use]
    pub fn into_validated(self, validator_signature: ValidatorSignature) -> ValidatedTransaction {
        ValidatedTransaction {
            id: self.id,
            timestamp: self.timestamp,
            payload: self.payload,
            user_signature: self.user_signature,
            validator_signature,
        }
    }
}

/// A producer-co-signed transaction, eligible for block inclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTransaction {
    pub id: TransactionId,
    pub timestamp: Timestamp,
    pub payload: TransactionPayload,
    pub user_signature: UserSignature,
    pub validator_signature: ValidatorSignature,
}

impl ValidatedTransaction {
    #[must_use]
    pub fn payload_kind(&self) -> PayloadKind {
        self.payload.kind()
    }

    pub fn signing_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        signing_bytes(self.id, self.payload.kind(), &self.timestamp, &self.payload)
    }

    pub fn digest(&self) -> Result<Bytes32, serde_json::Error> {
        Ok(digest_of(&self.signing_bytes()?))
    }
}

fn signing_bytes(
    id: TransactionId,
    kind: PayloadKind,
    timestamp: &Timestamp,
    payload: &TransactionPayload,
) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = Vec::with_capacity(128);
    bytes.extend_from_slice(id.as_bytes());
    bytes.extend_from_slice(kind.0.as_bytes());
    bytes.extend_from_slice(timestamp.to_rfc3339().as_bytes());
    bytes.extend_from_slice(serde_json::to_vec(&payload.to_value()?)?.as_slice());
    Ok(bytes)
}

fn digest_of(bytes: &[u8]) -> Bytes32 {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Bytes32(hasher.finalize().into())
}

// =============================================================================
// WIRE ENVELOPE
// =============================================================================

/// A transaction in either wire state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Signed(SignedTransaction),
    Validated(ValidatedTransaction),
}

impl Transaction {
    #[must_use]
    pub fn id(&self) -> TransactionId {
        match self {
            Self::Signed(tx) => tx.id,
            Self::Validated(tx) => tx.id,
        }
    }

    #[must_use]
    pub fn state(&self) -> TransactionState {
        match self {
            Self::Signed(_) => TransactionState::Signed,
            Self::Validated(_) => TransactionState::Validated,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireTransaction {
    id: TransactionId,
    payload_kind: PayloadKind,
    state: TransactionState,
    timestamp: Timestamp,
    user_signature: UserSignature,
    #[serde(skip_serializing_if = "Option::is_none")]
    validator_signature: Option<ValidatorSignature>,
    payload: serde_json::Value,
}

impl Transaction {
    /// Encode to the JSON wire envelope.
    pub fn to_wire(&self) -> Result<serde_json::Value, serde_json::Error> {
        let (id, timestamp, payload, user_signature, validator_signature) = match self {
            Self::Signed(tx) => (tx.id, tx.timestamp, &tx.payload, &tx.user_signature, None),
            Self::Validated(tx) => (
                tx.id,
                tx.timestamp,
                &tx.payload,
                &tx.user_signature,
                Some(tx.validator_signature.clone()),
            ),
        };
        serde_json::to_value(WireTransaction {
            id,
            payload_kind: payload.kind(),
            state: self.state(),
            timestamp,
            user_signature: user_signature.clone(),
            validator_signature,
            payload: payload.to_value()?,
        })
    }

    /// Decode from the JSON wire envelope, dispatching on `payload_kind`.
    pub fn from_wire(value: serde_json::Value) -> Result<Self, DomainError> {
        let wire: WireTransaction = serde_json::from_value(value)
            .map_err(|e| DomainError::MalformedPayload(e.to_string()))?;
        let payload = TransactionPayload::from_kind(wire.payload_kind, wire.payload)
            .ok_or(DomainError::UnknownPayloadKind(wire.payload_kind))?
            .map_err(|e| DomainError::MalformedPayload(e.to_string()))?;
        match (wire.state, wire.validator_signature) {
            (TransactionState::Signed, _) => Ok(Self::Signed(SignedTransaction {
                id: wire.id,
                timestamp: wire.timestamp,
                payload,
                user_signature: wire.user_signature,
            })),
            (TransactionState::Validated, Some(validator_signature)) => {
                Ok(Self::Validated(ValidatedTransaction {
                    id: wire.id,
                    timestamp: wire.timestamp,
                    payload,
                    user_signature: wire.user_signature,
                    validator_signature,
                }))
            }
            (TransactionState::Validated, None) => Err(DomainError::MalformedPayload(
                "validated transaction without validator signature".to_string(),
            )),
        }
    }
}
