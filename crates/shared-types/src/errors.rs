//! # Domain Errors
//!
//! The error vocabulary shared by every subsystem. Rejections from content
//! handlers surface these to the submitter; indexing failures log them with
//! `(block_index, tx_id, kind)` and never abort block processing.

use crate::{Address, Amount, Bytes32, FeedId, PayloadKind, Token};

/// Domain error kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("unknown payload kind {0}")]
    UnknownPayloadKind(PayloadKind),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("user signature does not verify")]
    BadUserSignature,

    #[error("validator signature does not verify")]
    BadValidatorSignature,

    #[error("insufficient funds for {token}: required {required}, available {available}")]
    InsufficientFunds {
        token: Token,
        required: Amount,
        available: Amount,
    },

    #[error("unknown feed {0}")]
    UnknownFeed(FeedId),

    #[error("address {0} is not a member of feed {1}")]
    NotMember(Address, FeedId),

    #[error("address {0} lacks the required role in feed {1}")]
    UnauthorizedForRole(Address, FeedId),

    #[error("commitment already registered in feed {0}")]
    DuplicateCommitment(FeedId),

    #[error("merkle root {0} is not within the accepted window")]
    UnknownMerkleRoot(Bytes32),

    #[error("zero-knowledge proof failed verification")]
    InvalidProof,

    #[error("proof was produced by a vulnerable circuit version {0}")]
    VulnerableCircuit(u32),

    #[error("nullifier already bound to a different message")]
    NullifierReuseOnOtherMessage,

    #[error("storage conflict: {0}")]
    StorageConflict(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Non-fatal; callers fall through to storage.
    #[error("cache unavailable")]
    CacheUnavailable,

    #[error("operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Short stable name used in structured log fields.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::UnknownPayloadKind(_) => "UnknownPayloadKind",
            Self::MalformedPayload(_) => "MalformedPayload",
            Self::BadUserSignature => "BadUserSignature",
            Self::BadValidatorSignature => "BadValidatorSignature",
            Self::InsufficientFunds { .. } => "InsufficientFunds",
            Self::UnknownFeed(_) => "UnknownFeed",
            Self::NotMember(..) => "NotMember",
            Self::UnauthorizedForRole(..) => "UnauthorizedForRole",
            Self::DuplicateCommitment(_) => "DuplicateCommitment",
            Self::UnknownMerkleRoot(_) => "UnknownMerkleRoot",
            Self::InvalidProof => "InvalidProof",
            Self::VulnerableCircuit(_) => "VulnerableCircuit",
            Self::NullifierReuseOnOtherMessage => "NullifierReuseOnOtherMessage",
            Self::StorageConflict(_) => "StorageConflict",
            Self::StorageUnavailable(_) => "StorageUnavailable",
            Self::CacheUnavailable => "CacheUnavailable",
            Self::Cancelled => "Cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_values() {
        let err = DomainError::InsufficientFunds {
            token: Token::native(),
            required: "10.000000000".parse().unwrap(),
            available: "3.000000000".parse().unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.contains("10.000000000"));
        assert!(msg.contains("3.000000000"));
        assert!(msg.contains("HUSH"));
    }

    #[test]
    fn test_kind_names_are_stable() {
        assert_eq!(DomainError::InvalidProof.kind_name(), "InvalidProof");
        assert_eq!(DomainError::Cancelled.kind_name(), "Cancelled");
    }
}
