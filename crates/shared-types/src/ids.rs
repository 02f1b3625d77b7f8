//! # Opaque Identifiers
//!
//! All entity identifiers are opaque 128-bit values serialized as canonical
//! lower-case hex strings. Equality is by value; generation is random.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; 16]);

        impl $name {
            /// The all-zero identifier (used where "no value" is meaningful,
            /// e.g. the genesis block's previous pointer).
            pub const EMPTY: Self = Self([0u8; 16]);

            /// Generate a fresh random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(*uuid::Uuid::new_v4().as_bytes())
            }

            #[must_use]
            pub fn as_bytes(&self) -> &[u8; 16] {
                &self.0
            }

            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0 == [0u8; 16]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = hex::FromHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = hex::decode(s)?;
                let arr: [u8; 16] = bytes
                    .try_into()
                    .map_err(|_| hex::FromHexError::InvalidStringLength)?;
                Ok(Self(arr))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

define_id!(
    /// Identifier of a committed block.
    BlockId
);
define_id!(
    /// Identifier of the single chain-state row.
    BlockchainStateId
);
define_id!(
    /// Identifier of a feed (personal, chat, or group).
    FeedId
);
define_id!(
    /// Identifier of a message within a feed.
    FeedMessageId
);
define_id!(
    /// Identifier of a transaction, assigned at creation.
    TransactionId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_is_unique() {
        let mut seen = HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(TransactionId::generate()));
        }
    }

    #[test]
    fn test_hex_round_trip() {
        let id = FeedId::generate();
        let s = id.to_string();
        assert_eq!(s.len(), 32);
        assert_eq!(s, s.to_lowercase());
        assert_eq!(s.parse::<FeedId>().unwrap(), id);
    }

    #[test]
    fn test_empty_id() {
        assert!(BlockId::EMPTY.is_empty());
        assert!(!BlockId::generate().is_empty());
    }

    #[test]
    fn test_serde_is_hex_string() {
        let id = BlockId([0xFF; 16]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "ff".repeat(16)));
        let back: BlockId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!("ff".parse::<BlockId>().is_err());
        assert!("zz".repeat(16).parse::<BlockId>().is_err());
    }
}
