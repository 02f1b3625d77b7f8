//! # Feed Projections
//!
//! Query-serving rows for feeds, participants, messages, group key
//! generations, and profiles. These are mutated only by the indexing
//! pipeline and read by everything else.

use crate::{Address, Bytes32, FeedId, FeedMessageId, Timestamp};
use serde::{Deserialize, Serialize};

/// Kind of a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedType {
    /// Single-owner feed.
    Personal,
    /// Exactly two participants.
    Chat,
    /// Many participants with roles and key generations.
    Group,
}

/// Role of a participant within a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticipantRole {
    Owner,
    Admin,
    Member,
    Guest,
    /// Write-suspended; retains read access and stays in the key set.
    Blocked,
    /// Removed from the eligible-member set from the banning block onward.
    Banned,
}

impl ParticipantRole {
    /// Whether this role may administer the feed.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// Whether this role may post messages.
    #[must_use]
    pub fn can_post(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin | Self::Member)
    }

    /// Whether this role receives keys on rotation.
    #[must_use]
    pub fn in_key_set(&self) -> bool {
        !matches!(self, Self::Banned)
    }
}

/// A feed row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub feed_id: FeedId,
    pub title: String,
    pub feed_type: FeedType,
    pub description: String,
    pub is_public: bool,
    pub created_at_block: u64,
    /// Monotonic; meaningful for group feeds only.
    pub current_key_generation: u64,
}

/// A participant row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedParticipant {
    pub feed_id: FeedId,
    pub participant_address: Address,
    pub role: ParticipantRole,
    pub encrypted_feed_key: String,
    pub key_generation: u64,
}

/// A message row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMessage {
    pub message_id: FeedMessageId,
    pub feed_id: FeedId,
    pub encrypted_content: String,
    pub author_address: Address,
    pub timestamp: Timestamp,
    pub block_index: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<FeedMessageId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_generation: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_commitment: Option<Bytes32>,
}

/// Why a group key was rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyRotationTrigger {
    Join,
    Leave,
    Ban,
    Unban,
    Manual,
}

/// One member's encrypted key for one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberEncryptedKey {
    pub member: Address,
    pub encrypted_key: String,
}

/// One rotation of a group feed's symmetric key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFeedKeyGeneration {
    pub feed_id: FeedId,
    pub generation: u64,
    pub valid_from_block: u64,
    pub trigger: KeyRotationTrigger,
    /// One entry per eligible member at rotation time.
    pub encrypted_keys: Vec<MemberEncryptedKey>,
}

/// A registered user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub address: Address,
    pub display_name: String,
    pub public_key: Bytes32,
    pub registered_at_block: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_capabilities() {
        assert!(ParticipantRole::Owner.is_admin());
        assert!(ParticipantRole::Admin.is_admin());
        assert!(!ParticipantRole::Member.is_admin());

        assert!(ParticipantRole::Member.can_post());
        assert!(!ParticipantRole::Blocked.can_post());
        assert!(!ParticipantRole::Banned.can_post());
        assert!(!ParticipantRole::Guest.can_post());
    }

    #[test]
    fn test_blocked_stays_in_key_set_banned_does_not() {
        assert!(ParticipantRole::Blocked.in_key_set());
        assert!(!ParticipantRole::Banned.in_key_set());
    }

    #[test]
    fn test_feed_serde_round_trip() {
        let feed = Feed {
            feed_id: FeedId::generate(),
            title: "engineering".into(),
            feed_type: FeedType::Group,
            description: String::new(),
            is_public: false,
            created_at_block: 12,
            current_key_generation: 3,
        };
        let json = serde_json::to_string(&feed).unwrap();
        let back: Feed = serde_json::from_str(&json).unwrap();
        assert_eq!(back, feed);
    }
}
