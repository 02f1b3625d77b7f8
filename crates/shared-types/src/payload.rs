//! # Payload Registry
//!
//! Every transaction payload kind has a stable UUID that round-trips through
//! the wire format. Decoding dispatches on the UUID; adding a new kind means
//! adding a payload struct, a registry constant, and an enum variant here —
//! no other component changes.

use crate::{
    Address, Amount, Bytes32, FeedId, FeedMessageId, KeyRotationTrigger, ProofBytes, Token,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::{uuid, Uuid};

/// Stable identifier of a payload schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadKind(pub Uuid);

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Producer-issued block reward.
pub const KIND_REWARD: PayloadKind = PayloadKind(uuid!("e054b791-29ea-42bc-8fcf-f37ea6085ec3"));
/// Transfer of funds between addresses.
pub const KIND_FUNDS_TRANSFER: PayloadKind =
    PayloadKind(uuid!("c3a91f27-6b58-4de2-9b7a-51c08e3f72aa"));
/// Profile registration binding a display name to an address.
pub const KIND_REGISTER_PROFILE: PayloadKind =
    PayloadKind(uuid!("9f8e7d6c-5b4a-4392-8170-fedcba987654"));
/// Creation of a single-owner personal feed.
pub const KIND_NEW_PERSONAL_FEED: PayloadKind =
    PayloadKind(uuid!("70c718a9-41f5-46ea-b1f4-f02aa0084386"));
/// Creation of a two-party chat feed.
pub const KIND_NEW_CHAT_FEED: PayloadKind =
    PayloadKind(uuid!("84d2f0b6-7e19-4c35-a8d4-903b62c51e77"));
/// Creation of a group feed.
pub const KIND_NEW_GROUP_FEED: PayloadKind =
    PayloadKind(uuid!("a1b2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c5d"));
/// A user joining a group feed.
pub const KIND_JOIN_GROUP_FEED: PayloadKind =
    PayloadKind(uuid!("b2c3d4e5-f6a7-4b8c-9d0e-1f2a3b4c5d6e"));
/// An admin adding a member to a group feed.
pub const KIND_ADD_MEMBER_TO_GROUP: PayloadKind =
    PayloadKind(uuid!("d4e5f6a7-b8c9-4d0e-8f1a-2b3c4d5e6f8a"));
/// A member leaving a group feed voluntarily.
pub const KIND_LEAVE_GROUP_FEED: PayloadKind =
    PayloadKind(uuid!("c4d5e6f7-a8b9-4c0d-8e1f-2a3b4c5d6e7f"));
/// An admin banning a member from a group feed.
pub const KIND_BAN_FROM_GROUP: PayloadKind =
    PayloadKind(uuid!("a7b8c9d0-e1f2-4a3b-8c5d-6e7f8a9b0c1d"));
/// An admin lifting a ban.
pub const KIND_UNBAN_FROM_GROUP: PayloadKind =
    PayloadKind(uuid!("b8c9d0e1-f2a3-4b4c-9d6e-7f8a9b0c1d2e"));
/// An admin blocking a member (write suspension).
pub const KIND_BLOCK_MEMBER: PayloadKind =
    PayloadKind(uuid!("e5f6a7b8-c9d0-4e1f-8a3b-4c5d6e7f8b9b"));
/// An admin unblocking a member.
pub const KIND_UNBLOCK_MEMBER: PayloadKind =
    PayloadKind(uuid!("f6a7b8c9-d0e1-4f2a-8b3c-4d5e6f7a8c0c"));
/// An admin promoting a member to admin.
pub const KIND_PROMOTE_TO_ADMIN: PayloadKind =
    PayloadKind(uuid!("c9d0e1f2-a3b4-4c5d-8e6f-7a8b9c0d2f3f"));
/// Rotation of a group feed's symmetric key.
pub const KIND_GROUP_KEY_ROTATION: PayloadKind =
    PayloadKind(uuid!("a3b4c5d6-e7f8-4a9b-8c0d-1e2f3a4b5d7d"));
/// Title change of a group feed.
pub const KIND_UPDATE_GROUP_TITLE: PayloadKind =
    PayloadKind(uuid!("d0e1f2a3-b4c5-4d6e-8f7a-8b9c0d1e2f4a"));
/// Description change of a group feed.
pub const KIND_UPDATE_GROUP_DESCRIPTION: PayloadKind =
    PayloadKind(uuid!("e1f2a3b4-c5d6-4e7f-8a8b-9c0d1e2f3b5b"));
/// Deletion of a group feed.
pub const KIND_DELETE_GROUP_FEED: PayloadKind =
    PayloadKind(uuid!("f2a3b4c5-d6e7-4f8a-9b0c-1d2e3f4a5c6c"));
/// A message posted to a personal or chat feed.
pub const KIND_NEW_FEED_MESSAGE: PayloadKind =
    PayloadKind(uuid!("3309d79b-8465-4a3c-b33f-c44e4a624264"));
/// A message posted to a group feed.
pub const KIND_NEW_GROUP_FEED_MESSAGE: PayloadKind =
    PayloadKind(uuid!("b4c5d6e7-f8a9-4b0c-8d1e-2f3a4b5c6e8e"));
/// An anonymous reaction vote carrying a zero-knowledge proof.
pub const KIND_REACTION_VOTE: PayloadKind =
    PayloadKind(uuid!("0d94f48a-2c73-4e16-9a58-6be10f7d43c9"));

// =============================================================================
// PAYLOADS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPayload {
    pub token: Token,
    pub precision: u32,
    pub amount: Amount,
    /// Recipient of the reward.
    pub to: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundsTransferPayload {
    pub token: Token,
    pub precision: u32,
    pub amount: Amount,
    pub from: Address,
    pub to: Address,
    /// Feed the transfer was initiated from, for timeline rendering.
    pub feed_id: FeedId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterProfilePayload {
    pub address: Address,
    pub display_name: String,
    /// Hex-encoded long-term public key published with the profile.
    pub public_key: Bytes32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPersonalFeedPayload {
    pub feed_id: FeedId,
    pub title: String,
    pub feed_type: crate::FeedType,
    pub encrypted_feed_key: String,
}

/// One participant entry of a chat or group feed creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedParticipantEntry {
    pub feed_id: FeedId,
    pub address: Address,
    pub encrypted_feed_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChatFeedPayload {
    pub feed_id: FeedId,
    pub feed_type: crate::FeedType,
    /// Exactly two participants.
    pub participants: Vec<FeedParticipantEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGroupFeedPayload {
    pub feed_id: FeedId,
    pub title: String,
    pub description: String,
    pub is_public: bool,
    pub participants: Vec<FeedParticipantEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinGroupFeedPayload {
    pub feed_id: FeedId,
    pub user_address: Address,
    /// Present when joining a private group by invitation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMemberToGroupPayload {
    pub feed_id: FeedId,
    pub admin: Address,
    pub new_member: Address,
    pub new_member_encrypt_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveGroupFeedPayload {
    pub feed_id: FeedId,
    pub user_address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanFromGroupPayload {
    pub feed_id: FeedId,
    pub admin: Address,
    pub banned: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbanFromGroupPayload {
    pub feed_id: FeedId,
    pub admin: Address,
    pub unbanned: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMemberPayload {
    pub feed_id: FeedId,
    pub admin: Address,
    pub blocked: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnblockMemberPayload {
    pub feed_id: FeedId,
    pub admin: Address,
    pub unblocked: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoteToAdminPayload {
    pub feed_id: FeedId,
    pub admin: Address,
    pub member: Address,
}

/// One member's re-encrypted key in a rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotatedMemberKey {
    pub member: Address,
    pub encrypted_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupKeyRotationPayload {
    pub feed_id: FeedId,
    pub new_generation: u64,
    pub previous_generation: u64,
    pub valid_from_block: u64,
    pub encrypted_keys: Vec<RotatedMemberKey>,
    pub trigger: KeyRotationTrigger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateGroupTitlePayload {
    pub feed_id: FeedId,
    pub admin: Address,
    pub new_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateGroupDescriptionPayload {
    pub feed_id: FeedId,
    pub admin: Address,
    pub new_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteGroupFeedPayload {
    pub feed_id: FeedId,
    pub admin: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFeedMessagePayload {
    pub message_id: FeedMessageId,
    pub feed_id: FeedId,
    /// Encrypted message content; flows through opaquely.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<FeedMessageId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_generation: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_commitment: Option<Bytes32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGroupFeedMessagePayload {
    pub message_id: FeedMessageId,
    pub feed_id: FeedId,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<FeedMessageId>,
    pub key_generation: u64,
    pub author_commitment: Bytes32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionVotePayload {
    pub message_id: FeedMessageId,
    pub feed_id: FeedId,
    pub proof: ProofBytes,
    pub nullifier: Bytes32,
    /// x-coordinates of the six C1 points.
    pub ciphertext_c1_x: [Bytes32; 6],
    pub ciphertext_c1_y: [Bytes32; 6],
    pub ciphertext_c2_x: [Bytes32; 6],
    pub ciphertext_c2_y: [Bytes32; 6],
    pub merkle_root: Bytes32,
    pub author_commitment: Bytes32,
    pub circuit_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_backup: Option<String>,
}

// =============================================================================
// SUM TYPE
// =============================================================================

/// Tagged union over all payload kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionPayload {
    Reward(RewardPayload),
    FundsTransfer(FundsTransferPayload),
    RegisterProfile(RegisterProfilePayload),
    NewPersonalFeed(NewPersonalFeedPayload),
    NewChatFeed(NewChatFeedPayload),
    NewGroupFeed(NewGroupFeedPayload),
    JoinGroupFeed(JoinGroupFeedPayload),
    AddMemberToGroup(AddMemberToGroupPayload),
    LeaveGroupFeed(LeaveGroupFeedPayload),
    BanFromGroup(BanFromGroupPayload),
    UnbanFromGroup(UnbanFromGroupPayload),
    BlockMember(BlockMemberPayload),
    UnblockMember(UnblockMemberPayload),
    PromoteToAdmin(PromoteToAdminPayload),
    GroupKeyRotation(GroupKeyRotationPayload),
    UpdateGroupTitle(UpdateGroupTitlePayload),
    UpdateGroupDescription(UpdateGroupDescriptionPayload),
    DeleteGroupFeed(DeleteGroupFeedPayload),
    NewFeedMessage(NewFeedMessagePayload),
    NewGroupFeedMessage(NewGroupFeedMessagePayload),
    ReactionVote(Box<ReactionVotePayload>),
}

impl TransactionPayload {
    /// The registry UUID of this payload.
    #[must_use]
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Reward(_) => KIND_REWARD,
            Self::FundsTransfer(_) => KIND_FUNDS_TRANSFER,
            Self::RegisterProfile(_) => KIND_REGISTER_PROFILE,
            Self::NewPersonalFeed(_) => KIND_NEW_PERSONAL_FEED,
            Self::NewChatFeed(_) => KIND_NEW_CHAT_FEED,
            Self::NewGroupFeed(_) => KIND_NEW_GROUP_FEED,
            Self::JoinGroupFeed(_) => KIND_JOIN_GROUP_FEED,
            Self::AddMemberToGroup(_) => KIND_ADD_MEMBER_TO_GROUP,
            Self::LeaveGroupFeed(_) => KIND_LEAVE_GROUP_FEED,
            Self::BanFromGroup(_) => KIND_BAN_FROM_GROUP,
            Self::UnbanFromGroup(_) => KIND_UNBAN_FROM_GROUP,
            Self::BlockMember(_) => KIND_BLOCK_MEMBER,
            Self::UnblockMember(_) => KIND_UNBLOCK_MEMBER,
            Self::PromoteToAdmin(_) => KIND_PROMOTE_TO_ADMIN,
            Self::GroupKeyRotation(_) => KIND_GROUP_KEY_ROTATION,
            Self::UpdateGroupTitle(_) => KIND_UPDATE_GROUP_TITLE,
            Self::UpdateGroupDescription(_) => KIND_UPDATE_GROUP_DESCRIPTION,
            Self::DeleteGroupFeed(_) => KIND_DELETE_GROUP_FEED,
            Self::NewFeedMessage(_) => KIND_NEW_FEED_MESSAGE,
            Self::NewGroupFeedMessage(_) => KIND_NEW_GROUP_FEED_MESSAGE,
            Self::ReactionVote(_) => KIND_REACTION_VOTE,
        }
    }

    /// Encode the payload body as JSON (without the kind tag).
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Reward(p) => serde_json::to_value(p),
            Self::FundsTransfer(p) => serde_json::to_value(p),
            Self::RegisterProfile(p) => serde_json::to_value(p),
            Self::NewPersonalFeed(p) => serde_json::to_value(p),
            Self::NewChatFeed(p) => serde_json::to_value(p),
            Self::NewGroupFeed(p) => serde_json::to_value(p),
            Self::JoinGroupFeed(p) => serde_json::to_value(p),
            Self::AddMemberToGroup(p) => serde_json::to_value(p),
            Self::LeaveGroupFeed(p) => serde_json::to_value(p),
            Self::BanFromGroup(p) => serde_json::to_value(p),
            Self::UnbanFromGroup(p) => serde_json::to_value(p),
            Self::BlockMember(p) => serde_json::to_value(p),
            Self::UnblockMember(p) => serde_json::to_value(p),
            Self::PromoteToAdmin(p) => serde_json::to_value(p),
            Self::GroupKeyRotation(p) => serde_json::to_value(p),
            Self::UpdateGroupTitle(p) => serde_json::to_value(p),
            Self::UpdateGroupDescription(p) => serde_json::to_value(p),
            Self::DeleteGroupFeed(p) => serde_json::to_value(p),
            Self::NewFeedMessage(p) => serde_json::to_value(p),
            Self::NewGroupFeedMessage(p) => serde_json::to_value(p),
            Self::ReactionVote(p) => serde_json::to_value(p),
        }
    }

    /// Decode a payload body against a registry UUID.
    ///
    /// Returns `None` when the kind is not in the registry; the caller maps
    /// that to `UnknownPayloadKind`.
    pub fn from_kind(
        kind: PayloadKind,
        value: serde_json::Value,
    ) -> Option<Result<Self, serde_json::Error>> {
        let decoded = match kind {
            k if k == KIND_REWARD => serde_json::from_value(value).map(Self::Reward),
            k if k == KIND_FUNDS_TRANSFER => serde_json::from_value(value).map(Self::FundsTransfer),
            k if k == KIND_REGISTER_PROFILE => {
                serde_json::from_value(value).map(Self::RegisterProfile)
            }
            k if k == KIND_NEW_PERSONAL_FEED => {
                serde_json::from_value(value).map(Self::NewPersonalFeed)
            }
            k if k == KIND_NEW_CHAT_FEED => serde_json::from_value(value).map(Self::NewChatFeed),
            k if k == KIND_NEW_GROUP_FEED => serde_json::from_value(value).map(Self::NewGroupFeed),
            k if k == KIND_JOIN_GROUP_FEED => {
                serde_json::from_value(value).map(Self::JoinGroupFeed)
            }
            k if k == KIND_ADD_MEMBER_TO_GROUP => {
                serde_json::from_value(value).map(Self::AddMemberToGroup)
            }
            k if k == KIND_LEAVE_GROUP_FEED => {
                serde_json::from_value(value).map(Self::LeaveGroupFeed)
            }
            k if k == KIND_BAN_FROM_GROUP => serde_json::from_value(value).map(Self::BanFromGroup),
            k if k == KIND_UNBAN_FROM_GROUP => {
                serde_json::from_value(value).map(Self::UnbanFromGroup)
            }
            k if k == KIND_BLOCK_MEMBER => serde_json::from_value(value).map(Self::BlockMember),
            k if k == KIND_UNBLOCK_MEMBER => serde_json::from_value(value).map(Self::UnblockMember),
            k if k == KIND_PROMOTE_TO_ADMIN => {
                serde_json::from_value(value).map(Self::PromoteToAdmin)
            }
            k if k == KIND_GROUP_KEY_ROTATION => {
                serde_json::from_value(value).map(Self::GroupKeyRotation)
            }
            k if k == KIND_UPDATE_GROUP_TITLE => {
                serde_json::from_value(value).map(Self::UpdateGroupTitle)
            }
            k if k == KIND_UPDATE_GROUP_DESCRIPTION => {
                serde_json::from_value(value).map(Self::UpdateGroupDescription)
            }
            k if k == KIND_DELETE_GROUP_FEED => {
                serde_json::from_value(value).map(Self::DeleteGroupFeed)
            }
            k if k == KIND_NEW_FEED_MESSAGE => {
                serde_json::from_value(value).map(Self::NewFeedMessage)
            }
            k if k == KIND_NEW_GROUP_FEED_MESSAGE => {
                serde_json::from_value(value).map(Self::NewGroupFeedMessage)
            }
            k if k == KIND_REACTION_VOTE => serde_json::from_value(value)
                .map(|p| Self::ReactionVote(Box::new(p))),
            _ => return None,
        };
        Some(decoded)
    }
}
