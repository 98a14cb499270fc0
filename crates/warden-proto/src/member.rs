//! Member and message records returned by platform lookups.

use crate::id::{GroupId, MessageId, UserId};
use crate::segment::Segment;
use serde::{Deserialize, Serialize};

/// A member's role as reported by the platform.
///
/// Platforms occasionally report roles this crate does not know about (or
/// none at all); those decode as [`MemberRole::Unknown`] instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// Group owner.
    Owner,
    /// Group administrator.
    Admin,
    /// Ordinary member.
    Member,
    /// Anything else, including a missing role.
    #[default]
    #[serde(other)]
    Unknown,
}

impl MemberRole {
    /// The wire name of this role.
    pub fn as_str(self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
            MemberRole::Unknown => "unknown",
        }
    }
}

/// A group member as seen by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    /// The group this record belongs to.
    pub group_id: GroupId,
    /// The member.
    pub user_id: UserId,
    /// Account nickname.
    #[serde(default)]
    pub nickname: String,
    /// In-group display name, empty when unset.
    #[serde(default)]
    pub card: String,
    /// Role within the group.
    #[serde(default)]
    pub role: MemberRole,
}

impl MemberInfo {
    /// The name other members see: the card if set, otherwise the nickname.
    pub fn display_name(&self) -> &str {
        if self.card.is_empty() {
            &self.nickname
        } else {
            &self.card
        }
    }
}

/// Public profile of an account that is not necessarily a group member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrangerInfo {
    /// The account.
    pub user_id: UserId,
    /// Account nickname.
    #[serde(default)]
    pub nickname: String,
}

/// A message fetched back from the platform's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// The message id.
    pub message_id: MessageId,
    /// The group it was posted in.
    pub group_id: GroupId,
    /// Who posted it.
    pub sender_id: UserId,
    /// Its content.
    pub segments: Vec<Segment>,
}

/// A group announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupNotice {
    /// Who published it.
    pub sender_id: UserId,
    /// Unix timestamp (seconds) of publication.
    pub published_at: i64,
    /// Announcement text.
    pub content: String,
}
