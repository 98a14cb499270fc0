//! The messaging-platform boundary.
//!
//! Everything groupwarden does to the outside world goes through the
//! [`Platform`] trait: member lookups, message delivery, membership and role
//! changes. Each call is a suspension point; implementations are free to be
//! network clients or in-process simulations.

mod intent;
mod simulator;

pub use intent::Intent;
pub use simulator::SimulatedPlatform;

#[cfg(test)]
pub use simulator::FIRST_SENT_MESSAGE_ID;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use warden_proto::{
    GroupId, GroupNotice, MemberInfo, MessageId, Segment, StoredMessage, StrangerInfo, UserId,
};

/// Errors returned by platform calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The platform refused the call (missing rights, stale token, ...).
    #[error("{action} rejected: {reason}")]
    Rejected {
        action: &'static str,
        reason: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    /// The platform could not be reached.
    #[error("platform unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for platform calls.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Calls consumed from the messaging platform.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Look up a member. `no_cache` asks the platform to bypass its own cache.
    async fn get_member_info(
        &self,
        group: GroupId,
        user: UserId,
        no_cache: bool,
    ) -> PlatformResult<MemberInfo>;

    async fn get_member_list(&self, group: GroupId) -> PlatformResult<Vec<MemberInfo>>;

    async fn get_stranger_info(&self, user: UserId) -> PlatformResult<StrangerInfo>;

    /// Fetch a message back from history.
    async fn get_message(&self, message: MessageId) -> PlatformResult<StoredMessage>;

    /// Post a message and return its id.
    async fn send_group_message(
        &self,
        group: GroupId,
        segments: Vec<Segment>,
    ) -> PlatformResult<MessageId>;

    async fn delete_message(&self, message: MessageId) -> PlatformResult<()>;

    /// Mute a member. A zero duration lifts the mute.
    async fn set_member_mute(
        &self,
        group: GroupId,
        user: UserId,
        duration: Duration,
    ) -> PlatformResult<()>;

    async fn set_whole_mute(&self, group: GroupId, enable: bool) -> PlatformResult<()>;

    /// Remove a member. `reject_rejoin` also refuses their future requests.
    async fn kick_member(
        &self,
        group: GroupId,
        user: UserId,
        reject_rejoin: bool,
    ) -> PlatformResult<()>;

    async fn set_admin(&self, group: GroupId, user: UserId, enable: bool) -> PlatformResult<()>;

    async fn set_card(&self, group: GroupId, user: UserId, card: &str) -> PlatformResult<()>;

    async fn set_special_title(
        &self,
        group: GroupId,
        user: UserId,
        title: &str,
    ) -> PlatformResult<()>;

    /// Mark or unmark a message as essential.
    async fn set_essence(&self, message: MessageId, enable: bool) -> PlatformResult<()>;

    async fn set_group_name(&self, group: GroupId, name: &str) -> PlatformResult<()>;

    async fn set_group_avatar(&self, group: GroupId, file: &str) -> PlatformResult<()>;

    async fn send_group_notice(&self, group: GroupId, content: &str) -> PlatformResult<()>;

    async fn get_group_notices(&self, group: GroupId) -> PlatformResult<Vec<GroupNotice>>;

    /// Approve or deny a pending join request identified by its flag token.
    async fn resolve_join_request(
        &self,
        flag: &str,
        approve: bool,
        reason: &str,
    ) -> PlatformResult<()>;
}
