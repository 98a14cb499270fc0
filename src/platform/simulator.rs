//! In-process simulated platform.
//!
//! Keeps a roster learned from observed events, stores every message so it
//! can be fetched back, tracks outstanding join-request flags and records
//! each mutating call as an [`Intent`]. The binary runs against it when fed
//! events on stdin; tests use it to assert on emitted intents and to inject
//! failures per action.

use super::{Intent, Platform, PlatformError, PlatformResult};
use crate::access::TrustLevel;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::debug;
use warden_proto::{
    Event, GroupId, GroupNotice, LeaveKind, MemberInfo, MemberRole, MessageId, Segment,
    StoredMessage, StrangerInfo, UserId, plain_text,
};

/// Message ids handed out for messages the bot sends.
pub const FIRST_SENT_MESSAGE_ID: i64 = 1_000_000;

pub struct SimulatedPlatform {
    self_id: UserId,
    /// Role assumed for the bot in groups where it has no explicit record.
    self_role: MemberRole,
    members: DashMap<(GroupId, UserId), MemberInfo>,
    strangers: DashMap<UserId, StrangerInfo>,
    messages: DashMap<MessageId, StoredMessage>,
    notices: DashMap<GroupId, Vec<GroupNotice>>,
    /// Outstanding join requests, consumed on first resolution.
    join_flags: DashMap<String, (GroupId, UserId)>,
    next_message_id: AtomicI64,
    intents: Mutex<Vec<Intent>>,
    failing: Mutex<HashSet<String>>,
    echo: bool,
}

impl SimulatedPlatform {
    pub fn new(self_id: UserId, self_role: MemberRole) -> Self {
        Self {
            self_id,
            self_role,
            members: DashMap::new(),
            strangers: DashMap::new(),
            messages: DashMap::new(),
            notices: DashMap::new(),
            join_flags: DashMap::new(),
            next_message_id: AtomicI64::new(FIRST_SENT_MESSAGE_ID),
            intents: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            echo: false,
        }
    }

    /// Print every recorded intent as one JSON line on stdout.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Learn from an inbound event before it is handled.
    pub fn observe(&self, event: &Event) {
        match event {
            Event::GroupMessage(msg) => {
                let key = (msg.group_id, msg.sender.user_id);
                self.members.insert(
                    key,
                    MemberInfo {
                        group_id: msg.group_id,
                        user_id: msg.sender.user_id,
                        nickname: msg.sender.nickname.clone(),
                        card: msg.sender.card.clone(),
                        role: msg.sender.role,
                    },
                );
                self.messages.insert(
                    msg.message_id,
                    StoredMessage {
                        message_id: msg.message_id,
                        group_id: msg.group_id,
                        sender_id: msg.sender.user_id,
                        segments: msg.segments.clone(),
                    },
                );
            }
            Event::JoinRequest(req) => {
                self.join_flags
                    .insert(req.flag.clone(), (req.group_id, req.user_id));
            }
            Event::MemberLeave(leave) => {
                self.members.remove(&(leave.group_id, leave.user_id));
                if leave.kind == LeaveKind::Kick {
                    debug!(group = %leave.group_id, user = %leave.user_id, "Simulated kick observed");
                }
            }
        }
    }

    #[cfg(test)]
    pub fn add_member(&self, info: MemberInfo) {
        self.members.insert((info.group_id, info.user_id), info);
    }

    #[cfg(test)]
    pub fn add_stranger(&self, info: StrangerInfo) {
        self.strangers.insert(info.user_id, info);
    }

    /// Make every call of `action` fail until [`recover`](Self::recover).
    #[cfg(test)]
    pub fn fail(&self, action: &str) {
        self.failing.lock().insert(action.to_string());
    }

    #[cfg(test)]
    pub fn recover(&self, action: &str) {
        self.failing.lock().remove(action);
    }

    /// All intents recorded so far.
    #[cfg(test)]
    pub fn intents(&self) -> Vec<Intent> {
        self.intents.lock().clone()
    }

    #[cfg(test)]
    pub fn member(&self, group: GroupId, user: UserId) -> Option<MemberInfo> {
        self.members.get(&(group, user)).map(|m| m.clone())
    }

    fn check(&self, action: &'static str) -> PlatformResult<()> {
        if self.failing.lock().contains(action) {
            return Err(PlatformError::Unavailable(format!("{action} is failing")));
        }
        Ok(())
    }

    fn record(&self, intent: Intent) {
        debug!(action = intent.action(), "Intent recorded");
        if self.echo {
            match serde_json::to_string(&intent) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "Failed to encode intent"),
            }
        }
        self.intents.lock().push(intent);
    }

    fn role_of(&self, group: GroupId, user: UserId) -> MemberRole {
        match self.members.get(&(group, user)) {
            Some(member) => member.role,
            None if user == self.self_id => self.self_role,
            None => MemberRole::Unknown,
        }
    }

    fn bot_level(&self, group: GroupId) -> TrustLevel {
        TrustLevel::from(self.role_of(group, self.self_id))
    }

    /// The bot may only touch members strictly below itself, and never
    /// without at least admin rights.
    fn require_outranks(
        &self,
        action: &'static str,
        group: GroupId,
        target: UserId,
    ) -> PlatformResult<()> {
        let bot = self.bot_level(group);
        let target_level = TrustLevel::from(self.role_of(group, target));
        if bot > TrustLevel::Admin || bot >= target_level {
            return Err(PlatformError::Rejected {
                action,
                reason: "insufficient rights".to_string(),
            });
        }
        Ok(())
    }

    fn require_bot(
        &self,
        action: &'static str,
        group: GroupId,
        level: TrustLevel,
    ) -> PlatformResult<()> {
        if self.bot_level(group) > level {
            return Err(PlatformError::Rejected {
                action,
                reason: "insufficient rights".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Platform for SimulatedPlatform {
    async fn get_member_info(
        &self,
        group: GroupId,
        user: UserId,
        _no_cache: bool,
    ) -> PlatformResult<MemberInfo> {
        self.check("get_member_info")?;
        if let Some(member) = self.members.get(&(group, user)) {
            return Ok(member.clone());
        }
        if user == self.self_id {
            return Ok(MemberInfo {
                group_id: group,
                user_id: user,
                nickname: "groupwarden".to_string(),
                card: String::new(),
                role: self.self_role,
            });
        }
        Err(PlatformError::NotFound(format!("member {user} in group {group}")))
    }

    async fn get_member_list(&self, group: GroupId) -> PlatformResult<Vec<MemberInfo>> {
        self.check("get_member_list")?;
        let mut list: Vec<MemberInfo> = self
            .members
            .iter()
            .filter(|entry| entry.key().0 == group)
            .map(|entry| entry.value().clone())
            .collect();
        list.sort_by_key(|m| m.user_id);
        Ok(list)
    }

    async fn get_stranger_info(&self, user: UserId) -> PlatformResult<StrangerInfo> {
        self.check("get_stranger_info")?;
        if let Some(info) = self.strangers.get(&user) {
            return Ok(info.clone());
        }
        self.members
            .iter()
            .find(|entry| entry.key().1 == user)
            .map(|entry| StrangerInfo {
                user_id: user,
                nickname: entry.value().nickname.clone(),
            })
            .ok_or_else(|| PlatformError::NotFound(format!("user {user}")))
    }

    async fn get_message(&self, message: MessageId) -> PlatformResult<StoredMessage> {
        self.check("get_message")?;
        self.messages
            .get(&message)
            .map(|m| m.clone())
            .ok_or_else(|| PlatformError::NotFound(format!("message {message}")))
    }

    async fn send_group_message(
        &self,
        group: GroupId,
        segments: Vec<Segment>,
    ) -> PlatformResult<MessageId> {
        self.check("send_message")?;
        let message_id = MessageId(self.next_message_id.fetch_add(1, Ordering::Relaxed));
        let mentions = segments
            .iter()
            .filter_map(|s| match s {
                Segment::At { user_id } => Some(*user_id),
                _ => None,
            })
            .collect();
        self.record(Intent::SendMessage {
            group_id: group,
            message_id,
            text: plain_text(&segments),
            mentions,
        });
        self.messages.insert(
            message_id,
            StoredMessage {
                message_id,
                group_id: group,
                sender_id: self.self_id,
                segments,
            },
        );
        Ok(message_id)
    }

    async fn delete_message(&self, message: MessageId) -> PlatformResult<()> {
        self.check("delete_message")?;
        if self.messages.remove(&message).is_none() {
            return Err(PlatformError::NotFound(format!("message {message}")));
        }
        self.record(Intent::DeleteMessage {
            message_id: message,
        });
        Ok(())
    }

    async fn set_member_mute(
        &self,
        group: GroupId,
        user: UserId,
        duration: Duration,
    ) -> PlatformResult<()> {
        self.check("mute_member")?;
        self.require_outranks("mute_member", group, user)?;
        self.record(Intent::MuteMember {
            group_id: group,
            user_id: user,
            duration_secs: duration.as_secs(),
        });
        Ok(())
    }

    async fn set_whole_mute(&self, group: GroupId, enable: bool) -> PlatformResult<()> {
        self.check("whole_mute")?;
        self.require_bot("whole_mute", group, TrustLevel::Admin)?;
        self.record(Intent::WholeMute {
            group_id: group,
            enable,
        });
        Ok(())
    }

    async fn kick_member(
        &self,
        group: GroupId,
        user: UserId,
        reject_rejoin: bool,
    ) -> PlatformResult<()> {
        self.check("kick")?;
        self.require_outranks("kick", group, user)?;
        self.members.remove(&(group, user));
        self.record(Intent::Kick {
            group_id: group,
            user_id: user,
            reject_rejoin,
        });
        Ok(())
    }

    async fn set_admin(&self, group: GroupId, user: UserId, enable: bool) -> PlatformResult<()> {
        self.check("set_admin")?;
        self.require_bot("set_admin", group, TrustLevel::Owner)?;
        if let Some(mut member) = self.members.get_mut(&(group, user)) {
            member.role = if enable {
                MemberRole::Admin
            } else {
                MemberRole::Member
            };
        }
        self.record(Intent::SetAdmin {
            group_id: group,
            user_id: user,
            enable,
        });
        Ok(())
    }

    async fn set_card(&self, group: GroupId, user: UserId, card: &str) -> PlatformResult<()> {
        self.check("set_card")?;
        if user != self.self_id {
            self.require_outranks("set_card", group, user)?;
        }
        if let Some(mut member) = self.members.get_mut(&(group, user)) {
            member.card = card.to_string();
        }
        self.record(Intent::SetCard {
            group_id: group,
            user_id: user,
            card: card.to_string(),
        });
        Ok(())
    }

    async fn set_special_title(
        &self,
        group: GroupId,
        user: UserId,
        title: &str,
    ) -> PlatformResult<()> {
        self.check("set_title")?;
        self.require_bot("set_title", group, TrustLevel::Owner)?;
        self.record(Intent::SetTitle {
            group_id: group,
            user_id: user,
            title: title.to_string(),
        });
        Ok(())
    }

    async fn set_essence(&self, message: MessageId, enable: bool) -> PlatformResult<()> {
        self.check("set_essence")?;
        if !self.messages.contains_key(&message) {
            return Err(PlatformError::NotFound(format!("message {message}")));
        }
        self.record(Intent::SetEssence {
            message_id: message,
            enable,
        });
        Ok(())
    }

    async fn set_group_name(&self, group: GroupId, name: &str) -> PlatformResult<()> {
        self.check("set_group_name")?;
        self.require_bot("set_group_name", group, TrustLevel::Admin)?;
        self.record(Intent::SetGroupName {
            group_id: group,
            name: name.to_string(),
        });
        Ok(())
    }

    async fn set_group_avatar(&self, group: GroupId, file: &str) -> PlatformResult<()> {
        self.check("set_group_avatar")?;
        self.require_bot("set_group_avatar", group, TrustLevel::Admin)?;
        self.record(Intent::SetGroupAvatar {
            group_id: group,
            file: file.to_string(),
        });
        Ok(())
    }

    async fn send_group_notice(&self, group: GroupId, content: &str) -> PlatformResult<()> {
        self.check("post_notice")?;
        self.require_bot("post_notice", group, TrustLevel::Admin)?;
        self.notices.entry(group).or_default().push(GroupNotice {
            sender_id: self.self_id,
            published_at: chrono::Utc::now().timestamp(),
            content: content.to_string(),
        });
        self.record(Intent::PostNotice {
            group_id: group,
            content: content.to_string(),
        });
        Ok(())
    }

    async fn get_group_notices(&self, group: GroupId) -> PlatformResult<Vec<GroupNotice>> {
        self.check("get_group_notices")?;
        Ok(self
            .notices
            .get(&group)
            .map(|n| n.clone())
            .unwrap_or_default())
    }

    async fn resolve_join_request(
        &self,
        flag: &str,
        approve: bool,
        reason: &str,
    ) -> PlatformResult<()> {
        self.check("resolve_join_request")?;
        let Some((_, (group, user))) = self.join_flags.remove(flag) else {
            return Err(PlatformError::Rejected {
                action: "resolve_join_request",
                reason: format!("flag {flag} is unknown or already handled"),
            });
        };
        if approve {
            let nickname = self
                .strangers
                .get(&user)
                .map(|s| s.nickname.clone())
                .unwrap_or_default();
            self.members.insert(
                (group, user),
                MemberInfo {
                    group_id: group,
                    user_id: user,
                    nickname,
                    card: String::new(),
                    role: MemberRole::Member,
                },
            );
        }
        self.record(Intent::ResolveJoinRequest {
            flag: flag.to_string(),
            approve,
            reason: reason.to_string(),
        });
        Ok(())
    }
}
