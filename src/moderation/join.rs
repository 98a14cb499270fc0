//! Join-request screening.
//!
//! Each group has a list of accept keywords; the blacklist holds applicants
//! per group but is checked across all groups. Both are loaded from the
//! database at startup and written through on every change: the database
//! row goes first and the in-memory view only follows a successful write.

use super::notification::{JoinNotice, NoticeError};
use crate::db::{Database, DbError};
use crate::error::CommandError;
use crate::metrics;
use crate::platform::{Platform, PlatformError};
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use warden_proto::{GroupId, JoinRequest, MessageId, Segment, StoredMessage, UserId};

/// Outcome of screening one join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    AutoApprove,
    AutoReject { reason: String },
    /// Left to an operator; a notice was (or should be) posted.
    Escalate,
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::AutoApprove => "approve",
            Decision::AutoReject { .. } => "reject",
            Decision::Escalate => "escalate",
        }
    }
}

fn normalize(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

pub struct JoinRequestEngine {
    db: Database,
    platform: Arc<dyn Platform>,
    self_id: UserId,
    reject_reason: String,
    keywords: DashMap<GroupId, Vec<String>>,
    blacklist: DashMap<GroupId, BTreeSet<UserId>>,
}

impl JoinRequestEngine {
    /// Build the engine from the rules stored in `db`.
    pub async fn load(
        db: Database,
        platform: Arc<dyn Platform>,
        self_id: UserId,
        reject_reason: impl Into<String>,
    ) -> Result<Self, DbError> {
        let keywords: DashMap<GroupId, Vec<String>> = DashMap::new();
        let blacklist: DashMap<GroupId, BTreeSet<UserId>> = DashMap::new();

        let repo = db.join_rules();
        let stored_keywords = repo.keywords().await?;
        let stored_blacklist = repo.blacklist().await?;
        let (keyword_count, blacklist_count) = (stored_keywords.len(), stored_blacklist.len());

        for (group, keyword) in stored_keywords {
            keywords.entry(group).or_default().push(keyword);
        }
        for (group, user) in stored_blacklist {
            blacklist.entry(group).or_default().insert(user);
        }

        info!(
            keywords = keyword_count,
            blacklisted = blacklist_count,
            "Join rules loaded"
        );

        Ok(Self {
            db,
            platform,
            self_id,
            reject_reason: reject_reason.into(),
            keywords,
            blacklist,
        })
    }

    /// Blacklisted in any group.
    pub fn is_blacklisted(&self, user: UserId) -> bool {
        self.blacklist.iter().any(|entry| entry.value().contains(&user))
    }

    /// Screen a request without side effects.
    ///
    /// The blacklist is consulted first, then the group's keywords as
    /// case-insensitive substrings of the comment.
    pub fn decide(&self, group: GroupId, user: UserId, comment: &str) -> Decision {
        if self.is_blacklisted(user) {
            return Decision::AutoReject {
                reason: self.reject_reason.clone(),
            };
        }

        let comment = comment.to_lowercase();
        let matched = self
            .keywords
            .get(&group)
            .is_some_and(|kw| kw.iter().any(|k| comment.contains(&normalize(k))));

        if matched {
            Decision::AutoApprove
        } else {
            Decision::Escalate
        }
    }

    /// Screen a request and act on the decision.
    ///
    /// Auto decisions resolve the request on the platform. Escalation posts
    /// the notice and nothing else.
    pub async fn on_join_request(&self, request: &JoinRequest) -> Result<Decision, PlatformError> {
        let decision = self.decide(request.group_id, request.user_id, &request.comment);
        info!(
            group = %request.group_id,
            user = %request.user_id,
            decision = decision.label(),
            "Join request screened"
        );
        metrics::record_join_decision(decision.label());

        match &decision {
            Decision::AutoApprove => {
                self.platform
                    .resolve_join_request(&request.flag, true, "")
                    .await?;
            }
            Decision::AutoReject { reason } => {
                self.platform
                    .resolve_join_request(&request.flag, false, reason)
                    .await?;
            }
            Decision::Escalate => {
                let nickname = match self.platform.get_stranger_info(request.user_id).await {
                    Ok(info) => info.nickname,
                    Err(e) => {
                        debug!(user = %request.user_id, error = %e, "Stranger lookup failed");
                        String::new()
                    }
                };
                let notice = JoinNotice {
                    nickname,
                    user_id: request.user_id,
                    flag: request.flag.clone(),
                    comment: request.comment.clone(),
                };
                self.platform
                    .send_group_message(request.group_id, vec![Segment::text(notice.render())])
                    .await?;
            }
        }

        Ok(decision)
    }

    /// A voluntary departure blacklists the member. Repeats are harmless.
    pub async fn on_member_leave(&self, group: GroupId, user: UserId) -> Result<bool, DbError> {
        let added = self.add_blacklist(group, user).await?;
        if added {
            info!(group = %group, user = %user, "Departed member blacklisted");
        }
        Ok(added)
    }

    /// Resolve the request described by `notice_message`, which must be a
    /// notice the bot posted. Returns the confirmation text.
    pub async fn resolve_pending(
        &self,
        notice_message: &StoredMessage,
        approve: bool,
        reason: &str,
    ) -> Result<String, CommandError> {
        if notice_message.sender_id != self.self_id {
            return Err(CommandError::parse(
                "Reply to one of my join request notices",
            ));
        }

        let text = warden_proto::plain_text(&notice_message.segments);
        let notice = JoinNotice::parse(&text).map_err(|e| match e {
            NoticeError::NotANotice => {
                CommandError::parse("That message isn't a join request notice")
            }
            NoticeError::MissingField(field) => {
                CommandError::parse(format!("That notice has no readable {field}"))
            }
        })?;

        self.platform
            .resolve_join_request(&notice.flag, approve, reason)
            .await?;

        info!(flag = %notice.flag, approve, "Pending join request resolved");
        let who = if notice.nickname.is_empty() {
            notice.user_id.to_string()
        } else {
            notice.nickname
        };
        Ok(if approve {
            format!("Approved the join request from {who}")
        } else {
            format!("Denied the join request from {who}")
        })
    }

    // ------------------------------------------------------------------
    // Keywords
    // ------------------------------------------------------------------

    pub fn keywords(&self, group: GroupId) -> Vec<String> {
        self.keywords
            .get(&group)
            .map(|kw| kw.clone())
            .unwrap_or_default()
    }

    /// Add a keyword. Returns `false` when it already exists, compared
    /// case-insensitively, or is blank.
    pub async fn add_keyword(&self, group: GroupId, keyword: &str) -> Result<bool, DbError> {
        let keyword = keyword.trim();
        if keyword.is_empty() || self.find_keyword(group, keyword).is_some() {
            return Ok(false);
        }

        self.db.join_rules().add_keyword(group, keyword).await?;

        let mut entry = self.keywords.entry(group).or_default();
        if !entry.iter().any(|k| normalize(k) == normalize(keyword)) {
            entry.push(keyword.to_string());
        }
        debug!(group = %group, keyword, "Join keyword added");
        Ok(true)
    }

    pub async fn remove_keyword(&self, group: GroupId, keyword: &str) -> Result<bool, DbError> {
        let Some(stored) = self.find_keyword(group, keyword) else {
            return Ok(false);
        };

        self.db.join_rules().remove_keyword(group, &stored).await?;

        if let Some(mut entry) = self.keywords.get_mut(&group) {
            entry.retain(|k| k != &stored);
        }
        self.keywords.remove_if(&group, |_, kw| kw.is_empty());
        debug!(group = %group, keyword = %stored, "Join keyword removed");
        Ok(true)
    }

    fn find_keyword(&self, group: GroupId, keyword: &str) -> Option<String> {
        let wanted = normalize(keyword);
        self.keywords
            .get(&group)?
            .iter()
            .find(|k| normalize(k) == wanted)
            .cloned()
    }

    // ------------------------------------------------------------------
    // Blacklist
    // ------------------------------------------------------------------

    pub fn blacklist(&self, group: GroupId) -> Vec<UserId> {
        self.blacklist
            .get(&group)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub async fn add_blacklist(&self, group: GroupId, user: UserId) -> Result<bool, DbError> {
        if self
            .blacklist
            .get(&group)
            .is_some_and(|set| set.contains(&user))
        {
            return Ok(false);
        }

        self.db.join_rules().add_blacklist(group, user).await?;
        Ok(self.blacklist.entry(group).or_default().insert(user))
    }

    /// Clears `user` from this group's list only.
    pub async fn remove_blacklist(&self, group: GroupId, user: UserId) -> Result<bool, DbError> {
        if !self
            .blacklist
            .get(&group)
            .is_some_and(|set| set.contains(&user))
        {
            return Ok(false);
        }

        self.db.join_rules().remove_blacklist(group, user).await?;

        let removed = self
            .blacklist
            .get_mut(&group)
            .is_some_and(|mut set| set.remove(&user));
        self.blacklist.remove_if(&group, |_, set| set.is_empty());
        if removed {
            debug!(group = %group, user = %user, "Blacklist entry removed");
        } else {
            warn!(group = %group, user = %user, "Blacklist entry vanished during removal");
        }
        Ok(removed)
    }

    /// Fetch the message an operator replied to.
    pub async fn fetch_notice(&self, message: MessageId) -> Result<StoredMessage, PlatformError> {
        self.platform.get_message(message).await
    }
}
