//! Join-rule maintenance and pending request resolution.

use super::{CommandResult, Invocation, Reply};
use crate::error::CommandError;
use crate::warden::Warden;
use warden_proto::UserId;

fn join_ids(ids: &[UserId]) -> String {
    ids.iter().map(UserId::to_string).collect::<Vec<_>>().join(", ")
}

impl Warden {
    pub(super) async fn cmd_keyword_add(&self, inv: &Invocation<'_>) -> CommandResult {
        if inv.args.is_empty() {
            return Err(CommandError::parse("Which keywords?"));
        }
        let (mut added, mut present) = (Vec::new(), Vec::new());
        for word in &inv.args {
            if self.joins.add_keyword(inv.group(), word).await? {
                added.push(word.as_str());
            } else {
                present.push(word.as_str());
            }
        }

        let mut lines = Vec::new();
        if !added.is_empty() {
            lines.push(format!("Added join keywords: {}", added.join(", ")));
        }
        if !present.is_empty() {
            lines.push(format!("Already present: {}", present.join(", ")));
        }
        Ok(vec![Reply::text(lines.join("\n"))])
    }

    pub(super) async fn cmd_keyword_remove(&self, inv: &Invocation<'_>) -> CommandResult {
        if inv.args.is_empty() {
            return Err(CommandError::parse("Which keywords?"));
        }
        let (mut removed, mut missing) = (Vec::new(), Vec::new());
        for word in &inv.args {
            if self.joins.remove_keyword(inv.group(), word).await? {
                removed.push(word.as_str());
            } else {
                missing.push(word.as_str());
            }
        }

        let mut lines = Vec::new();
        if !removed.is_empty() {
            lines.push(format!("Removed join keywords: {}", removed.join(", ")));
        }
        if !missing.is_empty() {
            lines.push(format!("Not found: {}", missing.join(", ")));
        }
        Ok(vec![Reply::text(lines.join("\n"))])
    }

    pub(super) fn cmd_keyword_list(&self, inv: &Invocation<'_>) -> CommandResult {
        let keywords = self.joins.keywords(inv.group());
        Ok(vec![Reply::text(if keywords.is_empty() {
            "No join keywords set".to_string()
        } else {
            format!("Join keywords: {}", keywords.join(", "))
        })])
    }

    pub(super) async fn cmd_blacklist_add(&self, inv: &Invocation<'_>) -> CommandResult {
        if inv.targets.is_empty() {
            return Err(CommandError::parse("You didn't say who to blacklist"));
        }
        let mut added = Vec::new();
        for &target in &inv.targets {
            if self.joins.add_blacklist(inv.group(), target).await? {
                added.push(target);
            }
        }
        Ok(vec![Reply::text(if added.is_empty() {
            "Already blacklisted".to_string()
        } else {
            format!("Blacklisted: {}", join_ids(&added))
        })])
    }

    /// Ids may be typed or mentioned.
    pub(super) async fn cmd_blacklist_remove(&self, inv: &Invocation<'_>) -> CommandResult {
        let mut ids = inv.targets.clone();
        for arg in &inv.args {
            let id: UserId = arg
                .parse()
                .map_err(|_| CommandError::parse(format!("'{arg}' isn't a user id")))?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            return Err(CommandError::parse("Which ids?"));
        }

        let (mut removed, mut missing) = (Vec::new(), Vec::new());
        for id in ids {
            if self.joins.remove_blacklist(inv.group(), id).await? {
                removed.push(id);
            } else {
                missing.push(id);
            }
        }

        let mut lines = Vec::new();
        if !removed.is_empty() {
            lines.push(format!("Removed from blacklist: {}", join_ids(&removed)));
        }
        if !missing.is_empty() {
            lines.push(format!("Not blacklisted here: {}", join_ids(&missing)));
        }
        Ok(vec![Reply::text(lines.join("\n"))])
    }

    pub(super) fn cmd_blacklist_list(&self, inv: &Invocation<'_>) -> CommandResult {
        let ids = self.joins.blacklist(inv.group());
        Ok(vec![Reply::text(if ids.is_empty() {
            "The blacklist is empty".to_string()
        } else {
            format!("Blacklisted: {}", join_ids(&ids))
        })])
    }

    pub(super) async fn cmd_resolve_join(&self, inv: &Invocation<'_>, approve: bool) -> CommandResult {
        let Some(notice_id) = inv.message.reply_to() else {
            return Err(CommandError::parse("Reply to a join request notice"));
        };
        let notice = self.joins.fetch_notice(notice_id).await?;
        let confirmation = self
            .joins
            .resolve_pending(&notice, approve, &inv.rest())
            .await?;
        Ok(vec![Reply::text(confirmation)])
    }
}
