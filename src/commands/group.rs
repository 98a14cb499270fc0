//! Group-wide commands: whole mute, identity, member list and notices.

use super::{CommandResult, Invocation, Reply};
use crate::error::CommandError;
use crate::warden::Warden;
use tracing::info;

impl Warden {
    pub(super) async fn cmd_whole_mute(&self, inv: &Invocation<'_>, enable: bool) -> CommandResult {
        self.platform.set_whole_mute(inv.group(), enable).await?;
        info!(group = %inv.group(), enable, "Whole-group mute toggled");
        Ok(vec![Reply::text(if enable {
            "Whole-group mute is on"
        } else {
            "Whole-group mute is off"
        })])
    }

    pub(super) async fn cmd_group_name(&self, inv: &Invocation<'_>) -> CommandResult {
        let name = inv.rest();
        if name.is_empty() {
            return Err(CommandError::parse("You didn't say what to rename the group to"));
        }
        self.platform.set_group_name(inv.group(), &name).await?;
        Ok(vec![Reply::text(format!("Group renamed to [{name}]"))])
    }

    /// An explicit URL wins over an attached image.
    pub(super) async fn cmd_avatar(&self, inv: &Invocation<'_>) -> CommandResult {
        let file = inv
            .args
            .first()
            .map(String::as_str)
            .or_else(|| inv.message.first_image());
        let Some(file) = file else {
            return Err(CommandError::parse("Send an image or a URL for the new avatar"));
        };
        self.platform.set_group_avatar(inv.group(), file).await?;
        Ok(vec![Reply::text("Group avatar updated")])
    }

    pub(super) async fn cmd_members(&self, inv: &Invocation<'_>) -> CommandResult {
        let members = self.platform.get_member_list(inv.group()).await?;
        let limit = self.config.limits.member_list_max;

        let mut lines = vec![format!("Members ({}):", members.len())];
        lines.extend(
            members
                .iter()
                .take(limit)
                .map(|m| format!("{} ({}) - {}", m.display_name(), m.user_id, m.role.as_str())),
        );
        if members.len() > limit {
            lines.push(format!("...and {} more", members.len() - limit));
        }
        Ok(vec![Reply::text(lines.join("\n"))])
    }

    pub(super) async fn cmd_notice(&self, inv: &Invocation<'_>) -> CommandResult {
        let content = inv.rest();
        if content.is_empty() {
            return Err(CommandError::parse("You didn't say what to announce"));
        }
        self.platform.send_group_notice(inv.group(), &content).await?;
        Ok(vec![Reply::text("Notice posted")])
    }

    /// Newest first, capped by `limits.notice_list_max`.
    pub(super) async fn cmd_notices(&self, inv: &Invocation<'_>) -> CommandResult {
        let mut notices = self.platform.get_group_notices(inv.group()).await?;
        if notices.is_empty() {
            return Ok(vec![Reply::text("No notices yet")]);
        }
        notices.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        let lines: Vec<String> = notices
            .iter()
            .take(self.config.limits.notice_list_max)
            .map(|n| {
                let when = chrono::DateTime::from_timestamp(n.published_at, 0)
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| n.published_at.to_string());
                format!("[{when}] {}", n.content)
            })
            .collect();
        Ok(vec![Reply::text(lines.join("\n"))])
    }
}
