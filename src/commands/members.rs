//! Commands that act on individual members.

use super::{CommandResult, Invocation, Reply};
use crate::error::CommandError;
use crate::warden::Warden;
use rand::Rng;
use rand::seq::SliceRandom;
use std::time::Duration;
use tracing::{debug, info};

const MUTE_ME_QUIPS: &[&str] = &[
    "Somebody actually asked for this",
    "Granted",
    "A little quiet never hurt",
    "You asked for it!",
    "Fine, go take a breather",
    "Okay okay, muted",
    "Are you alright?",
];

impl Warden {
    /// Explicit seconds from the first argument, else a random duration.
    /// `0` or a non-numeric argument counts as "not given". Never zero: the
    /// platform reads a zero-length mute as an unmute.
    fn mute_duration(&self, inv: &Invocation<'_>) -> Duration {
        let explicit = inv
            .args
            .first()
            .and_then(|arg| arg.parse::<u64>().ok())
            .filter(|&secs| secs > 0);

        let secs = explicit.unwrap_or_else(|| {
            let (min, max) = (
                self.config.mute.random_min_secs,
                self.config.mute.random_max_secs,
            );
            if min >= max {
                min
            } else {
                rand::thread_rng().gen_range(min..=max)
            }
        });
        Duration::from_secs(secs.max(1))
    }

    pub(super) async fn cmd_mute(&self, inv: &Invocation<'_>) -> CommandResult {
        if inv.targets.is_empty() {
            return Err(CommandError::parse("You didn't say who to mute"));
        }
        let duration = self.mute_duration(inv);
        let mut muted = 0;
        let mut failures = Vec::new();
        for &target in &inv.targets {
            if let Err(e) = self
                .platform
                .set_member_mute(inv.group(), target, duration)
                .await
            {
                debug!(group = %inv.group(), user = %target, error = %e, "Mute failed");
                let name = self.display_name(inv.group(), target).await;
                failures.push(Reply::text(format!("I can't mute {name}")));
                continue;
            }
            info!(group = %inv.group(), user = %target, secs = duration.as_secs(), "Member muted");
            muted += 1;
        }

        let mut replies = Vec::with_capacity(failures.len() + 1);
        if muted > 0 {
            replies.push(Reply::text(format!(
                "Muted for {} seconds",
                duration.as_secs()
            )));
        }
        replies.extend(failures);
        Ok(replies)
    }

    pub(super) async fn cmd_mute_me(&self, inv: &Invocation<'_>) -> CommandResult {
        let duration = self.mute_duration(inv);
        if let Err(e) = self
            .platform
            .set_member_mute(inv.group(), inv.actor(), duration)
            .await
        {
            debug!(user = %inv.actor(), error = %e, "Self-mute failed");
            return Ok(vec![Reply::text("I can't mute you")]);
        }
        let quip = MUTE_ME_QUIPS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("Granted");
        Ok(vec![Reply::text(quip)])
    }

    pub(super) async fn cmd_unmute(&self, inv: &Invocation<'_>) -> CommandResult {
        if inv.targets.is_empty() {
            return Err(CommandError::parse("You didn't say who to unmute"));
        }
        for &target in &inv.targets {
            self.platform
                .set_member_mute(inv.group(), target, Duration::ZERO)
                .await?;
        }
        Ok(vec![Reply::text("Unmuted")])
    }

    pub(super) async fn cmd_card(&self, inv: &Invocation<'_>) -> CommandResult {
        let card = inv.rest();
        if card.is_empty() {
            return Err(CommandError::parse("You didn't say what to change the card to"));
        }
        let mut replies = Vec::new();
        for target in inv.targets_or_sender() {
            let previous = self.display_name(inv.group(), target).await;
            self.platform.set_card(inv.group(), target, &card).await?;
            replies.push(Reply::text(format!("Changed {previous}'s card to [{card}]")));
        }
        Ok(replies)
    }

    pub(super) async fn cmd_card_me(&self, inv: &Invocation<'_>) -> CommandResult {
        let card = inv.rest();
        if card.is_empty() {
            return Err(CommandError::parse("You didn't say what to change your card to"));
        }
        if let Err(e) = self.platform.set_card(inv.group(), inv.actor(), &card).await {
            debug!(user = %inv.actor(), error = %e, "Self card change failed");
            return Ok(vec![Reply::text("I can't change your card")]);
        }
        Ok(vec![Reply::text(format!("Changed your card to [{card}]"))])
    }

    pub(super) async fn cmd_title(&self, inv: &Invocation<'_>) -> CommandResult {
        let title = inv.rest();
        if title.is_empty() {
            return Err(CommandError::parse("You didn't say which title to give"));
        }
        let mut replies = Vec::new();
        for target in inv.targets_or_sender() {
            let name = self.display_name(inv.group(), target).await;
            self.platform
                .set_special_title(inv.group(), target, &title)
                .await?;
            replies.push(Reply::text(format!("Changed {name}'s title to [{title}]")));
        }
        Ok(replies)
    }

    pub(super) async fn cmd_title_me(&self, inv: &Invocation<'_>) -> CommandResult {
        let title = inv.rest();
        if title.is_empty() {
            return Err(CommandError::parse("You didn't say which title you want"));
        }
        self.platform
            .set_special_title(inv.group(), inv.actor(), &title)
            .await?;
        Ok(vec![Reply::text(format!("Changed your title to [{title}]"))])
    }

    /// `block` is a kick that also refuses future join requests.
    pub(super) async fn cmd_kick(&self, inv: &Invocation<'_>, block: bool) -> CommandResult {
        if inv.targets.is_empty() {
            return Err(CommandError::parse(if block {
                "You didn't say who to block"
            } else {
                "You didn't say who to kick"
            }));
        }
        let mut replies = Vec::new();
        for &target in &inv.targets {
            let name = self.display_name(inv.group(), target).await;
            if let Err(e) = self.platform.kick_member(inv.group(), target, block).await {
                debug!(group = %inv.group(), user = %target, block, error = %e, "Kick failed");
                replies.push(Reply::text(format!("I can't kick {name}")));
                continue;
            }
            info!(group = %inv.group(), user = %target, block, "Member removed");
            replies.push(Reply::text(if block {
                format!("Kicked and blocked [{target}-{name}]")
            } else {
                format!("Kicked [{target}-{name}]")
            }));
        }
        Ok(replies)
    }

    pub(super) async fn cmd_admin(&self, inv: &Invocation<'_>, enable: bool) -> CommandResult {
        if inv.targets.is_empty() {
            return Err(CommandError::parse(if enable {
                "Who should become an admin?"
            } else {
                "Whose admin role should be removed?"
            }));
        }
        let mut replies = Vec::new();
        for &target in &inv.targets {
            if let Err(e) = self.platform.set_admin(inv.group(), target, enable).await {
                debug!(group = %inv.group(), user = %target, enable, error = %e, "Admin change failed");
                let name = self.display_name(inv.group(), target).await;
                replies.push(Reply::text(format!("I can't change {name}'s admin role")));
                continue;
            }
            info!(group = %inv.group(), user = %target, enable, "Admin role changed");
            replies.push(Reply::Mention {
                user: target,
                text: if enable {
                    "you are now an admin".to_string()
                } else {
                    "your admin role has been removed".to_string()
                },
            });
        }
        Ok(replies)
    }
}
