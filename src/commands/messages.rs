//! Commands that act on a replied-to message.

use super::{CommandResult, Invocation, Reply};
use crate::error::CommandError;
use crate::warden::Warden;
use tracing::{debug, warn};

impl Warden {
    pub(super) async fn cmd_essence(&self, inv: &Invocation<'_>, enable: bool) -> CommandResult {
        let Some(target) = inv.message.reply_to() else {
            return Err(CommandError::parse("Reply to the message you mean"));
        };
        match self.platform.set_essence(target, enable).await {
            Ok(()) => Ok(vec![Reply::text(if enable { "Marked as essence" } else { "Essence mark removed" })]),
            Err(e) => {
                debug!(message = %target, enable, error = %e, "Essence toggle failed");
                Ok(vec![Reply::text(if enable {
                    "I can't mark that as essence"
                } else {
                    "I can't remove that essence mark"
                })])
            }
        }
    }

    /// Delete the replied message, then the command message itself.
    pub(super) async fn cmd_recall(&self, inv: &Invocation<'_>) -> CommandResult {
        let Some(target) = inv.message.reply_to() else {
            return Err(CommandError::parse("Reply to the message you want recalled"));
        };

        let mut replies = Vec::new();
        if let Err(e) = self.platform.delete_message(target).await {
            warn!(message = %target, error = %e, "Recall failed");
            replies.push(Reply::text("I can't recall that message"));
        }
        if let Err(e) = self.platform.delete_message(inv.message.message_id).await {
            debug!(message = %inv.message.message_id, error = %e, "Could not delete recall command");
        }
        Ok(replies)
    }
}
