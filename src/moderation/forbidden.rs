//! Forbidden-word screening.
//!
//! Screened groups have every message checked against one global word list.
//! A hit is remediated once per message: the message is deleted and, when a
//! positive mute duration is configured, the sender is muted. Both
//! remediation calls are best effort.

use crate::metrics;
use crate::platform::Platform;
use aho_corasick::{AhoCorasick, MatchKind};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};
use warden_proto::{GroupId, GroupMessage};

/// A forbidden word found in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub word: String,
}

pub struct ForbiddenWordFilter {
    groups: HashSet<GroupId>,
    words: Vec<String>,
    /// `None` when the list is empty or the automaton failed to build.
    matcher: Option<AhoCorasick>,
    mute: Duration,
}

impl ForbiddenWordFilter {
    pub fn new(
        groups: impl IntoIterator<Item = GroupId>,
        words: Vec<String>,
        case_insensitive: bool,
        mute: Duration,
    ) -> Self {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        let matcher = if words.is_empty() {
            None
        } else {
            // Standard semantics so overlapping search reports every pattern.
            match AhoCorasick::builder()
                .match_kind(MatchKind::Standard)
                .ascii_case_insensitive(case_insensitive)
                .build(&words)
            {
                Ok(matcher) => Some(matcher),
                Err(err) => {
                    warn!(error = ?err, "Failed to build forbidden word matcher; screening disabled");
                    None
                }
            }
        };

        Self {
            groups: groups.into_iter().collect(),
            words,
            matcher,
            mute,
        }
    }

    pub fn is_screened(&self, group: GroupId) -> bool {
        self.groups.contains(&group)
    }

    /// The first configured word (in list order) contained in `text`.
    pub fn evaluate(&self, group: GroupId, text: &str) -> Option<Violation> {
        if !self.is_screened(group) {
            return None;
        }
        let matcher = self.matcher.as_ref()?;

        let first = matcher
            .find_overlapping_iter(text)
            .map(|m| m.pattern().as_usize())
            .min()?;

        self.words.get(first).map(|word| Violation { word: word.clone() })
    }

    /// Evaluate `msg` and remediate a violation. Returns the violation so the
    /// caller can skip command handling.
    pub async fn screen(&self, platform: &dyn Platform, msg: &GroupMessage) -> Option<Violation> {
        let text = msg.plain_text();
        let violation = self.evaluate(msg.group_id, &text)?;

        info!(
            group = %msg.group_id,
            user = %msg.sender.user_id,
            word = %violation.word,
            "Forbidden word detected"
        );
        metrics::record_forbidden();

        if let Err(e) = platform.delete_message(msg.message_id).await {
            debug!(message = %msg.message_id, error = %e, "Could not delete violating message");
        }
        if !self.mute.is_zero()
            && let Err(e) = platform
                .set_member_mute(msg.group_id, msg.sender.user_id, self.mute)
                .await
        {
            debug!(user = %msg.sender.user_id, error = %e, "Could not mute violating member");
        }

        Some(violation)
    }
}
