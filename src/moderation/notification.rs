//! The escalation notice posted for join requests that need a human.
//!
//! The notice is the only record of a pending request: operators reply to it
//! with `approve` or `deny`, and the flag is read back from its text.

use thiserror::Error;
use warden_proto::UserId;

pub const HEADER: &str = "[Join request]";
const NICKNAME: &str = "Nickname: ";
const USER_ID: &str = "User ID: ";
const FLAG: &str = "Flag: ";
const COMMENT: &str = "Comment: ";
const FOOTER: &str = "Reply \"approve\" or \"deny\" to resolve.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoticeError {
    #[error("not a join request notice")]
    NotANotice,
    #[error("notice is missing the {0} line")]
    MissingField(&'static str),
}

/// A pending join request as carried by its notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinNotice {
    pub nickname: String,
    pub user_id: UserId,
    pub flag: String,
    pub comment: String,
}

/// Keep every field on its own line.
fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

impl JoinNotice {
    pub fn render(&self) -> String {
        [
            HEADER.to_string(),
            format!("{NICKNAME}{}", single_line(&self.nickname)),
            format!("{USER_ID}{}", self.user_id),
            format!("{FLAG}{}", single_line(&self.flag)),
            format!("{COMMENT}{}", single_line(&self.comment)),
            FOOTER.to_string(),
        ]
        .join("\n")
    }

    /// Read a notice back by line position.
    ///
    /// The nickname and flag are required. The user id and comment are
    /// informational and tolerated when missing or edited.
    pub fn parse(text: &str) -> Result<Self, NoticeError> {
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        if lines.first() != Some(&HEADER) {
            return Err(NoticeError::NotANotice);
        }

        let field = |index: usize, prefix: &str| {
            lines
                .get(index)
                .and_then(|line| line.strip_prefix(prefix.trim_end()))
                .map(|value| value.trim().to_string())
        };

        let nickname = field(1, NICKNAME).ok_or(NoticeError::MissingField("nickname"))?;
        let flag = field(3, FLAG)
            .filter(|flag| !flag.is_empty())
            .ok_or(NoticeError::MissingField("flag"))?;
        let user_id = field(2, USER_ID)
            .and_then(|id| id.parse().ok())
            .unwrap_or(UserId(0));
        let comment = field(4, COMMENT).unwrap_or_default();

        Ok(Self {
            nickname,
            user_id,
            flag,
            comment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice() -> JoinNotice {
        JoinNotice {
            nickname: "dora".into(),
            user_id: UserId(42),
            flag: "flag-abc".into(),
            comment: "I like math".into(),
        }
    }

    #[test]
    fn test_render_layout() {
        let text = notice().render();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "Nickname: dora");
        assert_eq!(lines[2], "User ID: 42");
        assert_eq!(lines[3], "Flag: flag-abc");
        assert_eq!(lines[4], "Comment: I like math");
    }

    #[test]
    fn test_parse_reads_rendered_notice() {
        assert_eq!(JoinNotice::parse(&notice().render()), Ok(notice()));
    }

    #[test]
    fn test_multiline_comment_keeps_positions() {
        let mut n = notice();
        n.comment = "line one\nline two".into();
        let parsed = JoinNotice::parse(&n.render()).unwrap();
        assert_eq!(parsed.flag, "flag-abc");
        assert_eq!(parsed.comment, "line one line two");
    }

    #[test]
    fn test_unrelated_text_is_rejected() {
        assert_eq!(JoinNotice::parse("hello there"), Err(NoticeError::NotANotice));
        assert_eq!(JoinNotice::parse(""), Err(NoticeError::NotANotice));
    }

    #[test]
    fn test_edited_notice_without_flag_is_rejected() {
        let text = "[Join request]\nNickname: dora\nUser ID: 42";
        assert_eq!(
            JoinNotice::parse(text),
            Err(NoticeError::MissingField("flag"))
        );
    }
}
