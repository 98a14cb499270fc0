//! Inbound platform events.

use crate::id::{GroupId, MessageId, UserId};
use crate::member::MemberRole;
use crate::segment::{Segment, plain_text};
use serde::{Deserialize, Serialize};

/// An event delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A message posted in a group.
    GroupMessage(GroupMessage),
    /// Someone asked to join a group.
    JoinRequest(JoinRequest),
    /// Someone left or was removed from a group.
    MemberLeave(MemberLeave),
}

impl Event {
    /// The group the event happened in.
    pub fn group_id(&self) -> GroupId {
        match self {
            Event::GroupMessage(m) => m.group_id,
            Event::JoinRequest(r) => r.group_id,
            Event::MemberLeave(l) => l.group_id,
        }
    }

    /// A static label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::GroupMessage(_) => "group_message",
            Event::JoinRequest(_) => "join_request",
            Event::MemberLeave(_) => "member_leave",
        }
    }
}

/// The author of a group message, as attached by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// The author.
    pub user_id: UserId,
    /// Account nickname.
    #[serde(default)]
    pub nickname: String,
    /// In-group display name.
    #[serde(default)]
    pub card: String,
    /// Role at the time the message was sent.
    #[serde(default)]
    pub role: MemberRole,
}

/// A message posted in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMessage {
    /// Where it was posted.
    pub group_id: GroupId,
    /// The platform's id for it.
    pub message_id: MessageId,
    /// Who posted it.
    pub sender: Sender,
    /// Content.
    pub segments: Vec<Segment>,
}

impl GroupMessage {
    /// The trimmed concatenation of all text segments.
    pub fn plain_text(&self) -> String {
        plain_text(&self.segments)
    }

    /// Users mentioned in the message, in order of appearance.
    pub fn mentions(&self) -> impl Iterator<Item = UserId> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::At { user_id } => Some(*user_id),
            _ => None,
        })
    }

    /// The message this one quotes, if any.
    pub fn reply_to(&self) -> Option<MessageId> {
        self.segments.iter().find_map(|s| match s {
            Segment::Reply { message_id } => Some(*message_id),
            _ => None,
        })
    }

    /// The first attached image, if any.
    pub fn first_image(&self) -> Option<&str> {
        self.segments.iter().find_map(|s| match s {
            Segment::Image { url } => Some(url.as_str()),
            _ => None,
        })
    }
}

/// A request to join a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    /// The group being joined.
    pub group_id: GroupId,
    /// The applicant.
    pub user_id: UserId,
    /// Free text the applicant supplied.
    #[serde(default)]
    pub comment: String,
    /// Opaque token the platform needs to approve or deny this request.
    pub flag: String,
}

/// Why a member is no longer in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveKind {
    /// The member left on their own.
    Leave,
    /// An operator removed them.
    Kick,
}

/// A member left or was removed from a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberLeave {
    /// The group.
    pub group_id: GroupId,
    /// The departed member.
    pub user_id: UserId,
    /// Who performed the removal; equals `user_id` for voluntary leaves.
    pub operator_id: UserId,
    /// How they left.
    pub kind: LeaveKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_join_request_without_comment() {
        let raw = r#"{"type":"join_request","group_id":10,"user_id":5,"flag":"abc"}"#;
        let event: Event = serde_json::from_str(raw).unwrap();
        match event {
            Event::JoinRequest(req) => {
                assert_eq!(req.comment, "");
                assert_eq!(req.flag, "abc");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_leave_event_labels() {
        let raw = r#"{"type":"member_leave","group_id":10,"user_id":5,"operator_id":5,"kind":"leave"}"#;
        let event: Event = serde_json::from_str(raw).unwrap();
        assert_eq!(event.kind(), "member_leave");
        assert_eq!(event.group_id(), GroupId(10));
    }

    #[test]
    fn test_message_helpers() {
        let msg = GroupMessage {
            group_id: GroupId(1),
            message_id: MessageId(2),
            sender: Sender {
                user_id: UserId(3),
                nickname: "n".into(),
                card: String::new(),
                role: MemberRole::Member,
            },
            segments: vec![
                Segment::Reply {
                    message_id: MessageId(1),
                },
                Segment::text("/approve"),
                Segment::at(UserId(8)),
                Segment::at(UserId(9)),
            ],
        };
        assert_eq!(msg.reply_to(), Some(MessageId(1)));
        assert_eq!(msg.mentions().collect::<Vec<_>>(), vec![UserId(8), UserId(9)]);
        assert_eq!(msg.first_image(), None);
    }
}
