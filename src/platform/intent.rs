use serde::Serialize;
use warden_proto::{GroupId, MessageId, UserId};

/// An outbound side effect, as requested of the platform.
///
/// The simulated platform records one of these per mutating call and can
/// echo them as JSON lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Intent {
    SendMessage {
        group_id: GroupId,
        message_id: MessageId,
        text: String,
        mentions: Vec<UserId>,
    },
    DeleteMessage {
        message_id: MessageId,
    },
    MuteMember {
        group_id: GroupId,
        user_id: UserId,
        duration_secs: u64,
    },
    WholeMute {
        group_id: GroupId,
        enable: bool,
    },
    Kick {
        group_id: GroupId,
        user_id: UserId,
        reject_rejoin: bool,
    },
    SetAdmin {
        group_id: GroupId,
        user_id: UserId,
        enable: bool,
    },
    SetCard {
        group_id: GroupId,
        user_id: UserId,
        card: String,
    },
    SetTitle {
        group_id: GroupId,
        user_id: UserId,
        title: String,
    },
    SetEssence {
        message_id: MessageId,
        enable: bool,
    },
    SetGroupName {
        group_id: GroupId,
        name: String,
    },
    SetGroupAvatar {
        group_id: GroupId,
        file: String,
    },
    PostNotice {
        group_id: GroupId,
        content: String,
    },
    ResolveJoinRequest {
        flag: String,
        approve: bool,
        reason: String,
    },
}

impl Intent {
    /// The action name, matching the serialized `action` tag.
    pub fn action(&self) -> &'static str {
        match self {
            Intent::SendMessage { .. } => "send_message",
            Intent::DeleteMessage { .. } => "delete_message",
            Intent::MuteMember { .. } => "mute_member",
            Intent::WholeMute { .. } => "whole_mute",
            Intent::Kick { .. } => "kick",
            Intent::SetAdmin { .. } => "set_admin",
            Intent::SetCard { .. } => "set_card",
            Intent::SetTitle { .. } => "set_title",
            Intent::SetEssence { .. } => "set_essence",
            Intent::SetGroupName { .. } => "set_group_name",
            Intent::SetGroupAvatar { .. } => "set_group_avatar",
            Intent::PostNotice { .. } => "post_notice",
            Intent::ResolveJoinRequest { .. } => "resolve_join_request",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_matches_serialized_tag() {
        let intent = Intent::WholeMute {
            group_id: GroupId(7),
            enable: true,
        };
        let value = serde_json::to_value(&intent).unwrap();
        assert_eq!(value["action"], intent.action());
        assert_eq!(value["group_id"], 7);
    }
}
