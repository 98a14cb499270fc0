//! Operator commands.
//!
//! A command is a group message whose text starts with the configured
//! prefix. Parsing only identifies the command and splits its arguments;
//! argument checks happen in the handlers, after the authorization gate has
//! passed, so an unprivileged caller learns nothing about argument errors.
//!
//! Handlers live in submodules as `impl Warden` blocks:
//! - `members` - mute, cards, titles, kick/block, admin grants
//! - `messages` - essence marks and recall
//! - `group` - whole-group mute, name, avatar, member list, notices
//! - `curfew` - curfew start/stop
//! - `join` - join keywords, blacklist, pending request resolution

mod curfew;
mod group;
mod join;
mod members;
mod messages;

use crate::access::AccessRequest;
use crate::error::CommandError;
use crate::warden::Warden;
use warden_proto::{GroupId, GroupMessage, Segment, UserId};

/// What an operator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Mute,
    MuteMe,
    Unmute,
    MuteAll,
    UnmuteAll,
    Card,
    CardMe,
    Title,
    TitleMe,
    Kick,
    Block,
    Admin,
    Unadmin,
    Essence,
    Unessence,
    Recall,
    GroupName,
    Avatar,
    Members,
    Notice,
    Notices,
    CurfewStart,
    CurfewStop,
    KeywordAdd,
    KeywordRemove,
    KeywordList,
    BlacklistAdd,
    BlacklistRemove,
    BlacklistList,
    Approve,
    Deny,
    Help,
    /// A known command family with a missing or unknown subcommand. Gated
    /// under `key`, the family's entry-level command.
    Usage {
        usage: &'static str,
        key: &'static str,
    },
}

impl CommandKind {
    /// Look up the command for `word`, consuming `sub` for families with
    /// subcommands. Returns the kind and whether `sub` was consumed.
    fn lookup(word: &str, sub: Option<&str>) -> Option<(Self, bool)> {
        use CommandKind::*;

        let single = match word {
            "mute" => Mute,
            "muteme" => MuteMe,
            "unmute" => Unmute,
            "muteall" => MuteAll,
            "unmuteall" => UnmuteAll,
            "card" => Card,
            "cardme" => CardMe,
            "title" => Title,
            "titleme" => TitleMe,
            "kick" => Kick,
            "block" => Block,
            "admin" => Admin,
            "unadmin" => Unadmin,
            "essence" => Essence,
            "unessence" => Unessence,
            "recall" => Recall,
            "groupname" => GroupName,
            "avatar" => Avatar,
            "members" => Members,
            "notice" => Notice,
            "notices" => Notices,
            "approve" => Approve,
            "deny" => Deny,
            "help" => Help,
            "curfew" => {
                return Some(match sub.map(str::to_lowercase).as_deref() {
                    Some("start") => (CurfewStart, true),
                    Some("stop") => (CurfewStop, true),
                    _ => (
                        Usage {
                            usage: "Usage: curfew start [HH:MM HH:MM] | curfew stop",
                            key: "start_curfew",
                        },
                        false,
                    ),
                });
            }
            "keyword" => {
                return Some(match sub.map(str::to_lowercase).as_deref() {
                    Some("add") => (KeywordAdd, true),
                    Some("remove") => (KeywordRemove, true),
                    Some("list") => (KeywordList, true),
                    _ => (
                        Usage {
                            usage: "Usage: keyword add|remove <words..> | keyword list",
                            key: "view_keywords",
                        },
                        false,
                    ),
                });
            }
            "blacklist" => {
                return Some(match sub.map(str::to_lowercase).as_deref() {
                    Some("add") => (BlacklistAdd, true),
                    Some("remove") => (BlacklistRemove, true),
                    Some("list") => (BlacklistList, true),
                    _ => (
                        Usage {
                            usage: "Usage: blacklist add @member.. | blacklist remove <id..> | blacklist list",
                            key: "view_blacklist",
                        },
                        false,
                    ),
                });
            }
            _ => return None,
        };
        Some((single, false))
    }

    /// Key into the permission table. `None` means ungated.
    pub fn permission_key(self) -> Option<&'static str> {
        use CommandKind::*;

        Some(match self {
            Mute => "mute",
            MuteMe => "mute_me",
            Unmute => "unmute",
            MuteAll => "mute_all",
            UnmuteAll => "unmute_all",
            Card => "set_card",
            CardMe => "set_card_me",
            Title => "set_title",
            TitleMe => "set_title_me",
            Kick => "kick",
            Block => "block",
            Admin => "set_admin",
            Unadmin => "unset_admin",
            Essence => "set_essence",
            Unessence => "unset_essence",
            Recall => "delete_message",
            GroupName => "set_group_name",
            Avatar => "set_group_avatar",
            Members => "list_members",
            Notice => "post_notice",
            Notices => "read_notices",
            CurfewStart => "start_curfew",
            CurfewStop => "stop_curfew",
            KeywordAdd => "add_keyword",
            KeywordRemove => "remove_keyword",
            KeywordList => "view_keywords",
            BlacklistAdd => "add_blacklist",
            BlacklistRemove => "remove_blacklist",
            BlacklistList => "view_blacklist",
            Approve => "approve_join",
            Deny => "deny_join",
            Usage { key, .. } => key,
            Help => return None,
        })
    }

    /// Metric label.
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Help => "help",
            CommandKind::Usage { .. } => "usage",
            other => other.permission_key().unwrap_or("unknown"),
        }
    }
}

/// A parsed command together with the message that carried it.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub message: &'a GroupMessage,
    pub kind: CommandKind,
    /// Whitespace-separated words after the command (and subcommand).
    pub args: Vec<String>,
    /// Mentioned members, excluding the bot.
    pub targets: Vec<UserId>,
}

impl<'a> Invocation<'a> {
    /// Parse `message` as a command, or `None` if it isn't one.
    pub fn parse(prefix: &str, self_id: UserId, message: &'a GroupMessage) -> Option<Self> {
        let text = message.plain_text();
        let body = text.strip_prefix(prefix)?;

        let mut words = body.split_whitespace();
        let word = words.next()?.to_lowercase();
        let mut rest: Vec<String> = words.map(str::to_string).collect();

        let (kind, consumed) = CommandKind::lookup(&word, rest.first().map(String::as_str))?;
        if consumed {
            rest.remove(0);
        }

        let mut targets: Vec<UserId> = Vec::new();
        for user in message.mentions().filter(|&u| u != self_id) {
            if !targets.contains(&user) {
                targets.push(user);
            }
        }

        Some(Self {
            message,
            kind,
            args: rest,
            targets,
        })
    }

    pub fn group(&self) -> GroupId {
        self.message.group_id
    }

    pub fn actor(&self) -> UserId {
        self.message.sender.user_id
    }

    /// All arguments joined back with single spaces.
    pub fn rest(&self) -> String {
        self.args.join(" ")
    }

    /// Mentioned members, or the sender when nobody was mentioned.
    pub fn targets_or_sender(&self) -> Vec<UserId> {
        if self.targets.is_empty() {
            vec![self.actor()]
        } else {
            self.targets.clone()
        }
    }
}

/// A message the bot posts back into the group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// Mentions `user`, then the text.
    Mention { user: UserId, text: String },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    pub fn into_segments(self) -> Vec<Segment> {
        match self {
            Reply::Text(text) => vec![Segment::text(text)],
            Reply::Mention { user, text } => vec![Segment::at(user), Segment::text(format!(" {text}"))],
        }
    }
}

pub type CommandResult = Result<Vec<Reply>, CommandError>;

const HELP: &str = "\
Commands:
mute [secs] @member.. / unmute @member.. / muteme [secs]
muteall / unmuteall
card <name> [@member..] / cardme <name>
title <title> [@member..] / titleme <title>
kick @member.. / block @member..
admin @member.. / unadmin @member..
essence / unessence / recall (reply to a message)
groupname <name> / avatar <url or image>
members / notice <text> / notices
curfew start [HH:MM HH:MM] / curfew stop
keyword add|remove <words..> / keyword list
blacklist add @member.. / blacklist remove <id..> / blacklist list
approve [reason] / deny [reason] (reply to a join request notice)";

impl Warden {
    /// Gate and run one command.
    pub(crate) async fn execute(&self, inv: &Invocation<'_>) -> CommandResult {
        if let Some(key) = inv.kind.permission_key() {
            let request = AccessRequest {
                group: inv.group(),
                actor: inv.actor(),
                targets: &inv.targets,
            };
            self.gate
                .authorize(&request, self.config.permissions.requirement(key))
                .await?;
        }

        use CommandKind::*;
        match inv.kind {
            Mute => self.cmd_mute(inv).await,
            MuteMe => self.cmd_mute_me(inv).await,
            Unmute => self.cmd_unmute(inv).await,
            MuteAll => self.cmd_whole_mute(inv, true).await,
            UnmuteAll => self.cmd_whole_mute(inv, false).await,
            Card => self.cmd_card(inv).await,
            CardMe => self.cmd_card_me(inv).await,
            Title => self.cmd_title(inv).await,
            TitleMe => self.cmd_title_me(inv).await,
            Kick => self.cmd_kick(inv, false).await,
            Block => self.cmd_kick(inv, true).await,
            Admin => self.cmd_admin(inv, true).await,
            Unadmin => self.cmd_admin(inv, false).await,
            Essence => self.cmd_essence(inv, true).await,
            Unessence => self.cmd_essence(inv, false).await,
            Recall => self.cmd_recall(inv).await,
            GroupName => self.cmd_group_name(inv).await,
            Avatar => self.cmd_avatar(inv).await,
            Members => self.cmd_members(inv).await,
            Notice => self.cmd_notice(inv).await,
            Notices => self.cmd_notices(inv).await,
            CurfewStart => self.cmd_curfew_start(inv).await,
            CurfewStop => self.cmd_curfew_stop(inv).await,
            KeywordAdd => self.cmd_keyword_add(inv).await,
            KeywordRemove => self.cmd_keyword_remove(inv).await,
            KeywordList => self.cmd_keyword_list(inv),
            BlacklistAdd => self.cmd_blacklist_add(inv).await,
            BlacklistRemove => self.cmd_blacklist_remove(inv).await,
            BlacklistList => self.cmd_blacklist_list(inv),
            Approve => self.cmd_resolve_join(inv, true).await,
            Deny => self.cmd_resolve_join(inv, false).await,
            Help => Ok(vec![Reply::text(HELP)]),
            Usage { usage, .. } => Err(CommandError::parse(usage)),
        }
    }

    /// Card if set, else nickname, else the raw id.
    pub(crate) async fn display_name(&self, group: GroupId, user: UserId) -> String {
        match self.platform.get_member_info(group, user, false).await {
            Ok(info) => info.display_name().to_string(),
            Err(_) => user.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_proto::{MemberRole, MessageId, Sender};

    const BOT: UserId = UserId(1);

    fn message(segments: Vec<Segment>) -> GroupMessage {
        GroupMessage {
            group_id: GroupId(10),
            message_id: MessageId(1),
            sender: Sender {
                user_id: UserId(2),
                nickname: "alice".into(),
                card: String::new(),
                role: MemberRole::Admin,
            },
            segments,
        }
    }

    #[test]
    fn test_parse_with_targets() {
        let msg = message(vec![
            Segment::text("/mute 60 "),
            Segment::at(UserId(3)),
            Segment::at(BOT),
            Segment::at(UserId(3)),
        ]);
        let inv = Invocation::parse("/", BOT, &msg).unwrap();
        assert_eq!(inv.kind, CommandKind::Mute);
        assert_eq!(inv.args, vec!["60"]);
        assert_eq!(inv.targets, vec![UserId(3)]);
    }

    #[test]
    fn test_subcommands_are_consumed() {
        let msg = message(vec![Segment::text("/keyword ADD math chess")]);
        let inv = Invocation::parse("/", BOT, &msg).unwrap();
        assert_eq!(inv.kind, CommandKind::KeywordAdd);
        assert_eq!(inv.args, vec!["math", "chess"]);

        let msg = message(vec![Segment::text("/curfew start 22:00 23:00")]);
        let inv = Invocation::parse("/", BOT, &msg).unwrap();
        assert_eq!(inv.kind, CommandKind::CurfewStart);
        assert_eq!(inv.rest(), "22:00 23:00");
    }

    #[test]
    fn test_unknown_subcommand_is_usage() {
        let msg = message(vec![Segment::text("/curfew")]);
        let inv = Invocation::parse("/", BOT, &msg).unwrap();
        assert!(matches!(inv.kind, CommandKind::Usage { .. }));
        assert_eq!(inv.kind.permission_key(), Some("start_curfew"));

        let msg = message(vec![Segment::text("/blacklist purge")]);
        let inv = Invocation::parse("/", BOT, &msg).unwrap();
        assert_eq!(inv.kind.permission_key(), Some("view_blacklist"));
        assert_eq!(inv.args, vec!["purge"]);
    }

    #[test]
    fn test_non_commands_are_ignored() {
        for text in ["hello", "/", "/dance", "mute @x"] {
            let msg = message(vec![Segment::text(text)]);
            assert!(Invocation::parse("/", BOT, &msg).is_none(), "{text}");
        }
    }

    #[test]
    fn test_custom_prefix() {
        let msg = message(vec![Segment::text("!kick")]);
        assert!(Invocation::parse("/", BOT, &msg).is_none());
        assert_eq!(
            Invocation::parse("!", BOT, &msg).unwrap().kind,
            CommandKind::Kick
        );
    }

    #[test]
    fn test_every_gated_kind_has_a_configurable_key() {
        use CommandKind::*;
        let kinds = [
            Mute, MuteMe, Unmute, MuteAll, UnmuteAll, Card, CardMe, Title, TitleMe, Kick, Block,
            Admin, Unadmin, Essence, Unessence, Recall, GroupName, Avatar, Members, Notice,
            Notices, CurfewStart, CurfewStop, KeywordAdd, KeywordRemove, KeywordList,
            BlacklistAdd, BlacklistRemove, BlacklistList, Approve, Deny,
        ];
        for kind in kinds {
            let key = kind.permission_key().unwrap();
            assert!(crate::config::COMMAND_KEYS.contains(&key), "{key}");
        }
        assert_eq!(kinds.len(), crate::config::COMMAND_KEYS.len());
        assert_eq!(Help.permission_key(), None);
    }

    #[test]
    fn test_mention_reply_segments() {
        let segments = Reply::Mention {
            user: UserId(3),
            text: "hi".into(),
        }
        .into_segments();
        assert_eq!(segments, vec![Segment::at(UserId(3)), Segment::text(" hi")]);
    }
}
