//! Per-command permission requirements.
//!
//! The `[permissions]` table maps a command key to either a bare level
//! (`kick = "owner"`, which sets the actor requirement) or a table
//! (`title = { actor = "admin", bot = "owner" }`). Anything not configured
//! falls back to the built-in table below.

use crate::access::{PermissionRequirement, TrustLevel};
use serde::Deserialize;
use std::collections::HashMap;

/// Every gated command key.
pub const COMMAND_KEYS: &[&str] = &[
    "mute",
    "mute_me",
    "unmute",
    "mute_all",
    "unmute_all",
    "set_card",
    "set_card_me",
    "set_title",
    "set_title_me",
    "kick",
    "block",
    "set_admin",
    "unset_admin",
    "set_essence",
    "unset_essence",
    "delete_message",
    "set_group_name",
    "set_group_avatar",
    "list_members",
    "post_notice",
    "read_notices",
    "start_curfew",
    "stop_curfew",
    "add_keyword",
    "remove_keyword",
    "view_keywords",
    "add_blacklist",
    "remove_blacklist",
    "view_blacklist",
    "approve_join",
    "deny_join",
];

/// Built-in requirement for `key`. Unlisted keys need admin on both sides.
pub fn builtin_requirement(key: &str) -> PermissionRequirement {
    use TrustLevel::{Admin, Member, Owner};

    match key {
        "mute_me" | "set_card_me" | "list_members" | "read_notices" => {
            PermissionRequirement::new(Member, Admin)
        }
        "set_title" | "set_admin" | "unset_admin" => PermissionRequirement::new(Admin, Owner),
        "set_title_me" => PermissionRequirement::new(Member, Owner),
        "delete_message" => PermissionRequirement::new(Admin, Member),
        _ => PermissionRequirement::default(),
    }
}

/// One configured override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RequirementSpec {
    Actor(TrustLevel),
    Full {
        #[serde(default)]
        actor: Option<TrustLevel>,
        #[serde(default)]
        bot: Option<TrustLevel>,
    },
}

impl RequirementSpec {
    fn apply(self, base: PermissionRequirement) -> PermissionRequirement {
        match self {
            RequirementSpec::Actor(actor) => PermissionRequirement::new(actor, base.bot),
            RequirementSpec::Full { actor, bot } => {
                PermissionRequirement::new(actor.unwrap_or(base.actor), bot.unwrap_or(base.bot))
            }
        }
    }

    pub(crate) fn levels(self) -> impl Iterator<Item = TrustLevel> {
        let (a, b) = match self {
            RequirementSpec::Actor(actor) => (Some(actor), None),
            RequirementSpec::Full { actor, bot } => (actor, bot),
        };
        a.into_iter().chain(b)
    }
}

/// Configured overrides merged over [`builtin_requirement`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PermissionTable {
    overrides: HashMap<String, RequirementSpec>,
}

impl PermissionTable {
    pub fn requirement(&self, key: &str) -> PermissionRequirement {
        let base = builtin_requirement(key);
        match self.overrides.get(key) {
            Some(spec) => spec.apply(base),
            None => base,
        }
    }

    pub(crate) fn overrides(&self) -> impl Iterator<Item = (&str, RequirementSpec)> {
        self.overrides.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
