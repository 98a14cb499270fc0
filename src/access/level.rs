//! Trust levels and per-operation requirements.

use serde::Deserialize;
use std::fmt;
use warden_proto::MemberRole;

/// Ordinal administrative privilege. Smaller is more privileged.
///
/// The derived ordering follows declaration order, so `SuperUser < Owner <
/// Admin < Member < Unknown` and a check passes when `actual <= required`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TrustLevel {
    SuperUser = 0,
    Owner = 1,
    Admin = 2,
    Member = 3,
    Unknown = 4,
}

impl TrustLevel {
    /// True when this level is at or above `required` in privilege.
    #[inline]
    pub fn satisfies(self, required: TrustLevel) -> bool {
        self <= required
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrustLevel::SuperUser => "superuser",
            TrustLevel::Owner => "owner",
            TrustLevel::Admin => "admin",
            TrustLevel::Member => "member",
            TrustLevel::Unknown => "unknown",
        }
    }
}

impl From<MemberRole> for TrustLevel {
    fn from(role: MemberRole) -> Self {
        match role {
            MemberRole::Owner => TrustLevel::Owner,
            MemberRole::Admin => TrustLevel::Admin,
            MemberRole::Member => TrustLevel::Member,
            MemberRole::Unknown => TrustLevel::Unknown,
        }
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The levels an operation demands of the invoking actor and of the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionRequirement {
    pub actor: TrustLevel,
    pub bot: TrustLevel,
}

impl PermissionRequirement {
    pub const fn new(actor: TrustLevel, bot: TrustLevel) -> Self {
        Self { actor, bot }
    }
}

impl Default for PermissionRequirement {
    fn default() -> Self {
        Self::new(TrustLevel::Admin, TrustLevel::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_total_and_fixed() {
        let levels = [
            TrustLevel::SuperUser,
            TrustLevel::Owner,
            TrustLevel::Admin,
            TrustLevel::Member,
            TrustLevel::Unknown,
        ];
        for pair in levels.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0] as u8 + 1, pair[1] as u8);
        }
    }

    #[test]
    fn test_satisfies_is_numeric_at_or_below() {
        assert!(TrustLevel::Owner.satisfies(TrustLevel::Admin));
        assert!(TrustLevel::Admin.satisfies(TrustLevel::Admin));
        assert!(!TrustLevel::Member.satisfies(TrustLevel::Admin));
        assert!(!TrustLevel::Unknown.satisfies(TrustLevel::Member));
    }

    #[test]
    fn test_role_mapping_is_total() {
        assert_eq!(TrustLevel::from(MemberRole::Owner), TrustLevel::Owner);
        assert_eq!(TrustLevel::from(MemberRole::Unknown), TrustLevel::Unknown);
    }
}
