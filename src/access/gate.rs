//! The authorization gate every privileged command passes through.

use super::{PermissionRequirement, PermissionResolver, TrustLevel};
use crate::error::CommandError;
use crate::metrics;
use tracing::debug;
use warden_proto::{GroupId, UserId};

/// Why the gate refused an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    InsufficientActorPrivilege,
    InsufficientBotPrivilege,
    /// A referenced member ranks at or above the bot.
    TargetOutranksBot,
}

impl Denial {
    /// Fixed user-facing text, one per reason.
    pub fn message(self) -> &'static str {
        match self {
            Denial::InsufficientActorPrivilege => "You don't have permission to do that",
            Denial::InsufficientBotPrivilege => "I don't have permission to do that",
            Denial::TargetOutranksBot => "I can't act on that member",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Denial::InsufficientActorPrivilege => "actor",
            Denial::InsufficientBotPrivilege => "bot",
            Denial::TargetOutranksBot => "target",
        }
    }
}

/// Who is asking for what, in which group.
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    pub group: GroupId,
    pub actor: UserId,
    /// Members the operation would act upon.
    pub targets: &'a [UserId],
}

pub struct AuthorizationGate {
    resolver: PermissionResolver,
    self_id: UserId,
}

impl AuthorizationGate {
    pub fn new(resolver: PermissionResolver, self_id: UserId) -> Self {
        Self { resolver, self_id }
    }

    /// Check the actor, then the bot, then every target.
    ///
    /// Nothing is mutated here; callers must not start side effects before
    /// this returns `Ok`.
    pub async fn authorize(
        &self,
        request: &AccessRequest<'_>,
        requirement: PermissionRequirement,
    ) -> Result<(), CommandError> {
        let actor_level = self
            .resolver
            .resolve_level(request.actor, request.group)
            .await?;
        if !actor_level.satisfies(requirement.actor) {
            return Err(self.deny(request, Denial::InsufficientActorPrivilege, actor_level));
        }

        let bot_level = self
            .resolver
            .resolve_level(self.self_id, request.group)
            .await?;
        if !bot_level.satisfies(requirement.bot) {
            return Err(self.deny(request, Denial::InsufficientBotPrivilege, bot_level));
        }

        for &target in request.targets {
            let target_level = self.resolver.resolve_level(target, request.group).await?;
            if bot_level >= target_level {
                return Err(self.deny(request, Denial::TargetOutranksBot, target_level));
            }
        }

        Ok(())
    }

    fn deny(&self, request: &AccessRequest<'_>, denial: Denial, level: TrustLevel) -> CommandError {
        debug!(
            group = %request.group,
            actor = %request.actor,
            reason = denial.code(),
            level = %level,
            "Authorization denied"
        );
        metrics::record_denial(denial.code());
        CommandError::Denied(denial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::SimulatedPlatform;
    use std::sync::Arc;
    use warden_proto::{MemberInfo, MemberRole};

    const GROUP: GroupId = GroupId(10);
    const BOT: UserId = UserId(1);

    fn build_gate(bot_role: MemberRole, members: &[(i64, MemberRole)], superusers: &[i64]) -> AuthorizationGate {
        let platform = Arc::new(SimulatedPlatform::new(BOT, bot_role));
        for &(user, role) in members {
            platform.add_member(MemberInfo {
                group_id: GROUP,
                user_id: UserId(user),
                nickname: format!("u{user}"),
                card: String::new(),
                role,
            });
        }
        let resolver = PermissionResolver::new(superusers.iter().map(|&u| UserId(u)), platform);
        AuthorizationGate::new(resolver, BOT)
    }

    fn denial_of(result: Result<(), CommandError>) -> Option<Denial> {
        match result {
            Ok(()) => None,
            Err(CommandError::Denied(d)) => Some(d),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_actor_threshold_is_numeric() {
        let roles = [
            (MemberRole::Owner, TrustLevel::Owner),
            (MemberRole::Admin, TrustLevel::Admin),
            (MemberRole::Member, TrustLevel::Member),
            (MemberRole::Unknown, TrustLevel::Unknown),
        ];
        let requirements = [
            TrustLevel::SuperUser,
            TrustLevel::Owner,
            TrustLevel::Admin,
            TrustLevel::Member,
        ];
        for (role, level) in roles {
            let gate = build_gate(MemberRole::Owner, &[(2, role)], &[]);
            for required in requirements {
                let request = AccessRequest {
                    group: GROUP,
                    actor: UserId(2),
                    targets: &[],
                };
                let requirement = PermissionRequirement::new(required, TrustLevel::Unknown);
                let denied = denial_of(gate.authorize(&request, requirement).await);
                if level > required {
                    assert_eq!(denied, Some(Denial::InsufficientActorPrivilege));
                } else {
                    assert_eq!(denied, None);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_superuser_passes_any_actor_requirement() {
        let gate = build_gate(MemberRole::Owner, &[(2, MemberRole::Member)], &[2]);
        let request = AccessRequest {
            group: GROUP,
            actor: UserId(2),
            targets: &[],
        };
        let requirement = PermissionRequirement::new(TrustLevel::SuperUser, TrustLevel::Admin);
        assert_eq!(denial_of(gate.authorize(&request, requirement).await), None);
    }

    #[tokio::test]
    async fn test_bot_privilege_checked_after_actor() {
        let gate = build_gate(MemberRole::Admin, &[(2, MemberRole::Owner), (3, MemberRole::Member)], &[]);
        let owner_only = PermissionRequirement::new(TrustLevel::Admin, TrustLevel::Owner);

        let request = AccessRequest {
            group: GROUP,
            actor: UserId(2),
            targets: &[],
        };
        assert_eq!(
            denial_of(gate.authorize(&request, owner_only).await),
            Some(Denial::InsufficientBotPrivilege)
        );

        // An unprivileged actor is rejected for their own level first.
        let request = AccessRequest {
            group: GROUP,
            actor: UserId(3),
            targets: &[],
        };
        assert_eq!(
            denial_of(gate.authorize(&request, owner_only).await),
            Some(Denial::InsufficientActorPrivilege)
        );
    }

    #[tokio::test]
    async fn test_targets_must_rank_strictly_below_bot() {
        let gate = build_gate(
            MemberRole::Admin,
            &[(2, MemberRole::Owner), (3, MemberRole::Admin), (4, MemberRole::Member)],
            &[],
        );
        let requirement = PermissionRequirement::default();

        let request = AccessRequest {
            group: GROUP,
            actor: UserId(2),
            targets: &[UserId(4)],
        };
        assert_eq!(denial_of(gate.authorize(&request, requirement).await), None);

        let request = AccessRequest {
            group: GROUP,
            actor: UserId(2),
            targets: &[UserId(4), UserId(3)],
        };
        assert_eq!(
            denial_of(gate.authorize(&request, requirement).await),
            Some(Denial::TargetOutranksBot)
        );
    }

    #[tokio::test]
    async fn test_lookup_failure_is_not_an_allow() {
        let gate = build_gate(MemberRole::Admin, &[(2, MemberRole::Owner)], &[]);
        let request = AccessRequest {
            group: GROUP,
            actor: UserId(2),
            targets: &[UserId(404)],
        };
        let result = gate.authorize(&request, PermissionRequirement::default()).await;
        assert!(matches!(result, Err(CommandError::Platform(_))));
    }
}
