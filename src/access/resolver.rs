use super::TrustLevel;
use crate::platform::{Platform, PlatformError};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::trace;
use warden_proto::{GroupId, UserId};

/// Maps an actor to a trust level within a group.
///
/// Superusers short-circuit without a platform call. Everyone else costs one
/// uncached role lookup per call, so role changes take effect immediately.
pub struct PermissionResolver {
    superusers: HashSet<UserId>,
    platform: Arc<dyn Platform>,
}

impl PermissionResolver {
    pub fn new(superusers: impl IntoIterator<Item = UserId>, platform: Arc<dyn Platform>) -> Self {
        Self {
            superusers: superusers.into_iter().collect(),
            platform,
        }
    }

    #[inline]
    pub fn is_superuser(&self, actor: UserId) -> bool {
        self.superusers.contains(&actor)
    }

    pub async fn resolve_level(
        &self,
        actor: UserId,
        group: GroupId,
    ) -> Result<TrustLevel, PlatformError> {
        if self.is_superuser(actor) {
            return Ok(TrustLevel::SuperUser);
        }

        let info = self.platform.get_member_info(group, actor, true).await?;
        let level = TrustLevel::from(info.role);
        trace!(user = %actor, group = %group, level = %level, "Resolved trust level");
        Ok(level)
    }
}
