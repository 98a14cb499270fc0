//! The moderation engine.
//!
//! [`Warden`] owns every subsystem and routes inbound events to them:
//! group messages go through the forbidden-word filter and then command
//! dispatch, join requests to the join engine, and departures to the
//! automatic blacklist.

use crate::access::{AuthorizationGate, PermissionResolver};
use crate::commands::{Invocation, Reply};
use crate::config::Config;
use crate::db::{Database, DbError};
use crate::metrics;
use crate::moderation::{ForbiddenWordFilter, JoinRequestEngine};
use crate::platform::Platform;
use crate::scheduler::{Clock, LocalClock, ScheduledTaskManager};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use warden_proto::{Event, GroupId, GroupMessage, JoinRequest, LeaveKind, MemberLeave, UserId};

pub struct Warden {
    pub(crate) config: Config,
    pub(crate) platform: Arc<dyn Platform>,
    pub(crate) gate: AuthorizationGate,
    pub(crate) scheduler: ScheduledTaskManager,
    pub(crate) filter: ForbiddenWordFilter,
    pub(crate) joins: JoinRequestEngine,
    pub(crate) clock: Arc<dyn Clock>,
}

impl Warden {
    /// Wire up the subsystems and load stored join rules from `db`.
    pub async fn new(config: Config, platform: Arc<dyn Platform>, db: Database) -> Result<Self, DbError> {
        let self_id = config.bot.self_id;

        let resolver = PermissionResolver::new(config.bot.superusers.iter().copied(), platform.clone());
        let gate = AuthorizationGate::new(resolver, self_id);

        let filter = ForbiddenWordFilter::new(
            config.forbidden.groups.iter().copied(),
            config.forbidden.words.clone(),
            config.forbidden.case_insensitive,
            Duration::from_secs(config.forbidden.mute_secs),
        );

        let joins =
            JoinRequestEngine::load(db, platform.clone(), self_id, config.join.reject_reason.clone()).await?;

        info!(
            self_id = %self_id,
            superusers = config.bot.superusers.len(),
            screened_groups = config.forbidden.groups.len(),
            "Warden initialized"
        );

        Ok(Self {
            config,
            platform,
            gate,
            scheduler: ScheduledTaskManager::new(),
            filter,
            joins,
            clock: Arc::new(LocalClock),
        })
    }

    /// Replace the wall clock curfew tasks read.
    #[cfg(test)]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn self_id(&self) -> UserId {
        self.config.bot.self_id
    }

    /// Handle one inbound event. Failures are logged and contained.
    pub async fn handle_event(&self, event: &Event) {
        match event {
            Event::GroupMessage(msg) => self.on_group_message(msg).await,
            Event::JoinRequest(request) => self.on_join_request(request).await,
            Event::MemberLeave(leave) => self.on_member_leave(leave).await,
        }
    }

    async fn on_group_message(&self, msg: &GroupMessage) {
        if msg.sender.user_id == self.self_id() {
            return;
        }

        // A screened message is never also a command.
        if self.filter.screen(self.platform.as_ref(), msg).await.is_some() {
            return;
        }

        let Some(inv) = Invocation::parse(&self.config.bot.command_prefix, self.self_id(), msg) else {
            return;
        };

        let command = inv.kind.name();
        debug!(group = %msg.group_id, actor = %msg.sender.user_id, command, "Command received");

        let started = Instant::now();
        let replies = match self.execute(&inv).await {
            Ok(replies) => replies,
            Err(e) => {
                debug!(command, error = %e, "Command failed");
                metrics::record_command_error(command, e.error_code());
                vec![Reply::text(e.user_message())]
            }
        };
        metrics::record_command(command, started.elapsed().as_secs_f64());

        self.send_replies(msg.group_id, replies).await;
    }

    async fn send_replies(&self, group: GroupId, replies: Vec<Reply>) {
        for reply in replies {
            if let Err(e) = self
                .platform
                .send_group_message(group, reply.into_segments())
                .await
            {
                warn!(group = %group, error = %e, "Failed to send reply");
            }
        }
    }

    async fn on_join_request(&self, request: &JoinRequest) {
        if let Err(e) = self.joins.on_join_request(request).await {
            warn!(
                group = %request.group_id,
                user = %request.user_id,
                error = %e,
                "Join request handling failed"
            );
        }
    }

    async fn on_member_leave(&self, leave: &MemberLeave) {
        match leave.kind {
            LeaveKind::Leave => {
                if let Err(e) = self.joins.on_member_leave(leave.group_id, leave.user_id).await {
                    warn!(
                        group = %leave.group_id,
                        user = %leave.user_id,
                        error = %e,
                        "Failed to blacklist departed member"
                    );
                }
            }
            LeaveKind::Kick => {
                debug!(
                    group = %leave.group_id,
                    user = %leave.user_id,
                    operator = %leave.operator_id,
                    "Member removed by an operator"
                );
            }
        }
    }

    /// Stop every scheduled task.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
        info!("Warden shut down");
    }
}
