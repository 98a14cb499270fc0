//! Per-group scheduled background tasks.
//!
//! Each group owns at most one live task. A task is a spawned future plus
//! the [`CancellationToken`] it watches; stopping cancels the token and
//! waits for the task to acknowledge by returning.

pub mod curfew;

pub use curfew::{Clock, CurfewEnforcer, CurfewWindow, LocalClock};

use crate::error::SchedulerError;
use crate::metrics;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::future::Future;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use warden_proto::GroupId;

/// A recorded background task.
///
/// `handle` is taken by whoever stops the task; the record stays in the
/// table until that stop has been acknowledged.
#[derive(Debug)]
pub struct ScheduledTask {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
    started_at: Instant,
}

impl ScheduledTask {
    /// Whether the group slot is still taken: the future is running, or a
    /// stop is waiting on it.
    fn holds_slot(&self) -> bool {
        self.handle.as_ref().is_none_or(|handle| !handle.is_finished())
    }

    /// Cancel the task and hand back its join handle, unless another caller
    /// is already stopping it.
    fn begin_stop(&mut self) -> Option<JoinHandle<()>> {
        self.token.cancel();
        self.handle.take()
    }
}

async fn await_stopped(group: GroupId, handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        warn!(group = %group, error = %e, "Scheduled task ended abnormally");
    }
}

/// Owns the per-group task table.
#[derive(Debug, Default)]
pub struct ScheduledTaskManager {
    tasks: DashMap<GroupId, ScheduledTask>,
}

impl ScheduledTaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `body` as the task for `group`.
    ///
    /// Rejected with [`SchedulerError::AlreadyRunning`] while a task is live
    /// or still being stopped; nothing is spawned in that case. A recorded
    /// task that has already finished on its own is replaced.
    pub fn start<F, Fut>(&self, group: GroupId, body: F) -> Result<(), SchedulerError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let spawn = |body: F| {
            let token = CancellationToken::new();
            let handle = tokio::spawn(body(token.clone()));
            ScheduledTask {
                token,
                handle: Some(handle),
                started_at: Instant::now(),
            }
        };

        match self.tasks.entry(group) {
            Entry::Occupied(mut entry) => {
                if entry.get().holds_slot() {
                    return Err(SchedulerError::AlreadyRunning(group));
                }
                info!(group = %group, "Replacing finished scheduled task");
                entry.insert(spawn(body));
            }
            Entry::Vacant(entry) => {
                entry.insert(spawn(body));
            }
        }

        info!(group = %group, "Scheduled task started");
        metrics::set_scheduled_tasks(self.tasks.len());
        Ok(())
    }

    /// Cancel the task for `group` and wait for it to acknowledge.
    ///
    /// The group stays occupied until the task has returned, so a `start`
    /// racing this call is rejected rather than run alongside the old task.
    pub async fn stop(&self, group: GroupId) -> Result<(), SchedulerError> {
        let (handle, ran_for) = {
            let Some(mut task) = self.tasks.get_mut(&group) else {
                return Err(SchedulerError::NotRunning(group));
            };
            let Some(handle) = task.begin_stop() else {
                return Err(SchedulerError::NotRunning(group));
            };
            (handle, task.started_at.elapsed())
        };

        await_stopped(group, handle).await;
        self.tasks.remove_if(&group, |_, task| task.handle.is_none());
        info!(group = %group, ran_secs = ran_for.as_secs(), "Scheduled task stopped");
        metrics::set_scheduled_tasks(self.tasks.len());
        Ok(())
    }

    /// A task is running until it is cancelled or its future has returned.
    #[cfg(test)]
    pub fn is_running(&self, group: GroupId) -> bool {
        self.tasks
            .get(&group)
            .is_some_and(|task| !task.token.is_cancelled() && task.holds_slot())
    }

    /// Cancel every recorded task and wait for all of them.
    pub async fn shutdown(&self) {
        let pending: Vec<(GroupId, JoinHandle<()>)> = self
            .tasks
            .iter_mut()
            .filter_map(|mut entry| {
                let group = *entry.key();
                entry.begin_stop().map(|handle| (group, handle))
            })
            .collect();

        let count = pending.len();
        for (group, handle) in pending {
            await_stopped(group, handle).await;
        }
        self.tasks.retain(|_, task| task.handle.is_some());
        if count > 0 {
            info!(count, "Scheduled tasks cancelled for shutdown");
        }
        metrics::set_scheduled_tasks(self.tasks.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const GROUP: GroupId = GroupId(10);

    /// Counts itself live, then takes a while to acknowledge cancellation.
    async fn slow_to_acknowledge(
        token: CancellationToken,
        live: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    ) {
        let now = live.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        token.cancelled().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        live.fetch_sub(1, Ordering::SeqCst);
    }

    #[tokio::test]
    async fn test_duplicate_start_is_rejected_without_spawning() {
        let manager = ScheduledTaskManager::new();
        let spawned = Arc::new(AtomicUsize::new(0));

        let results: Vec<_> = (0..2)
            .map(|_| {
                let spawned = spawned.clone();
                manager.start(GROUP, move |token| async move {
                    spawned.fetch_add(1, Ordering::SeqCst);
                    token.cancelled().await;
                })
            })
            .collect();

        assert_eq!(results[0], Ok(()));
        assert_eq!(results[1], Err(SchedulerError::AlreadyRunning(GROUP)));
        assert_eq!(manager.tasks.len(), 1);
        manager.stop(GROUP).await.unwrap();
        assert_eq!(spawned.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_start_reports_already_running() {
        let manager = ScheduledTaskManager::new();
        manager
            .start(GROUP, |token| async move { token.cancelled().await })
            .unwrap();
        let second = manager.start(GROUP, |token| async move { token.cancelled().await });
        assert_eq!(second, Err(SchedulerError::AlreadyRunning(GROUP)));
        assert!(manager.is_running(GROUP));
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_stop_without_task_is_not_running() {
        let manager = ScheduledTaskManager::new();
        assert_eq!(
            manager.stop(GROUP).await,
            Err(SchedulerError::NotRunning(GROUP))
        );
    }

    #[tokio::test]
    async fn test_stop_waits_for_acknowledgement() {
        let manager = ScheduledTaskManager::new();
        let acknowledged = Arc::new(AtomicUsize::new(0));
        let ack = acknowledged.clone();
        manager
            .start(GROUP, move |token| async move {
                token.cancelled().await;
                tokio::task::yield_now().await;
                ack.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        manager.stop(GROUP).await.unwrap();
        assert_eq!(acknowledged.load(Ordering::SeqCst), 1);
        assert!(!manager.is_running(GROUP));
        assert!(manager.tasks.is_empty());
    }

    #[tokio::test]
    async fn test_finished_task_can_be_replaced() {
        let manager = ScheduledTaskManager::new();
        manager.start(GROUP, |_token| async {}).unwrap();
        while manager.is_running(GROUP) {
            tokio::task::yield_now().await;
        }
        manager
            .start(GROUP, |token| async move { token.cancelled().await })
            .unwrap();
        assert!(manager.is_running(GROUP));
        manager.shutdown().await;
        assert!(manager.tasks.is_empty());
    }

    #[tokio::test]
    async fn test_groups_are_independent() {
        let manager = ScheduledTaskManager::new();
        for group in [GroupId(1), GroupId(2)] {
            manager
                .start(group, |token| async move { token.cancelled().await })
                .unwrap();
        }
        manager.stop(GroupId(1)).await.unwrap();
        assert!(!manager.is_running(GroupId(1)));
        assert!(manager.is_running(GroupId(2)));
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_start_while_stopping_is_rejected() {
        let manager = Arc::new(ScheduledTaskManager::new());
        let live = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (l, p) = (live.clone(), peak.clone());
        manager
            .start(GROUP, move |token| slow_to_acknowledge(token, l, p))
            .unwrap();
        tokio::task::yield_now().await;

        let stopping = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.stop(GROUP).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(!manager.is_running(GROUP));
        let (l, p) = (live.clone(), peak.clone());
        assert_eq!(
            manager.start(GROUP, move |token| slow_to_acknowledge(token, l, p)),
            Err(SchedulerError::AlreadyRunning(GROUP))
        );
        assert_eq!(
            manager.stop(GROUP).await,
            Err(SchedulerError::NotRunning(GROUP))
        );

        stopping.await.unwrap().unwrap();
        assert_eq!(live.load(Ordering::SeqCst), 0);
        assert!(manager.tasks.is_empty());

        let (l, p) = (live.clone(), peak.clone());
        manager
            .start(GROUP, move |token| slow_to_acknowledge(token, l, p))
            .unwrap();
        tokio::task::yield_now().await;
        manager.shutdown().await;
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_every_group() {
        let manager = ScheduledTaskManager::new();
        let acknowledged = Arc::new(AtomicUsize::new(0));
        for id in 1..=3u64 {
            let ack = acknowledged.clone();
            manager
                .start(GroupId(id as i64), move |token| async move {
                    token.cancelled().await;
                    tokio::time::sleep(Duration::from_millis(20 * id)).await;
                    ack.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        manager.shutdown().await;
        assert_eq!(acknowledged.load(Ordering::SeqCst), 3);
        assert!(manager.tasks.is_empty());
        for id in 1..=3 {
            assert!(!manager.is_running(GroupId(id)));
        }

        manager
            .start(GroupId(1), |token| async move { token.cancelled().await })
            .unwrap();
        manager.shutdown().await;
    }
}
