//! Curfew enforcement.
//!
//! A curfew mutes a whole group while the wall clock sits inside a daily
//! window. The enforcer polls on a fixed interval and only calls the
//! platform on edges: entering the window mutes, leaving it unmutes.

use crate::metrics;
use crate::platform::Platform;
use chrono::{NaiveTime, Timelike};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use warden_proto::{GroupId, Segment};

/// Source of the current time of day.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveTime;
}

/// The host's local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveTime {
        chrono::Local::now().time()
    }
}

/// Parse `HH:MM` (or `HH:MM:SS`) into a time of day.
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime, chrono::ParseError> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M"))
}

/// Drop everything below minutes.
fn to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

/// A daily window `[start, end]`, inclusive, at minute resolution.
///
/// The check is a plain `start <= now <= end`: a window whose end is before
/// its start (e.g. `23:30`-`06:00`) never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurfewWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl CurfewWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start: to_minute(start),
            end: to_minute(end),
        }
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self::new(parse_time_of_day(start)?, parse_time_of_day(end)?))
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn contains(&self, now: NaiveTime) -> bool {
        let now = to_minute(now);
        self.start <= now && now <= self.end
    }
}

impl std::fmt::Display for CurfewWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurfewState {
    Unmuted,
    Muted,
}

/// An edge the enforcer acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Entered,
    Left,
}

/// The task body run by the scheduler for one group.
pub struct CurfewEnforcer {
    group: GroupId,
    window: CurfewWindow,
    state: CurfewState,
    interval: Duration,
    platform: Arc<dyn Platform>,
    clock: Arc<dyn Clock>,
}

impl CurfewEnforcer {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

    pub fn new(
        group: GroupId,
        window: CurfewWindow,
        platform: Arc<dyn Platform>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            group,
            window,
            state: CurfewState::Unmuted,
            interval: Self::DEFAULT_INTERVAL,
            platform,
            clock,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn state(&self) -> CurfewState {
        self.state
    }

    /// Evaluate one poll. Returns the edge acted on, if any.
    ///
    /// A failed mute or unmute leaves the state untouched so the next tick
    /// retries.
    pub async fn tick(&mut self, now: NaiveTime) -> Option<Transition> {
        let inside = self.window.contains(now);
        let (enable, transition) = match (self.state, inside) {
            (CurfewState::Unmuted, true) => (true, Transition::Entered),
            (CurfewState::Muted, false) => (false, Transition::Left),
            _ => return None,
        };

        if let Err(e) = self.platform.set_whole_mute(self.group, enable).await {
            warn!(group = %self.group, enable, error = %e, "Curfew mute toggle failed; retrying next tick");
            return None;
        }

        self.state = if enable {
            CurfewState::Muted
        } else {
            CurfewState::Unmuted
        };
        info!(group = %self.group, window = %self.window, muted = enable, "Curfew edge");
        metrics::record_curfew_transition(if enable { "mute" } else { "unmute" });

        let text = match transition {
            Transition::Entered => format!(
                "Curfew has begun. The group is muted until {}.",
                self.window.end().format("%H:%M")
            ),
            Transition::Left => "Curfew is over. The group is open again.".to_string(),
        };
        if let Err(e) = self
            .platform
            .send_group_message(self.group, vec![Segment::text(text)])
            .await
        {
            debug!(group = %self.group, error = %e, "Curfew announcement failed");
        }

        Some(transition)
    }

    /// Poll until cancelled.
    ///
    /// Cancellation is checked before every tick and raced against every
    /// sleep. The group is left in whatever mute state it is in.
    pub async fn run(mut self, token: CancellationToken) {
        info!(group = %self.group, window = %self.window, "Curfew enforcer running");
        loop {
            if token.is_cancelled() {
                break;
            }
            let now = self.clock.now();
            self.tick(now).await;

            tokio::select! {
                biased;

                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        info!(group = %self.group, state = ?self.state, "Curfew enforcer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Intent, SimulatedPlatform};
    use crate::scheduler::ScheduledTaskManager;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use warden_proto::{MemberRole, UserId};

    const GROUP: GroupId = GroupId(10);

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    /// Hands out scripted times, repeating the last one.
    struct ScriptedClock(Mutex<VecDeque<NaiveTime>>);

    impl Clock for ScriptedClock {
        fn now(&self) -> NaiveTime {
            let mut times = self.0.lock();
            if times.len() > 1 {
                times.pop_front().unwrap_or(at(0, 0))
            } else {
                times.front().copied().unwrap_or(at(0, 0))
            }
        }
    }

    fn whole_mutes(platform: &SimulatedPlatform) -> Vec<bool> {
        platform
            .intents()
            .into_iter()
            .filter_map(|i| match i {
                Intent::WholeMute { enable, .. } => Some(enable),
                _ => None,
            })
            .collect()
    }

    fn enforcer(platform: Arc<SimulatedPlatform>, window: CurfewWindow) -> CurfewEnforcer {
        CurfewEnforcer::new(GROUP, window, platform, Arc::new(LocalClock))
    }

    #[tokio::test]
    async fn test_transitions_fire_on_edges_only() {
        let platform = Arc::new(SimulatedPlatform::new(UserId(1), MemberRole::Admin));
        let mut curfew = enforcer(platform.clone(), CurfewWindow::new(at(9, 0), at(9, 5)));

        assert_eq!(curfew.tick(at(8, 59)).await, None);
        assert_eq!(curfew.tick(at(9, 0)).await, Some(Transition::Entered));
        assert_eq!(curfew.tick(at(9, 3)).await, None);
        assert_eq!(curfew.tick(at(9, 6)).await, Some(Transition::Left));

        assert_eq!(whole_mutes(&platform), vec![true, false]);
        assert_eq!(curfew.state(), CurfewState::Unmuted);
    }

    #[tokio::test]
    async fn test_window_bounds_are_inclusive() {
        let window = CurfewWindow::parse("09:00", "09:05").unwrap();
        assert!(window.contains(at(9, 0)));
        assert!(window.contains(NaiveTime::from_hms_opt(9, 5, 59).unwrap()));
        assert!(!window.contains(at(9, 6)));
        assert!(!window.contains(at(8, 59)));
    }

    #[test]
    fn test_midnight_wrapping_window_never_matches() {
        // Preserved behavior: no special case for windows crossing midnight.
        let window = CurfewWindow::parse("23:30", "06:00").unwrap();
        for time in [at(23, 30), at(23, 59), at(0, 0), at(3, 0), at(6, 0), at(12, 0)] {
            assert!(!window.contains(time), "{time} unexpectedly inside");
        }
    }

    #[test]
    fn test_parse_time_of_day_formats() {
        assert_eq!(parse_time_of_day("7:05").unwrap(), at(7, 5));
        assert_eq!(
            parse_time_of_day("07:05:30").unwrap(),
            NaiveTime::from_hms_opt(7, 5, 30).unwrap()
        );
        assert!(parse_time_of_day("25:00").is_err());
        assert!(parse_time_of_day("soon").is_err());
    }

    #[tokio::test]
    async fn test_failed_mute_retries_next_tick() {
        let platform = Arc::new(SimulatedPlatform::new(UserId(1), MemberRole::Admin));
        let mut curfew = enforcer(platform.clone(), CurfewWindow::new(at(9, 0), at(9, 5)));

        platform.fail("whole_mute");
        assert_eq!(curfew.tick(at(9, 0)).await, None);
        assert_eq!(curfew.state(), CurfewState::Unmuted);

        platform.recover("whole_mute");
        assert_eq!(curfew.tick(at(9, 1)).await, Some(Transition::Entered));
        assert_eq!(whole_mutes(&platform), vec![true]);
    }

    #[tokio::test]
    async fn test_cancellation_leaves_group_muted() {
        let platform = Arc::new(SimulatedPlatform::new(UserId(1), MemberRole::Admin));
        let clock = Arc::new(ScriptedClock(Mutex::new(VecDeque::from([at(9, 1)]))));
        let curfew = CurfewEnforcer::new(
            GROUP,
            CurfewWindow::new(at(9, 0), at(9, 5)),
            platform.clone(),
            clock,
        )
        .with_interval(Duration::from_millis(1));

        let manager = ScheduledTaskManager::new();
        manager.start(GROUP, move |token| curfew.run(token)).unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while whole_mutes(&platform).is_empty() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("curfew never muted the group");

        manager.stop(GROUP).await.unwrap();
        assert_eq!(whole_mutes(&platform), vec![true]);
    }
}
