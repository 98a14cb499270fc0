//! Prometheus metrics collection for groupwarden.
//!
//! Metrics live in `OnceLock` statics registered by [`init`]. Until `init`
//! runs every recording helper is a no-op, so library code and unit tests
//! can record freely.
//!
//! - `warden_commands_total{command}` - operator commands by name
//! - `warden_command_duration_seconds{command}` - command latency
//! - `warden_command_errors_total{command,error}` - failed commands by error code
//! - `warden_authorization_denied_total{reason}` - gate denials (actor/bot/target)
//! - `warden_forbidden_words_total` - forbidden-word remediations
//! - `warden_join_decisions_total{decision}` - approve/reject/escalate
//! - `warden_curfew_transitions_total{direction}` - mute/unmute edges
//! - `warden_scheduled_tasks` - recorded per-group tasks

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters
// ========================================================================

pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();
pub static AUTHORIZATION_DENIED: OnceLock<IntCounterVec> = OnceLock::new();
pub static FORBIDDEN_WORDS: OnceLock<IntCounter> = OnceLock::new();
pub static JOIN_DECISIONS: OnceLock<IntCounterVec> = OnceLock::new();
pub static CURFEW_TRANSITIONS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges
// ========================================================================

pub static SCHEDULED_TASKS: OnceLock<IntGauge> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup. Repeated calls leave the first registration in place.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("warden_commands_total", "Operator commands by name"), &["command"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("warden_command_duration_seconds", "Operator command latency by name")
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("warden_command_errors_total", "Failed commands by error code"), &["command", "error"]));
    register!(AUTHORIZATION_DENIED, IntCounterVec::new(Opts::new("warden_authorization_denied_total", "Authorization denials by reason"), &["reason"]));
    register!(FORBIDDEN_WORDS, IntCounter::new("warden_forbidden_words_total", "Forbidden-word remediations"));
    register!(JOIN_DECISIONS, IntCounterVec::new(Opts::new("warden_join_decisions_total", "Join request decisions by outcome"), &["decision"]));
    register!(CURFEW_TRANSITIONS, IntCounterVec::new(Opts::new("warden_curfew_transitions_total", "Curfew mute toggles by direction"), &["direction"]));
    register!(SCHEDULED_TASKS, IntGauge::new("warden_scheduled_tasks", "Recorded per-group scheduled tasks"));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

fn inc(metric: &OnceLock<IntCounterVec>, labels: &[&str]) {
    if let Some(c) = metric.get() {
        c.with_label_values(labels).inc();
    }
}

/// Record a command execution with latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    inc(&COMMAND_COUNTER, &[command]);
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

#[inline]
pub fn record_command_error(command: &str, error: &str) {
    inc(&COMMAND_ERRORS, &[command, error]);
}

#[inline]
pub fn record_denial(reason: &str) {
    inc(&AUTHORIZATION_DENIED, &[reason]);
}

#[inline]
pub fn record_forbidden() {
    if let Some(c) = FORBIDDEN_WORDS.get() {
        c.inc();
    }
}

#[inline]
pub fn record_join_decision(decision: &str) {
    inc(&JOIN_DECISIONS, &[decision]);
}

#[inline]
pub fn record_curfew_transition(direction: &str) {
    inc(&CURFEW_TRANSITIONS, &[direction]);
}

#[inline]
pub fn set_scheduled_tasks(count: usize) {
    if let Some(g) = SCHEDULED_TASKS.get() {
        g.set(i64::try_from(count).unwrap_or(i64::MAX));
    }
}
