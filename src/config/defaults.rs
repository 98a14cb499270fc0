//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use warden_proto::MemberRole;

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Bot Defaults
// =============================================================================

pub fn default_command_prefix() -> String {
    "/".to_string()
}

// =============================================================================
// Database and Server Defaults
// =============================================================================

pub fn default_database_path() -> String {
    "groupwarden.db".to_string()
}

pub fn default_metrics_port() -> u16 {
    9090
}

pub fn default_simulated_bot_role() -> MemberRole {
    MemberRole::Admin
}

// =============================================================================
// Mute Defaults
// =============================================================================

pub fn default_random_min_secs() -> u64 {
    30
}

pub fn default_random_max_secs() -> u64 {
    300
}

// =============================================================================
// Curfew Defaults
// =============================================================================

pub fn default_curfew_start() -> String {
    "00:00".to_string()
}

pub fn default_curfew_end() -> String {
    "06:00".to_string()
}

pub fn default_poll_interval_secs() -> u64 {
    10
}

// =============================================================================
// Moderation Defaults
// =============================================================================

pub fn default_forbidden_mute_secs() -> u64 {
    600
}

pub fn default_reject_reason() -> String {
    "blacklisted".to_string()
}

// =============================================================================
// Output Limits
// =============================================================================

pub fn default_member_list_max() -> usize {
    50
}

pub fn default_notice_list_max() -> usize {
    5
}
