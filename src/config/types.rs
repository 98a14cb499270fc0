//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use warden_proto::{GroupId, MemberRole, UserId};

use super::defaults::*;
use super::permissions::PermissionTable;
use crate::scheduler::CurfewWindow;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid time of day for {field}: {value:?}")]
    InvalidTime { field: &'static str, value: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Bot identity and operators.
    pub bot: BotConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Per-command permission overrides.
    #[serde(default)]
    pub permissions: PermissionTable,
    #[serde(default)]
    pub mute: MuteConfig,
    #[serde(default)]
    pub curfew: CurfewConfig,
    #[serde(default)]
    pub forbidden: ForbiddenConfig,
    #[serde(default)]
    pub join: JoinConfig,
    /// Output limits for list commands.
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Bot identity.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// The bot's own account id.
    pub self_id: UserId,
    /// Accounts that pass every actor requirement.
    #[serde(default)]
    pub superusers: Vec<UserId>,
    /// Text a message must start with to be read as a command.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Process-level settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Prometheus metrics HTTP port. `0` disables the endpoint.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    /// Print every platform intent to stdout as a JSON line.
    #[serde(default = "default_true")]
    pub echo_intents: bool,
    /// Role the simulated platform assumes for the bot in unseen groups.
    #[serde(default = "default_simulated_bot_role")]
    pub simulated_bot_role: MemberRole,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            metrics_port: default_metrics_port(),
            echo_intents: default_true(),
            simulated_bot_role: default_simulated_bot_role(),
        }
    }
}

/// Bounds for mutes issued without an explicit duration.
#[derive(Debug, Clone, Deserialize)]
pub struct MuteConfig {
    #[serde(default = "default_random_min_secs")]
    pub random_min_secs: u64,
    #[serde(default = "default_random_max_secs")]
    pub random_max_secs: u64,
}

impl Default for MuteConfig {
    fn default() -> Self {
        Self {
            random_min_secs: default_random_min_secs(),
            random_max_secs: default_random_max_secs(),
        }
    }
}

/// Default curfew window and poll rate.
#[derive(Debug, Clone, Deserialize)]
pub struct CurfewConfig {
    /// Start of the window, `HH:MM`.
    #[serde(default = "default_curfew_start")]
    pub start: String,
    /// End of the window, `HH:MM`, inclusive.
    #[serde(default = "default_curfew_end")]
    pub end: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl CurfewConfig {
    pub fn window(&self) -> Result<CurfewWindow, ConfigError> {
        let parse = |field: &'static str, value: &str| {
            crate::scheduler::curfew::parse_time_of_day(value).map_err(|_| {
                ConfigError::InvalidTime {
                    field,
                    value: value.to_string(),
                }
            })
        };
        Ok(CurfewWindow::new(
            parse("curfew.start", &self.start)?,
            parse("curfew.end", &self.end)?,
        ))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for CurfewConfig {
    fn default() -> Self {
        Self {
            start: default_curfew_start(),
            end: default_curfew_end(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

/// Forbidden-word screening.
#[derive(Debug, Clone, Deserialize)]
pub struct ForbiddenConfig {
    /// Groups whose messages are screened.
    #[serde(default)]
    pub groups: Vec<GroupId>,
    /// Checked in order; the first hit wins.
    #[serde(default)]
    pub words: Vec<String>,
    /// Mute applied to the sender. `0` only deletes the message.
    #[serde(default = "default_forbidden_mute_secs")]
    pub mute_secs: u64,
    /// ASCII case folding during matching.
    #[serde(default)]
    pub case_insensitive: bool,
}

impl Default for ForbiddenConfig {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            words: Vec::new(),
            mute_secs: default_forbidden_mute_secs(),
            case_insensitive: false,
        }
    }
}

/// Join-request screening.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinConfig {
    /// Reason sent with automatic rejections.
    #[serde(default = "default_reject_reason")]
    pub reject_reason: String,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            reject_reason: default_reject_reason(),
        }
    }
}

/// Output limits for list commands.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_member_list_max")]
    pub member_list_max: usize,
    #[serde(default = "default_notice_list_max")]
    pub notice_list_max: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            member_list_max: default_member_list_max(),
            notice_list_max: default_notice_list_max(),
        }
    }
}
