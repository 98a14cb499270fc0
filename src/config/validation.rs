//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use super::permissions::COMMAND_KEYS;
use crate::access::TrustLevel;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bot.self_id must be a positive account id")]
    InvalidSelfId,
    #[error("bot.command_prefix must not be empty")]
    EmptyCommandPrefix,
    #[error("mute.random_min_secs ({min}) exceeds mute.random_max_secs ({max})")]
    MuteBoundsInverted { min: u64, max: u64 },
    #[error("mute.random_min_secs must be at least 1; a zero-second mute lifts the mute")]
    ZeroMuteMin,
    #[error("curfew.poll_interval_secs must be at least 1")]
    ZeroPollInterval,
    #[error("{0}")]
    InvalidCurfewTime(String),
    #[error("permissions.{0} is not a known command")]
    UnknownPermission(String),
    #[error("permissions.{0} uses level \"unknown\"; use superuser, owner, admin or member")]
    UnknownLevel(String),
    #[error("forbidden.groups is set but forbidden.words is empty")]
    NoForbiddenWords,
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bot.self_id.get() <= 0 {
        errors.push(ValidationError::InvalidSelfId);
    }
    if config.bot.command_prefix.is_empty() {
        errors.push(ValidationError::EmptyCommandPrefix);
    }

    let mute = &config.mute;
    if mute.random_min_secs == 0 {
        errors.push(ValidationError::ZeroMuteMin);
    }
    if mute.random_min_secs > mute.random_max_secs {
        errors.push(ValidationError::MuteBoundsInverted {
            min: mute.random_min_secs,
            max: mute.random_max_secs,
        });
    }

    if config.curfew.poll_interval_secs == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }
    if let Err(e) = config.curfew.window() {
        errors.push(ValidationError::InvalidCurfewTime(e.to_string()));
    }

    for (key, spec) in config.permissions.overrides() {
        if !COMMAND_KEYS.contains(&key) {
            errors.push(ValidationError::UnknownPermission(key.to_string()));
        } else if spec.levels().any(|level| level == TrustLevel::Unknown) {
            errors.push(ValidationError::UnknownLevel(key.to_string()));
        }
    }

    if !config.forbidden.groups.is_empty()
        && config.forbidden.words.iter().all(|w| w.trim().is_empty())
    {
        errors.push(ValidationError::NoForbiddenWords);
    }

    if config.database.path != crate::db::IN_MEMORY {
        let db_path = Path::new(&config.database.path);
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(
                config.database.path.clone(),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_valid_config_passes() {
        let config = parse("[bot]\nself_id = 100\n");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_inverted_mute_bounds_fail() {
        let config = parse("[bot]\nself_id = 1\n[mute]\nrandom_min_secs = 60\nrandom_max_secs = 10\n");
        let errors = validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::MuteBoundsInverted { min: 60, max: 10 })));
    }

    #[test]
    fn test_zero_mute_min_fails() {
        let config = parse("[bot]\nself_id = 1\n[mute]\nrandom_min_secs = 0\nrandom_max_secs = 10\n");
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidationError::ZeroMuteMin));
    }

    #[test]
    fn test_unknown_permission_key_fails() {
        let config = parse("[bot]\nself_id = 1\n[permissions]\nban_everyone = \"member\"\n");
        let errors = validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::UnknownPermission(k) if k == "ban_everyone")));
    }

    #[test]
    fn test_errors_are_collected() {
        let toml = r#"
[bot]
self_id = 0
command_prefix = ""

[curfew]
end = "noon"
poll_interval_secs = 0
"#;
        let errors = validate(&parse(toml)).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_missing_database_directory_fails() {
        let config = parse("[bot]\nself_id = 1\n[database]\npath = \"/nonexistent/dir/x.db\"\n");
        let errors = validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DatabasePathInvalid(_))));
    }
}
