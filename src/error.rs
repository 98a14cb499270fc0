//! Unified error handling for groupwarden.
//!
//! Every failure a command or policy can hit is contained and reported; none
//! of these errors is fatal to the process. Each kind carries a static code
//! for metrics labeling and a user-facing message for the reply.

use crate::access::Denial;
use crate::db::DbError;
use crate::platform::PlatformError;
use thiserror::Error;
use warden_proto::GroupId;

// ============================================================================
// Scheduler Errors
// ============================================================================

/// Conflicts reported by the scheduled task manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("a scheduled task is already running for group {0}")]
    AlreadyRunning(GroupId),

    #[error("no scheduled task is running for group {0}")]
    NotRunning(GroupId),
}

// ============================================================================
// Command Errors
// ============================================================================

/// Errors that abort a single operator command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The authorization gate refused the operation.
    #[error("authorization denied: {0:?}")]
    Denied(Denial),

    /// The platform rejected or failed a call.
    #[error("platform call failed: {0}")]
    Platform(#[from] PlatformError),

    /// Operator input could not be interpreted. The message is user-facing.
    #[error("parse failure: {0}")]
    Parse(String),

    #[error("scheduler conflict: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("storage error: {0}")]
    Store(#[from] DbError),
}

impl CommandError {
    /// Shorthand for a parse failure with a user-facing message.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Denied(_) => "authorization_denied",
            Self::Platform(_) => "platform_call_failed",
            Self::Parse(_) => "parse_failure",
            Self::Scheduler(_) => "scheduler_conflict",
            Self::Store(_) => "storage_error",
        }
    }

    /// The text shown to the operator who issued the command.
    pub fn user_message(&self) -> String {
        match self {
            Self::Denied(denial) => denial.message().to_string(),
            Self::Platform(PlatformError::NotFound(_)) => {
                "I couldn't find that on the platform".to_string()
            }
            Self::Platform(_) => "I can't do that right now".to_string(),
            Self::Parse(message) => message.clone(),
            Self::Scheduler(SchedulerError::AlreadyRunning(_)) => {
                "Curfew is already running here. Stop it first.".to_string()
            }
            Self::Scheduler(SchedulerError::NotRunning(_)) => {
                "Curfew isn't running here".to_string()
            }
            Self::Store(_) => "Couldn't save that change, please try again later".to_string(),
        }
    }
}

impl From<Denial> for CommandError {
    fn from(denial: Denial) -> Self {
        Self::Denied(denial)
    }
}
