//! Error types for trigger classification and schedules

use thiserror::Error;

/// Reasons an event is rejected instead of producing a run request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("Unrecognized event '{0}'")]
    UnknownEvent(String),

    #[error("Push event has no ref")]
    MissingRef,

    #[error("Ref '{0}' is not a branch")]
    NotABranch(String),

    #[error("Branch '{0}' is not watched for pushes")]
    BranchNotWatched(String),

    #[error("Schedule event has no cron expression")]
    MissingSchedule,

    #[error("Schedule '{found}' does not match configured schedule '{expected}'")]
    ScheduleMismatch { expected: String, found: String },

    #[error("No schedule tick at or before {0}")]
    NoScheduleTick(String),
}

/// Errors raised while parsing a weekly schedule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Expected 5 cron fields (min hour dom month dow), found {found} in '{expr}'")]
    FieldCount { expr: String, found: usize },

    #[error("Invalid {field} '{value}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Schedule '{0}' does not fire exactly once per week")]
    NotWeekly(String),

    #[error("Cron expression rejected: {0}")]
    Cron(String),
}
