//! Scorewatch Trigger Infrastructure
//!
//! This crate provides the trigger scheduler shared by the runner and the CLI.
//! It includes:
//! - Classification of external event descriptors into run requests
//! - The weekly cron schedule and a restart-safe schedule cursor
//! - Correlation ID derivation

pub mod classifier;
pub mod correlation;
pub mod cursor;
pub mod error;
pub mod schedule;

pub use classifier::{TriggerPolicy, branch_from_ref, kind_for_event};
pub use cursor::ScheduleCursor;
pub use error::{ClassifyError, ScheduleError};
pub use schedule::{DEFAULT_SCHEDULE, WeeklySchedule};

pub use scorewatch_core::domain::trigger::{EventDescriptor, RunRequest, TriggerKind};
