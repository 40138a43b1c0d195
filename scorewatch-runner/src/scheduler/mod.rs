//! Scheduler layer for the runner
//!
//! This layer turns external events and schedule ticks into runs. The
//! ticker produces schedule events, and the dispatcher classifies every
//! event and executes the resulting runs one at a time.

pub mod dispatcher;
pub mod ticker;

pub use dispatcher::RunDispatcher;
pub use ticker::ScheduleTicker;
