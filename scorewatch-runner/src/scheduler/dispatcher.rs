//! Run dispatcher
//!
//! Classifies incoming events and executes the resulting runs. A single
//! consumer drains the event channel, so at most one run is in progress
//! at any time.

use scorewatch_core::domain::run::RunOutcome;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use scorewatch_trigger::{EventDescriptor, TriggerPolicy};

use crate::service::ExecutionService;

/// Dispatcher that turns events into runs, one at a time
pub struct RunDispatcher {
    policy: TriggerPolicy,
    execution: Arc<dyn ExecutionService>,
}

impl RunDispatcher {
    /// Creates a new dispatcher
    pub fn new(policy: TriggerPolicy, execution: Arc<dyn ExecutionService>) -> Self {
        Self { policy, execution }
    }

    /// Classifies and executes a single event
    ///
    /// # Returns
    /// The run outcome, or `None` when the event does not map to a run
    pub async fn dispatch(&self, event: &EventDescriptor) -> Option<RunOutcome> {
        let request = match self.policy.classify(event) {
            Ok(request) => request,
            Err(e) => {
                warn!("No run for event '{}': {}", event.event_name, e);
                return None;
            }
        };

        Some(self.execution.execute(request).await)
    }

    /// Processes events until every sender is dropped
    ///
    /// # Returns
    /// Number of runs executed
    pub async fn run(self, mut events: mpsc::Receiver<EventDescriptor>) -> usize {
        info!("Run dispatcher started");

        let mut executed = 0;
        while let Some(event) = events.recv().await {
            debug!("Received event '{}'", event.event_name);

            if let Some(outcome) = self.dispatch(&event).await {
                executed += 1;
                info!(
                    "Run {} finished: {:?} (exit code {})",
                    outcome.correlation_id,
                    outcome.status,
                    outcome.exit_code()
                );
            }
        }

        info!("Run dispatcher stopped after {} run(s)", executed);
        executed
    }
}
