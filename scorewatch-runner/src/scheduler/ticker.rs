//! Schedule ticker
//!
//! Feeds synthetic `schedule` events to the dispatcher whenever the weekly
//! schedule comes due. Fire times come from the schedule cursor, which
//! resumes from the wall clock, so restarts do not drift. The last fired
//! tick is kept in a small state file: a tick missed during a restart is
//! caught up, and one already fired is not repeated.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use scorewatch_trigger::{EventDescriptor, ScheduleCursor, WeeklySchedule};

/// Upper bound on a single sleep, so clock jumps and host suspends are
/// noticed within this interval
const MAX_SLEEP: Duration = Duration::from_secs(15 * 60);

/// Emits schedule events on the dispatcher channel
pub struct ScheduleTicker {
    cursor: ScheduleCursor,
    events: mpsc::Sender<EventDescriptor>,
    state_file: Option<PathBuf>,
}

impl ScheduleTicker {
    /// Creates a ticker with no memory of earlier fires
    #[allow(dead_code)]
    pub fn new(
        schedule: WeeklySchedule,
        now: DateTime<Utc>,
        events: mpsc::Sender<EventDescriptor>,
    ) -> Self {
        Self {
            cursor: ScheduleCursor::resume(schedule, now),
            events,
            state_file: None,
        }
    }

    /// Creates a ticker that resumes from, and records fires to, `path`
    ///
    /// A missing or unreadable state file is treated as "never fired".
    pub async fn with_state_file(
        schedule: WeeklySchedule,
        now: DateTime<Utc>,
        events: mpsc::Sender<EventDescriptor>,
        path: PathBuf,
    ) -> Self {
        let last_fired = read_last_fired(&path).await;
        Self {
            cursor: ScheduleCursor::resume_after(schedule, now, last_fired),
            events,
            state_file: Some(path),
        }
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.cursor.next_due()
    }

    /// The event sent for a fired tick
    pub fn tick_event(&self, tick: DateTime<Utc>) -> EventDescriptor {
        EventDescriptor::new("schedule")
            .with_schedule(self.cursor.schedule().expression())
            .with_occurred_at(tick)
    }

    /// Runs until shutdown is signalled or the dispatcher goes away
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        info!(
            "Schedule ticker started: {}, next run at {:?}",
            self.cursor.schedule(),
            self.cursor.next_due()
        );

        loop {
            let Some(wait) = self.cursor.wait_duration(Utc::now()) else {
                warn!("Schedule has no further ticks, stopping ticker");
                return Ok(());
            };

            tokio::select! {
                _ = tokio::time::sleep(wait.min(MAX_SLEEP)) => {}
                _ = shutdown.recv() => {
                    info!("Schedule ticker shutting down");
                    return Ok(());
                }
            }

            let Some(tick) = self.cursor.poll(Utc::now()) else {
                debug!("Woke before the next tick, waiting again");
                continue;
            };

            info!("Schedule tick {} fired", tick);
            if self.events.send(self.tick_event(tick)).await.is_err() {
                warn!("Dispatcher closed, stopping ticker");
                return Ok(());
            }
            self.record_fired(tick).await;
        }
    }

    async fn record_fired(&self, tick: DateTime<Utc>) {
        let Some(path) = &self.state_file else {
            return;
        };
        if let Err(e) = tokio::fs::write(path, tick.to_rfc3339()).await {
            warn!("Failed to record schedule tick in {}: {}", path.display(), e);
        }
    }
}

async fn read_last_fired(path: &Path) -> Option<DateTime<Utc>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Failed to read schedule state {}: {}", path.display(), e);
            return None;
        }
    };

    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(tick) => Some(tick.with_timezone(&Utc)),
        Err(e) => {
            warn!("Ignoring malformed schedule state {}: {}", path.display(), e);
            None
        }
    }
}
