//! Schedule cursor
//!
//! Tracks the next due tick of a weekly schedule. Fire times are always
//! recomputed from the wall clock, so a new process lands on the same tick
//! sequence. A tick that fell inside a restart's downtime is caught up on
//! resume as long as its week is not over.
//!
//! The only state worth carrying across a restart is the last fired tick.
//! Without it, a restart in the same week fires that week's tick again;
//! the repeat carries the same `schedule:<epoch>` correlation ID and
//! converges at the ingestion endpoint.

use chrono::{DateTime, Datelike, Duration, Utc};
use tracing::debug;

use crate::schedule::WeeklySchedule;

/// How long after the end of its ISO week a missed tick is still caught up
pub const CATCH_UP_GRACE: Duration = Duration::hours(6);

/// Position of a running process within a schedule
#[derive(Debug, Clone)]
pub struct ScheduleCursor {
    schedule: WeeklySchedule,
    next_due: Option<DateTime<Utc>>,
    last_fired: Option<DateTime<Utc>>,
}

impl ScheduleCursor {
    /// Positions the cursor for a process starting at `now` with no memory
    /// of earlier fires
    pub fn resume(schedule: WeeklySchedule, now: DateTime<Utc>) -> Self {
        Self::resume_after(schedule, now, None)
    }

    /// Positions the cursor for a process starting at `now`
    ///
    /// `last_fired` is the most recent tick an earlier process already
    /// fired. The latest tick at or before `now` is due immediately when it
    /// belongs to the current week (or ended within [`CATCH_UP_GRACE`]) and
    /// is newer than `last_fired`; otherwise the cursor waits for the next
    /// tick at or after `now`.
    pub fn resume_after(
        schedule: WeeklySchedule,
        now: DateTime<Utc>,
        last_fired: Option<DateTime<Utc>>,
    ) -> Self {
        let catch_up = schedule
            .latest_at_or_before(now)
            .filter(|latest| within_catch_up(*latest, now))
            .filter(|latest| last_fired.is_none_or(|fired| fired < *latest));

        let next_due = catch_up.or_else(|| schedule.next_at_or_after(now));
        debug!(
            "Schedule cursor resumed at {} (last fired {:?}), next due {:?}",
            now, last_fired, next_due
        );

        Self {
            schedule,
            next_due,
            last_fired,
        }
    }

    pub fn schedule(&self) -> &WeeklySchedule {
        &self.schedule
    }

    /// The tick the cursor is waiting for
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.next_due
    }

    /// The most recent tick fired by this cursor or given on resume
    pub fn last_fired(&self) -> Option<DateTime<Utc>> {
        self.last_fired
    }

    /// How long to wait from `now` until the next tick
    ///
    /// Returns zero when a tick is already due.
    pub fn wait_duration(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        self.next_due
            .map(|due| (due - now).to_std().unwrap_or(std::time::Duration::ZERO))
    }

    /// Returns the due tick, if any, and advances past `now`
    ///
    /// Ticks missed while the process was suspended collapse into the most
    /// recent one, so a single poll never yields more than one tick.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let due = self.next_due?;
        if due > now {
            return None;
        }

        let fired = self.schedule.latest_at_or_before(now).unwrap_or(due);
        self.next_due = self.schedule.next_after(now);
        self.last_fired = Some(fired);
        Some(fired)
    }
}

fn within_catch_up(tick: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    tick.iso_week() == now.iso_week() || now - tick <= CATCH_UP_GRACE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::DEFAULT_SCHEDULE;
    use chrono::{TimeZone, Timelike, Weekday};
    use std::collections::BTreeMap;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn monday_one_am() -> WeeklySchedule {
        WeeklySchedule::parse(DEFAULT_SCHEDULE).unwrap()
    }

    /// Runs the same loop as the runner's schedule ticker over a series of
    /// process lifetimes `(boot, shutdown)`. The process sleeps until the
    /// next due tick and polls. When `keep_state` is set the last fired
    /// tick survives restarts, as the runner's state file does.
    fn simulate(
        schedule: &WeeklySchedule,
        sessions: &[(DateTime<Utc>, DateTime<Utc>)],
        keep_state: bool,
    ) -> Vec<DateTime<Utc>> {
        let mut fired = Vec::new();
        let mut last_fired = None;

        for (boot, shutdown) in sessions {
            let remembered = if keep_state { last_fired } else { None };
            let mut cursor = ScheduleCursor::resume_after(schedule.clone(), *boot, remembered);

            while let Some(due) = cursor.next_due() {
                if due >= *shutdown {
                    break;
                }
                if let Some(tick) = cursor.poll(due.max(*boot)) {
                    fired.push(tick);
                }
            }
            last_fired = cursor.last_fired();
        }
        fired
    }

    /// Sessions that restart instantly at each instant in `restarts`
    fn back_to_back(
        start: DateTime<Utc>,
        restarts: &[DateTime<Utc>],
        end: DateTime<Utc>,
    ) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let mut boundaries = vec![start];
        boundaries.extend_from_slice(restarts);
        boundaries.push(end);
        boundaries.windows(2).map(|w| (w[0], w[1])).collect()
    }

    fn fires_per_week(fired: &[DateTime<Utc>]) -> BTreeMap<(i32, u32), usize> {
        let mut per_week = BTreeMap::new();
        for tick in fired {
            assert_eq!(tick.weekday(), Weekday::Mon);
            assert_eq!((tick.hour(), tick.minute(), tick.second()), (1, 0, 0));
            let week = tick.iso_week();
            *per_week.entry((week.year(), week.week())).or_default() += 1;
        }
        per_week
    }

    #[test]
    fn test_poll_before_due_returns_none() {
        let mut cursor = ScheduleCursor::resume(monday_one_am(), utc(2024, 1, 8, 0, 0, 0));
        assert_eq!(cursor.next_due(), Some(utc(2024, 1, 8, 1, 0, 0)));
        assert_eq!(cursor.poll(utc(2024, 1, 8, 0, 59, 59)), None);
        assert_eq!(cursor.next_due(), Some(utc(2024, 1, 8, 1, 0, 0)));
    }

    #[test]
    fn test_poll_fires_once_and_advances() {
        let mut cursor = ScheduleCursor::resume(monday_one_am(), utc(2024, 1, 8, 0, 0, 0));
        let tick = utc(2024, 1, 8, 1, 0, 0);

        assert_eq!(cursor.poll(tick), Some(tick));
        assert_eq!(cursor.last_fired(), Some(tick));
        assert_eq!(cursor.poll(tick), None);
        assert_eq!(cursor.poll(tick + Duration::minutes(5)), None);
        assert_eq!(cursor.next_due(), Some(utc(2024, 1, 15, 1, 0, 0)));
    }

    #[test]
    fn test_missed_ticks_collapse() {
        let mut cursor = ScheduleCursor::resume(monday_one_am(), utc(2024, 1, 8, 0, 0, 0));

        // Suspended for more than two weeks
        let now = utc(2024, 1, 24, 12, 0, 0);
        assert_eq!(cursor.poll(now), Some(utc(2024, 1, 22, 1, 0, 0)));
        assert_eq!(cursor.poll(now), None);
        assert_eq!(cursor.next_due(), Some(utc(2024, 1, 29, 1, 0, 0)));
    }

    #[test]
    fn test_resume_on_tick_is_due_immediately() {
        let tick = utc(2024, 1, 8, 1, 0, 0);
        let cursor = ScheduleCursor::resume(monday_one_am(), tick);
        assert_eq!(cursor.next_due(), Some(tick));
        assert_eq!(cursor.wait_duration(tick), Some(std::time::Duration::ZERO));
    }

    #[test]
    fn test_resume_catches_up_tick_missed_this_week() {
        let tick = utc(2024, 1, 8, 1, 0, 0);
        let now = utc(2024, 1, 10, 15, 0, 0);

        let cursor = ScheduleCursor::resume(monday_one_am(), now);
        assert_eq!(cursor.next_due(), Some(tick));
        assert_eq!(cursor.wait_duration(now), Some(std::time::Duration::ZERO));
    }

    #[test]
    fn test_resume_skips_tick_already_fired() {
        let tick = utc(2024, 1, 8, 1, 0, 0);
        let cursor =
            ScheduleCursor::resume_after(monday_one_am(), utc(2024, 1, 10, 15, 0, 0), Some(tick));
        assert_eq!(cursor.next_due(), Some(utc(2024, 1, 15, 1, 0, 0)));
    }

    #[test]
    fn test_resume_ignores_tick_from_previous_week() {
        // Monday 00:30, the latest tick was a week ago
        let cursor = ScheduleCursor::resume(monday_one_am(), utc(2024, 1, 8, 0, 30, 0));
        assert_eq!(cursor.next_due(), Some(utc(2024, 1, 8, 1, 0, 0)));
    }

    #[test]
    fn test_resume_catches_up_within_grace_after_week_end() {
        // Sunday 23:00 schedule, process back at Monday 02:00
        let schedule = WeeklySchedule::parse("0 23 * * 0").unwrap();
        let tick = utc(2024, 1, 14, 23, 0, 0);

        let cursor = ScheduleCursor::resume(schedule.clone(), utc(2024, 1, 15, 2, 0, 0));
        assert_eq!(cursor.next_due(), Some(tick));

        let cursor = ScheduleCursor::resume(schedule, utc(2024, 1, 15, 9, 0, 0));
        assert_eq!(cursor.next_due(), Some(utc(2024, 1, 21, 23, 0, 0)));
    }

    #[test]
    fn test_wait_duration() {
        let cursor = ScheduleCursor::resume(monday_one_am(), utc(2024, 1, 8, 0, 0, 0));
        assert_eq!(
            cursor.wait_duration(utc(2024, 1, 8, 0, 0, 0)),
            Some(std::time::Duration::from_secs(3600))
        );
    }

    #[test]
    fn test_downtime_straddling_tick_still_fires() {
        let schedule = monday_one_am();
        let sessions = [
            (utc(2024, 1, 8, 0, 0, 0), utc(2024, 1, 8, 0, 59, 58)),
            (utc(2024, 1, 8, 1, 0, 2), utc(2024, 1, 15, 0, 0, 0)),
        ];

        for keep_state in [true, false] {
            let fired = simulate(&schedule, &sessions, keep_state);
            assert_eq!(fired, vec![utc(2024, 1, 8, 1, 0, 0)]);
        }
    }

    #[test]
    fn test_long_downtime_fires_current_week_only() {
        let schedule = monday_one_am();
        let sessions = [
            (utc(2024, 1, 8, 2, 0, 0), utc(2024, 1, 9, 0, 0, 0)),
            // Down for two and a half weeks
            (utc(2024, 1, 25, 12, 0, 0), utc(2024, 1, 28, 0, 0, 0)),
        ];

        let fired = simulate(&schedule, &sessions, true);
        assert_eq!(
            fired,
            vec![utc(2024, 1, 8, 1, 0, 0), utc(2024, 1, 22, 1, 0, 0)]
        );
    }

    #[test]
    fn test_fires_once_per_calendar_week_across_restarts() {
        let schedule = monday_one_am();
        let start = utc(2024, 1, 1, 0, 0, 0);
        let end = utc(2024, 3, 4, 0, 0, 0); // 9 full weeks

        let restarts = vec![
            utc(2024, 1, 1, 0, 59, 59),  // just before a tick
            utc(2024, 1, 8, 1, 0, 0),    // exactly on a tick
            utc(2024, 1, 8, 1, 0, 1),    // right after it fired
            utc(2024, 1, 8, 1, 30, 0),
            utc(2024, 1, 10, 15, 0, 0),  // mid-week
            utc(2024, 1, 15, 1, 0, 0),   // on the next tick
            utc(2024, 1, 15, 2, 0, 0),
            utc(2024, 1, 21, 23, 59, 59),
            utc(2024, 2, 5, 0, 0, 0),
            utc(2024, 2, 5, 1, 0, 0),
            utc(2024, 2, 5, 1, 0, 0),    // restart loop at the same instant
            utc(2024, 2, 19, 1, 0, 0),
        ];

        let fired = simulate(&schedule, &back_to_back(start, &restarts, end), true);
        let per_week = fires_per_week(&fired);

        assert_eq!(fired.len(), 9);
        assert_eq!(per_week.len(), 9);
        assert!(per_week.values().all(|count| *count == 1));
    }

    #[test]
    fn test_fires_every_week_across_restarts_with_downtime() {
        let schedule = monday_one_am();
        let sessions = [
            (utc(2024, 1, 1, 0, 0, 0), utc(2024, 1, 1, 0, 59, 0)),
            (utc(2024, 1, 1, 3, 0, 0), utc(2024, 1, 8, 0, 59, 58)),
            (utc(2024, 1, 8, 1, 0, 2), utc(2024, 1, 14, 22, 0, 0)),
            (utc(2024, 1, 15, 5, 0, 0), utc(2024, 1, 20, 0, 0, 0)),
            (utc(2024, 1, 21, 12, 0, 0), utc(2024, 1, 22, 0, 30, 0)),
            (utc(2024, 1, 28, 9, 0, 0), utc(2024, 2, 5, 0, 0, 0)),
        ];

        let fired = simulate(&schedule, &sessions, true);
        let per_week = fires_per_week(&fired);

        // ISO weeks 1 to 5 of 2024
        let weeks: Vec<(i32, u32)> = per_week.keys().copied().collect();
        assert_eq!(weeks, (1..=5).map(|w| (2024, w)).collect::<Vec<_>>());
        assert!(per_week.values().all(|count| *count == 1));
    }

    #[test]
    fn test_restart_without_state_repeats_same_tick() {
        let schedule = monday_one_am();
        let sessions = [
            (utc(2024, 1, 8, 0, 0, 0), utc(2024, 1, 9, 0, 0, 0)),
            (utc(2024, 1, 9, 0, 0, 0), utc(2024, 1, 10, 0, 0, 0)),
        ];

        let fired = simulate(&schedule, &sessions, false);
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[0], fired[1]);
    }

    #[test]
    fn test_no_restarts_matches_restarted_sequence() {
        let schedule = monday_one_am();
        let start = utc(2024, 1, 1, 0, 0, 0);
        let end = utc(2024, 2, 1, 0, 0, 0);

        let steady = simulate(&schedule, &back_to_back(start, &[], end), true);
        let restarted = simulate(
            &schedule,
            &back_to_back(
                start,
                &[utc(2024, 1, 9, 4, 0, 0), utc(2024, 1, 20, 4, 0, 0)],
                end,
            ),
            true,
        );

        assert_eq!(steady, restarted);
    }
}
