//! Schedule command handlers
//!
//! Shows when the weekly scan fires next.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use colored::*;

use scorewatch_trigger::{DEFAULT_SCHEDULE, WeeklySchedule};

/// Schedule subcommands
#[derive(Subcommand)]
pub enum ScheduleCommands {
    /// Show upcoming fire times
    Next {
        /// Weekly cron expression (5 fields, UTC)
        #[arg(long, env = "SCOREWATCH_SCHEDULE", default_value = DEFAULT_SCHEDULE)]
        cron: String,

        /// Number of fire times to show
        #[arg(long, default_value_t = 5)]
        count: usize,

        /// Start from this RFC 3339 time instead of now
        #[arg(long)]
        after: Option<DateTime<Utc>>,
    },
}

/// Handle schedule commands
pub fn handle_schedule_command(command: ScheduleCommands) -> Result<()> {
    match command {
        ScheduleCommands::Next { cron, count, after } => {
            show_next(&cron, count, after.unwrap_or_else(Utc::now))
        }
    }
}

fn show_next(cron: &str, count: usize, after: DateTime<Utc>) -> Result<()> {
    let (schedule, ticks) = upcoming_ticks(cron, count, after)?;

    println!(
        "{}",
        format!("Schedule '{}' ({}):", schedule.expression(), schedule).bold()
    );
    for tick in ticks {
        println!(
            "  {} {} {}",
            "▸".cyan(),
            tick.format("%Y-%m-%d %H:%M UTC"),
            format!("(schedule:{})", tick.timestamp()).dimmed()
        );
    }

    Ok(())
}

fn upcoming_ticks(
    cron: &str,
    count: usize,
    after: DateTime<Utc>,
) -> Result<(WeeklySchedule, Vec<DateTime<Utc>>)> {
    let schedule =
        WeeklySchedule::parse(cron).with_context(|| format!("Invalid schedule '{}'", cron))?;
    let ticks = schedule.upcoming(after, count);
    Ok((schedule, ticks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Weekday};

    #[test]
    fn test_upcoming_ticks() {
        let after = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        let (_, ticks) = upcoming_ticks("0 1 * * 1", 3, after).unwrap();

        assert_eq!(ticks.len(), 3);
        assert!(ticks.iter().all(|t| t.weekday() == Weekday::Mon));
        assert_eq!(ticks[0], Utc.with_ymd_and_hms(2024, 1, 8, 1, 0, 0).unwrap());
    }

    #[test]
    fn test_invalid_cron() {
        assert!(upcoming_ticks("* * * * *", 1, Utc::now()).is_err());
    }
}
