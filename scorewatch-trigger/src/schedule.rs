//! Weekly cron schedule
//!
//! Fire times are always computed from the cron expression, so a process
//! that restarts recomputes the same ticks instead of drifting from uptime.

use chrono::{DateTime, Duration, Utc, Weekday};
use cron::Schedule;
use std::str::FromStr;

use crate::error::ScheduleError;

/// Monday 01:00 UTC
pub const DEFAULT_SCHEDULE: &str = "0 1 * * 1";

/// A schedule firing once per week at a fixed weekday, hour and minute (UTC)
#[derive(Debug, Clone)]
pub struct WeeklySchedule {
    expression: String,
    weekday: Weekday,
    hour: u32,
    minute: u32,
    schedule: Schedule,
}

impl WeeklySchedule {
    /// Parses a standard 5-field cron expression
    ///
    /// Only weekly expressions are accepted: a single minute, a single hour,
    /// `*` for day-of-month and month, and a single weekday either as a
    /// number (0 or 7 = Sunday, 1 = Monday ... 6 = Saturday) or a name.
    ///
    /// # Example
    /// ```
    /// use scorewatch_trigger::WeeklySchedule;
    /// use chrono::Weekday;
    ///
    /// let schedule = WeeklySchedule::parse("0 1 * * 1").unwrap();
    /// assert_eq!(schedule.weekday(), Weekday::Mon);
    /// assert_eq!(schedule.hour(), 1);
    /// ```
    pub fn parse(expr: &str) -> Result<Self, ScheduleError> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(ScheduleError::FieldCount {
                expr: expr.to_string(),
                found: fields.len(),
            });
        }

        let minute = parse_number("minute", fields[0], 59)?;
        let hour = parse_number("hour", fields[1], 23)?;

        if fields[2] != "*" || fields[3] != "*" {
            return Err(ScheduleError::NotWeekly(expr.to_string()));
        }

        let weekday = parse_weekday(fields[4])?;

        Self::new(weekday, hour, minute)
    }

    /// Builds a schedule from its components
    pub fn new(weekday: Weekday, hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        if hour > 23 {
            return Err(invalid("hour", hour.to_string(), "must be 0-23"));
        }
        if minute > 59 {
            return Err(invalid("minute", minute.to_string(), "must be 0-59"));
        }

        // The cron crate numbers weekdays from Sunday = 1, so names are used
        // in the canonical form to avoid ambiguity.
        let canonical = format!("0 {} {} * * {} *", minute, hour, weekday_name(weekday));
        let schedule =
            Schedule::from_str(&canonical).map_err(|e| ScheduleError::Cron(e.to_string()))?;

        Ok(Self {
            expression: format!("{} {} * * {}", minute, hour, weekday.num_days_from_sunday()),
            weekday,
            hour,
            minute,
            schedule,
        })
    }

    /// Normalized 5-field expression (numeric weekday)
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Whether `expr` describes the same weekly schedule
    ///
    /// Unparseable expressions never match.
    pub fn matches_expression(&self, expr: &str) -> bool {
        WeeklySchedule::parse(expr)
            .map(|other| other == *self)
            .unwrap_or(false)
    }

    /// First tick strictly after `after`
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).find(|tick| *tick > after)
    }

    /// First tick at or after `at`
    pub fn next_at_or_after(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&(at - Duration::seconds(1)))
            .find(|tick| *tick >= at)
    }

    /// Most recent tick at or before `at`
    pub fn latest_at_or_before(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&(at - Duration::weeks(1) - Duration::seconds(1)))
            .take_while(|tick| *tick <= at)
            .last()
    }

    /// The next `count` ticks strictly after `after`
    pub fn upcoming(&self, after: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        self.schedule
            .after(&after)
            .filter(|tick| *tick > after)
            .take(count)
            .collect()
    }
}

impl PartialEq for WeeklySchedule {
    fn eq(&self, other: &Self) -> bool {
        self.weekday == other.weekday && self.hour == other.hour && self.minute == other.minute
    }
}

impl Eq for WeeklySchedule {}

impl std::fmt::Display for WeeklySchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "every {} at {:02}:{:02} UTC",
            weekday_name(self.weekday),
            self.hour,
            self.minute
        )
    }
}

// =============================================================================
// Field parsing
// =============================================================================

fn invalid(field: &'static str, value: impl Into<String>, reason: &str) -> ScheduleError {
    ScheduleError::InvalidField {
        field,
        value: value.into(),
        reason: reason.to_string(),
    }
}

fn parse_number(field: &'static str, value: &str, max: u32) -> Result<u32, ScheduleError> {
    let number: u32 = value
        .parse()
        .map_err(|_| invalid(field, value, "must be a single number"))?;

    if number > max {
        return Err(invalid(field, value, &format!("must be 0-{}", max)));
    }

    Ok(number)
}

fn parse_weekday(value: &str) -> Result<Weekday, ScheduleError> {
    if let Ok(number) = value.parse::<u32>() {
        return match number {
            0 | 7 => Ok(Weekday::Sun),
            1 => Ok(Weekday::Mon),
            2 => Ok(Weekday::Tue),
            3 => Ok(Weekday::Wed),
            4 => Ok(Weekday::Thu),
            5 => Ok(Weekday::Fri),
            6 => Ok(Weekday::Sat),
            _ => Err(invalid("weekday", value, "must be 0-7")),
        };
    }

    match value.to_ascii_lowercase().as_str() {
        "sun" | "sunday" => Ok(Weekday::Sun),
        "mon" | "monday" => Ok(Weekday::Mon),
        "tue" | "tuesday" => Ok(Weekday::Tue),
        "wed" | "wednesday" => Ok(Weekday::Wed),
        "thu" | "thursday" => Ok(Weekday::Thu),
        "fri" | "friday" => Ok(Weekday::Fri),
        "sat" | "saturday" => Ok(Weekday::Sat),
        _ => Err(invalid("weekday", value, "must be a single day")),
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_parse_default_schedule() {
        let schedule = WeeklySchedule::parse(DEFAULT_SCHEDULE).unwrap();
        assert_eq!(schedule.weekday(), Weekday::Mon);
        assert_eq!(schedule.hour(), 1);
        assert_eq!(schedule.minute(), 0);
        assert_eq!(schedule.expression(), "0 1 * * 1");
    }

    #[test]
    fn test_parse_named_and_sunday_weekdays() {
        assert_eq!(
            WeeklySchedule::parse("30 7 * * tue").unwrap().weekday(),
            Weekday::Tue
        );
        assert_eq!(
            WeeklySchedule::parse("0 0 * * 0").unwrap().weekday(),
            Weekday::Sun
        );
        assert_eq!(
            WeeklySchedule::parse("0 0 * * 7").unwrap().weekday(),
            Weekday::Sun
        );
    }

    #[test]
    fn test_reject_non_weekly_expressions() {
        assert!(matches!(
            WeeklySchedule::parse("0 1 * *"),
            Err(ScheduleError::FieldCount { found: 4, .. })
        ));
        assert!(matches!(
            WeeklySchedule::parse("0 1 1 * 1"),
            Err(ScheduleError::NotWeekly(_))
        ));
        assert!(matches!(
            WeeklySchedule::parse("*/5 1 * * 1"),
            Err(ScheduleError::InvalidField { field: "minute", .. })
        ));
        assert!(matches!(
            WeeklySchedule::parse("0 24 * * 1"),
            Err(ScheduleError::InvalidField { field: "hour", .. })
        ));
        assert!(matches!(
            WeeklySchedule::parse("0 1 * * 1-5"),
            Err(ScheduleError::InvalidField { field: "weekday", .. })
        ));
    }

    #[test]
    fn test_matches_expression() {
        let schedule = WeeklySchedule::parse("0 1 * * 1").unwrap();
        assert!(schedule.matches_expression("0 1 * * mon"));
        assert!(schedule.matches_expression("0  1 * * Monday"));
        assert!(!schedule.matches_expression("0 2 * * 1"));
        assert!(!schedule.matches_expression("garbage"));
    }

    #[test]
    fn test_next_after_is_monday_one_am() {
        let schedule = WeeklySchedule::parse(DEFAULT_SCHEDULE).unwrap();

        // Wednesday 2024-01-03
        let next = schedule.next_after(utc(2024, 1, 3, 12, 0, 0)).unwrap();
        assert_eq!(next, utc(2024, 1, 8, 1, 0, 0));
        assert_eq!(next.weekday(), Weekday::Mon);
        assert_eq!(next.hour(), 1);

        // Exactly on a tick: strictly after skips to next week
        let next = schedule.next_after(utc(2024, 1, 8, 1, 0, 0)).unwrap();
        assert_eq!(next, utc(2024, 1, 15, 1, 0, 0));
    }

    #[test]
    fn test_next_at_or_after_includes_tick() {
        let schedule = WeeklySchedule::parse(DEFAULT_SCHEDULE).unwrap();
        let tick = utc(2024, 1, 8, 1, 0, 0);
        assert_eq!(schedule.next_at_or_after(tick), Some(tick));
        assert_eq!(
            schedule.next_at_or_after(tick + Duration::seconds(1)),
            Some(utc(2024, 1, 15, 1, 0, 0))
        );
    }

    #[test]
    fn test_latest_at_or_before() {
        let schedule = WeeklySchedule::parse(DEFAULT_SCHEDULE).unwrap();
        let tick = utc(2024, 1, 8, 1, 0, 0);

        assert_eq!(schedule.latest_at_or_before(tick), Some(tick));
        assert_eq!(
            schedule.latest_at_or_before(tick + Duration::minutes(3)),
            Some(tick)
        );
        assert_eq!(
            schedule.latest_at_or_before(tick - Duration::seconds(1)),
            Some(utc(2024, 1, 1, 1, 0, 0))
        );
    }

    #[test]
    fn test_upcoming() {
        let schedule = WeeklySchedule::parse(DEFAULT_SCHEDULE).unwrap();
        let ticks = schedule.upcoming(utc(2024, 1, 1, 0, 0, 0), 3);
        assert_eq!(
            ticks,
            vec![
                utc(2024, 1, 1, 1, 0, 0),
                utc(2024, 1, 8, 1, 0, 0),
                utc(2024, 1, 15, 1, 0, 0),
            ]
        );
    }

    #[test]
    fn test_display() {
        let schedule = WeeklySchedule::parse("5 9 * * 5").unwrap();
        assert_eq!(schedule.to_string(), "every Fri at 09:05 UTC");
    }
}
