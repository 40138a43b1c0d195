//! Correlation IDs
//!
//! The correlation ID is the upsert key at the ingestion endpoint, so the
//! same logical run must always map to the same ID.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use scorewatch_core::domain::trigger::TriggerKind;

/// Correlation ID for a scheduled run, derived from the tick it belongs to
pub fn for_schedule_tick(tick: DateTime<Utc>) -> String {
    format!("{}:{}", TriggerKind::Schedule.as_str(), tick.timestamp())
}

/// Correlation ID for an event-driven run
///
/// Uses the host delivery ID when present so redeliveries of the same event
/// converge. Events without one get a fresh random ID.
pub fn for_delivery(kind: TriggerKind, delivery_id: Option<&str>) -> String {
    match delivery_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => format!("{}:{}", kind.as_str(), id),
        None => format!("{}:{}", kind.as_str(), Uuid::new_v4()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_schedule_id_is_tick_epoch() {
        let tick = Utc.with_ymd_and_hms(2024, 1, 8, 1, 0, 0).unwrap();
        assert_eq!(for_schedule_tick(tick), format!("schedule:{}", tick.timestamp()));
        assert_eq!(for_schedule_tick(tick), for_schedule_tick(tick));
    }

    #[test]
    fn test_delivery_id_is_stable() {
        assert_eq!(
            for_delivery(TriggerKind::Push, Some("d-42")),
            for_delivery(TriggerKind::Push, Some(" d-42 "))
        );
        assert_eq!(for_delivery(TriggerKind::Manual, Some("x")), "manual:x");
    }

    #[test]
    fn test_missing_delivery_id_is_unique() {
        let a = for_delivery(TriggerKind::RuleChange, None);
        let b = for_delivery(TriggerKind::RuleChange, Some("  "));
        assert!(a.starts_with("rule-change:"));
        assert_ne!(a, b);
    }
}
