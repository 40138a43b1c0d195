//! Event classification
//!
//! Maps an external [`EventDescriptor`] to exactly one [`RunRequest`], or
//! rejects it. Anything that cannot be classified with certainty is rejected:
//! the classifier never guesses a trigger kind.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use scorewatch_core::domain::trigger::{EventDescriptor, RunRequest, TriggerKind};

use crate::correlation;
use crate::error::ClassifyError;
use crate::schedule::WeeklySchedule;

/// Host event names and the trigger kind they map to
const EVENT_KINDS: [(&str, TriggerKind); 4] = [
    ("workflow_dispatch", TriggerKind::Manual),
    ("schedule", TriggerKind::Schedule),
    ("branch_protection_rule", TriggerKind::RuleChange),
    ("push", TriggerKind::Push),
];

/// Maps a host event name to its trigger kind
pub fn kind_for_event(event_name: &str) -> Option<TriggerKind> {
    EVENT_KINDS
        .iter()
        .find(|(name, _)| *name == event_name)
        .map(|(_, kind)| *kind)
}

/// Extracts the branch name from a git ref
///
/// `refs/heads/<name>` and bare names are branches; any other `refs/`
/// namespace (tags, pull requests) is not.
pub fn branch_from_ref(git_ref: &str) -> Result<String, ClassifyError> {
    let git_ref = git_ref.trim();

    if let Some(branch) = git_ref.strip_prefix("refs/heads/") {
        if !branch.is_empty() {
            return Ok(branch.to_string());
        }
    } else if !git_ref.is_empty() && !git_ref.starts_with("refs/") {
        return Ok(git_ref.to_string());
    }

    Err(ClassifyError::NotABranch(git_ref.to_string()))
}

/// The set of events a scan listens to
#[derive(Debug, Clone)]
pub struct TriggerPolicy {
    push_branches: Vec<String>,
    default_branch: String,
    schedule: WeeklySchedule,
}

impl TriggerPolicy {
    /// Creates a policy watching pushes to `main` and the given schedule
    pub fn new(schedule: WeeklySchedule) -> Self {
        Self {
            push_branches: vec!["main".to_string()],
            default_branch: "main".to_string(),
            schedule,
        }
    }

    /// Replaces the watched push branches
    pub fn with_push_branches<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_branches = branches.into_iter().map(Into::into).collect();
        self
    }

    /// Branch scanned when the event does not name one
    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = branch.into();
        self
    }

    pub fn push_branches(&self) -> &[String] {
        &self.push_branches
    }

    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }

    pub fn schedule(&self) -> &WeeklySchedule {
        &self.schedule
    }

    /// Classifies an event using the current time for schedule resolution
    pub fn classify(&self, event: &EventDescriptor) -> Result<RunRequest, ClassifyError> {
        self.classify_at(event, Utc::now())
    }

    /// Classifies an event
    ///
    /// `now` is used to locate the schedule tick when the event carries no
    /// timestamp of its own.
    pub fn classify_at(
        &self,
        event: &EventDescriptor,
        now: DateTime<Utc>,
    ) -> Result<RunRequest, ClassifyError> {
        let kind = kind_for_event(&event.event_name).ok_or_else(|| {
            warn!("Ignoring unrecognized event '{}'", event.event_name);
            ClassifyError::UnknownEvent(event.event_name.clone())
        })?;

        let request = match kind {
            TriggerKind::Push => self.classify_push(event)?,
            TriggerKind::Schedule => self.classify_schedule(event, now)?,
            TriggerKind::Manual => RunRequest::new(
                kind,
                Some(self.branch_or_default(event)),
                correlation::for_delivery(kind, event.delivery_id.as_deref()),
                "manual dispatch",
            ),
            TriggerKind::RuleChange => {
                let reason = match event.action.as_deref() {
                    Some(action) => format!("branch protection rule {}", action),
                    None => "branch protection rule changed".to_string(),
                };
                RunRequest::new(
                    kind,
                    Some(self.branch_or_default(event)),
                    correlation::for_delivery(kind, event.delivery_id.as_deref()),
                    reason,
                )
            }
        };

        debug!(
            "Classified '{}' as {} ({})",
            event.event_name,
            request.trigger_kind(),
            request.correlation_id()
        );

        Ok(request)
    }

    fn classify_push(&self, event: &EventDescriptor) -> Result<RunRequest, ClassifyError> {
        let git_ref = event.git_ref.as_deref().ok_or(ClassifyError::MissingRef)?;
        let branch = branch_from_ref(git_ref)?;

        if !self.push_branches.iter().any(|b| *b == branch) {
            return Err(ClassifyError::BranchNotWatched(branch));
        }

        Ok(RunRequest::new(
            TriggerKind::Push,
            Some(branch.clone()),
            correlation::for_delivery(TriggerKind::Push, event.delivery_id.as_deref()),
            format!("push to {}", branch),
        ))
    }

    fn classify_schedule(
        &self,
        event: &EventDescriptor,
        now: DateTime<Utc>,
    ) -> Result<RunRequest, ClassifyError> {
        let expr = event
            .schedule
            .as_deref()
            .ok_or(ClassifyError::MissingSchedule)?;

        if !self.schedule.matches_expression(expr) {
            return Err(ClassifyError::ScheduleMismatch {
                expected: self.schedule.expression().to_string(),
                found: expr.to_string(),
            });
        }

        let at = event.occurred_at.unwrap_or(now);
        let tick = self
            .schedule
            .latest_at_or_before(at)
            .ok_or_else(|| ClassifyError::NoScheduleTick(at.to_rfc3339()))?;

        Ok(RunRequest::new(
            TriggerKind::Schedule,
            Some(self.default_branch.clone()),
            correlation::for_schedule_tick(tick),
            format!("weekly schedule ({})", self.schedule),
        ))
    }

    fn branch_or_default(&self, event: &EventDescriptor) -> String {
        event
            .git_ref
            .as_deref()
            .and_then(|r| branch_from_ref(r).ok())
            .unwrap_or_else(|| self.default_branch.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::DEFAULT_SCHEDULE;
    use chrono::TimeZone;

    fn policy() -> TriggerPolicy {
        TriggerPolicy::new(WeeklySchedule::parse(DEFAULT_SCHEDULE).unwrap())
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_each_kind_yields_one_request() {
        let policy = policy();
        let cases = vec![
            (
                EventDescriptor::new("workflow_dispatch").with_ref("refs/heads/main"),
                TriggerKind::Manual,
            ),
            (
                EventDescriptor::new("schedule").with_schedule("0 1 * * 1"),
                TriggerKind::Schedule,
            ),
            (
                EventDescriptor::new("branch_protection_rule"),
                TriggerKind::RuleChange,
            ),
            (
                EventDescriptor::new("push").with_ref("refs/heads/main"),
                TriggerKind::Push,
            ),
        ];

        for (event, expected) in cases {
            let request = policy
                .classify(&event)
                .unwrap_or_else(|e| panic!("{} rejected: {}", event.event_name, e));
            assert_eq!(request.trigger_kind(), expected);
            assert!(
                request
                    .correlation_id()
                    .starts_with(&format!("{}:", expected.as_str()))
            );
            assert_eq!(request.branch(), Some("main"));
        }
    }

    #[test]
    fn test_unknown_events_fail_closed() {
        let policy = policy();
        for name in ["pull_request", "", "PUSH", "release", "workflow_run"] {
            let result = policy.classify(&EventDescriptor::new(name).with_ref("refs/heads/main"));
            assert_eq!(result, Err(ClassifyError::UnknownEvent(name.to_string())));
        }
    }

    #[test]
    fn test_push_requires_watched_branch() {
        let policy = policy();

        assert_eq!(
            policy.classify(&EventDescriptor::new("push")),
            Err(ClassifyError::MissingRef)
        );
        assert_eq!(
            policy.classify(&EventDescriptor::new("push").with_ref("refs/heads/feature")),
            Err(ClassifyError::BranchNotWatched("feature".to_string()))
        );
        assert_eq!(
            policy.classify(&EventDescriptor::new("push").with_ref("refs/tags/v1.0")),
            Err(ClassifyError::NotABranch("refs/tags/v1.0".to_string()))
        );
    }

    #[test]
    fn test_push_to_configured_branch() {
        let policy = policy().with_push_branches(["main", "release"]);
        let request = policy
            .classify(
                &EventDescriptor::new("push")
                    .with_ref("refs/heads/release")
                    .with_delivery_id("d-1"),
            )
            .unwrap();

        assert_eq!(request.branch(), Some("release"));
        assert_eq!(request.correlation_id(), "push:d-1");
        assert_eq!(request.reason(), "push to release");
    }

    #[test]
    fn test_schedule_must_match_configuration() {
        let policy = policy();

        assert_eq!(
            policy.classify(&EventDescriptor::new("schedule")),
            Err(ClassifyError::MissingSchedule)
        );
        assert!(matches!(
            policy.classify(&EventDescriptor::new("schedule").with_schedule("0 2 * * 1")),
            Err(ClassifyError::ScheduleMismatch { .. })
        ));
        assert!(matches!(
            policy.classify(&EventDescriptor::new("schedule").with_schedule("nonsense")),
            Err(ClassifyError::ScheduleMismatch { .. })
        ));
    }

    #[test]
    fn test_schedule_correlation_follows_tick() {
        let policy = policy();
        let tick = utc(2024, 1, 8, 1, 0);

        // Delivered a few minutes late, and again on a later redelivery
        let late = EventDescriptor::new("schedule")
            .with_schedule("0 1 * * mon")
            .with_occurred_at(utc(2024, 1, 8, 1, 4));
        let later = late.clone().with_occurred_at(utc(2024, 1, 9, 9, 0));

        let first = policy.classify(&late).unwrap();
        let second = policy.classify(&later).unwrap();

        assert_eq!(first.correlation_id(), format!("schedule:{}", tick.timestamp()));
        assert_eq!(first.correlation_id(), second.correlation_id());
    }

    #[test]
    fn test_schedule_uses_now_without_timestamp() {
        let policy = policy();
        let event = EventDescriptor::new("schedule").with_schedule("0 1 * * 1");
        let request = policy.classify_at(&event, utc(2024, 1, 10, 0, 0)).unwrap();
        assert_eq!(
            request.correlation_id(),
            format!("schedule:{}", utc(2024, 1, 8, 1, 0).timestamp())
        );
    }

    #[test]
    fn test_rule_change_reason_and_branch() {
        let policy = policy().with_default_branch("trunk");
        let mut event = EventDescriptor::new("branch_protection_rule").with_delivery_id("r-9");
        event.action = Some("edited".to_string());

        let request = policy.classify(&event).unwrap();
        assert_eq!(request.reason(), "branch protection rule edited");
        assert_eq!(request.branch(), Some("trunk"));
        assert_eq!(request.correlation_id(), "rule-change:r-9");
    }

    #[test]
    fn test_manual_dispatch_on_tag_falls_back_to_default_branch() {
        let request = policy()
            .classify(&EventDescriptor::new("workflow_dispatch").with_ref("refs/tags/v2"))
            .unwrap();
        assert_eq!(request.branch(), Some("main"));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let policy = policy();
        let event = EventDescriptor::new("push")
            .with_ref("refs/heads/main")
            .with_delivery_id("abc");

        let a = policy.classify(&event).unwrap();
        let b = policy.classify(&event).unwrap();
        assert_eq!(a.trigger_kind(), b.trigger_kind());
        assert_eq!(a.correlation_id(), b.correlation_id());
    }

    #[test]
    fn test_classify_from_json() {
        let json = r#"{"event_name": "push", "ref": "refs/heads/main", "delivery_id": "7"}"#;
        let event: EventDescriptor = serde_json::from_str(json).unwrap();
        let request = policy().classify(&event).unwrap();
        assert_eq!(request.correlation_id(), "push:7");
    }

    #[test]
    fn test_branch_from_ref() {
        assert_eq!(branch_from_ref("refs/heads/main"), Ok("main".to_string()));
        assert_eq!(
            branch_from_ref("refs/heads/feature/x"),
            Ok("feature/x".to_string())
        );
        assert_eq!(branch_from_ref("main"), Ok("main".to_string()));
        assert!(branch_from_ref("refs/pull/1/merge").is_err());
        assert!(branch_from_ref("refs/heads/").is_err());
        assert!(branch_from_ref("").is_err());
    }
}
