//! Trigger domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of external event started a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerKind {
    Manual,
    Schedule,
    RuleChange,
    Push,
}

impl TriggerKind {
    /// Stable lowercase identifier, used as the correlation ID prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::Manual => "manual",
            TriggerKind::Schedule => "schedule",
            TriggerKind::RuleChange => "rule-change",
            TriggerKind::Push => "push",
        }
    }
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// External event as delivered by the host (webhook payload, event file, scheduler tick)
///
/// Only the fields needed for classification are modelled; unknown fields
/// in the incoming JSON are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDescriptor {
    /// Host event name, e.g. `push` or `workflow_dispatch`
    pub event_name: String,

    /// Git ref the event refers to (`refs/heads/main`)
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,

    /// Cron expression that fired, for schedule events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,

    /// Sub-action, e.g. `edited` for branch protection rule events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Host-assigned delivery identifier, stable across redeliveries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
}

impl EventDescriptor {
    /// Creates a descriptor with just an event name
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            ..Default::default()
        }
    }

    pub fn with_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = Some(git_ref.into());
        self
    }

    pub fn with_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.schedule = Some(schedule.into());
        self
    }

    pub fn with_delivery_id(mut self, delivery_id: impl Into<String>) -> Self {
        self.delivery_id = Some(delivery_id.into());
        self
    }

    pub fn with_occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }
}

/// Normalized request to perform one scan run
///
/// Created by the trigger classifier and never modified afterwards: fields
/// are only readable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    trigger_kind: TriggerKind,
    branch: Option<String>,
    correlation_id: String,
    reason: String,
    requested_at: DateTime<Utc>,
}

impl RunRequest {
    /// Creates a new run request stamped with the current time
    pub fn new(
        trigger_kind: TriggerKind,
        branch: Option<String>,
        correlation_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            trigger_kind,
            branch,
            correlation_id: correlation_id.into(),
            reason: reason.into(),
            requested_at: Utc::now(),
        }
    }

    pub fn trigger_kind(&self) -> TriggerKind {
        self.trigger_kind
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Human readable description of why the run was requested
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }
}
