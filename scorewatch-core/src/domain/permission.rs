//! Step permission model
//!
//! Every step runs with read-only access by default. Only the upload step
//! is elevated, and only for the security-events channel and identity token.

use serde::{Deserialize, Serialize};

use crate::domain::run::StepKind;

/// Access level for a single scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    None,
    Read,
    Write,
}

/// Permissions granted to one step of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPermissions {
    /// Repository contents
    pub contents: Permission,
    /// Code-scanning results channel
    pub security_events: Permission,
    /// Identity token issuance
    pub id_token: Permission,
}

impl StepPermissions {
    /// Default permission set for every step
    pub const READ_ONLY: StepPermissions = StepPermissions {
        contents: Permission::Read,
        security_events: Permission::None,
        id_token: Permission::None,
    };

    /// Minimal permissions needed by `step`
    pub fn for_step(step: StepKind) -> Self {
        match step {
            StepKind::Checkout | StepKind::Analyze => Self::READ_ONLY,
            StepKind::Upload => StepPermissions {
                security_events: Permission::Write,
                id_token: Permission::Write,
                ..Self::READ_ONLY
            },
        }
    }

    pub fn can_write_security_events(&self) -> bool {
        self.security_events == Permission::Write
    }

    /// Whether any scope is above read access
    pub fn is_elevated(&self) -> bool {
        [self.contents, self.security_events, self.id_token]
            .iter()
            .any(|p| *p == Permission::Write)
    }
}

impl Default for StepPermissions {
    fn default() -> Self {
        Self::READ_ONLY
    }
}
