//! In-memory report store
//!
//! Reports live for the lifetime of the process. The store is cheap to clone
//! and shared as router state.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use scorewatch_core::dto::report::StoredReport;

/// Reports keyed by correlation ID
#[derive(Debug, Clone, Default)]
pub struct ReportStore {
    reports: Arc<RwLock<HashMap<String, StoredReport>>>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reports(&self) -> &RwLock<HashMap<String, StoredReport>> {
        &self.reports
    }
}
