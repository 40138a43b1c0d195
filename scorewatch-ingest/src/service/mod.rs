//! Service Module
//!
//! Business logic layer for the ingestion endpoint.
//! Services validate requests and orchestrate repository calls.

pub mod report;

// Re-export for convenience
pub use report as report_service;
