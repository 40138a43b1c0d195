//! Repository Module
//!
//! Data access layer for the ingestion endpoint.

pub mod report;

// Re-export for convenience
pub use report as report_repository;
