//! Data Transfer Objects for inter-service communication
//!
//! DTOs exchanged between the runner, the CLI and the ingestion endpoint.

pub mod report;
