//! Core domain types
//!
//! This module contains the core domain structures used across Scorewatch services.
//! They are shared between the trigger library (which creates run requests),
//! the runner (which executes them) and the ingestion endpoint.

pub mod permission;
pub mod run;
pub mod trigger;
