//! Scorewatch Core
//!
//! Core types and abstractions for the Scorewatch scan orchestrator.
//!
//! This crate contains:
//! - Domain types: Core business entities (RunRequest, RunResult, permissions)
//! - DTOs: Data transfer objects exchanged with the ingestion endpoint

pub mod domain;
pub mod dto;
