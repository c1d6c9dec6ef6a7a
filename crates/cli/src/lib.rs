//! Batch runner for the readiness engine.
//!
//! Owns everything the engine refuses to do: reading the snapshot file,
//! mapping loosely-shaped rows onto canonical records, reading the clock,
//! and writing the report.

pub mod config;
pub mod error;
pub mod ingest;
pub mod report;
