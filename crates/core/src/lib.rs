//! Compliance & deployment-readiness engine.
//!
//! Decides whether an offshore worker is cleared for a rotation, based on the
//! required document catalog, expiration dates, the evidence trail, and
//! turnaround gaps between consecutive rotations.
//!
//! Every function is pure and synchronous: no I/O, no wall-clock reads, no
//! shared state. Callers load the data, pass in `today`, and re-invoke on
//! change.

pub mod catalog;
pub mod config;
pub mod context;
pub mod dates;
pub mod document_status;
pub mod documents;
pub mod error;
pub mod evidence;
pub mod kpi;
pub mod readiness;
pub mod turnaround;
pub mod types;
pub mod window;
