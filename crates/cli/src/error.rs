use std::path::PathBuf;

use crewready_core::error::CoreError;

/// Errors while loading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Errors while loading a snapshot. Individual bad rows are not errors;
/// they are skipped and counted.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid reference data in snapshot: {0}")]
    Catalog(#[from] CoreError),
}
