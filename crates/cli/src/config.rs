use std::path::PathBuf;

use chrono::NaiveDate;

use crewready_core::catalog::RequiredDocumentSet;
use crewready_core::config::{ComplianceConfig, DEFAULT_EXPIRING_HORIZON_DAYS};
use crewready_core::dates::normalize_text;

use crate::error::ConfigError;

pub const ENV_SNAPSHOT: &str = "CREWREADY_SNAPSHOT";
pub const ENV_TODAY: &str = "CREWREADY_TODAY";
pub const ENV_HORIZON_DAYS: &str = "CREWREADY_HORIZON_DAYS";
pub const ENV_REQUIRED_CODES: &str = "CREWREADY_REQUIRED_CODES";
pub const ENV_LOG_FORMAT: &str = "CREWREADY_LOG_FORMAT";

const DEFAULT_SNAPSHOT: &str = "snapshot.json";

/// Runner configuration loaded from environment variables.
///
/// All fields have defaults suitable for local use.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Path of the JSON snapshot to evaluate.
    pub snapshot_path: PathBuf,
    /// Reference date. `None` means "today" on the local clock.
    pub today: Option<NaiveDate>,
    pub compliance: ComplianceConfig,
    /// Overrides the snapshot's and the built-in required set when present.
    pub required_codes: Option<RequiredDocumentSet>,
    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,
}

impl CliConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                   |
    /// |----------------------------|---------------------------|
    /// | `CREWREADY_SNAPSHOT`       | `snapshot.json`           |
    /// | `CREWREADY_TODAY`          | local date                |
    /// | `CREWREADY_HORIZON_DAYS`   | `30`                      |
    /// | `CREWREADY_REQUIRED_CODES` | snapshot / built-in set   |
    /// | `CREWREADY_LOG_FORMAT`     | `text`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let snapshot_path: PathBuf = get(ENV_SNAPSHOT)
            .unwrap_or_else(|| DEFAULT_SNAPSHOT.into())
            .into();

        let today = get(ENV_TODAY)
            .map(|raw| {
                normalize_text(&raw).ok_or_else(|| ConfigError::InvalidVar {
                    var: ENV_TODAY,
                    reason: format!("'{raw}' is not a date"),
                })
            })
            .transpose()?;

        let horizon: i64 = match get(ENV_HORIZON_DAYS) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidVar {
                var: ENV_HORIZON_DAYS,
                reason: format!("'{raw}' is not an integer"),
            })?,
            None => DEFAULT_EXPIRING_HORIZON_DAYS,
        };
        let compliance = ComplianceConfig::with_horizon(horizon)?;

        let required_codes = get(ENV_REQUIRED_CODES)
            .map(|raw| {
                RequiredDocumentSet::new(raw.split(',').filter(|c| !c.trim().is_empty()))
            })
            .transpose()?;

        let log_json = match get(ENV_LOG_FORMAT).as_deref().map(str::trim) {
            None | Some("text") => false,
            Some("json") => true,
            Some(other) => {
                return Err(ConfigError::InvalidVar {
                    var: ENV_LOG_FORMAT,
                    reason: format!("'{other}' must be 'text' or 'json'"),
                })
            }
        };

        Ok(Self {
            snapshot_path,
            today,
            compliance,
            required_codes,
            log_json,
        })
    }
}
