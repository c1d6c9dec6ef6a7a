//! Engine configuration.
//!
//! The only tunable is the "expiring soon" horizon. Everything else in the
//! engine is fixed by the classification rules.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default number of calendar days ahead of `today` that counts as "expiring".
pub const DEFAULT_EXPIRING_HORIZON_DAYS: i64 = 30;

/// Upper bound accepted for the expiring horizon (ten years).
pub const MAX_EXPIRING_HORIZON_DAYS: i64 = 3650;

/// Tunables for the document status classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// A document expiring within this many days of `today` is `VENCENDO`.
    pub expiring_horizon_days: i64,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            expiring_horizon_days: DEFAULT_EXPIRING_HORIZON_DAYS,
        }
    }
}

impl ComplianceConfig {
    /// Build a config with a custom horizon, validating the range.
    pub fn with_horizon(expiring_horizon_days: i64) -> Result<Self, CoreError> {
        let config = Self {
            expiring_horizon_days,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the horizon lies in `1..=MAX_EXPIRING_HORIZON_DAYS`.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.expiring_horizon_days < 1 || self.expiring_horizon_days > MAX_EXPIRING_HORIZON_DAYS
        {
            return Err(CoreError::Validation(format!(
                "expiring_horizon_days must be between 1 and {MAX_EXPIRING_HORIZON_DAYS}, got {}",
                self.expiring_horizon_days
            )));
        }
        Ok(())
    }
}
