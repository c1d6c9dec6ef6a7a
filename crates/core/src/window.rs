//! Deployment windows (embark → disembark rotations).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::DateInput;
use crate::error::CoreError;

/// One rotation for one employee, inclusive on both ends, at day granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DeploymentWindow {
    /// Build a window, rejecting one that ends before it starts.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if end < start {
            return Err(CoreError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build a synthetic window from raw embark/disembark inputs.
    ///
    /// Returns `None` if either date is unreadable or the range is inverted.
    pub fn from_inputs(embark: &DateInput, disembark: &DateInput) -> Option<Self> {
        let start = embark.normalize()?;
        let end = disembark.normalize()?;
        match Self::new(start, end) {
            Ok(window) => Some(window),
            Err(e) => {
                tracing::debug!(error = %e, "Discarding deployment window");
                None
            }
        }
    }

    /// Whether `date` falls inside `[start, end]`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days on board, counting both embark and disembark.
    pub fn length_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}
