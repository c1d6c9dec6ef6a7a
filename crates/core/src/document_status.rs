//! Per-document expiration status.
//!
//! Classifies one document record against `today` and, optionally, a
//! deployment window. The same function answers "what is this document's
//! status today" and "would it survive this specific rotation": for the
//! latter the caller passes a synthetic window built from the candidate
//! embark/disembark pair (see [`status_for_rotation`]).
//!
//! Check order is fixed: not-expiring, then missing, then expired, then
//! inside-the-window, then expiring-soon. The window check must run before
//! the horizon check, otherwise a document lapsing mid-rotation would be
//! reported as merely expiring soon.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::DocumentType;
use crate::config::ComplianceConfig;
use crate::dates::DateInput;
use crate::documents::DocumentRecord;
use crate::window::DeploymentWindow;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const STATUS_OK: &str = "OK";
pub const STATUS_VENCIDO: &str = "VENCIDO";
pub const STATUS_VENCENDO: &str = "VENCENDO";
pub const STATUS_DURANTE_EMBARQUE: &str = "DURANTE_EMBARQUE";
pub const STATUS_SEM_VALIDADE: &str = "SEM_VALIDADE";
pub const STATUS_FALTANDO: &str = "FALTANDO";

/// All valid document status strings.
pub const VALID_DOCUMENT_STATUSES: &[&str] = &[
    STATUS_OK,
    STATUS_VENCIDO,
    STATUS_VENCENDO,
    STATUS_DURANTE_EMBARQUE,
    STATUS_SEM_VALIDADE,
    STATUS_FALTANDO,
];

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Expiration status of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    /// Valid beyond the expiring horizon and outside any active window.
    Ok,
    /// Expired before today.
    Vencido,
    /// Expires within the expiring horizon.
    Vencendo,
    /// Expires inside the active deployment window.
    DuranteEmbarque,
    /// The document type never expires.
    SemValidade,
    /// Required, but no usable expiration date (or no record at all).
    Faltando,
}

impl DocumentStatus {
    /// Convert from a persisted string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            STATUS_OK => Ok(Self::Ok),
            STATUS_VENCIDO => Ok(Self::Vencido),
            STATUS_VENCENDO => Ok(Self::Vencendo),
            STATUS_DURANTE_EMBARQUE => Ok(Self::DuranteEmbarque),
            STATUS_SEM_VALIDADE => Ok(Self::SemValidade),
            STATUS_FALTANDO => Ok(Self::Faltando),
            _ => Err(format!(
                "Invalid document status '{s}'. Must be one of: {}",
                VALID_DOCUMENT_STATUSES.join(", ")
            )),
        }
    }

    /// Convert to the persisted string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => STATUS_OK,
            Self::Vencido => STATUS_VENCIDO,
            Self::Vencendo => STATUS_VENCENDO,
            Self::DuranteEmbarque => STATUS_DURANTE_EMBARQUE,
            Self::SemValidade => STATUS_SEM_VALIDADE,
            Self::Faltando => STATUS_FALTANDO,
        }
    }

    /// Whether this status blocks deployment outright.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Vencido | Self::Faltando)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify one document record.
///
/// Pure: the only notion of "now" is the supplied `today`.
pub fn classify_document_status(
    record: &DocumentRecord,
    document_type: &DocumentType,
    active_window: Option<&DeploymentWindow>,
    today: NaiveDate,
    config: &ComplianceConfig,
) -> DocumentStatus {
    if !document_type.requires_expiration {
        return DocumentStatus::SemValidade;
    }
    classify_expiration(record.expiration(), active_window, today, config)
}

/// Classify a normalized expiration day for a type that requires one.
pub fn classify_expiration(
    expiration: Option<NaiveDate>,
    active_window: Option<&DeploymentWindow>,
    today: NaiveDate,
    config: &ComplianceConfig,
) -> DocumentStatus {
    let Some(expiration) = expiration else {
        return DocumentStatus::Faltando;
    };

    if expiration < today {
        return DocumentStatus::Vencido;
    }

    if active_window.is_some_and(|w| w.contains(expiration)) {
        return DocumentStatus::DuranteEmbarque;
    }

    if (expiration - today).num_days() <= config.expiring_horizon_days {
        return DocumentStatus::Vencendo;
    }

    DocumentStatus::Ok
}

/// Would this document survive a specific (possibly future) rotation?
///
/// Builds a synthetic window from the candidate embark/disembark pair and
/// classifies against it. An unreadable pair is classified with no window.
pub fn status_for_rotation(
    record: &DocumentRecord,
    document_type: &DocumentType,
    embark: &DateInput,
    disembark: &DateInput,
    today: NaiveDate,
    config: &ComplianceConfig,
) -> DocumentStatus {
    let window = DeploymentWindow::from_inputs(embark, disembark);
    if window.is_none() {
        tracing::debug!(
            employee_id = record.employee_id,
            code = %record.document_type_code,
            "Rotation window unreadable, classifying without it"
        );
    }
    classify_document_status(record, document_type, window.as_ref(), today, config)
}

/// Days from `today` until the record expires. Negative once expired.
pub fn days_until_expiry(record: &DocumentRecord, today: NaiveDate) -> Option<i64> {
    record.expiration().map(|exp| (exp - today).num_days())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
