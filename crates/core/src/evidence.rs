//! Evidence verification status.
//!
//! Independent of expiration: a valid certificate can still be waiting for
//! staff to check the attached proof. Reported alongside the expiration
//! status, never folded into it.

use serde::{Deserialize, Serialize};

use crate::documents::DocumentRecord;

pub const EVIDENCE_SEM_EVIDENCIA: &str = "SEM_EVIDENCIA";
pub const EVIDENCE_PENDENTE_VERIFICACAO: &str = "PENDENTE_VERIFICACAO";
pub const EVIDENCE_VERIFICADO: &str = "VERIFICADO";

/// All valid evidence status strings.
pub const VALID_EVIDENCE_STATUSES: &[&str] = &[
    EVIDENCE_SEM_EVIDENCIA,
    EVIDENCE_PENDENTE_VERIFICACAO,
    EVIDENCE_VERIFICADO,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceStatus {
    SemEvidencia,
    PendenteVerificacao,
    Verificado,
}

impl EvidenceStatus {
    /// Convert from a persisted string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            EVIDENCE_SEM_EVIDENCIA => Ok(Self::SemEvidencia),
            EVIDENCE_PENDENTE_VERIFICACAO => Ok(Self::PendenteVerificacao),
            EVIDENCE_VERIFICADO => Ok(Self::Verificado),
            _ => Err(format!(
                "Invalid evidence status '{s}'. Must be one of: {}",
                VALID_EVIDENCE_STATUSES.join(", ")
            )),
        }
    }

    /// Convert to the persisted string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SemEvidencia => EVIDENCE_SEM_EVIDENCIA,
            Self::PendenteVerificacao => EVIDENCE_PENDENTE_VERIFICACAO,
            Self::Verificado => EVIDENCE_VERIFICADO,
        }
    }
}

impl std::fmt::Display for EvidenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the evidence trail of one record.
pub fn classify_evidence_status(record: &DocumentRecord) -> EvidenceStatus {
    if !has_evidence(record) {
        return EvidenceStatus::SemEvidencia;
    }
    if record.verified {
        EvidenceStatus::Verificado
    } else {
        EvidenceStatus::PendenteVerificacao
    }
}

/// Whether an evidence type or reference is present. Blank strings count as
/// absent.
fn has_evidence(record: &DocumentRecord) -> bool {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    present(&record.evidence_type) || present(&record.evidence_ref)
}
