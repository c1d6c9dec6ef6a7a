//! Employee deployment readiness.
//!
//! Aggregates per-document classifications for one employee against one
//! target window into a single verdict. Missing and expired documents block
//! (`NAO_APTO`); a document lapsing inside the window is a warning
//! (`ATENCAO`); pending evidence never changes the level and is surfaced as
//! a separate flag for follow-up.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::context::EvaluationContext;
use crate::document_status::{classify_document_status, days_until_expiry, DocumentStatus};
use crate::documents::{live_records, DocumentsByEmployee};
use crate::evidence::{classify_evidence_status, EvidenceStatus};
use crate::types::DbId;
use crate::window::DeploymentWindow;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const LEVEL_APTO: &str = "APTO";
pub const LEVEL_ATENCAO: &str = "ATENCAO";
pub const LEVEL_NAO_APTO: &str = "NAO_APTO";

/// All valid readiness level strings.
pub const VALID_READINESS_LEVELS: &[&str] = &[LEVEL_APTO, LEVEL_ATENCAO, LEVEL_NAO_APTO];

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Overall readiness of one employee for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadinessLevel {
    Apto,
    Atencao,
    NaoApto,
}

impl ReadinessLevel {
    /// Convert from a persisted string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            LEVEL_APTO => Ok(Self::Apto),
            LEVEL_ATENCAO => Ok(Self::Atencao),
            LEVEL_NAO_APTO => Ok(Self::NaoApto),
            _ => Err(format!(
                "Invalid readiness level '{s}'. Must be one of: {}",
                VALID_READINESS_LEVELS.join(", ")
            )),
        }
    }

    /// Convert to the persisted string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apto => LEVEL_APTO,
            Self::Atencao => LEVEL_ATENCAO,
            Self::NaoApto => LEVEL_NAO_APTO,
        }
    }
}

impl std::fmt::Display for ReadinessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// Outcome for one required document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCheck {
    pub code: String,
    pub status: DocumentStatus,
    /// `None` when the employee holds no record for this code.
    pub evidence: Option<EvidenceStatus>,
    pub expiration_date: Option<NaiveDate>,
    pub days_until_expiry: Option<i64>,
}

/// Readiness of one employee against one target window. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessVerdict {
    pub employee_id: DbId,
    pub level: ReadinessLevel,
    pub missing: Vec<String>,
    pub expired: Vec<String>,
    pub expiring_during_window: Vec<String>,
    /// Some required document the employee holds has evidence that is not
    /// verified. Missing documents are excluded; they already block through
    /// `missing`.
    pub evidence_pending: bool,
    /// One entry per catalogued required code, in required-set order.
    pub items: Vec<DocumentCheck>,
}

/// Counts of verdict levels across a set of employees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessSummary {
    pub total: usize,
    pub apto: usize,
    pub atencao: usize,
    pub nao_apto: usize,
    pub evidence_pending: usize,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate one employee against the required set for a target window.
///
/// Only catalogued codes in the required set are examined, so records of
/// unknown or optional types never affect the verdict. A required code with
/// no live record is missing.
pub fn compute_readiness(
    ctx: &EvaluationContext<'_>,
    employee_id: DbId,
    documents_by_employee: &DocumentsByEmployee,
    window: Option<&DeploymentWindow>,
) -> ReadinessVerdict {
    let records = documents_by_employee
        .get(&employee_id)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let live = live_records(records, ctx.catalog);

    let mut missing = Vec::new();
    let mut expired = Vec::new();
    let mut expiring_during_window = Vec::new();
    let mut evidence_pending = false;
    let mut items = Vec::with_capacity(ctx.required_types().len());

    for &document_type in ctx.required_types() {
        let code = document_type.code.as_str();
        let record = live.get(code).copied();

        let (status, evidence) = match record {
            None => (DocumentStatus::Faltando, None),
            Some(r) => (
                classify_document_status(r, document_type, window, ctx.today, &ctx.config),
                Some(classify_evidence_status(r)),
            ),
        };

        match status {
            DocumentStatus::Faltando => missing.push(code.to_string()),
            DocumentStatus::Vencido => expired.push(code.to_string()),
            DocumentStatus::DuranteEmbarque => expiring_during_window.push(code.to_string()),
            DocumentStatus::Ok | DocumentStatus::Vencendo | DocumentStatus::SemValidade => {}
        }

        if evidence.is_some_and(|e| e != EvidenceStatus::Verificado) {
            evidence_pending = true;
        }

        items.push(DocumentCheck {
            code: code.to_string(),
            status,
            evidence,
            expiration_date: record.and_then(|r| r.expiration()),
            days_until_expiry: record.and_then(|r| days_until_expiry(r, ctx.today)),
        });
    }

    let level = derive_level(&missing, &expired, &expiring_during_window);

    if level != ReadinessLevel::Apto {
        tracing::debug!(
            employee_id,
            level = %level,
            missing = missing.len(),
            expired = expired.len(),
            expiring = expiring_during_window.len(),
            "Employee not fully ready"
        );
    }

    ReadinessVerdict {
        employee_id,
        level,
        missing,
        expired,
        expiring_during_window,
        evidence_pending,
        items,
    }
}

/// Fixed priority: blockers first, then mid-window expiry.
fn derive_level(
    missing: &[String],
    expired: &[String],
    expiring_during_window: &[String],
) -> ReadinessLevel {
    if !missing.is_empty() || !expired.is_empty() {
        ReadinessLevel::NaoApto
    } else if !expiring_during_window.is_empty() {
        ReadinessLevel::Atencao
    } else {
        ReadinessLevel::Apto
    }
}

/// Tally verdict levels.
pub fn summarize_readiness(verdicts: &[ReadinessVerdict]) -> ReadinessSummary {
    let mut summary = ReadinessSummary {
        total: verdicts.len(),
        ..ReadinessSummary::default()
    };
    for v in verdicts {
        match v.level {
            ReadinessLevel::Apto => summary.apto += 1,
            ReadinessLevel::Atencao => summary.atencao += 1,
            ReadinessLevel::NaoApto => summary.nao_apto += 1,
        }
        if v.evidence_pending {
            summary.evidence_pending += 1;
        }
    }
    summary
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DocumentCatalog, DocumentType, RequiredDocumentSet};
    use crate::documents::{group_by_employee, DocumentRecord};
    use chrono::Utc;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn catalog() -> DocumentCatalog {
        DocumentCatalog::new([
            DocumentType::new("ASO", "ASO", "saude", true),
            DocumentType::new("HUET", "HUET", "treinamento", true),
            DocumentType::new("RG", "RG", "identidade", false),
        ])
    }

    fn verified(code: &str, exp: &str) -> DocumentRecord {
        DocumentRecord::new(1, code)
            .with_expiration(exp)
            .with_evidence("pdf", "ref")
            .verified_by("rh", Utc::now())
    }

    fn evaluate(
        required: &[&str],
        records: Vec<DocumentRecord>,
        window: Option<&DeploymentWindow>,
    ) -> ReadinessVerdict {
        let catalog = catalog();
        let required = RequiredDocumentSet::new(required.iter().copied()).unwrap();
        let ctx = EvaluationContext::new(&catalog, &required, ymd(2026, 1, 10));
        compute_readiness(&ctx, 1, &group_by_employee(records), window)
    }

    // -- ReadinessLevel -------------------------------------------------------

    #[test]
    fn level_round_trip() {
        for s in VALID_READINESS_LEVELS {
            assert_eq!(ReadinessLevel::from_str_value(s).unwrap().as_str(), *s);
        }
    }

    #[test]
    fn level_invalid_rejected() {
        let err = ReadinessLevel::from_str_value("apto").unwrap_err();
        assert!(err.contains("Invalid readiness level"));
    }

    #[test]
    fn level_serializes_as_contract_code() {
        assert_eq!(
            serde_json::to_value(ReadinessLevel::NaoApto).unwrap(),
            serde_json::json!("NAO_APTO")
        );
    }

    // -- compute_readiness ----------------------------------------------------

    #[test]
    fn all_valid_is_apto() {
        let v = evaluate(
            &["ASO", "HUET"],
            vec![verified("ASO", "2027-01-01"), verified("HUET", "2027-01-01")],
            None,
        );
        assert_eq!(v.level, ReadinessLevel::Apto);
        assert!(v.missing.is_empty());
        assert!(!v.evidence_pending);
        assert_eq!(v.items.len(), 2);
    }

    #[test]
    fn absent_required_type_is_missing() {
        let v = evaluate(&["ASO", "HUET"], vec![verified("ASO", "2027-01-01")], None);
        assert_eq!(v.missing, vec!["HUET"]);
        assert_eq!(v.level, ReadinessLevel::NaoApto);
        let huet = &v.items[1];
        assert_eq!(huet.status, DocumentStatus::Faltando);
        assert_eq!(huet.evidence, None);
    }

    #[test]
    fn employee_without_records_misses_everything() {
        let v = evaluate(&["ASO", "RG"], vec![], None);
        assert_eq!(v.missing, vec!["ASO", "RG"]);
        assert_eq!(v.level, ReadinessLevel::NaoApto);
        assert!(!v.evidence_pending);
    }

    #[test]
    fn expired_blocks_even_when_others_valid() {
        let v = evaluate(
            &["ASO", "HUET", "RG"],
            vec![
                verified("ASO", "2026-01-05"),
                verified("HUET", "2028-01-01"),
                DocumentRecord::new(1, "RG").with_evidence("scan", "rg.png").verified_by("rh", Utc::now()),
            ],
            None,
        );
        assert_eq!(v.expired, vec!["ASO"]);
        assert_eq!(v.level, ReadinessLevel::NaoApto);
    }

    #[test]
    fn expiring_in_window_is_atencao() {
        let window = DeploymentWindow::new(ymd(2026, 1, 12), ymd(2026, 1, 20)).unwrap();
        let v = evaluate(
            &["ASO", "HUET"],
            vec![verified("ASO", "2026-01-16"), verified("HUET", "2027-01-01")],
            Some(&window),
        );
        assert_eq!(v.expiring_during_window, vec!["ASO"]);
        assert_eq!(v.level, ReadinessLevel::Atencao);
    }

    #[test]
    fn missing_outranks_mid_window_expiry() {
        let window = DeploymentWindow::new(ymd(2026, 1, 12), ymd(2026, 1, 20)).unwrap();
        let v = evaluate(&["ASO", "HUET"], vec![verified("ASO", "2026-01-16")], Some(&window));
        assert_eq!(v.level, ReadinessLevel::NaoApto);
        assert_eq!(v.expiring_during_window, vec!["ASO"]);
    }

    #[test]
    fn expiring_soon_alone_is_still_apto() {
        let v = evaluate(&["ASO"], vec![verified("ASO", "2026-01-15")], None);
        assert_eq!(v.level, ReadinessLevel::Apto);
        assert_eq!(v.items[0].status, DocumentStatus::Vencendo);
        assert_eq!(v.items[0].days_until_expiry, Some(5));
    }

    #[test]
    fn pending_evidence_does_not_downgrade() {
        let record = DocumentRecord::new(1, "ASO")
            .with_expiration("2027-01-01")
            .with_evidence("pdf", "aso.pdf");
        let v = evaluate(&["ASO"], vec![record], None);
        assert_eq!(v.level, ReadinessLevel::Apto);
        assert!(v.evidence_pending);
        assert_eq!(v.items[0].evidence, Some(EvidenceStatus::PendenteVerificacao));
    }

    #[test]
    fn no_evidence_counts_as_pending() {
        let record = DocumentRecord::new(1, "ASO").with_expiration("2027-01-01");
        let v = evaluate(&["ASO"], vec![record], None);
        assert!(v.evidence_pending);
    }

    #[test]
    fn non_expiring_required_document_is_fine_without_date() {
        let record = DocumentRecord::new(1, "RG")
            .with_evidence("scan", "rg.png")
            .verified_by("rh", Utc::now());
        let v = evaluate(&["RG"], vec![record], None);
        assert_eq!(v.level, ReadinessLevel::Apto);
        assert_eq!(v.items[0].status, DocumentStatus::SemValidade);
    }

    #[test]
    fn unparseable_expiration_counts_as_missing() {
        let v = evaluate(&["ASO"], vec![verified("ASO", "??")], None);
        assert_eq!(v.missing, vec!["ASO"]);
        assert_eq!(v.level, ReadinessLevel::NaoApto);
    }

    #[test]
    fn records_outside_required_set_are_ignored() {
        let v = evaluate(
            &["ASO"],
            vec![verified("ASO", "2027-01-01"), verified("UNKNOWN", "2000-01-01")],
            None,
        );
        assert_eq!(v.level, ReadinessLevel::Apto);
        assert_eq!(v.items.len(), 1);
    }

    #[test]
    fn uncatalogued_required_code_never_blocks() {
        // GWO is required but not in the catalog; its record lapsed already.
        let v = evaluate(
            &["ASO", "GWO"],
            vec![verified("ASO", "2027-01-01"), verified("GWO", "2026-01-05")],
            None,
        );
        assert_eq!(v.level, ReadinessLevel::Apto);
        assert!(v.expired.is_empty());
        assert!(v.missing.is_empty());
        assert_eq!(v.items.len(), 1);
        assert_eq!(v.items[0].code, "ASO");
    }

    #[test]
    fn evidence_pending_ignores_missing_documents() {
        let v = evaluate(&["ASO", "HUET"], vec![verified("ASO", "2027-01-01")], None);
        assert_eq!(v.missing, vec!["HUET"]);
        assert!(!v.evidence_pending);
    }

    #[test]
    fn superseded_record_is_not_used() {
        let mut old = verified("ASO", "2027-01-01");
        old.superseded = true;
        let v = evaluate(&["ASO"], vec![old, verified("ASO", "2026-01-01")], None);
        assert_eq!(v.expired, vec!["ASO"]);
    }

    #[test]
    fn empty_required_set_is_apto() {
        let v = evaluate(&[], vec![], None);
        assert_eq!(v.level, ReadinessLevel::Apto);
        assert!(v.items.is_empty());
    }

    // -- summarize_readiness --------------------------------------------------

    #[test]
    fn summary_counts_levels_and_pending() {
        let apto = evaluate(&["ASO"], vec![verified("ASO", "2027-01-01")], None);
        let nao = evaluate(&["ASO"], vec![], None);
        let pending = evaluate(
            &["ASO"],
            vec![DocumentRecord::new(1, "ASO").with_expiration("2027-01-01")],
            None,
        );
        let summary = summarize_readiness(&[apto, nao, pending]);
        assert_eq!(
            summary,
            ReadinessSummary {
                total: 3,
                apto: 2,
                atencao: 0,
                nao_apto: 1,
                evidence_pending: 1,
            }
        );
    }

    #[test]
    fn summary_of_nothing_is_zero() {
        assert_eq!(summarize_readiness(&[]), ReadinessSummary::default());
    }
}
