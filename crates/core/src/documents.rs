//! Canonical document records and live-record selection.
//!
//! A record is one certificate instance held by one employee. Records are
//! never deleted; a renewal supersedes the prior record for the same type, so
//! an employee's history can hold several records per code. The engine only
//! ever evaluates the live one.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::DocumentCatalog;
use crate::dates::{normalize_optional, DateInput};
use crate::types::{DbId, Timestamp};

/// All document records, grouped by employee.
pub type DocumentsByEmployee = HashMap<DbId, Vec<DocumentRecord>>;

/// One certificate or document held by one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub employee_id: DbId,
    pub document_type_code: String,
    #[serde(default)]
    pub issue_date: Option<DateInput>,
    /// Absent for non-expiring types. Absent on an expiring type means the
    /// document is missing, not that the record is malformed.
    #[serde(default)]
    pub expiration_date: Option<DateInput>,
    #[serde(default)]
    pub evidence_type: Option<String>,
    #[serde(default)]
    pub evidence_ref: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub verified_by: Option<String>,
    #[serde(default)]
    pub verified_at: Option<Timestamp>,
    /// When the record was uploaded or imported. Used to pick the live
    /// record when several are not marked superseded.
    #[serde(default)]
    pub submitted_at: Option<Timestamp>,
    #[serde(default)]
    pub superseded: bool,
}

impl DocumentRecord {
    /// A bare record with no dates, evidence, or verification.
    pub fn new(employee_id: DbId, document_type_code: &str) -> Self {
        Self {
            employee_id,
            document_type_code: document_type_code.to_string(),
            issue_date: None,
            expiration_date: None,
            evidence_type: None,
            evidence_ref: None,
            verified: false,
            verified_by: None,
            verified_at: None,
            submitted_at: None,
            superseded: false,
        }
    }

    pub fn with_expiration(mut self, expiration: impl Into<DateInput>) -> Self {
        self.expiration_date = Some(expiration.into());
        self
    }

    pub fn with_evidence(mut self, evidence_type: &str, evidence_ref: &str) -> Self {
        self.evidence_type = Some(evidence_type.to_string());
        self.evidence_ref = Some(evidence_ref.to_string());
        self
    }

    pub fn verified_by(mut self, who: &str, at: Timestamp) -> Self {
        self.verified = true;
        self.verified_by = Some(who.to_string());
        self.verified_at = Some(at);
        self
    }

    /// The normalized expiration day, or `None` if absent or unreadable.
    pub fn expiration(&self) -> Option<NaiveDate> {
        let date = normalize_optional(self.expiration_date.as_ref());
        if date.is_none() && self.expiration_date.is_some() {
            tracing::debug!(
                employee_id = self.employee_id,
                code = %self.document_type_code,
                "Unparseable expiration date treated as absent"
            );
        }
        date
    }

    /// The normalized issue day, or `None` if absent or unreadable.
    pub fn issued_on(&self) -> Option<NaiveDate> {
        normalize_optional(self.issue_date.as_ref())
    }
}

/// Select the live record per document-type code.
///
/// Superseded records and records whose code the catalog does not know are
/// ignored. Among the rest, the latest `submitted_at` wins; a record without
/// `submitted_at` loses to one with it, and exact ties go to the later
/// position in `records`.
pub fn live_records<'a>(
    records: &'a [DocumentRecord],
    catalog: &DocumentCatalog,
) -> HashMap<&'a str, &'a DocumentRecord> {
    let mut live: HashMap<&str, &DocumentRecord> = HashMap::new();
    for record in records.iter().filter(|r| !r.superseded) {
        let code = record.document_type_code.as_str();
        if !catalog.contains(code) {
            tracing::debug!(
                employee_id = record.employee_id,
                code,
                "Ignoring record of uncatalogued document type"
            );
            continue;
        }
        let replaces = live
            .get(code)
            .map_or(true, |current| current.submitted_at <= record.submitted_at);
        if replaces {
            live.insert(code, record);
        }
    }
    live
}

/// The live record for one employee and one code, if any.
pub fn live_record<'a>(
    documents_by_employee: &'a DocumentsByEmployee,
    catalog: &DocumentCatalog,
    employee_id: DbId,
    code: &str,
) -> Option<&'a DocumentRecord> {
    let records = documents_by_employee.get(&employee_id)?;
    live_records(records, catalog).get(code).copied()
}

/// Group a flat list of records by employee, preserving input order.
pub fn group_by_employee(records: impl IntoIterator<Item = DocumentRecord>) -> DocumentsByEmployee {
    let mut grouped = DocumentsByEmployee::new();
    for record in records {
        grouped.entry(record.employee_id).or_default().push(record);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn catalog() -> DocumentCatalog {
        DocumentCatalog::offshore_default()
    }

    fn at(day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap()
    }

    fn submitted(code: &str, exp: &str, day: Option<u32>) -> DocumentRecord {
        let mut r = DocumentRecord::new(1, code).with_expiration(exp);
        r.submitted_at = day.map(at);
        r
    }

    #[test]
    fn superseded_records_are_ignored() {
        let mut old = submitted("ASO", "2027-01-01", Some(5));
        old.superseded = true;
        let records = vec![old, submitted("ASO", "2026-06-01", Some(1))];
        let live = live_records(&records, &catalog());
        assert_eq!(
            live["ASO"].expiration(),
            NaiveDate::from_ymd_opt(2026, 6, 1)
        );
    }

    #[test]
    fn latest_submission_wins() {
        let records = vec![
            submitted("ASO", "2026-06-01", Some(9)),
            submitted("ASO", "2026-03-01", Some(2)),
        ];
        let live = live_records(&records, &catalog());
        assert_eq!(live["ASO"].submitted_at, Some(at(9)));
    }

    #[test]
    fn missing_submission_time_loses() {
        let records = vec![
            submitted("ASO", "2026-06-01", Some(2)),
            submitted("ASO", "2026-03-01", None),
        ];
        let live = live_records(&records, &catalog());
        assert_eq!(live["ASO"].submitted_at, Some(at(2)));
    }

    #[test]
    fn tie_goes_to_later_position() {
        let records = vec![
            submitted("ASO", "2026-06-01", None),
            submitted("ASO", "2026-09-01", None),
        ];
        let live = live_records(&records, &catalog());
        assert_eq!(live["ASO"].expiration(), NaiveDate::from_ymd_opt(2026, 9, 1));
    }

    #[test]
    fn one_live_record_per_code() {
        let records = vec![
            submitted("ASO", "2026-06-01", None),
            submitted("HUET", "2026-06-01", None),
            submitted("ASO", "2026-07-01", None),
        ];
        assert_eq!(live_records(&records, &catalog()).len(), 2);
    }

    #[test]
    fn live_record_lookup_by_employee() {
        let grouped = group_by_employee(vec![
            DocumentRecord::new(1, "ASO"),
            DocumentRecord::new(2, "HUET"),
        ]);
        assert!(live_record(&grouped, &catalog(), 1, "ASO").is_some());
        assert!(live_record(&grouped, &catalog(), 1, "HUET").is_none());
        assert!(live_record(&grouped, &catalog(), 3, "ASO").is_none());
    }

    #[test]
    fn uncatalogued_codes_are_excluded() {
        let records = vec![
            submitted("GWO", "2026-01-05", Some(3)),
            submitted("ASO", "2027-01-01", Some(3)),
        ];
        let live = live_records(&records, &catalog());
        assert_eq!(live.len(), 1);
        assert!(live.contains_key("ASO"));
        assert!(!live.contains_key("GWO"));
    }

    #[test]
    fn unreadable_expiration_is_absent() {
        let r = DocumentRecord::new(1, "ASO").with_expiration("not a date");
        assert!(r.expiration_date.is_some());
        assert_eq!(r.expiration(), None);
    }

    #[test]
    fn record_deserializes_with_defaults() {
        let r: DocumentRecord = serde_json::from_value(serde_json::json!({
            "employee_id": 7,
            "document_type_code": "ASO",
            "expiration_date": 46042
        }))
        .unwrap();
        assert!(!r.verified);
        assert!(!r.superseded);
        assert_eq!(r.expiration(), NaiveDate::from_ymd_opt(2026, 1, 20));
    }
}
