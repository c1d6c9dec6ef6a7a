//! Snapshot ingestion: maps loosely-shaped rows onto canonical engine records.
//!
//! Rows come from spreadsheet imports, legacy exports, and the REST layer,
//! each naming the same concept differently (`expiration_date`,
//! `expirationDate`, `DATA_VENCIMENTO`, ...). All aliases are resolved here so
//! the engine only ever sees one shape. A row that fails to parse or validate
//! is skipped with a warning and counted; it never aborts the load.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use validator::Validate;

use crewready_core::catalog::{DocumentCatalog, DocumentType, RequiredDocumentSet};
use crewready_core::dates::{normalize_date, DateInput, EPOCH_SECONDS_LIMIT, SERIAL_DAY_LIMIT};
use crewready_core::documents::{group_by_employee, DocumentRecord, DocumentsByEmployee};
use crewready_core::kpi::{CrewMember, Program};
use crewready_core::turnaround::Assignment;
use crewready_core::types::{DbId, Timestamp};
use crewready_core::window::DeploymentWindow;

use crate::error::IngestError;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything the engine needs for one run, in canonical form.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub catalog: DocumentCatalog,
    /// Required set declared by the snapshot, if any.
    pub required: Option<RequiredDocumentSet>,
    pub documents: DocumentsByEmployee,
    pub programs: Vec<Program>,
    /// Explicit assignment history plus one assignment per program member.
    pub assignments: Vec<Assignment>,
    /// Rows dropped because they failed to parse or validate.
    pub skipped_rows: usize,
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default, alias = "documentTypes", alias = "tipos_documento")]
    document_types: Option<Vec<Value>>,
    #[serde(default, alias = "requiredCodes", alias = "documentos_obrigatorios")]
    required_codes: Option<Vec<String>>,
    #[serde(default, alias = "documentos")]
    documents: Vec<Value>,
    #[serde(default, alias = "programas")]
    programs: Vec<Value>,
    #[serde(default, alias = "alocacoes")]
    assignments: Vec<Value>,
}

/// Read and parse a snapshot file.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, IngestError> {
    let text = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_snapshot(&text)
}

/// Parse snapshot JSON text.
pub fn parse_snapshot(text: &str) -> Result<Snapshot, IngestError> {
    let raw: RawSnapshot = serde_json::from_str(text)?;
    let mut skipped = 0usize;

    let catalog = match raw.document_types {
        Some(rows) => DocumentCatalog::new(
            parse_rows::<DocumentTypeRow>("document_type", rows, &mut skipped)
                .into_iter()
                .map(DocumentTypeRow::into_document_type),
        ),
        None => DocumentCatalog::offshore_default(),
    };

    let required = raw
        .required_codes
        .map(RequiredDocumentSet::new)
        .transpose()?;

    let documents = group_by_employee(
        parse_rows::<DocumentRow>("document", raw.documents, &mut skipped)
            .into_iter()
            .filter_map(DocumentRow::into_record),
    );

    let programs: Vec<Program> = parse_rows::<ProgramRow>("program", raw.programs, &mut skipped)
        .into_iter()
        .map(ProgramRow::into_program)
        .collect();

    let explicit: Vec<Assignment> =
        parse_rows::<AssignmentRow>("assignment", raw.assignments, &mut skipped)
            .into_iter()
            .map(AssignmentRow::into_assignment)
            .collect();
    let assignments = merge_assignments(explicit, &programs);

    tracing::info!(
        document_types = catalog.len(),
        employees = documents.len(),
        programs = programs.len(),
        assignments = assignments.len(),
        skipped,
        "Snapshot loaded"
    );

    Ok(Snapshot {
        catalog,
        required,
        documents,
        programs,
        assignments,
        skipped_rows: skipped,
    })
}

/// Explicit history first, then one assignment per program member that the
/// history does not already cover.
fn merge_assignments(explicit: Vec<Assignment>, programs: &[Program]) -> Vec<Assignment> {
    let covered: HashSet<(DbId, DbId)> = explicit
        .iter()
        .map(|a| (a.employee_id, a.program_id))
        .collect();

    let derived: Vec<Assignment> = programs
        .iter()
        .filter_map(|p| p.window.map(|w| (p, w)))
        .flat_map(|(p, w)| {
            p.crew.iter().map(move |m| Assignment {
                employee_id: m.employee_id,
                program_id: p.id,
                embark_date: DateInput::Date(w.start),
                disembark_date: DateInput::Date(w.end),
            })
        })
        .filter(|a| !covered.contains(&(a.employee_id, a.program_id)))
        .collect();

    explicit.into_iter().chain(derived).collect()
}

fn parse_rows<T>(kind: &'static str, rows: Vec<Value>, skipped: &mut usize) -> Vec<T>
where
    T: DeserializeOwned + Validate,
{
    rows.into_iter()
        .enumerate()
        .filter_map(|(i, value)| {
            let row: T = match serde_json::from_value(value) {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!(kind, row = i, error = %e, "Skipping malformed row");
                    *skipped += 1;
                    return None;
                }
            };
            if let Err(e) = row.validate() {
                tracing::warn!(kind, row = i, error = %e, "Skipping invalid row");
                *skipped += 1;
                return None;
            }
            Some(row)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
struct DocumentTypeRow {
    #[serde(alias = "codigo", alias = "CODIGO")]
    #[validate(length(min = 1, max = 32))]
    code: String,
    #[serde(default, alias = "nome", alias = "NOME")]
    name: Option<String>,
    #[serde(default, alias = "categoria", alias = "CATEGORIA")]
    category: Option<String>,
    #[serde(
        default = "default_true",
        alias = "requiresExpiration",
        alias = "exige_validade",
        alias = "EXIGE_VALIDADE",
        deserialize_with = "expiration_flag"
    )]
    requires_expiration: bool,
}

impl DocumentTypeRow {
    fn into_document_type(self) -> DocumentType {
        let code = self.code.trim().to_string();
        DocumentType {
            name: self.name.unwrap_or_else(|| code.clone()),
            category: self.category.unwrap_or_default(),
            code,
            requires_expiration: self.requires_expiration,
        }
    }
}

/// One document row as it arrives from any of the upstream sources.
#[derive(Debug, Deserialize, Validate)]
struct DocumentRow {
    #[serde(alias = "employeeId", alias = "funcionario_id", alias = "ID_FUNCIONARIO")]
    #[validate(range(min = 1))]
    employee_id: DbId,
    #[serde(
        alias = "documentTypeCode",
        alias = "document_type",
        alias = "tipo_documento",
        alias = "CODIGO_DOCUMENTO"
    )]
    #[validate(length(min = 1, max = 32))]
    document_type_code: String,
    #[serde(default, alias = "issueDate", alias = "data_emissao", alias = "DATA_EMISSAO")]
    issue_date: Option<DateInput>,
    #[serde(
        default,
        alias = "expirationDate",
        alias = "data_vencimento",
        alias = "DATA_VENCIMENTO"
    )]
    expiration_date: Option<DateInput>,
    #[serde(default, alias = "evidenceType", alias = "tipo_evidencia")]
    evidence_type: Option<String>,
    #[serde(
        default,
        alias = "evidenceRef",
        alias = "evidence_url",
        alias = "url_evidencia"
    )]
    evidence_ref: Option<String>,
    #[serde(
        default,
        alias = "isVerified",
        alias = "verificado",
        deserialize_with = "lenient_bool"
    )]
    verified: bool,
    #[serde(default, alias = "verifiedBy", alias = "verificado_por")]
    verified_by: Option<String>,
    #[serde(default, alias = "verifiedAt", alias = "verificado_em")]
    verified_at: Option<DateInput>,
    #[serde(
        default,
        alias = "submittedAt",
        alias = "created_at",
        alias = "createdAt",
        alias = "enviado_em"
    )]
    submitted_at: Option<DateInput>,
    #[serde(
        default,
        alias = "isSuperseded",
        alias = "substituido",
        deserialize_with = "lenient_bool"
    )]
    superseded: bool,
}

impl DocumentRow {
    /// Map to the canonical record. `None` if the code is blank once trimmed.
    fn into_record(self) -> Option<DocumentRecord> {
        let code = self.document_type_code.trim();
        if code.is_empty() {
            tracing::warn!(employee_id = self.employee_id, "Skipping document with blank code");
            return None;
        }
        Some(DocumentRecord {
            employee_id: self.employee_id,
            document_type_code: code.to_string(),
            issue_date: self.issue_date,
            expiration_date: self.expiration_date,
            evidence_type: self.evidence_type,
            evidence_ref: self.evidence_ref,
            verified: self.verified,
            verified_by: self.verified_by,
            verified_at: self.verified_at.as_ref().and_then(to_timestamp),
            submitted_at: self.submitted_at.as_ref().and_then(to_timestamp),
            superseded: self.superseded,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
struct CrewRow {
    #[serde(alias = "employeeId", alias = "funcionario_id", alias = "ID_FUNCIONARIO")]
    #[validate(range(min = 1))]
    employee_id: DbId,
    #[serde(
        default,
        alias = "localizacao",
        alias = "status_local",
        alias = "LOCALIZACAO"
    )]
    location: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
struct ProgramRow {
    #[serde(alias = "programId", alias = "programa_id", alias = "ID_PROGRAMA")]
    #[validate(range(min = 1))]
    id: DbId,
    #[serde(default, alias = "nome", alias = "NOME")]
    name: String,
    #[serde(default, alias = "embarkDate", alias = "data_embarque", alias = "DATA_EMBARQUE")]
    embark_date: Option<DateInput>,
    #[serde(
        default,
        alias = "disembarkDate",
        alias = "data_desembarque",
        alias = "DATA_DESEMBARQUE"
    )]
    disembark_date: Option<DateInput>,
    #[serde(default, alias = "tripulacao")]
    #[validate(nested)]
    crew: Vec<CrewRow>,
}

impl ProgramRow {
    fn into_program(self) -> Program {
        let window = match (&self.embark_date, &self.disembark_date) {
            (Some(embark), Some(disembark)) => DeploymentWindow::from_inputs(embark, disembark),
            _ => None,
        };
        if window.is_none() {
            tracing::warn!(program_id = self.id, "Program has no readable window");
        }
        Program {
            id: self.id,
            name: self.name,
            window,
            crew: self
                .crew
                .into_iter()
                .map(|c| CrewMember {
                    employee_id: c.employee_id,
                    location: c.location,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
struct AssignmentRow {
    #[serde(alias = "employeeId", alias = "funcionario_id", alias = "ID_FUNCIONARIO")]
    #[validate(range(min = 1))]
    employee_id: DbId,
    #[serde(alias = "programId", alias = "programa_id", alias = "ID_PROGRAMA")]
    #[validate(range(min = 1))]
    program_id: DbId,
    #[serde(alias = "embarkDate", alias = "data_embarque", alias = "DATA_EMBARQUE")]
    embark_date: DateInput,
    #[serde(alias = "disembarkDate", alias = "data_desembarque", alias = "DATA_DESEMBARQUE")]
    disembark_date: DateInput,
}

impl AssignmentRow {
    fn into_assignment(self) -> Assignment {
        Assignment {
            employee_id: self.employee_id,
            program_id: self.program_id,
            embark_date: self.embark_date,
            disembark_date: self.disembark_date,
        }
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

/// Spreadsheet-friendly boolean: accepts JSON booleans, non-zero numbers,
/// and `true`/`sim`/`s`/`yes`/`y`/`1`/`x` in any case. Anything else is false.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "sim" | "s" | "yes" | "y" | "1" | "x"
        ),
        _ => false,
    })
}

/// Whether a document type expires. Only an explicit negative (`false`, `0`,
/// `nao`/`não`/`n`/`no`) turns it off; absent, null or unrecognised values
/// keep the type expiring.
fn expiration_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !matches!(
            s.trim().to_lowercase().as_str(),
            "false" | "0" | "nao" | "não" | "n" | "no"
        ),
        _ => true,
    })
}

/// Any date shape to an instant. Epoch numbers and RFC 3339 text keep their
/// time of day; every other readable date lands at midnight UTC.
fn to_timestamp(input: &DateInput) -> Option<Timestamp> {
    match input {
        DateInput::Timestamp(ts) => Some(*ts),
        DateInput::Number(n) if n.is_finite() && n.abs() >= EPOCH_SECONDS_LIMIT => {
            DateTime::from_timestamp_millis(n.floor() as i64)
        }
        DateInput::Number(n) if n.is_finite() && n.abs() >= SERIAL_DAY_LIMIT => {
            DateTime::from_timestamp(n.floor() as i64, 0)
        }
        DateInput::Text(raw) => DateTime::parse_from_rfc3339(raw.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| at_midnight(input)),
        _ => at_midnight(input),
    }
}

fn at_midnight(input: &DateInput) -> Option<Timestamp> {
    normalize_date(input)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(value: Value) -> DocumentRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn canonical_field_names() {
        let record = row(json!({
            "employee_id": 1,
            "document_type_code": "ASO",
            "expiration_date": "2026-01-05",
            "verified": true
        }))
        .into_record()
        .unwrap();
        assert_eq!(record.expiration(), Some(ymd(2026, 1, 5)));
        assert!(record.verified);
    }

    #[test]
    fn camel_case_aliases() {
        let record = row(json!({
            "employeeId": 1,
            "documentTypeCode": "HUET",
            "expirationDate": 46042,
            "evidenceRef": "uploads/huet.pdf",
            "submittedAt": "2026-01-02T10:00:00Z"
        }))
        .into_record()
        .unwrap();
        assert_eq!(record.document_type_code, "HUET");
        assert_eq!(record.expiration(), Some(ymd(2026, 1, 20)));
        assert_eq!(record.evidence_ref.as_deref(), Some("uploads/huet.pdf"));
        assert!(record.submitted_at.is_some());
    }

    #[test]
    fn spreadsheet_aliases() {
        let record = row(json!({
            "ID_FUNCIONARIO": 3,
            "CODIGO_DOCUMENTO": " NR-35 ",
            "DATA_VENCIMENTO": "05/01/2026",
            "verificado": "Sim"
        }))
        .into_record()
        .unwrap();
        assert_eq!(record.employee_id, 3);
        assert_eq!(record.document_type_code, "NR-35");
        assert_eq!(record.expiration(), Some(ymd(2026, 1, 5)));
        assert!(record.verified);
    }

    #[test]
    fn lenient_flags() {
        for (raw, expected) in [
            (json!(1), true),
            (json!(0), false),
            (json!("x"), true),
            (json!("nao"), false),
            (json!(null), false),
        ] {
            let record = row(json!({
                "employee_id": 1,
                "document_type_code": "ASO",
                "superseded": raw
            }));
            assert_eq!(record.superseded, expected);
        }
    }

    #[test]
    fn blank_code_dropped_at_conversion() {
        let r = row(json!({"employee_id": 1, "document_type_code": "  "}));
        assert!(r.into_record().is_none());
    }

    #[test]
    fn timestamp_fallback_to_date() {
        let ts = to_timestamp(&"2026-01-02".into()).unwrap();
        assert_eq!(ts.date_naive(), ymd(2026, 1, 2));
        assert!(to_timestamp(&"whenever".into()).is_none());
    }

    #[test]
    fn numeric_submission_time_is_accepted() {
        let record = row(json!({
            "employee_id": 1,
            "document_type_code": "ASO",
            "submittedAt": 1767225600000_i64,
            "verified_at": 46023
        }))
        .into_record()
        .unwrap();
        let submitted = record.submitted_at.unwrap();
        assert_eq!(submitted.timestamp(), 1_767_225_600);
        assert_eq!(record.verified_at.unwrap().date_naive(), ymd(2026, 1, 1));
    }

    #[test]
    fn epoch_seconds_keep_time_of_day() {
        let ts = to_timestamp(&DateInput::Number(1_767_258_000.0)).unwrap();
        assert_eq!(ts.timestamp(), 1_767_258_000);
    }

    #[test]
    fn expiration_flag_defaults_to_expiring() {
        for (raw, expected) in [
            (json!(null), true),
            (json!("obrigatorio"), true),
            (json!(""), true),
            (json!("sim"), true),
            (json!(1), true),
            (json!(false), false),
            (json!(0), false),
            (json!("NAO"), false),
            (json!("não"), false),
            (json!("n"), false),
            (json!("no"), false),
        ] {
            let row: DocumentTypeRow =
                serde_json::from_value(json!({"code": "X", "requires_expiration": raw.clone()}))
                    .unwrap();
            assert_eq!(row.requires_expiration, expected, "value {raw}");
        }
        let row: DocumentTypeRow = serde_json::from_value(json!({"code": "X"})).unwrap();
        assert!(row.requires_expiration);
    }

    #[test]
    fn explicit_assignment_suppresses_derived_duplicate() {
        let program = Program {
            id: 10,
            name: "P".to_string(),
            window: Some(DeploymentWindow::new(ymd(2026, 1, 1), ymd(2026, 1, 14)).unwrap()),
            crew: vec![
                CrewMember {
                    employee_id: 1,
                    location: None,
                },
                CrewMember {
                    employee_id: 2,
                    location: None,
                },
            ],
        };
        let explicit = vec![Assignment {
            employee_id: 1,
            program_id: 10,
            embark_date: "2026-01-02".into(),
            disembark_date: "2026-01-15".into(),
        }];
        let merged = merge_assignments(explicit, &[program]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].embark_date, DateInput::from("2026-01-02"));
        assert_eq!(merged[1].employee_id, 2);
    }
}
