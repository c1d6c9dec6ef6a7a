//! Turnaround risk index.
//!
//! A turnaround risk is a certificate that is still valid when the worker
//! disembarks from one rotation but lapses before the next rotation starts.
//! "Is it expired today" and "does it expire during this window" both miss
//! it, because the relevant window is the *next* one.
//!
//! The index is sparse: only (employee, program) pairs with at least one
//! at-risk code appear.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::context::EvaluationContext;
use crate::dates::DateInput;
use crate::documents::{live_records, DocumentsByEmployee};
use crate::types::DbId;

/// Composite key: (employee_id, current program_id).
pub type RiskKey = (DbId, DbId);

/// All turnaround risks, keyed by employee and current program.
pub type TurnaroundRiskIndex = HashMap<RiskKey, TurnaroundRisk>;

/// One employee's assignment to one program's rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub employee_id: DbId,
    pub program_id: DbId,
    pub embark_date: DateInput,
    pub disembark_date: DateInput,
}

/// Codes that lapse in the gap after `current_program_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnaroundRisk {
    pub employee_id: DbId,
    pub current_program_id: DbId,
    pub next_program_id: DbId,
    pub current_disembark: NaiveDate,
    pub next_embark: NaiveDate,
    pub at_risk_codes: Vec<String>,
}

/// An assignment whose dates normalized cleanly.
#[derive(Debug, Clone, Copy)]
struct Rotation {
    program_id: DbId,
    embark: NaiveDate,
    disembark: NaiveDate,
}

/// Build the turnaround risk index over every assignment.
///
/// Assignments are grouped per employee and ordered by embark date; each
/// adjacent pair is checked. A required document is at risk when its
/// expiration is strictly after the current disembark and strictly before
/// the next embark. Assignments with unreadable dates are skipped.
pub fn build_turnaround_risk_index(
    ctx: &EvaluationContext<'_>,
    assignments: &[Assignment],
    documents_by_employee: &DocumentsByEmployee,
) -> TurnaroundRiskIndex {
    let mut index = TurnaroundRiskIndex::new();
    let expiring_codes: Vec<&str> = ctx
        .required_types()
        .iter()
        .filter(|t| t.requires_expiration)
        .map(|t| t.code.as_str())
        .collect();

    for (employee_id, rotations) in rotations_by_employee(assignments) {
        let records = documents_by_employee
            .get(&employee_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let live = live_records(records, ctx.catalog);

        for pair in rotations.windows(2) {
            let (current, next) = (pair[0], pair[1]);

            let at_risk_codes: Vec<String> = expiring_codes
                .iter()
                .filter(|code| {
                    live.get(**code)
                        .and_then(|r| r.expiration())
                        .is_some_and(|exp| current.disembark < exp && exp < next.embark)
                })
                .map(|code| code.to_string())
                .collect();

            if at_risk_codes.is_empty() {
                continue;
            }

            let key = (employee_id, current.program_id);
            if index.contains_key(&key) {
                tracing::debug!(
                    employee_id,
                    program_id = current.program_id,
                    "Duplicate assignment to program, keeping earliest turnaround"
                );
                continue;
            }

            index.insert(
                key,
                TurnaroundRisk {
                    employee_id,
                    current_program_id: current.program_id,
                    next_program_id: next.program_id,
                    current_disembark: current.disembark,
                    next_embark: next.embark,
                    at_risk_codes,
                },
            );
        }
    }

    index
}

/// Normalize and group assignments, each group sorted by embark date. Ties
/// keep input order.
fn rotations_by_employee(assignments: &[Assignment]) -> HashMap<DbId, Vec<Rotation>> {
    let mut grouped: HashMap<DbId, Vec<Rotation>> = HashMap::new();

    for a in assignments {
        let (Some(embark), Some(disembark)) =
            (a.embark_date.normalize(), a.disembark_date.normalize())
        else {
            tracing::warn!(
                employee_id = a.employee_id,
                program_id = a.program_id,
                "Skipping assignment with unreadable embark/disembark date"
            );
            continue;
        };

        grouped.entry(a.employee_id).or_default().push(Rotation {
            program_id: a.program_id,
            embark,
            disembark,
        });
    }

    for rotations in grouped.values_mut() {
        rotations.sort_by_key(|r| r.embark);
    }
    grouped
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
