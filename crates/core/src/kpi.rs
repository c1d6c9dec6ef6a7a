//! Program-level roster KPIs.
//!
//! Rolls up readiness verdicts and turnaround flags for every member of one
//! deployment program. Pure tally; the only branching is the location bucket.

use serde::{Deserialize, Serialize};

use crate::context::EvaluationContext;
use crate::documents::DocumentsByEmployee;
use crate::readiness::{compute_readiness, ReadinessLevel, ReadinessVerdict};
use crate::turnaround::TurnaroundRiskIndex;
use crate::types::DbId;
use crate::window::DeploymentWindow;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const LOCATION_BASE: &str = "base";
pub const LOCATION_HOSPEDADO: &str = "hospedado";
pub const LOCATION_EMBARCADO: &str = "embarcado";

/// All valid location bucket strings.
pub const VALID_LOCATIONS: &[&str] = &[LOCATION_BASE, LOCATION_HOSPEDADO, LOCATION_EMBARCADO];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where a crew member physically is right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrewLocation {
    /// On shore at the base. Also the bucket for anything unrecognized.
    #[default]
    Base,
    /// In a hotel awaiting transfer.
    Hospedado,
    /// On board.
    Embarcado,
}

impl CrewLocation {
    /// Map a free-form location value to a bucket. Case and surrounding
    /// whitespace are ignored; unknown or absent values fall back to `Base`.
    pub fn from_str_lossy(s: Option<&str>) -> Self {
        match s.map(|v| v.trim().to_lowercase()).as_deref() {
            Some(LOCATION_HOSPEDADO) => Self::Hospedado,
            Some(LOCATION_EMBARCADO) => Self::Embarcado,
            _ => Self::Base,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => LOCATION_BASE,
            Self::Hospedado => LOCATION_HOSPEDADO,
            Self::Embarcado => LOCATION_EMBARCADO,
        }
    }
}

/// One assigned crew member of a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewMember {
    pub employee_id: DbId,
    /// Raw location value as stored; bucketed with [`CrewLocation::from_str_lossy`].
    #[serde(default)]
    pub location: Option<String>,
}

/// A named rotation with its assigned crew.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: DbId,
    pub name: String,
    /// `None` when the program's dates could not be read.
    pub window: Option<DeploymentWindow>,
    pub crew: Vec<CrewMember>,
}

/// Program-level counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramKpis {
    pub program_id: DbId,
    pub total: usize,
    pub apto: usize,
    pub atencao: usize,
    pub nao_apto: usize,
    pub evidence_pending: usize,
    /// Members with at least one document lapsing inside the program window.
    pub expiring_during_window: usize,
    pub base: usize,
    pub hospedado: usize,
    pub embarcado: usize,
    /// Members present in the turnaround index for this program.
    pub turnaround_risk: usize,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Evaluate every crew member against the program window, then tally.
pub fn compute_program_kpis(
    ctx: &EvaluationContext<'_>,
    program: &Program,
    documents_by_employee: &DocumentsByEmployee,
    risk_index: &TurnaroundRiskIndex,
) -> ProgramKpis {
    let verdicts = evaluate_crew(ctx, program, documents_by_employee);
    tally_program_kpis(program, &verdicts, risk_index)
}

/// Readiness verdict for every crew member, in crew order.
pub fn evaluate_crew(
    ctx: &EvaluationContext<'_>,
    program: &Program,
    documents_by_employee: &DocumentsByEmployee,
) -> Vec<ReadinessVerdict> {
    program
        .crew
        .iter()
        .map(|m| {
            compute_readiness(
                ctx,
                m.employee_id,
                documents_by_employee,
                program.window.as_ref(),
            )
        })
        .collect()
}

/// Tally precomputed verdicts. `verdicts` must be in crew order.
pub fn tally_program_kpis(
    program: &Program,
    verdicts: &[ReadinessVerdict],
    risk_index: &TurnaroundRiskIndex,
) -> ProgramKpis {
    let mut kpis = ProgramKpis {
        program_id: program.id,
        total: program.crew.len(),
        ..ProgramKpis::default()
    };

    for verdict in verdicts {
        match verdict.level {
            ReadinessLevel::Apto => kpis.apto += 1,
            ReadinessLevel::Atencao => kpis.atencao += 1,
            ReadinessLevel::NaoApto => kpis.nao_apto += 1,
        }
        if verdict.evidence_pending {
            kpis.evidence_pending += 1;
        }
        if !verdict.expiring_during_window.is_empty() {
            kpis.expiring_during_window += 1;
        }
    }

    for member in &program.crew {
        match CrewLocation::from_str_lossy(member.location.as_deref()) {
            CrewLocation::Base => kpis.base += 1,
            CrewLocation::Hospedado => kpis.hospedado += 1,
            CrewLocation::Embarcado => kpis.embarcado += 1,
        }
        if risk_index.contains_key(&(member.employee_id, program.id)) {
            kpis.turnaround_risk += 1;
        }
    }

    kpis
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
