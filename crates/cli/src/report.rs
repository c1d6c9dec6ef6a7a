//! Roster report: every program's KPIs plus per-member detail.

use chrono::NaiveDate;
use serde::Serialize;

use crewready_core::catalog::RequiredDocumentSet;
use crewready_core::config::ComplianceConfig;
use crewready_core::context::EvaluationContext;
use crewready_core::kpi::{evaluate_crew, tally_program_kpis, CrewLocation, ProgramKpis};
use crewready_core::readiness::{summarize_readiness, ReadinessSummary, ReadinessVerdict};
use crewready_core::turnaround::{build_turnaround_risk_index, TurnaroundRisk};
use crewready_core::types::DbId;
use crewready_core::window::DeploymentWindow;

use crate::ingest::Snapshot;

#[derive(Debug, Clone, Serialize)]
pub struct RosterReport {
    pub today: NaiveDate,
    pub expiring_horizon_days: i64,
    pub required_codes: Vec<String>,
    /// Verdict counts across every program member (an employee on two
    /// programs is counted once per program).
    pub summary: ReadinessSummary,
    pub turnaround_risks: usize,
    pub skipped_rows: usize,
    pub programs: Vec<ProgramReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramReport {
    pub id: DbId,
    pub name: String,
    pub window: Option<DeploymentWindow>,
    pub kpis: ProgramKpis,
    pub members: Vec<MemberReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberReport {
    #[serde(flatten)]
    pub verdict: ReadinessVerdict,
    pub location: CrewLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turnaround: Option<TurnaroundRisk>,
}

/// Pick the required set: explicit override, then the snapshot's own, then
/// the built-in default.
pub fn resolve_required(
    override_codes: Option<&RequiredDocumentSet>,
    snapshot: &Snapshot,
) -> RequiredDocumentSet {
    override_codes
        .or(snapshot.required.as_ref())
        .cloned()
        .unwrap_or_else(RequiredDocumentSet::offshore_default)
}

/// Run the engine over a loaded snapshot.
pub fn build_report(
    snapshot: &Snapshot,
    required: &RequiredDocumentSet,
    today: NaiveDate,
    config: ComplianceConfig,
) -> RosterReport {
    let ctx = EvaluationContext::new(&snapshot.catalog, required, today).with_config(config);

    let risk_index =
        build_turnaround_risk_index(&ctx, &snapshot.assignments, &snapshot.documents);

    let mut all_verdicts = Vec::new();
    let programs: Vec<ProgramReport> = snapshot
        .programs
        .iter()
        .map(|program| {
            let verdicts = evaluate_crew(&ctx, program, &snapshot.documents);
            let kpis = tally_program_kpis(program, &verdicts, &risk_index);
            tracing::info!(
                program_id = program.id,
                total = kpis.total,
                apto = kpis.apto,
                atencao = kpis.atencao,
                nao_apto = kpis.nao_apto,
                turnaround = kpis.turnaround_risk,
                "Program evaluated"
            );

            all_verdicts.extend(verdicts.iter().cloned());

            let members = program
                .crew
                .iter()
                .zip(verdicts)
                .map(|(member, verdict)| MemberReport {
                    verdict,
                    location: CrewLocation::from_str_lossy(member.location.as_deref()),
                    turnaround: risk_index.get(&(member.employee_id, program.id)).cloned(),
                })
                .collect();

            ProgramReport {
                id: program.id,
                name: program.name.clone(),
                window: program.window,
                kpis,
                members,
            }
        })
        .collect();

    RosterReport {
        today,
        expiring_horizon_days: config.expiring_horizon_days,
        required_codes: required.iter().map(str::to_string).collect(),
        summary: summarize_readiness(&all_verdicts),
        turnaround_risks: risk_index.len(),
        skipped_rows: snapshot.skipped_rows,
        programs,
    }
}
