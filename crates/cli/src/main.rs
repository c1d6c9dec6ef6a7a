use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crewready_cli::config::CliConfig;
use crewready_cli::ingest::load_snapshot;
use crewready_cli::report::{build_report, resolve_required};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let mut config = CliConfig::from_env().context("Invalid configuration")?;
    if let Some(path) = std::env::args().nth(1) {
        config.snapshot_path = path.into();
    }

    // --- Tracing (stderr, so stdout carries only the report) ---
    let (json_layer, text_layer) = if config.log_json {
        (
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
            None,
        )
    } else {
        (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crewready_cli=info,crewready_core=warn".into()),
        )
        .with(json_layer)
        .with(text_layer)
        .init();

    let today = config
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    tracing::info!(
        snapshot = %config.snapshot_path.display(),
        %today,
        horizon_days = config.compliance.expiring_horizon_days,
        "Loaded configuration"
    );

    // --- Snapshot ---
    let snapshot = load_snapshot(&config.snapshot_path)
        .with_context(|| format!("Failed to load {}", config.snapshot_path.display()))?;
    let required = resolve_required(config.required_codes.as_ref(), &snapshot);

    // --- Evaluation ---
    let report = build_report(&snapshot, &required, today, config.compliance);
    tracing::info!(
        programs = report.programs.len(),
        turnaround_risks = report.turnaround_risks,
        "Roster evaluated"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
