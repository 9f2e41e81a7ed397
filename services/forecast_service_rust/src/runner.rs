//! Load inputs, run the simulation and write the report.

use crate::config::ServiceConfig;
use anyhow::{Context, Result};
use gridiron_rust_core::{
    EnsembleConfig, EnsembleOracle, ForecastReport, LeagueData, RatingSnapshot, SeasonSimulator,
};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Build the oracle from the ensemble file, or plain Elo when none is given.
pub fn load_oracle(models_path: Option<&str>) -> Result<(EnsembleOracle, RatingSnapshot)> {
    let ensemble = match models_path {
        Some(path) => EnsembleConfig::load(path)
            .with_context(|| format!("Failed to load ensemble definition from {}", path))?,
        None => EnsembleConfig::default(),
    };
    let (oracle, ratings) = ensemble.build().context("Invalid ensemble definition")?;
    info!(
        "Oracle ready: models [{}], {} rated teams",
        oracle.model_names().join(", "),
        ratings.len()
    );
    Ok((oracle, ratings))
}

/// Run a full forecast for the configured inputs.
pub fn run(config: &ServiceConfig) -> Result<ForecastReport> {
    let data = LeagueData::load(&config.teams_path, &config.schedule_path)
        .context("Failed to load league data")?;
    let (oracle, ratings) = load_oracle(config.models_path.as_deref())?;

    // Log roughly every tenth of the run
    let step = (config.simulation.number_of_trials / 10).max(1);
    let last_logged = AtomicU64::new(0);

    let simulator = SeasonSimulator::new(&data, &oracle, &ratings, config.simulation.clone())
        .context("Invalid simulation configuration")?
        .with_progress(|done, total| {
            let bucket = done / step;
            if last_logged.fetch_max(bucket, Ordering::Relaxed) < bucket {
                info!("Progress: {}/{} trials", done, total);
            }
        });

    let outcome = simulator.run().context("Simulation aborted")?;
    Ok(outcome.report(&data))
}

/// Pretty JSON to `output_path`, or stdout.
pub fn write_report(report: &ForecastReport, output_path: Option<&str>) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    match output_path {
        Some(path) => {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(path, json).with_context(|| format!("Failed to write report to {}", path))?;
            info!("Report written to {}", path);
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json).context("Failed to write report to stdout")?;
        }
    }
    Ok(())
}
