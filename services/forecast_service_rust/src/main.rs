use anyhow::{Context, Result};
use dotenv::dotenv;
use forecast_service_rust::{run, write_report, ServiceConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Forecast Service...");

    let config = ServiceConfig::from_env().context("Invalid service configuration")?;
    config.log_config();

    let report = run(&config)?;
    info!(
        "Run {} finished: {}/{} trials ({:?})",
        report.run_id, report.trials_completed, report.trials_requested, report.status
    );

    write_report(&report, config.output_path.as_deref())
}
