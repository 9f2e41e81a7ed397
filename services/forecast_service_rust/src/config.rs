//! Service configuration loaded from environment variables.

use gridiron_rust_core::config::DEFAULT_BATCH_SIZE;
use gridiron_rust_core::ratings::DEFAULT_K_FACTOR;
use gridiron_rust_core::{ConfigError, SimulationConfig};
use std::env;
use std::str::FromStr;
use tracing::info;

pub const DEFAULT_TEAMS_PATH: &str = "data/teams.json";
pub const DEFAULT_SCHEDULE_PATH: &str = "data/schedule.json";
pub const DEFAULT_NUM_SIMULATIONS: u64 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub teams_path: String,
    pub schedule_path: String,
    /// Ensemble definition; Elo at base ratings when unset
    pub models_path: Option<String>,
    /// Report destination; stdout when unset
    pub output_path: Option<String>,
    pub simulation: SimulationConfig,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let simulation = SimulationConfig {
            number_of_trials: parse(&get, "NUM_SIMULATIONS")?.unwrap_or(DEFAULT_NUM_SIMULATIONS),
            start_week: parse(&get, "START_WEEK")?,
            random_seed: parse(&get, "RANDOM_SEED")?,
            rating_k_factor: parse(&get, "RATING_K_FACTOR")?.unwrap_or(DEFAULT_K_FACTOR),
            batch_size: parse(&get, "SIM_BATCH_SIZE")?.unwrap_or(DEFAULT_BATCH_SIZE),
            threads: parse(&get, "SIM_THREADS")?,
        };
        simulation.validate()?;

        Ok(Self {
            teams_path: get("TEAMS_PATH").unwrap_or_else(|| DEFAULT_TEAMS_PATH.to_string()),
            schedule_path: get("SCHEDULE_PATH").unwrap_or_else(|| DEFAULT_SCHEDULE_PATH.to_string()),
            models_path: get("MODELS_PATH"),
            output_path: get("OUTPUT_PATH"),
            simulation,
        })
    }

    /// Log current configuration (useful at startup)
    pub fn log_config(&self) {
        info!("ServiceConfig loaded:");
        info!("  teams: {}", self.teams_path);
        info!("  schedule: {}", self.schedule_path);
        info!("  models: {}", self.models_path.as_deref().unwrap_or("<default elo>"));
        info!("  output: {}", self.output_path.as_deref().unwrap_or("<stdout>"));
        info!("  trials: {}", self.simulation.number_of_trials);
        info!("  start_week: {:?}", self.simulation.start_week);
        info!("  random_seed: {:?}", self.simulation.random_seed);
        info!("  threads: {:?}", self.simulation.threads);
    }
}

fn parse<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match get(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
    }
}
