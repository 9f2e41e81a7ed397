//! Run configuration for the season simulator.

use crate::error::ConfigError;
use crate::ratings::DEFAULT_K_FACTOR;
use serde::{Deserialize, Serialize};

/// Trials per parallel work unit.
pub const DEFAULT_BATCH_SIZE: usize = 250;

fn default_k_factor() -> f64 {
    DEFAULT_K_FACTOR
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub number_of_trials: u64,
    /// Games in this week or later are simulated even if already final.
    #[serde(default)]
    pub start_week: Option<i32>,
    /// Fixed seed for reproducible runs; drawn from the OS when absent.
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default = "default_k_factor")]
    pub rating_k_factor: f64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Dedicated worker pool size; the global rayon pool when absent.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl SimulationConfig {
    pub fn new(number_of_trials: u64) -> Self {
        Self {
            number_of_trials,
            start_week: None,
            random_seed: None,
            rating_k_factor: DEFAULT_K_FACTOR,
            batch_size: DEFAULT_BATCH_SIZE,
            threads: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_start_week(mut self, week: i32) -> Self {
        self.start_week = Some(week);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.number_of_trials == 0 {
            return Err(ConfigError::NoTrials);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if !self.rating_k_factor.is_finite() || self.rating_k_factor < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "rating_k_factor".to_string(),
                value: self.rating_k_factor.to_string(),
            });
        }
        if self.threads == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "threads".to_string(),
                value: "0".to_string(),
            });
        }
        if let Some(week) = self.start_week.filter(|w| *w < 0) {
            return Err(ConfigError::InvalidValue {
                key: "start_week".to_string(),
                value: week.to_string(),
            });
        }
        Ok(())
    }
}
