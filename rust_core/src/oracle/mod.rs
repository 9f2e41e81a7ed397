//! Win Probability Oracle
//!
//! Defines the `WinProbabilityOracle` trait the simulator depends on, and an
//! ensemble implementation built from pluggable rating models.
//!
//! The ensemble is a list of (weight, model) pairs. A model that was not
//! trained is simply not registered; nothing downstream branches on presence.

use crate::error::{ConfigError, OracleError};
use crate::ratings::RatingSnapshot;
use crate::types::GameContext;

// Concrete model implementations
pub mod config;
pub mod elo;
pub mod log5;
pub mod margin;
pub mod quarterback;

pub use config::EnsembleConfig;
pub use elo::EloModel;
pub use log5::Log5Model;
pub use margin::MarginRatingModel;
pub use quarterback::QuarterbackEloModel;

/// Elo-scale logistic: probability for a side that is `diff` points stronger.
#[inline]
pub fn elo_probability(diff: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf(-diff / 400.0))
}

/// Two teams and the context of their game.
///
/// `home` is the designated host; at a neutral site it is simply the first team.
#[derive(Debug, Clone, Copy)]
pub struct Matchup<'a> {
    pub home: &'a str,
    pub away: &'a str,
    pub context: &'a GameContext,
}

impl<'a> Matchup<'a> {
    pub fn new(home: &'a str, away: &'a str, context: &'a GameContext) -> Self {
        Self { home, away, context }
    }
}

/// Pointwise win-probability function.
///
/// Must be pure: same matchup and ratings, same answer. Implementations are
/// shared across worker threads.
pub trait WinProbabilityOracle: Send + Sync {
    /// Probability that `matchup.home` beats `matchup.away`.
    fn win_probability(
        &self,
        matchup: &Matchup<'_>,
        ratings: &RatingSnapshot,
    ) -> Result<f64, OracleError>;
}

/// One member of the ensemble.
pub trait RatingModel: Send + Sync {
    /// Probability that the home (first) team wins. Must be total.
    fn home_win_probability(&self, matchup: &Matchup<'_>, ratings: &RatingSnapshot) -> f64;

    /// Model name for logging and debugging
    fn model_name(&self) -> &str;
}

struct WeightedModel {
    weight: f64,
    model: Box<dyn RatingModel>,
}

/// Weighted average of registered rating models.
#[derive(Default)]
pub struct EnsembleOracle {
    models: Vec<WeightedModel>,
    total_weight: f64,
}

impl EnsembleOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model. Zero-weight models are dropped.
    pub fn register(&mut self, weight: f64, model: Box<dyn RatingModel>) -> Result<(), ConfigError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ConfigError::InvalidWeight {
                model: model.model_name().to_string(),
                weight,
            });
        }
        if weight == 0.0 {
            return Ok(());
        }
        self.total_weight += weight;
        self.models.push(WeightedModel { weight, model });
        Ok(())
    }

    /// Builder-style `register`.
    pub fn with_model(mut self, weight: f64, model: impl RatingModel + 'static) -> Result<Self, ConfigError> {
        self.register(weight, Box::new(model))?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.model.model_name()).collect()
    }

    /// Fails when nothing with positive weight was registered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() || self.total_weight <= 0.0 {
            return Err(ConfigError::NoModels);
        }
        Ok(())
    }
}

impl WinProbabilityOracle for EnsembleOracle {
    fn win_probability(
        &self,
        matchup: &Matchup<'_>,
        ratings: &RatingSnapshot,
    ) -> Result<f64, OracleError> {
        if self.total_weight <= 0.0 {
            return Err(OracleError::Model {
                model: "ensemble".to_string(),
                reason: "no models registered".to_string(),
            });
        }

        let mut total = 0.0;
        for member in &self.models {
            let p = member.model.home_win_probability(matchup, ratings);
            if !p.is_finite() {
                return Err(OracleError::Model {
                    model: member.model.model_name().to_string(),
                    reason: format!("non-finite probability {}", p),
                });
            }
            total += member.weight * p;
        }
        check_probability(total / self.total_weight)
    }
}

/// Reject values that cannot be used as a Bernoulli parameter.
pub fn check_probability(p: f64) -> Result<f64, OracleError> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(OracleError::InvalidProbability { value: p })
    }
}
