//! Declarative ensemble definition.
//!
//! Ratings are trained elsewhere; this file format only carries the trained
//! values and the weight each model gets.

use super::{EloModel, EnsembleOracle, Log5Model, MarginRatingModel, QuarterbackEloModel};
use crate::error::{ConfigError, DataError};
use crate::oracle::elo::ELO_HOME_ADVANTAGE;
use crate::oracle::log5::{pythagorean_win_pct, LOG5_HOME_ODDS_MULTIPLIER, PYTHAGOREAN_EXPONENT};
use crate::oracle::margin::MARGIN_HOME_ADVANTAGE_POINTS;
use crate::oracle::quarterback::{QB_BASE_RATING, QB_HOME_ADVANTAGE};
use crate::ratings::{RatingSnapshot, DEFAULT_BASE_RATING};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs;

fn default_weight() -> f64 {
    1.0
}

fn default_base_rating() -> f64 {
    DEFAULT_BASE_RATING
}

fn default_elo_hfa() -> f64 {
    ELO_HOME_ADVANTAGE
}

fn default_qb_base() -> f64 {
    QB_BASE_RATING
}

fn default_qb_hfa() -> f64 {
    QB_HOME_ADVANTAGE
}

fn default_margin_hfa() -> f64 {
    MARGIN_HOME_ADVANTAGE_POINTS
}

fn default_log5_hfa() -> f64 {
    LOG5_HOME_ODDS_MULTIPLIER
}

fn default_exponent() -> f64 {
    PYTHAGOREAN_EXPONENT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EloConfig {
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_base_rating")]
    pub base_rating: f64,
    #[serde(default = "default_elo_hfa")]
    pub home_advantage: f64,
    #[serde(default)]
    pub rest_bonus_per_day: f64,
    /// Team -> trained rating at the simulation start
    #[serde(default)]
    pub ratings: FxHashMap<String, f64>,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            weight: default_weight(),
            base_rating: DEFAULT_BASE_RATING,
            home_advantage: ELO_HOME_ADVANTAGE,
            rest_bonus_per_day: 0.0,
            ratings: FxHashMap::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterbackConfig {
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_qb_base")]
    pub base_rating: f64,
    #[serde(default = "default_qb_hfa")]
    pub home_advantage: f64,
    /// Quarterback name -> rating
    #[serde(default)]
    pub ratings: FxHashMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginModelConfig {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_margin_hfa")]
    pub home_advantage_points: f64,
    /// Team -> rating in points above league average
    #[serde(default)]
    pub ratings: FxHashMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log5ModelConfig {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_log5_hfa")]
    pub home_odds_multiplier: f64,
    /// Team -> expected winning percentage
    #[serde(default)]
    pub win_pcts: FxHashMap<String, f64>,
    /// Team -> [points for, points against]; converted with Pythagorean expectation
    #[serde(default)]
    pub points: FxHashMap<String, [f64; 2]>,
    #[serde(default = "default_exponent")]
    pub exponent: f64,
}

impl Log5ModelConfig {
    /// Explicit percentages override ones derived from points.
    fn win_pcts(&self) -> FxHashMap<String, f64> {
        let mut pcts: FxHashMap<String, f64> = self
            .points
            .iter()
            .map(|(team, [pf, pa])| (team.clone(), pythagorean_win_pct(*pf, *pa, self.exponent)))
            .collect();
        pcts.extend(self.win_pcts.iter().map(|(k, v)| (k.clone(), *v)));
        pcts
    }
}

/// Full ensemble description. Omitted models are not registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    #[serde(default)]
    pub elo: Option<EloConfig>,
    #[serde(default)]
    pub quarterback: Option<QuarterbackConfig>,
    #[serde(default)]
    pub margin_models: Vec<MarginModelConfig>,
    #[serde(default)]
    pub log5_models: Vec<Log5ModelConfig>,
}

impl Default for EnsembleConfig {
    /// Elo only, every team at the base rating.
    fn default() -> Self {
        Self {
            elo: Some(EloConfig::default()),
            quarterback: None,
            margin_models: Vec::new(),
            log5_models: Vec::new(),
        }
    }
}

impl EnsembleConfig {
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        serde_json::from_str(json).map_err(|source| DataError::Json {
            what: "ensemble definition",
            source,
        })
    }

    pub fn load(path: &str) -> Result<Self, DataError> {
        let content = fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Build the oracle and the base rating snapshot every trial clones.
    pub fn build(&self) -> Result<(EnsembleOracle, RatingSnapshot), ConfigError> {
        let mut oracle = EnsembleOracle::new();
        let mut snapshot = RatingSnapshot::default();

        if let Some(elo) = &self.elo {
            oracle.register(
                elo.weight,
                Box::new(EloModel::new(elo.home_advantage, elo.rest_bonus_per_day)),
            )?;
            snapshot = RatingSnapshot::from_ratings(
                elo.base_rating,
                elo.ratings.iter().map(|(k, v)| (k.clone(), *v)),
            );
        }

        if let Some(qb) = &self.quarterback {
            let mut model = QuarterbackEloModel::new(qb.ratings.clone());
            model.base_rating = qb.base_rating;
            model.home_advantage = qb.home_advantage;
            oracle.register(qb.weight, Box::new(model))?;
        }

        for margin in &self.margin_models {
            let mut model = MarginRatingModel::new(&margin.name, margin.ratings.clone());
            model.home_advantage_points = margin.home_advantage_points;
            oracle.register(margin.weight, Box::new(model))?;
        }

        for log5 in &self.log5_models {
            let mut model = Log5Model::new(&log5.name, log5.win_pcts());
            model.home_odds_multiplier = log5.home_odds_multiplier;
            oracle.register(log5.weight, Box::new(model))?;
        }

        oracle.validate()?;
        Ok((oracle, snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{Matchup, WinProbabilityOracle};
    use crate::types::GameContext;

    #[test]
    fn test_default_is_elo_only() {
        let (oracle, snapshot) = EnsembleConfig::default().build().unwrap();
        assert_eq!(oracle.model_names(), vec!["elo"]);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.base_rating(), DEFAULT_BASE_RATING);
    }

    #[test]
    fn test_parse_full_ensemble() {
        let json = r#"{
            "elo": { "weight": 0.4, "ratings": { "KC": 1650.0, "LV": 1420.0 } },
            "quarterback": { "weight": 0.2, "ratings": { "P.Mahomes": 1620.0 } },
            "margin_models": [
                { "name": "power", "weight": 0.2, "ratings": { "KC": 5.5 } },
                { "name": "form", "weight": 0.2, "ratings": { "KC": 3.0 } },
                { "name": "srs", "weight": 0.0 }
            ]
        }"#;
        let config = EnsembleConfig::from_json(json).unwrap();
        let (oracle, snapshot) = config.build().unwrap();

        assert_eq!(oracle.model_names(), vec!["elo", "quarterback", "power", "form"]);
        assert_eq!(snapshot.get("KC"), 1650.0);

        let ctx = GameContext::default();
        let p = oracle
            .win_probability(&Matchup::new("KC", "LV", &ctx), &snapshot)
            .unwrap();
        assert!(p > 0.7 && p < 1.0, "KC should be a clear home favorite: {:.3}", p);
    }

    #[test]
    fn test_all_zero_weights_rejected() {
        let config = EnsembleConfig {
            elo: Some(EloConfig {
                weight: 0.0,
                ..EloConfig::default()
            }),
            quarterback: None,
            margin_models: Vec::new(),
            log5_models: Vec::new(),
        };
        assert!(matches!(config.build(), Err(ConfigError::NoModels)));
    }

    #[test]
    fn test_log5_member_from_points() {
        let json = r#"{
            "log5_models": [
                { "name": "pythagorean", "points": { "SF": [420.0, 280.0], "ARI": [280.0, 420.0] } }
            ]
        }"#;
        let config = EnsembleConfig::from_json(json).unwrap();
        assert!(config.elo.is_none());
        assert_eq!(config.log5_models[0].home_odds_multiplier, LOG5_HOME_ODDS_MULTIPLIER);

        let (oracle, _) = config.build().unwrap();
        assert_eq!(oracle.model_names(), vec!["pythagorean"]);

        let ctx = GameContext::neutral(None, None);
        let p = oracle
            .win_probability(&Matchup::new("SF", "ARI", &ctx), &RatingSnapshot::default())
            .unwrap();
        assert!(p > 0.8, "better point differential should be a heavy favorite: {:.3}", p);
    }

    #[test]
    fn test_malformed_json_is_data_error() {
        assert!(matches!(
            EnsembleConfig::from_json("{ not json"),
            Err(DataError::Json { .. })
        ));
    }
}
