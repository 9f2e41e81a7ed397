//! Gridiron Core - Season and playoff outcome simulation.
//!
//! This module provides:
//! - Standings bookkeeping from completed and simulated games
//! - Playoff seeding (division leaders first, then wild cards)
//! - A seven-seed conference bracket with reseeding and a neutral-site final
//! - A pluggable win-probability oracle (weighted ensemble of rating models)
//! - Parallel, reproducible Monte Carlo trials via rayon
//! - Aggregation into per-team playoff, division, conference and title odds

pub mod aggregate;
pub mod bracket;
pub mod config;
pub mod data;
pub mod error;
pub mod league_config;
pub mod oracle;
pub mod ratings;
pub mod season;
pub mod seeding;
pub mod standings;
pub mod types;

pub use aggregate::{ForecastAggregator, ForecastReport, RunStatus, TeamForecast, TrialOutcome};
pub use bracket::{BracketResult, BracketSimulator, PlayoffRound};
pub use config::SimulationConfig;
pub use data::LeagueData;
pub use error::{ConfigError, DataError, FailedMatchup, OracleError, SimulationError};
pub use league_config::{LeagueStructure, PlayoffFormat, NFL_PLAYOFF_FORMAT};
pub use oracle::{EnsembleConfig, EnsembleOracle, Log5Model, Matchup, RatingModel, WinProbabilityOracle};
pub use ratings::RatingSnapshot;
pub use season::{CancelFlag, RunOutcome, SeasonSimulator};
pub use seeding::{SeedAssignment, SeedingResolver};
pub use standings::{Standings, TeamRecord};
pub use types::{Game, GameContext, GameOutcome, GameStatus, Team, TeamId};
