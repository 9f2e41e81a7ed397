//! Error types for loading, configuring and running simulations.
//!
//! Data and configuration problems are reported before the trial loop starts.
//! Inside the loop the only fatal condition is an oracle failure.

use crate::aggregate::ForecastAggregator;
use crate::bracket::PlayoffRound;
use crate::types::GameContext;
use std::fmt;
use thiserror::Error;

/// Malformed or incomplete schedule/team records.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("team record #{index} has an empty identifier")]
    EmptyTeamId { index: usize },

    #[error("team {team} is listed more than once")]
    DuplicateTeam { team: String },

    #[error("team {team} has no {field}")]
    MissingMembership { team: String, field: &'static str },

    #[error("team {team} belongs to undeclared conference {conference}")]
    UndeclaredConference { team: String, conference: String },

    #[error("game {game} references unknown team {team}{}", suggestion_suffix(.suggestion))]
    UnknownTeam {
        game: String,
        team: String,
        suggestion: Option<String>,
    },

    #[error("game {game} has negative week {week}")]
    NegativeWeek { game: String, week: i32 },

    #[error("game {game} schedules {team} against itself")]
    SelfMatchup { game: String, team: String },

    #[error("game {game} is final but has no score")]
    MissingScore { game: String },

    #[error("failed to parse {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean {}?)", s),
        None => String::new(),
    }
}

/// Invalid run or league configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("number_of_trials must be positive")]
    NoTrials,

    #[error("batch_size must be positive")]
    ZeroBatchSize,

    #[error("conference {0} has no teams")]
    EmptyConference(String),

    #[error("league must have exactly two conferences, found {0}")]
    ConferenceCount(usize),

    #[error("model {model} has invalid weight {weight}")]
    InvalidWeight { model: String, weight: f64 },

    #[error("ensemble has no model with positive weight")]
    NoModels,

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

/// Failure inside the win-probability oracle.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("probability {value} is outside [0, 1]")]
    InvalidProbability { value: f64 },

    #[error("model {model} failed: {reason}")]
    Model { model: String, reason: String },
}

/// Where in a trial an oracle call happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationStage {
    RegularSeason { week: i32 },
    Playoffs { round: PlayoffRound },
}

impl fmt::Display for SimulationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationStage::RegularSeason { week } => write!(f, "week {}", week),
            SimulationStage::Playoffs { round } => write!(f, "{}", round),
        }
    }
}

/// The matchup that made the oracle fail, surfaced in the failure report.
#[derive(Debug, Clone)]
pub struct FailedMatchup {
    pub trial: u64,
    pub stage: SimulationStage,
    pub home: String,
    pub away: String,
    pub context: GameContext,
    pub source: OracleError,
}

impl fmt::Display for FailedMatchup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trial {} ({}): {} vs {} (neutral: {}, rest {}/{}): {}",
            self.trial,
            self.stage,
            self.home,
            self.away,
            self.context.neutral_site,
            self.context.home_rest_days,
            self.context.away_rest_days,
            self.source
        )
    }
}

/// Top-level error for a simulation run.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The run aborted. `partial` holds only trials that completed before the failure.
    #[error("oracle failed in {failure}")]
    Oracle {
        failure: Box<FailedMatchup>,
        partial: Box<ForecastAggregator>,
    },
}

impl SimulationError {
    /// Partial aggregate for an aborted run, if any.
    pub fn partial(&self) -> Option<&ForecastAggregator> {
        match self {
            SimulationError::Oracle { partial, .. } => Some(partial),
            _ => None,
        }
    }
}
