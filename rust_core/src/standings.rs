//! Win/loss/tie bookkeeping.
//!
//! One base `Standings` is built from decided games; each trial works on its own clone.

use crate::types::{Game, GameOutcome};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Win percentage reported for a team with no games.
pub const NEUTRAL_WIN_PCT: f64 = 0.0;

/// Record for a single team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl TeamRecord {
    pub fn games_played(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// (wins + 0.5 * ties) / games, or the neutral default with no games.
    pub fn win_pct(&self) -> f64 {
        let games = self.games_played();
        if games == 0 {
            return NEUTRAL_WIN_PCT;
        }
        (self.wins as f64 + 0.5 * self.ties as f64) / games as f64
    }
}

/// Per-team records. Cloning yields a fully independent copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Standings {
    records: FxHashMap<String, TeamRecord>,
}

impl Standings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero records for every listed team.
    pub fn with_teams<'a>(teams: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            records: teams
                .into_iter()
                .map(|t| (t.to_string(), TeamRecord::default()))
                .collect(),
        }
    }

    /// Build the base standings from decided games. Games without a score are skipped.
    pub fn initialize_from_completed<'a>(
        teams: impl IntoIterator<Item = &'a str>,
        games: impl IntoIterator<Item = &'a Game>,
    ) -> Self {
        let mut standings = Self::with_teams(teams);
        for game in games {
            if let Some(outcome) = game.outcome() {
                standings.apply(&game.home_team, &game.away_team, outcome);
            }
        }
        standings
    }

    /// Apply one game result.
    pub fn apply(&mut self, home: &str, away: &str, outcome: GameOutcome) {
        match outcome {
            GameOutcome::HomeWin => {
                self.entry(home).wins += 1;
                self.entry(away).losses += 1;
            }
            GameOutcome::AwayWin => {
                self.entry(away).wins += 1;
                self.entry(home).losses += 1;
            }
            GameOutcome::Tie => {
                self.entry(home).ties += 1;
                self.entry(away).ties += 1;
            }
        }
    }

    fn entry(&mut self, team: &str) -> &mut TeamRecord {
        self.records.entry(team.to_string()).or_default()
    }

    /// Record for a team; unseen teams get an empty record.
    pub fn record(&self, team: &str) -> TeamRecord {
        self.records.get(team).copied().unwrap_or_default()
    }

    pub fn win_pct(&self, team: &str) -> f64 {
        self.record(team).win_pct()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total games counted across all teams (each game counts twice).
    pub fn total_team_games(&self) -> u32 {
        self.records.values().map(|r| r.games_played()).sum()
    }
}
