//! Trial-local team rating snapshot.
//!
//! The caller provides one immutable base snapshot (trained ratings at the
//! simulation start). Every trial clones it and updates only its own copy, in
//! week order, so later games in the same trial see earlier simulated results.

use crate::types::GameOutcome;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Rating assumed for teams with no trained rating.
pub const DEFAULT_BASE_RATING: f64 = 1500.0;

/// Default in-trial update constant (Elo points).
pub const DEFAULT_K_FACTOR: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSnapshot {
    base_rating: f64,
    ratings: FxHashMap<String, f64>,
}

impl Default for RatingSnapshot {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_RATING)
    }
}

impl RatingSnapshot {
    pub fn new(base_rating: f64) -> Self {
        Self {
            base_rating,
            ratings: FxHashMap::default(),
        }
    }

    pub fn from_ratings<I, K>(base_rating: f64, ratings: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            base_rating,
            ratings: ratings.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn base_rating(&self) -> f64 {
        self.base_rating
    }

    /// Rating for a team; unseen teams get the base rating.
    pub fn get(&self, team: &str) -> f64 {
        self.ratings.get(team).copied().unwrap_or(self.base_rating)
    }

    pub fn set(&mut self, team: &str, rating: f64) {
        self.ratings.insert(team.to_string(), rating);
    }

    /// Bounded incremental update after a simulated game.
    ///
    /// The shift is `k * (actual - expected)` where `expected` is the home win
    /// probability the game was drawn from, so it never exceeds `k` in size.
    /// Returns the shift applied to the home team.
    pub fn apply_result(
        &mut self,
        home: &str,
        away: &str,
        home_win_prob: f64,
        outcome: GameOutcome,
        k_factor: f64,
    ) -> f64 {
        let change = k_factor * (outcome.home_score() - home_win_prob);
        let home_rating = self.get(home);
        let away_rating = self.get(away);
        self.set(home, home_rating + change);
        self.set(away, away_rating - change);
        change
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}
