//! Log5 model over expected win percentages.
//!
//! Pythagorean expectation produces a per-team winning percentage, not a
//! margin, so it is combined head to head with log5 odds. Home field
//! multiplies the home side's odds.

use super::{Matchup, RatingModel};
use crate::ratings::RatingSnapshot;
use rustc_hash::FxHashMap;

/// Home odds multiplier
pub const LOG5_HOME_ODDS_MULTIPLIER: f64 = 1.5;

/// Exponent for points-based Pythagorean expectation
pub const PYTHAGOREAN_EXPONENT: f64 = 2.37;

/// Win percentages are clamped here before converting to odds.
const MIN_WIN_PCT: f64 = 0.01;
const MAX_WIN_PCT: f64 = 0.99;

/// Expected winning percentage from points scored and allowed.
pub fn pythagorean_win_pct(points_for: f64, points_against: f64, exponent: f64) -> f64 {
    if points_for <= 0.0 && points_against <= 0.0 {
        return 0.5;
    }
    let pf = points_for.powf(exponent);
    pf / (pf + points_against.powf(exponent))
}

#[derive(Debug, Clone)]
pub struct Log5Model {
    name: String,
    win_pcts: FxHashMap<String, f64>,
    pub home_odds_multiplier: f64,
}

impl Log5Model {
    pub fn new(name: &str, win_pcts: FxHashMap<String, f64>) -> Self {
        Self {
            name: name.to_string(),
            win_pcts,
            home_odds_multiplier: LOG5_HOME_ODDS_MULTIPLIER,
        }
    }

    /// Unseen teams are .500.
    pub fn win_pct(&self, team: &str) -> f64 {
        self.win_pcts
            .get(team)
            .copied()
            .unwrap_or(0.5)
            .clamp(MIN_WIN_PCT, MAX_WIN_PCT)
    }
}

impl RatingModel for Log5Model {
    fn home_win_probability(&self, matchup: &Matchup<'_>, _ratings: &RatingSnapshot) -> f64 {
        let odds = |p: f64| p / (1.0 - p);
        let mut ratio = odds(self.win_pct(matchup.home)) / odds(self.win_pct(matchup.away));
        if !matchup.context.neutral_site {
            ratio *= self.home_odds_multiplier;
        }
        ratio / (1.0 + ratio)
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}
