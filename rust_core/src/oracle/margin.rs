//! Point-margin rating model.
//!
//! Power ratings, recent form, SRS and EPA style models reduce to a per-team
//! expected margin in points. This model turns a margin difference into a
//! probability on the Elo scale. Win-percentage models use `Log5Model`.

use super::{elo_probability, Matchup, RatingModel};
use crate::ratings::RatingSnapshot;
use rustc_hash::FxHashMap;

/// Home field advantage in points
pub const MARGIN_HOME_ADVANTAGE_POINTS: f64 = 2.5;

/// Elo points per point of expected margin
pub const ELO_PER_POINT: f64 = 25.0;

#[derive(Debug, Clone)]
pub struct MarginRatingModel {
    name: String,
    ratings: FxHashMap<String, f64>,
    pub home_advantage_points: f64,
}

impl MarginRatingModel {
    pub fn new(name: &str, ratings: FxHashMap<String, f64>) -> Self {
        Self {
            name: name.to_string(),
            ratings,
            home_advantage_points: MARGIN_HOME_ADVANTAGE_POINTS,
        }
    }

    /// Rating in points; unseen teams are league average (0).
    pub fn rating(&self, team: &str) -> f64 {
        self.ratings.get(team).copied().unwrap_or(0.0)
    }

    /// Expected home margin in points.
    pub fn expected_margin(&self, matchup: &Matchup<'_>) -> f64 {
        let hfa = if matchup.context.neutral_site {
            0.0
        } else {
            self.home_advantage_points
        };
        self.rating(matchup.home) - self.rating(matchup.away) + hfa
    }
}

impl RatingModel for MarginRatingModel {
    fn home_win_probability(&self, matchup: &Matchup<'_>, _ratings: &RatingSnapshot) -> f64 {
        elo_probability(self.expected_margin(matchup) * ELO_PER_POINT)
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}
