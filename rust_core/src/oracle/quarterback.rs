//! Starting-quarterback Elo model.

use super::{elo_probability, Matchup, RatingModel};
use crate::ratings::RatingSnapshot;
use rustc_hash::FxHashMap;

pub const QB_BASE_RATING: f64 = 1400.0;
pub const QB_HOME_ADVANTAGE: f64 = 30.0;

/// Compares the two listed starters. Trained ratings are fixed for the run.
///
/// When either starter is unknown the model has no opinion and returns 0.5.
#[derive(Debug, Clone)]
pub struct QuarterbackEloModel {
    ratings: FxHashMap<String, f64>,
    pub base_rating: f64,
    pub home_advantage: f64,
}

impl Default for QuarterbackEloModel {
    fn default() -> Self {
        Self::new(FxHashMap::default())
    }
}

impl QuarterbackEloModel {
    pub fn new(ratings: FxHashMap<String, f64>) -> Self {
        Self {
            ratings,
            base_rating: QB_BASE_RATING,
            home_advantage: QB_HOME_ADVANTAGE,
        }
    }

    pub fn rating(&self, quarterback: &str) -> f64 {
        if quarterback.is_empty() {
            return self.base_rating;
        }
        self.ratings.get(quarterback).copied().unwrap_or(self.base_rating)
    }
}

impl RatingModel for QuarterbackEloModel {
    fn home_win_probability(&self, matchup: &Matchup<'_>, _ratings: &RatingSnapshot) -> f64 {
        let ctx = matchup.context;
        let (Some(home_qb), Some(away_qb)) = (ctx.home_qb.as_deref(), ctx.away_qb.as_deref()) else {
            return 0.5;
        };
        let hfa = if ctx.neutral_site { 0.0 } else { self.home_advantage };
        elo_probability(self.rating(home_qb) + hfa - self.rating(away_qb))
    }

    fn model_name(&self) -> &str {
        "quarterback"
    }
}
