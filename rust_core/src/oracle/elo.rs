//! Team Elo model reading the trial-local rating snapshot.

use super::{elo_probability, Matchup, RatingModel};
use crate::ratings::RatingSnapshot;

/// Home field advantage in Elo points
pub const ELO_HOME_ADVANTAGE: f64 = 65.0;

/// Elo win probability with home-field and optional rest adjustments.
///
/// Ratings come from the snapshot passed in, so within a trial later games see
/// the shifts caused by earlier simulated results.
#[derive(Debug, Clone)]
pub struct EloModel {
    pub home_advantage: f64,
    /// Elo points per day of rest advantage (0 disables the adjustment)
    pub rest_bonus_per_day: f64,
}

impl Default for EloModel {
    fn default() -> Self {
        Self {
            home_advantage: ELO_HOME_ADVANTAGE,
            rest_bonus_per_day: 0.0,
        }
    }
}

impl EloModel {
    pub fn new(home_advantage: f64, rest_bonus_per_day: f64) -> Self {
        Self {
            home_advantage,
            rest_bonus_per_day,
        }
    }
}

impl RatingModel for EloModel {
    fn home_win_probability(&self, matchup: &Matchup<'_>, ratings: &RatingSnapshot) -> f64 {
        let ctx = matchup.context;
        let hfa = if ctx.neutral_site { 0.0 } else { self.home_advantage };
        let rest_edge =
            (ctx.home_rest_days as f64 - ctx.away_rest_days as f64) * self.rest_bonus_per_day;

        let diff = ratings.get(matchup.home) + hfa + rest_edge - ratings.get(matchup.away);
        elo_probability(diff)
    }

    fn model_name(&self) -> &str {
        "elo"
    }
}
