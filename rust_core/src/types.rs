//! Reference data and schedule types shared by every simulation stage.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Team identifier (league abbreviation, e.g. "KC").
pub type TeamId = String;

/// Rest days assumed when the schedule does not carry them.
pub const DEFAULT_REST_DAYS: u8 = 7;

/// Immutable team reference data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(alias = "Key", alias = "team_abbr")]
    pub key: TeamId,
    #[serde(alias = "Conference", alias = "team_conf")]
    pub conference: String,
    #[serde(alias = "Division", alias = "team_division")]
    pub division: String,
    #[serde(default, alias = "FullName", alias = "team_name")]
    pub full_name: Option<String>,
}

impl Team {
    pub fn new(key: &str, conference: &str, division: &str) -> Self {
        Self {
            key: key.to_string(),
            conference: conference.to_string(),
            division: division.to_string(),
            full_name: None,
        }
    }
}

/// Game status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[serde(alias = "Scheduled", alias = "SCHEDULED")]
    Scheduled,
    #[serde(alias = "Final", alias = "FINAL")]
    Final,
}

/// Result of a single game from the home team's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    HomeWin,
    AwayWin,
    Tie,
}

impl GameOutcome {
    /// Score from the home side: 1 for a win, 0.5 for a tie, 0 for a loss.
    pub fn home_score(&self) -> f64 {
        match self {
            GameOutcome::HomeWin => 1.0,
            GameOutcome::AwayWin => 0.0,
            GameOutcome::Tie => 0.5,
        }
    }
}

/// One scheduled or completed regular-season game. Never mutated by the simulator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Game {
    #[serde(default, alias = "GameKey")]
    pub game_id: Option<String>,
    #[serde(default, alias = "Season")]
    pub season: Option<i32>,
    #[serde(alias = "Week")]
    pub week: i32,
    #[serde(alias = "HomeTeam")]
    pub home_team: TeamId,
    #[serde(alias = "AwayTeam")]
    pub away_team: TeamId,
    #[serde(alias = "Status")]
    pub status: GameStatus,
    #[serde(default, alias = "HomeScore", deserialize_with = "whole_number")]
    pub home_score: Option<u16>,
    #[serde(default, alias = "AwayScore", deserialize_with = "whole_number")]
    pub away_score: Option<u16>,
    #[serde(default, alias = "HomeRest", deserialize_with = "whole_number")]
    pub home_rest: Option<u8>,
    #[serde(default, alias = "AwayRest", deserialize_with = "whole_number")]
    pub away_rest: Option<u8>,
    #[serde(default, alias = "home_qb_name")]
    pub home_qb: Option<String>,
    #[serde(default, alias = "away_qb_name")]
    pub away_qb: Option<String>,
    #[serde(default, alias = "Date")]
    pub date: Option<NaiveDate>,
}

/// Non-negative integer that may arrive as an integral float (`24.0`).
fn whole_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    use serde::de::Error;

    let Some(value) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(D::Error::custom(format!(
            "expected a non-negative whole number, found {}",
            value
        )));
    }
    T::try_from(value as u64)
        .map(Some)
        .map_err(|_| D::Error::custom(format!("{} is out of range", value)))
}

impl Game {
    pub fn scheduled(week: i32, home: &str, away: &str) -> Self {
        Self {
            game_id: None,
            season: None,
            week,
            home_team: home.to_string(),
            away_team: away.to_string(),
            status: GameStatus::Scheduled,
            home_score: None,
            away_score: None,
            home_rest: None,
            away_rest: None,
            home_qb: None,
            away_qb: None,
            date: None,
        }
    }

    pub fn final_score(week: i32, home: &str, away: &str, home_score: u16, away_score: u16) -> Self {
        Self {
            status: GameStatus::Final,
            home_score: Some(home_score),
            away_score: Some(away_score),
            ..Self::scheduled(week, home, away)
        }
    }

    pub fn is_final(&self) -> bool {
        self.status == GameStatus::Final
    }

    /// Outcome of a final game; `None` while scores are missing.
    pub fn outcome(&self) -> Option<GameOutcome> {
        let (home, away) = (self.home_score?, self.away_score?);
        Some(match home.cmp(&away) {
            std::cmp::Ordering::Greater => GameOutcome::HomeWin,
            std::cmp::Ordering::Less => GameOutcome::AwayWin,
            std::cmp::Ordering::Equal => GameOutcome::Tie,
        })
    }

    /// Human-readable label for logs and error reports.
    pub fn label(&self) -> String {
        match &self.game_id {
            Some(id) => id.clone(),
            None => format!("week {} {} @ {}", self.week, self.away_team, self.home_team),
        }
    }
}

/// Contextual flags handed to the oracle with every matchup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameContext {
    pub neutral_site: bool,
    pub home_rest_days: u8,
    pub away_rest_days: u8,
    pub home_qb: Option<String>,
    pub away_qb: Option<String>,
}

impl Default for GameContext {
    fn default() -> Self {
        Self {
            neutral_site: false,
            home_rest_days: DEFAULT_REST_DAYS,
            away_rest_days: DEFAULT_REST_DAYS,
            home_qb: None,
            away_qb: None,
        }
    }
}

impl GameContext {
    /// Context for a regular-season game, defaulting missing rest days.
    pub fn for_game(game: &Game) -> Self {
        Self {
            neutral_site: false,
            home_rest_days: game.home_rest.unwrap_or(DEFAULT_REST_DAYS),
            away_rest_days: game.away_rest.unwrap_or(DEFAULT_REST_DAYS),
            home_qb: game.home_qb.clone(),
            away_qb: game.away_qb.clone(),
        }
    }

    /// Context for a postseason game with a designated host.
    pub fn playoff(home_qb: Option<String>, away_qb: Option<String>) -> Self {
        Self {
            home_qb,
            away_qb,
            ..Self::default()
        }
    }

    /// Context for the neutral-site championship game.
    pub fn neutral(team_a_qb: Option<String>, team_b_qb: Option<String>) -> Self {
        Self {
            neutral_site: true,
            ..Self::playoff(team_a_qb, team_b_qb)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_scores() {
        assert_eq!(Game::final_score(1, "KC", "BUF", 27, 20).outcome(), Some(GameOutcome::HomeWin));
        assert_eq!(Game::final_score(1, "KC", "BUF", 17, 20).outcome(), Some(GameOutcome::AwayWin));
        assert_eq!(Game::final_score(1, "KC", "BUF", 20, 20).outcome(), Some(GameOutcome::Tie));
        assert_eq!(Game::scheduled(1, "KC", "BUF").outcome(), None);
    }

    #[test]
    fn test_deserialize_source_column_names() {
        let json = r#"{
            "Week": 3, "HomeTeam": "KC", "AwayTeam": "DEN", "Status": "Final",
            "HomeScore": 24, "AwayScore": 10, "HomeRest": 6, "home_qb_name": "P.Mahomes"
        }"#;
        let game: Game = serde_json::from_str(json).unwrap();
        assert_eq!(game.week, 3);
        assert!(game.is_final());
        assert_eq!(game.home_rest, Some(6));
        assert_eq!(game.away_rest, None);
        assert_eq!(game.home_qb.as_deref(), Some("P.Mahomes"));
    }

    #[test]
    fn test_integral_float_columns_accepted() {
        let json = r#"{
            "Week": 1, "HomeTeam": "KC", "AwayTeam": "LV", "Status": "Final",
            "HomeScore": 24.0, "AwayScore": 17.0, "HomeRest": 7.0, "AwayRest": null
        }"#;
        let game: Game = serde_json::from_str(json).unwrap();
        assert_eq!(game.home_score, Some(24));
        assert_eq!(game.away_score, Some(17));
        assert_eq!(game.home_rest, Some(7));
        assert_eq!(game.away_rest, None);
        assert_eq!(game.outcome(), Some(GameOutcome::HomeWin));
    }

    #[test]
    fn test_fractional_or_negative_score_rejected() {
        for score in ["24.5", "-3", "-3.0", "70000"] {
            let json = format!(
                r#"{{"Week": 1, "HomeTeam": "KC", "AwayTeam": "LV", "Status": "Final", "HomeScore": {}, "AwayScore": 17}}"#,
                score
            );
            assert!(serde_json::from_str::<Game>(&json).is_err(), "{} should be rejected", score);
        }
    }

    #[test]
    fn test_context_defaults_rest_days() {
        let ctx = GameContext::for_game(&Game::scheduled(5, "KC", "LV"));
        assert_eq!(ctx.home_rest_days, DEFAULT_REST_DAYS);
        assert_eq!(ctx.away_rest_days, DEFAULT_REST_DAYS);
        assert!(!ctx.neutral_site);
        assert!(GameContext::neutral(None, None).neutral_site);
    }
}
