//! Team and schedule loading.
//!
//! Everything here runs once, before the trial loop. A bad record fails the
//! whole load with a `DataError` naming the offending game or team.

use crate::error::DataError;
use crate::league_config::LeagueStructure;
use crate::types::{Game, Team, TeamId};
use rustc_hash::FxHashMap;
use std::fs;
use tracing::info;

/// Validated league membership plus the season schedule.
#[derive(Debug, Clone)]
pub struct LeagueData {
    pub league: LeagueStructure,
    pub schedule: Vec<Game>,
}

impl LeagueData {
    /// Validate already-parsed records.
    pub fn new(teams: Vec<Team>, schedule: Vec<Game>) -> Result<Self, DataError> {
        let league = LeagueStructure::from_teams(teams)?;
        for game in &schedule {
            validate_game(&league, game)?;
        }
        Ok(Self { league, schedule })
    }

    /// Parse the teams array and the schedule array.
    pub fn from_json(teams_json: &str, schedule_json: &str) -> Result<Self, DataError> {
        let teams: Vec<Team> = serde_json::from_str(teams_json).map_err(|source| DataError::Json {
            what: "teams",
            source,
        })?;
        let schedule: Vec<Game> =
            serde_json::from_str(schedule_json).map_err(|source| DataError::Json {
                what: "schedule",
                source,
            })?;
        Self::new(teams, schedule)
    }

    pub fn load(teams_path: &str, schedule_path: &str) -> Result<Self, DataError> {
        let data = Self::from_json(&read(teams_path)?, &read(schedule_path)?)?;
        info!(
            "Loaded {} teams and {} games ({} final)",
            data.league.teams().len(),
            data.schedule.len(),
            data.schedule.iter().filter(|g| g.is_final()).count()
        );
        Ok(data)
    }

    /// Each team's most recently listed starting quarterback.
    ///
    /// Later weeks win; within a week the first schedule entry wins.
    pub fn primary_quarterbacks(&self) -> FxHashMap<TeamId, String> {
        primary_quarterbacks(&self.schedule)
    }
}

pub fn primary_quarterbacks(schedule: &[Game]) -> FxHashMap<TeamId, String> {
    let mut latest: FxHashMap<TeamId, (i32, String)> = FxHashMap::default();
    let mut note = |team: &str, week: i32, qb: &Option<String>| {
        if let Some(qb) = qb.as_deref().filter(|q| !q.trim().is_empty()) {
            let slot = latest
                .entry(team.to_string())
                .or_insert_with(|| (week, qb.to_string()));
            if week > slot.0 {
                *slot = (week, qb.to_string());
            }
        }
    };
    for game in schedule {
        note(&game.home_team, game.week, &game.home_qb);
        note(&game.away_team, game.week, &game.away_qb);
    }
    latest.into_iter().map(|(team, (_, qb))| (team, qb)).collect()
}

fn read(path: &str) -> Result<String, DataError> {
    fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_string(),
        source,
    })
}

fn validate_game(league: &LeagueStructure, game: &Game) -> Result<(), DataError> {
    for team in [&game.home_team, &game.away_team] {
        if team.trim().is_empty() {
            return Err(DataError::UnknownTeam {
                game: game.label(),
                team: team.clone(),
                suggestion: None,
            });
        }
        if !league.contains(team) {
            return Err(DataError::UnknownTeam {
                game: game.label(),
                team: team.clone(),
                suggestion: league.suggest(team),
            });
        }
    }
    if game.week < 0 {
        return Err(DataError::NegativeWeek {
            game: game.label(),
            week: game.week,
        });
    }
    if game.home_team == game.away_team {
        return Err(DataError::SelfMatchup {
            game: game.label(),
            team: game.home_team.clone(),
        });
    }
    if game.is_final() && game.outcome().is_none() {
        return Err(DataError::MissingScore { game: game.label() });
    }
    Ok(())
}
