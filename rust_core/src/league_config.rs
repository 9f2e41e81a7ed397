//! League configuration.
//!
//! This module provides:
//! - Static playoff format (seeds per conference, wild-card pairings)
//! - Conference/division membership supplied by the caller
//! - Team lookups with fuzzy suggestions for unknown identifiers

use crate::error::{ConfigError, DataError};
use crate::types::{Team, TeamId};
use rustc_hash::FxHashMap;
use strsim::jaro_winkler;

/// Playoff structure for one conference.
#[derive(Debug, Clone)]
pub struct PlayoffFormat {
    /// League code (e.g., "nfl")
    pub league_code: &'static str,
    /// Teams seeded per conference
    pub seeds_per_conference: usize,
    /// Seeds that skip the wild-card round
    pub bye_seeds: &'static [usize],
    /// Wild-card round pairings as (home seed, away seed)
    pub wild_card_pairings: &'static [(usize, usize)],
}

impl PlayoffFormat {
    /// Wild-card slots left once every division leader is seeded.
    pub fn wild_card_slots(&self, divisions: usize) -> usize {
        self.seeds_per_conference.saturating_sub(divisions)
    }
}

/// Seven seeds per conference, top seed on a bye.
pub static NFL_PLAYOFF_FORMAT: PlayoffFormat = PlayoffFormat {
    league_code: "nfl",
    seeds_per_conference: 7,
    bye_seeds: &[1],
    wild_card_pairings: &[(2, 7), (3, 6), (4, 5)],
};

/// Minimum Jaro-Winkler similarity for an unknown-team suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Conference and division membership for every team in the league.
#[derive(Debug, Clone)]
pub struct LeagueStructure {
    conferences: Vec<String>,
    teams: Vec<Team>,
    index: FxHashMap<TeamId, usize>,
}

impl LeagueStructure {
    /// Build from team records, deriving conferences in order of first appearance.
    pub fn from_teams(teams: Vec<Team>) -> Result<Self, DataError> {
        let mut conferences: Vec<String> = Vec::new();
        for team in &teams {
            if !team.conference.is_empty() && !conferences.contains(&team.conference) {
                conferences.push(team.conference.clone());
            }
        }
        Self::with_conferences(conferences, teams)
    }

    /// Build with an explicit conference list (used as the championship pairing order).
    pub fn with_conferences(conferences: Vec<String>, teams: Vec<Team>) -> Result<Self, DataError> {
        let mut index = FxHashMap::default();
        for (i, team) in teams.iter().enumerate() {
            if team.key.trim().is_empty() {
                return Err(DataError::EmptyTeamId { index: i });
            }
            if team.conference.trim().is_empty() {
                return Err(DataError::MissingMembership {
                    team: team.key.clone(),
                    field: "conference",
                });
            }
            if team.division.trim().is_empty() {
                return Err(DataError::MissingMembership {
                    team: team.key.clone(),
                    field: "division",
                });
            }
            if !conferences.contains(&team.conference) {
                return Err(DataError::UndeclaredConference {
                    team: team.key.clone(),
                    conference: team.conference.clone(),
                });
            }
            if index.insert(team.key.clone(), i).is_some() {
                return Err(DataError::DuplicateTeam {
                    team: team.key.clone(),
                });
            }
        }

        Ok(Self {
            conferences,
            teams,
            index,
        })
    }

    /// Check the league can produce two conference champions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for conference in &self.conferences {
            if self.conference_teams(conference).next().is_none() {
                return Err(ConfigError::EmptyConference(conference.clone()));
            }
        }
        if self.conferences.len() != 2 {
            return Err(ConfigError::ConferenceCount(self.conferences.len()));
        }
        Ok(())
    }

    pub fn conferences(&self) -> &[String] {
        &self.conferences
    }

    /// All teams in input order.
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, key: &str) -> Option<&Team> {
        self.index.get(key).map(|&i| &self.teams[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Teams of one conference in input order.
    pub fn conference_teams<'a>(&'a self, conference: &'a str) -> impl Iterator<Item = &'a Team> + 'a {
        self.teams.iter().filter(move |t| t.conference == conference)
    }

    /// Division names of one conference in order of first appearance.
    pub fn divisions(&self, conference: &str) -> Vec<&str> {
        let mut divisions: Vec<&str> = Vec::new();
        for team in self.teams.iter().filter(|t| t.conference == conference) {
            if !divisions.contains(&team.division.as_str()) {
                divisions.push(&team.division);
            }
        }
        divisions
    }

    /// Closest known team identifier, for error messages.
    pub fn suggest(&self, unknown: &str) -> Option<String> {
        let unknown = unknown.to_uppercase();
        self.teams
            .iter()
            .map(|t| (jaro_winkler(&unknown, &t.key.to_uppercase()), &t.key))
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, key)| key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_league() -> LeagueStructure {
        LeagueStructure::from_teams(vec![
            Team::new("KC", "AFC", "West"),
            Team::new("LV", "AFC", "West"),
            Team::new("BUF", "AFC", "East"),
            Team::new("PHI", "NFC", "East"),
            Team::new("DAL", "NFC", "East"),
        ])
        .unwrap()
    }

    #[test]
    fn test_conferences_in_first_appearance_order() {
        let league = small_league();
        assert_eq!(league.conferences(), &["AFC".to_string(), "NFC".to_string()]);
        assert_eq!(league.divisions("AFC"), vec!["West", "East"]);
        assert!(league.validate().is_ok());
    }

    #[test]
    fn test_duplicate_team_rejected() {
        let result = LeagueStructure::from_teams(vec![
            Team::new("KC", "AFC", "West"),
            Team::new("KC", "AFC", "West"),
        ]);
        assert!(matches!(result, Err(DataError::DuplicateTeam { .. })));
    }

    #[test]
    fn test_missing_division_rejected() {
        let result = LeagueStructure::from_teams(vec![Team::new("KC", "AFC", "")]);
        assert!(matches!(
            result,
            Err(DataError::MissingMembership { field: "division", .. })
        ));
    }

    #[test]
    fn test_empty_declared_conference_rejected() {
        let league = LeagueStructure::with_conferences(
            vec!["AFC".to_string(), "NFC".to_string()],
            vec![Team::new("KC", "AFC", "West")],
        )
        .unwrap();
        assert!(matches!(league.validate(), Err(ConfigError::EmptyConference(c)) if c == "NFC"));
    }

    #[test]
    fn test_divisions_outlive_conference_argument() {
        let league = small_league();
        let divisions = {
            let conference = String::from("NFC");
            league.divisions(&conference)
        };
        assert_eq!(divisions, vec!["East"]);
    }

    #[test]
    fn test_team_in_undeclared_conference_rejected() {
        let result = LeagueStructure::with_conferences(
            vec!["AFC".to_string(), "NFC".to_string()],
            vec![
                Team::new("KC", "AFC", "West"),
                Team::new("PHI", "NFC", "East"),
                Team::new("XX", "XFL", "North"),
            ],
        );
        assert!(matches!(
            result,
            Err(DataError::UndeclaredConference { team, conference }) if team == "XX" && conference == "XFL"
        ));
    }

    #[test]
    fn test_single_conference_rejected() {
        let league = LeagueStructure::from_teams(vec![Team::new("KC", "AFC", "West")]).unwrap();
        assert!(matches!(league.validate(), Err(ConfigError::ConferenceCount(1))));
    }

    #[test]
    fn test_suggestion_for_typo() {
        let league = small_league();
        assert_eq!(league.suggest("BUFF").as_deref(), Some("BUF"));
        assert_eq!(league.suggest("zzzzzz"), None);
    }

    #[test]
    fn test_wild_card_slots() {
        assert_eq!(NFL_PLAYOFF_FORMAT.wild_card_slots(4), 3);
        assert_eq!(NFL_PLAYOFF_FORMAT.wild_card_slots(2), 5);
        assert_eq!(NFL_PLAYOFF_FORMAT.wild_card_pairings.len(), 3);
    }
}
