//! Playoff seed resolution.
//!
//! Division leaders take the top seeds ordered by win percentage; the best
//! remaining teams in the conference fill the wild-card seeds. Ties on win
//! percentage keep the league's input order (division order for leaders, team
//! order within a division and in the wild-card pool).

use crate::league_config::{LeagueStructure, PlayoffFormat, NFL_PLAYOFF_FORMAT};
use crate::standings::Standings;
use crate::types::TeamId;
use serde::{Deserialize, Serialize};

/// Ordered seeds for one conference, seed 1 first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferenceSeeds {
    pub conference: String,
    pub teams: Vec<TeamId>,
    /// How many of the leading seeds are division leaders
    pub division_leaders: usize,
}

impl ConferenceSeeds {
    /// 1-based seed for a team, if seeded.
    pub fn seed_of(&self, team: &str) -> Option<usize> {
        self.teams.iter().position(|t| t == team).map(|i| i + 1)
    }

    /// Team holding a 1-based seed.
    pub fn team_at(&self, seed: usize) -> Option<&str> {
        seed.checked_sub(1)
            .and_then(|i| self.teams.get(i))
            .map(|t| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn is_division_leader(&self, team: &str) -> bool {
        self.seed_of(team).map_or(false, |s| s <= self.division_leaders)
    }
}

/// Seeds for every conference, in league conference order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedAssignment {
    pub conferences: Vec<ConferenceSeeds>,
}

impl SeedAssignment {
    pub fn conference(&self, name: &str) -> Option<&ConferenceSeeds> {
        self.conferences.iter().find(|c| c.conference == name)
    }

    /// (conference seeds, 1-based seed) for a team, if seeded anywhere.
    pub fn seed_of(&self, team: &str) -> Option<(&ConferenceSeeds, usize)> {
        self.conferences
            .iter()
            .find_map(|c| c.seed_of(team).map(|s| (c, s)))
    }
}

pub struct SeedingResolver<'a> {
    league: &'a LeagueStructure,
    format: &'a PlayoffFormat,
}

impl<'a> SeedingResolver<'a> {
    pub fn new(league: &'a LeagueStructure) -> Self {
        Self::with_format(league, &NFL_PLAYOFF_FORMAT)
    }

    pub fn with_format(league: &'a LeagueStructure, format: &'a PlayoffFormat) -> Self {
        Self { league, format }
    }

    pub fn resolve(&self, standings: &Standings) -> SeedAssignment {
        SeedAssignment {
            conferences: self
                .league
                .conferences()
                .iter()
                .map(|c| self.resolve_conference(c, standings))
                .collect(),
        }
    }

    /// Seeds for one conference. Returns fewer than the format's seed count
    /// when the conference does not have enough teams.
    pub fn resolve_conference(&self, conference: &str, standings: &Standings) -> ConferenceSeeds {
        let divisions = self.league.divisions(conference);
        let mut leaders: Vec<&str> = Vec::with_capacity(divisions.len());
        for division in &divisions {
            let mut members: Vec<&str> = self
                .league
                .conference_teams(conference)
                .filter(|t| t.division == *division)
                .map(|t| t.key.as_str())
                .collect();
            sort_by_win_pct(&mut members, standings);
            if let Some(&leader) = members.first() {
                leaders.push(leader);
            }
        }
        sort_by_win_pct(&mut leaders, standings);
        leaders.truncate(self.format.seeds_per_conference);

        let mut wild_card_pool: Vec<&str> = self
            .league
            .conference_teams(conference)
            .map(|t| t.key.as_str())
            .filter(|t| !leaders.contains(t))
            .collect();
        sort_by_win_pct(&mut wild_card_pool, standings);
        wild_card_pool.truncate(self.format.wild_card_slots(leaders.len()));

        let division_leaders = leaders.len();
        let teams = leaders
            .into_iter()
            .chain(wild_card_pool)
            .map(|t| t.to_string())
            .collect();

        ConferenceSeeds {
            conference: conference.to_string(),
            teams,
            division_leaders,
        }
    }
}

/// Descending win percentage. Stable, so equal records keep input order.
fn sort_by_win_pct(teams: &mut [&str], standings: &Standings) {
    teams.sort_by(|a, b| standings.win_pct(b).total_cmp(&standings.win_pct(a)));
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::types::{GameOutcome, Team};
    use proptest::prelude::*;
    use std::collections::HashSet;

    const DIVISIONS: [&str; 4] = ["East", "North", "South", "West"];

    fn league() -> LeagueStructure {
        let mut teams = Vec::new();
        for conference in ["AFC", "NFC"] {
            for division in DIVISIONS {
                for i in 0..4 {
                    teams.push(Team::new(
                        &format!("{}-{}-{}", conference, division, i),
                        conference,
                        division,
                    ));
                }
            }
        }
        LeagueStructure::from_teams(teams).unwrap()
    }

    proptest! {
        /// Property: 4x4 conferences always yield 7 unique seeds, leaders first, best wild cards next
        #[test]
        fn prop_full_conference_seeding(
            records in proptest::collection::vec((0u32..18, 0u32..3), 32)
        ) {
            let league = league();
            let mut standings = Standings::with_teams(league.teams().iter().map(|t| t.key.as_str()));
            for (team, &(wins, ties)) in league.teams().iter().zip(&records) {
                let wins = wins.min(17);
                let ties = ties.min(17 - wins);
                let losses = 17 - wins - ties;
                for _ in 0..wins {
                    standings.apply(&team.key, "OPP", GameOutcome::HomeWin);
                }
                for _ in 0..ties {
                    standings.apply(&team.key, "OPP", GameOutcome::Tie);
                }
                for _ in 0..losses {
                    standings.apply(&team.key, "OPP", GameOutcome::AwayWin);
                }
            }

            let assignment = SeedingResolver::new(&league).resolve(&standings);
            prop_assert_eq!(assignment.conferences.len(), 2);

            for seeds in &assignment.conferences {
                prop_assert_eq!(seeds.len(), 7);
                let unique: HashSet<&String> = seeds.teams.iter().collect();
                prop_assert_eq!(unique.len(), 7);
                prop_assert_eq!(seeds.division_leaders, 4);

                // Seeds 1-4: one leader per division, sorted descending
                let leaders = &seeds.teams[..4];
                let divisions: HashSet<&str> = leaders
                    .iter()
                    .map(|t| league.team(t).unwrap().division.as_str())
                    .collect();
                prop_assert_eq!(divisions.len(), 4);
                for pair in leaders.windows(2) {
                    prop_assert!(standings.win_pct(&pair[0]) >= standings.win_pct(&pair[1]));
                }
                for leader in leaders {
                    let division = &league.team(leader).unwrap().division;
                    for rival in league.conference_teams(&seeds.conference).filter(|t| &t.division == division) {
                        prop_assert!(standings.win_pct(leader) >= standings.win_pct(&rival.key));
                    }
                }

                // Seeds 5-7: no unseeded non-leader has a better record
                let wild_cards = &seeds.teams[4..];
                for pair in wild_cards.windows(2) {
                    prop_assert!(standings.win_pct(&pair[0]) >= standings.win_pct(&pair[1]));
                }
                let worst_wild_card = standings.win_pct(&wild_cards[2]);
                for team in league.conference_teams(&seeds.conference) {
                    if seeds.seed_of(&team.key).is_none() {
                        prop_assert!(standings.win_pct(&team.key) <= worst_wild_card);
                    }
                }
            }
        }
    }
}
