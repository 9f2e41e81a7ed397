//! Cross-trial aggregation.
//!
//! Counters are plain integers, so merging batches is additive and order
//! independent. Percentages are only computed at `finalize`.

use crate::bracket::{BracketResult, PlayoffRound};
use crate::league_config::LeagueStructure;
use crate::seeding::SeedAssignment;
use crate::types::TeamId;
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// What one team achieved in one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeamOutcome {
    pub made_playoffs: bool,
    pub seed: Option<usize>,
    pub won_division: bool,
    pub won_conference: bool,
    pub won_championship: bool,
    pub furthest_round: Option<PlayoffRound>,
}

/// Outcomes of one trial. Teams that missed the playoffs are omitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialOutcome {
    pub teams: Vec<(TeamId, TeamOutcome)>,
}

impl TrialOutcome {
    /// Translate seeds and bracket results into per-team flags.
    pub fn from_results(seeds: &SeedAssignment, bracket: &BracketResult) -> Self {
        let mut teams = Vec::new();
        for conference in &seeds.conferences {
            for (i, team) in conference.teams.iter().enumerate() {
                let outcome = TeamOutcome {
                    made_playoffs: true,
                    seed: Some(i + 1),
                    won_division: conference.is_division_leader(team),
                    won_conference: bracket.is_conference_champion(team),
                    won_championship: bracket.champion.as_deref() == Some(team.as_str()),
                    furthest_round: bracket.round_reached(team),
                };
                teams.push((team.clone(), outcome));
            }
        }
        Self { teams }
    }

    pub fn get(&self, team: &str) -> TeamOutcome {
        self.teams
            .iter()
            .find(|(t, _)| t == team)
            .map(|(_, o)| *o)
            .unwrap_or_default()
    }
}

/// Raw counts for one team.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamCounters {
    pub playoffs: u64,
    pub division: u64,
    pub conference: u64,
    pub championship: u64,
    /// Index `s - 1` counts trials seeded `s`
    pub seeds: Vec<u64>,
    /// Trials in which the team was alive in each round
    pub rounds: [u64; 4],
}

impl TeamCounters {
    fn record(&mut self, outcome: &TeamOutcome) {
        self.playoffs += outcome.made_playoffs as u64;
        self.division += outcome.won_division as u64;
        self.conference += outcome.won_conference as u64;
        self.championship += outcome.won_championship as u64;

        if let Some(seed) = outcome.seed.filter(|s| *s > 0) {
            if self.seeds.len() < seed {
                self.seeds.resize(seed, 0);
            }
            self.seeds[seed - 1] += 1;
        }
        if let Some(furthest) = outcome.furthest_round {
            for round in PlayoffRound::ALL.iter().filter(|r| **r <= furthest) {
                self.rounds[round.index()] += 1;
            }
        }
    }

    fn merge(&mut self, other: &TeamCounters) {
        self.playoffs += other.playoffs;
        self.division += other.division;
        self.conference += other.conference;
        self.championship += other.championship;
        if self.seeds.len() < other.seeds.len() {
            self.seeds.resize(other.seeds.len(), 0);
        }
        for (mine, theirs) in self.seeds.iter_mut().zip(&other.seeds) {
            *mine += theirs;
        }
        for (mine, theirs) in self.rounds.iter_mut().zip(other.rounds) {
            *mine += theirs;
        }
    }

    /// Most frequent seed. Equal frequencies go to the lower seed number.
    pub fn modal_seed(&self) -> Option<usize> {
        let mut best: Option<(usize, u64)> = None;
        for (i, &count) in self.seeds.iter().enumerate() {
            if count == 0 {
                continue;
            }
            // Strictly greater keeps the earlier (lower) seed on ties.
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((i + 1, count));
            }
        }
        best.map(|(seed, _)| seed)
    }
}

/// Accumulates trial outcomes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastAggregator {
    trials: u64,
    counters: FxHashMap<TeamId, TeamCounters>,
}

impl ForecastAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &TrialOutcome) {
        self.trials += 1;
        for (team, team_outcome) in &outcome.teams {
            self.counters
                .entry(team.clone())
                .or_default()
                .record(team_outcome);
        }
    }

    /// Add another aggregator's counts. Associative and commutative.
    pub fn merge(&mut self, other: &ForecastAggregator) {
        self.trials += other.trials;
        for (team, counters) in &other.counters {
            self.counters.entry(team.clone()).or_default().merge(counters);
        }
    }

    /// Fully completed trials recorded so far.
    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn counters(&self, team: &str) -> Option<&TeamCounters> {
        self.counters.get(team)
    }

    pub fn championships(&self, team: &str) -> u64 {
        self.counters.get(team).map_or(0, |c| c.championship)
    }

    pub fn total_championships(&self) -> u64 {
        self.counters.values().map(|c| c.championship).sum()
    }

    /// Per-team forecasts for every league team, best championship odds first.
    pub fn finalize(&self, league: &LeagueStructure) -> Vec<TeamForecast> {
        let empty = TeamCounters::default();
        let fraction = |count: u64| {
            if self.trials == 0 {
                0.0
            } else {
                count as f64 / self.trials as f64
            }
        };

        let mut forecasts: Vec<TeamForecast> = league
            .teams()
            .iter()
            .map(|team| {
                let c = self.counters.get(&team.key).unwrap_or(&empty);
                TeamForecast {
                    team: team.key.clone(),
                    full_name: team.full_name.clone(),
                    conference: team.conference.clone(),
                    division: team.division.clone(),
                    playoff_probability: fraction(c.playoffs),
                    division_probability: fraction(c.division),
                    conference_probability: fraction(c.conference),
                    championship_probability: fraction(c.championship),
                    modal_seed: c.modal_seed(),
                    seed_distribution: c
                        .seeds
                        .iter()
                        .enumerate()
                        .filter(|(_, n)| **n > 0)
                        .map(|(i, n)| (i + 1, fraction(*n)))
                        .collect(),
                    round_probabilities: PlayoffRound::ALL
                        .iter()
                        .map(|r| (*r, fraction(c.rounds[r.index()])))
                        .collect(),
                }
            })
            .collect();

        forecasts.sort_by(|a, b| {
            b.championship_probability
                .total_cmp(&a.championship_probability)
                .then(b.playoff_probability.total_cmp(&a.playoff_probability))
                .then_with(|| a.team.cmp(&b.team))
        });
        forecasts
    }
}

/// Final per-team numbers. Probabilities are fractions in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamForecast {
    pub team: TeamId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub conference: String,
    pub division: String,
    pub playoff_probability: f64,
    pub division_probability: f64,
    pub conference_probability: f64,
    pub championship_probability: f64,
    /// `None` if the team was never seeded
    pub modal_seed: Option<usize>,
    pub seed_distribution: BTreeMap<usize, f64>,
    /// Probability of being alive in each round
    pub round_probabilities: BTreeMap<PlayoffRound, f64>,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Cancelled,
}

/// Serializable summary of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub trials_requested: u64,
    pub trials_completed: u64,
    pub status: RunStatus,
    pub random_seed: u64,
    pub start_week: Option<i32>,
    pub teams: Vec<TeamForecast>,
}

impl ForecastReport {
    pub fn new(
        aggregate: &ForecastAggregator,
        league: &LeagueStructure,
        trials_requested: u64,
        status: RunStatus,
        random_seed: u64,
        start_week: Option<i32>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            trials_requested,
            trials_completed: aggregate.trials(),
            status,
            random_seed,
            start_week,
            teams: aggregate.finalize(league),
        }
    }

    pub fn team(&self, key: &str) -> Option<&TeamForecast> {
        self.teams.iter().find(|t| t.team == key)
    }
}
