//! Single-elimination playoff bracket with reseeding.
//!
//! Each conference plays WildCard -> Divisional -> ConferenceChampionship;
//! the two conference champions then meet at a neutral site. Survivors are
//! re-paired every round by seed: best remaining seed hosts the worst, the
//! next best hosts the next worst, and so on.

use crate::error::{FailedMatchup, SimulationStage};
use crate::league_config::{PlayoffFormat, NFL_PLAYOFF_FORMAT};
use crate::oracle::{check_probability, Matchup, WinProbabilityOracle};
use crate::ratings::RatingSnapshot;
use crate::seeding::{ConferenceSeeds, SeedAssignment};
use crate::types::{GameContext, TeamId};
use rand::Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Postseason rounds in playing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlayoffRound {
    WildCard,
    Divisional,
    ConferenceChampionship,
    Championship,
}

impl PlayoffRound {
    pub const ALL: [PlayoffRound; 4] = [
        PlayoffRound::WildCard,
        PlayoffRound::Divisional,
        PlayoffRound::ConferenceChampionship,
        PlayoffRound::Championship,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlayoffRound::WildCard => "Wild Card",
            PlayoffRound::Divisional => "Divisional",
            PlayoffRound::ConferenceChampionship => "Conference Championship",
            PlayoffRound::Championship => "Championship",
        }
    }

    /// Round that follows this one, `None` after the championship.
    pub fn next(&self) -> Option<PlayoffRound> {
        PlayoffRound::ALL.get(self.index() + 1).copied()
    }
}

impl fmt::Display for PlayoffRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one simulated postseason.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BracketResult {
    /// Furthest round each playoff team took part in. Bye teams start at Divisional.
    pub furthest_round: FxHashMap<TeamId, PlayoffRound>,
    /// Conference champions in league conference order; skipped conferences are absent.
    pub conference_champions: Vec<TeamId>,
    /// `None` when a conference was skipped for lack of seeds.
    pub champion: Option<TeamId>,
}

impl BracketResult {
    pub fn round_reached(&self, team: &str) -> Option<PlayoffRound> {
        self.furthest_round.get(team).copied()
    }

    pub fn is_conference_champion(&self, team: &str) -> bool {
        self.conference_champions.iter().any(|t| t == team)
    }

    fn reach(&mut self, team: &str, round: PlayoffRound) {
        let entry = self
            .furthest_round
            .entry(team.to_string())
            .or_insert(round);
        if round > *entry {
            *entry = round;
        }
    }
}

/// A surviving team and the seed it carries through the bracket.
#[derive(Debug, Clone, Copy)]
struct Entrant<'s> {
    seed: usize,
    team: &'s str,
}

/// Plays postseason games against a fixed rating snapshot.
///
/// Playoff results never feed back into ratings.
pub struct BracketSimulator<'a> {
    oracle: &'a dyn WinProbabilityOracle,
    ratings: &'a RatingSnapshot,
    quarterbacks: Option<&'a FxHashMap<TeamId, String>>,
    format: &'a PlayoffFormat,
}

impl<'a> BracketSimulator<'a> {
    pub fn new(oracle: &'a dyn WinProbabilityOracle, ratings: &'a RatingSnapshot) -> Self {
        Self {
            oracle,
            ratings,
            quarterbacks: None,
            format: &NFL_PLAYOFF_FORMAT,
        }
    }

    /// Starting quarterback per team, passed to the oracle in the context.
    pub fn with_quarterbacks(mut self, quarterbacks: &'a FxHashMap<TeamId, String>) -> Self {
        self.quarterbacks = Some(quarterbacks);
        self
    }

    pub fn with_format(mut self, format: &'a PlayoffFormat) -> Self {
        self.format = format;
        self
    }

    /// Run the full postseason for one trial.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        trial: u64,
        seeds: &SeedAssignment,
        rng: &mut R,
    ) -> Result<BracketResult, FailedMatchup> {
        let mut result = BracketResult::default();
        let mut skipped = false;

        for conference in &seeds.conferences {
            if conference.len() < self.format.seeds_per_conference {
                warn!(
                    "Skipping {} bracket: {} of {} seeds filled",
                    conference.conference,
                    conference.len(),
                    self.format.seeds_per_conference
                );
                skipped = true;
                continue;
            }
            let champion = self.simulate_conference(trial, conference, &mut result, rng)?;
            result.conference_champions.push(champion.to_string());
        }

        if skipped {
            return Ok(result);
        }

        if let [team_a, team_b] = result.conference_champions.as_slice() {
            let (team_a, team_b) = (team_a.clone(), team_b.clone());
            let context = GameContext::neutral(self.quarterback(&team_a), self.quarterback(&team_b));
            result.reach(&team_a, PlayoffRound::Championship);
            result.reach(&team_b, PlayoffRound::Championship);
            let a_wins = self.play(trial, PlayoffRound::Championship, &team_a, &team_b, context, rng)?;
            result.champion = Some(if a_wins { team_a } else { team_b });
        }

        Ok(result)
    }

    /// Play one conference down to its champion.
    fn simulate_conference<'s, R: Rng + ?Sized>(
        &self,
        trial: u64,
        seeds: &'s ConferenceSeeds,
        result: &mut BracketResult,
        rng: &mut R,
    ) -> Result<&'s str, FailedMatchup> {
        let entrant = |seed: usize| {
            seeds.team_at(seed).map(|team| Entrant { seed, team })
        };

        let mut survivors: Vec<Entrant<'s>> = self
            .format
            .bye_seeds
            .iter()
            .filter_map(|&s| entrant(s))
            .collect();
        for survivor in &survivors {
            result.reach(survivor.team, PlayoffRound::Divisional);
        }

        let wild_card: Vec<(Entrant<'s>, Entrant<'s>)> = self
            .format
            .wild_card_pairings
            .iter()
            .filter_map(|&(high, low)| Some((entrant(high)?, entrant(low)?)))
            .collect();
        survivors.extend(self.play_round(trial, PlayoffRound::WildCard, &wild_card, result, rng)?);

        let mut round = PlayoffRound::Divisional;
        while survivors.len() > 1 {
            let pairings = reseed(&mut survivors);
            survivors = self.play_round(trial, round, &pairings, result, rng)?;
            match round.next() {
                Some(next) => round = next,
                None => break,
            }
        }

        // A malformed format could leave nobody standing; the top seed takes it.
        let champion = survivors
            .first()
            .map(|e| e.team)
            .or_else(|| seeds.team_at(1))
            .unwrap_or_default();
        Ok(champion)
    }

    /// Play every pairing of a round and return the winners.
    fn play_round<'s, R: Rng + ?Sized>(
        &self,
        trial: u64,
        round: PlayoffRound,
        pairings: &[(Entrant<'s>, Entrant<'s>)],
        result: &mut BracketResult,
        rng: &mut R,
    ) -> Result<Vec<Entrant<'s>>, FailedMatchup> {
        let mut winners = Vec::with_capacity(pairings.len());
        for &(home, away) in pairings {
            result.reach(home.team, round);
            result.reach(away.team, round);
            let context = GameContext::playoff(self.quarterback(home.team), self.quarterback(away.team));
            let home_wins = self.play(trial, round, home.team, away.team, context, rng)?;
            winners.push(if home_wins { home } else { away });
        }
        Ok(winners)
    }

    /// One Bernoulli draw on the oracle's home-win probability.
    fn play<R: Rng + ?Sized>(
        &self,
        trial: u64,
        round: PlayoffRound,
        home: &str,
        away: &str,
        context: GameContext,
        rng: &mut R,
    ) -> Result<bool, FailedMatchup> {
        let probability = self
            .oracle
            .win_probability(&Matchup::new(home, away, &context), self.ratings)
            .and_then(check_probability);
        match probability {
            Ok(p) => Ok(rng.gen::<f64>() < p),
            Err(source) => Err(FailedMatchup {
                trial,
                stage: SimulationStage::Playoffs { round },
                home: home.to_string(),
                away: away.to_string(),
                context,
                source,
            }),
        }
    }

    fn quarterback(&self, team: &str) -> Option<String> {
        self.quarterbacks.and_then(|q| q.get(team).cloned())
    }
}

/// Pair survivors best-vs-worst by seed. The better seed is listed first (home).
fn reseed<'s>(survivors: &mut [Entrant<'s>]) -> Vec<(Entrant<'s>, Entrant<'s>)> {
    survivors.sort_by_key(|e| e.seed);
    let n = survivors.len();
    (0..n / 2)
        .map(|i| (survivors[i], survivors[n - 1 - i]))
        .collect()
}
