//! Season simulator.
//!
//! Replays the pending part of the schedule many times. Every trial gets its
//! own clone of the base standings and ratings plus its own random stream
//! (`ChaCha8Rng` stream = trial index), so results do not depend on how
//! trials are spread over threads.

use crate::aggregate::{ForecastAggregator, ForecastReport, RunStatus, TrialOutcome};
use crate::bracket::BracketSimulator;
use crate::config::SimulationConfig;
use crate::data::LeagueData;
use crate::error::{ConfigError, FailedMatchup, SimulationError, SimulationStage};
use crate::oracle::{check_probability, Matchup, WinProbabilityOracle};
use crate::ratings::RatingSnapshot;
use crate::seeding::SeedingResolver;
use crate::standings::Standings;
use crate::types::{Game, GameContext, GameOutcome, TeamId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Shared flag to stop a run between trials.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress callback: (completed trials, requested trials).
pub type ProgressFn<'a> = Box<dyn Fn(u64, u64) + Send + Sync + 'a>;

/// Aggregate of a finished or cancelled run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub aggregate: ForecastAggregator,
    pub trials_requested: u64,
    pub random_seed: u64,
    pub start_week: Option<i32>,
}

impl RunOutcome {
    pub fn trials_completed(&self) -> u64 {
        self.aggregate.trials()
    }

    pub fn report(&self, data: &LeagueData) -> ForecastReport {
        ForecastReport::new(
            &self.aggregate,
            &data.league,
            self.trials_requested,
            self.status,
            self.random_seed,
            self.start_week,
        )
    }
}

/// A pending game with its oracle context built once.
#[derive(Debug, Clone)]
struct PendingGame<'a> {
    game: &'a Game,
    context: GameContext,
}

#[derive(Debug, Default)]
struct BatchResult {
    aggregate: ForecastAggregator,
    failure: Option<FailedMatchup>,
}

pub struct SeasonSimulator<'a> {
    data: &'a LeagueData,
    oracle: &'a dyn WinProbabilityOracle,
    base_ratings: &'a RatingSnapshot,
    config: SimulationConfig,
    base_standings: Standings,
    pending: Vec<PendingGame<'a>>,
    decided: usize,
    quarterbacks: FxHashMap<TeamId, String>,
    cancel: Option<CancelFlag>,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> SeasonSimulator<'a> {
    /// Validate the configuration and league, then split the schedule.
    ///
    /// Every data and configuration problem is reported here, before any trial runs.
    pub fn new(
        data: &'a LeagueData,
        oracle: &'a dyn WinProbabilityOracle,
        base_ratings: &'a RatingSnapshot,
        config: SimulationConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        data.league.validate()?;

        let (decided, mut pending) = partition(&data.schedule, config.start_week);
        // Stable: same-week games keep schedule order.
        pending.sort_by_key(|g| g.week);

        let base_standings = Standings::initialize_from_completed(
            data.league.teams().iter().map(|t| t.key.as_str()),
            decided.iter().copied(),
        );

        Ok(Self {
            data,
            oracle,
            base_ratings,
            base_standings,
            decided: decided.len(),
            pending: pending
                .into_iter()
                .map(|game| PendingGame {
                    game,
                    context: GameContext::for_game(game),
                })
                .collect(),
            quarterbacks: data.primary_quarterbacks(),
            config,
            cancel: None,
            progress: None,
        })
    }

    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn with_progress(mut self, progress: impl Fn(u64, u64) + Send + Sync + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Override the playoff starters taken from the schedule.
    pub fn with_quarterbacks(mut self, quarterbacks: FxHashMap<TeamId, String>) -> Self {
        self.quarterbacks = quarterbacks;
        self
    }

    pub fn pending_games(&self) -> usize {
        self.pending.len()
    }

    pub fn decided_games(&self) -> usize {
        self.decided
    }

    pub fn base_standings(&self) -> &Standings {
        &self.base_standings
    }

    /// Run every trial and merge the results.
    ///
    /// On cancellation the outcome is `RunStatus::Cancelled` with the trials
    /// that finished. An oracle failure aborts the run; the error carries the
    /// failing matchup and the aggregate of trials completed before it.
    pub fn run(&self) -> Result<RunOutcome, SimulationError> {
        let seed = self.config.random_seed.unwrap_or_else(rand::random);
        let total = self.config.number_of_trials;
        let started = Instant::now();

        info!(
            "Simulating {} trials: {} pending games, {} decided, seed {}",
            total,
            self.pending.len(),
            self.decided,
            seed
        );

        let batches = match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;
                pool.install(|| self.run_batches(seed))
            }
            None => self.run_batches(seed),
        };

        let mut aggregate = ForecastAggregator::new();
        let mut failure: Option<FailedMatchup> = None;
        for batch in batches {
            aggregate.merge(&batch.aggregate);
            if let Some(f) = batch.failure {
                if failure.as_ref().map_or(true, |current| f.trial < current.trial) {
                    failure = Some(f);
                }
            }
        }

        if let Some(failure) = failure {
            error!(
                "Oracle failure after {} completed trials: {}",
                aggregate.trials(),
                failure
            );
            return Err(SimulationError::Oracle {
                failure: Box::new(failure),
                partial: Box::new(aggregate),
            });
        }

        let status = if aggregate.trials() < total {
            warn!("Run cancelled after {}/{} trials", aggregate.trials(), total);
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };

        info!(
            "Simulation finished: {} trials in {:.2?}",
            aggregate.trials(),
            started.elapsed()
        );

        Ok(RunOutcome {
            status,
            aggregate,
            trials_requested: total,
            random_seed: seed,
            start_week: self.config.start_week,
        })
    }

    fn run_batches(&self, seed: u64) -> Vec<BatchResult> {
        let total = self.config.number_of_trials;
        let batch_size = self.config.batch_size as u64;
        let abort = AtomicBool::new(false);
        let completed = AtomicU64::new(0);

        batch_ranges(total, batch_size)
            .into_par_iter()
            .map(|range| self.run_batch(range, seed, &abort, &completed))
            .collect()
    }

    fn run_batch(
        &self,
        trials: Range<u64>,
        seed: u64,
        abort: &AtomicBool,
        completed: &AtomicU64,
    ) -> BatchResult {
        let mut result = BatchResult::default();
        for trial in trials {
            if abort.load(Ordering::Relaxed) || self.is_cancelled() {
                return result;
            }
            match self.run_trial(trial, seed) {
                Ok(outcome) => result.aggregate.record(&outcome),
                Err(failure) => {
                    abort.store(true, Ordering::Relaxed);
                    result.failure = Some(failure);
                    return result;
                }
            }
        }

        let done = completed.fetch_add(result.aggregate.trials(), Ordering::Relaxed)
            + result.aggregate.trials();
        debug!("Batch done: {}/{} trials", done, self.config.number_of_trials);
        if let Some(progress) = &self.progress {
            progress(done, self.config.number_of_trials);
        }
        result
    }

    /// One complete season plus postseason.
    fn run_trial(&self, trial: u64, seed: u64) -> Result<TrialOutcome, FailedMatchup> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(trial);

        let mut standings = self.base_standings.clone();
        let mut ratings = self.base_ratings.clone();

        for pending in &self.pending {
            let game = pending.game;
            let matchup = Matchup::new(&game.home_team, &game.away_team, &pending.context);
            let p = self
                .oracle
                .win_probability(&matchup, &ratings)
                .and_then(check_probability)
                .map_err(|source| FailedMatchup {
                    trial,
                    stage: SimulationStage::RegularSeason { week: game.week },
                    home: game.home_team.clone(),
                    away: game.away_team.clone(),
                    context: pending.context.clone(),
                    source,
                })?;

            let outcome = if rng.gen::<f64>() < p {
                GameOutcome::HomeWin
            } else {
                GameOutcome::AwayWin
            };
            standings.apply(&game.home_team, &game.away_team, outcome);
            ratings.apply_result(
                &game.home_team,
                &game.away_team,
                p,
                outcome,
                self.config.rating_k_factor,
            );
        }

        let seeds = SeedingResolver::new(&self.data.league).resolve(&standings);
        let bracket = BracketSimulator::new(self.oracle, &ratings)
            .with_quarterbacks(&self.quarterbacks)
            .simulate(trial, &seeds, &mut rng)?;

        Ok(TrialOutcome::from_results(&seeds, &bracket))
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, |c| c.is_cancelled())
    }
}

/// Split the schedule into (decided, pending).
///
/// Without a start week, final games are decided. With one, only final games
/// before that week are decided; everything else is replayed.
fn partition(schedule: &[Game], start_week: Option<i32>) -> (Vec<&Game>, Vec<&Game>) {
    schedule.iter().partition(|game| match start_week {
        Some(week) => game.week < week && game.is_final(),
        None => game.is_final(),
    })
}

fn batch_ranges(total: u64, batch_size: u64) -> Vec<Range<u64>> {
    let batch_size = batch_size.max(1);
    (0..total)
        .step_by(batch_size as usize)
        .map(|start| start..(start + batch_size).min(total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;
    use crate::types::Team;
    use std::sync::Mutex;

    /// 2 conferences x 2 divisions x 4 teams; every team plays its division
    /// rivals at home in weeks 1-3.
    fn league_data() -> LeagueData {
        let mut teams = Vec::new();
        let mut schedule = Vec::new();
        for conference in ["AFC", "NFC"] {
            for division in ["East", "West"] {
                let keys: Vec<String> = (1..=4)
                    .map(|i| format!("{}{}{}", &conference[..1], &division[..1], i))
                    .collect();
                for key in &keys {
                    teams.push(Team::new(key, conference, division));
                }
                for (week, (h, a)) in [(0, 1), (2, 3), (0, 2), (1, 3), (0, 3), (1, 2)]
                    .into_iter()
                    .enumerate()
                {
                    schedule.push(Game::scheduled(week as i32 / 2 + 1, &keys[h], &keys[a]));
                }
            }
        }
        LeagueData::new(teams, schedule).unwrap()
    }

    struct Constant(f64);

    impl WinProbabilityOracle for Constant {
        fn win_probability(&self, _: &Matchup<'_>, _: &RatingSnapshot) -> Result<f64, OracleError> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_batch_ranges_cover_all_trials() {
        let ranges = batch_ranges(1001, 250);
        assert_eq!(ranges.len(), 5);
        assert_eq!(ranges[4], 1000..1001);
        assert_eq!(ranges.iter().map(|r| r.end - r.start).sum::<u64>(), 1001);
    }

    #[test]
    fn test_partition_by_status_and_start_week() {
        let schedule = vec![
            Game::final_score(1, "A", "B", 10, 3),
            Game::final_score(2, "B", "C", 7, 14),
            Game::scheduled(3, "C", "A"),
            Game::scheduled(1, "C", "D"),
        ];
        let (decided, pending) = partition(&schedule, None);
        assert_eq!((decided.len(), pending.len()), (2, 2));

        // Week 2 final is replayed; the unplayed week 1 game stays pending.
        let (decided, pending) = partition(&schedule, Some(2));
        assert_eq!(decided.len(), 1);
        assert_eq!(pending.len(), 3);
    }

    #[test]
    fn test_zero_trials_fail_before_running() {
        let data = league_data();
        let ratings = RatingSnapshot::default();
        let oracle = Constant(0.5);
        let result = SeasonSimulator::new(&data, &oracle, &ratings, SimulationConfig::new(0));
        assert!(matches!(result, Err(ConfigError::NoTrials)));
    }

    #[test]
    fn test_pending_games_are_week_ordered() {
        let mut data = league_data();
        data.schedule.reverse();
        let ratings = RatingSnapshot::default();
        let oracle = Constant(0.5);
        let sim = SeasonSimulator::new(&data, &oracle, &ratings, SimulationConfig::new(1)).unwrap();
        assert_eq!(sim.pending_games(), 24);
        assert!(sim.pending.windows(2).all(|w| w[0].game.week <= w[1].game.week));
    }

    #[test]
    fn test_ratings_update_within_a_trial() {
        struct Probe(Mutex<Vec<f64>>);
        impl WinProbabilityOracle for Probe {
            fn win_probability(&self, m: &Matchup<'_>, r: &RatingSnapshot) -> Result<f64, OracleError> {
                if m.home == "AE1" {
                    self.0.lock().unwrap().push(r.get("AE1"));
                }
                Ok(0.5)
            }
        }

        let data = league_data();
        let ratings = RatingSnapshot::default();
        let probe = Probe(Mutex::new(Vec::new()));
        let sim = SeasonSimulator::new(&data, &probe, &ratings, SimulationConfig::new(1).with_seed(3)).unwrap();
        sim.run().unwrap();

        let seen = probe.0.lock().unwrap();
        // Weeks 1, 2, 3 at home; playoff games may add more.
        assert!(seen.len() >= 3);
        assert_eq!(seen[0], 1500.0);
        assert!((seen[1] - 1500.0).abs() == 10.0, "week 1 result should move the rating: {}", seen[1]);
        // Base snapshot is untouched
        assert_eq!(ratings.get("AE1"), 1500.0);
    }

    #[test]
    fn test_cancelled_run_reports_partial() {
        let data = league_data();
        let ratings = RatingSnapshot::default();
        let oracle = Constant(0.5);
        let flag = CancelFlag::new();
        flag.cancel();

        let sim = SeasonSimulator::new(&data, &oracle, &ratings, SimulationConfig::new(100).with_seed(1))
            .unwrap()
            .with_cancel_flag(flag);
        let outcome = sim.run().unwrap();
        assert_eq!(outcome.status, RunStatus::Cancelled);
        assert_eq!(outcome.trials_completed(), 0);
        assert_eq!(outcome.trials_requested, 100);
    }

    #[test]
    fn test_progress_reaches_total() {
        let data = league_data();
        let ratings = RatingSnapshot::default();
        let oracle = Constant(0.5);
        let last = AtomicU64::new(0);

        let sim = SeasonSimulator::new(
            &data,
            &oracle,
            &ratings,
            SimulationConfig::new(40).with_seed(1).with_batch_size(7),
        )
        .unwrap()
        .with_progress(|done, total| {
            assert_eq!(total, 40);
            last.fetch_max(done, Ordering::Relaxed);
        });
        let outcome = sim.run().unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(last.load(Ordering::Relaxed), 40);
    }

    #[test]
    fn test_short_conferences_crown_no_champion() {
        // 8 teams per conference is enough for 7 seeds; drop one division to leave 4.
        let full = league_data();
        let teams: Vec<Team> = full
            .league
            .teams()
            .iter()
            .filter(|t| !(t.conference == "NFC" && t.division == "West"))
            .cloned()
            .collect();
        let schedule: Vec<Game> = full
            .schedule
            .iter()
            .filter(|g| !g.home_team.starts_with("NW"))
            .cloned()
            .collect();
        let data = LeagueData::new(teams, schedule).unwrap();
        let ratings = RatingSnapshot::default();
        let oracle = Constant(0.5);

        let outcome = SeasonSimulator::new(&data, &oracle, &ratings, SimulationConfig::new(20).with_seed(9))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(outcome.aggregate.trials(), 20);
        assert_eq!(outcome.aggregate.total_championships(), 0);
    }
}
