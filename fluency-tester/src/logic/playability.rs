use anyhow::{Context, Result, ensure};
use std::collections::{BTreeMap, HashSet};

use fluency_game::{City, QuizRating, QuizThresholds};

use crate::logic::policy::GameplayStrategy;
use crate::logic::seeds::SeedInfo;
use crate::logic::simulation::{GameTester, SimulationPlan, SimulationSummary};

/// Strategies swept by the playability analysis.
const PLAYABILITY_STRATEGIES: &[GameplayStrategy] = &GameplayStrategy::ALL;

/// Attempts allowed per city before a simulated player walks away.
pub const PLAYABILITY_MAX_ATTEMPTS: u32 = 200;

/// Below this many shots a city's keeper rate is too noisy to check.
const MIN_SHOTS_FOR_RATE_CHECK: usize = 400;

/// Allowed deviation of the observed keeper rate, in standard errors.
const RATE_TOLERANCE_SIGMAS: f64 = 4.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CityShots {
    pub shots: usize,
    pub saves: usize,
    pub guesses: usize,
}

#[derive(Debug, Clone)]
pub struct PlayabilityRecord {
    pub scenario_name: String,
    pub strategy: GameplayStrategy,
    pub seed_label: String,
    pub seed_value: u64,
    pub champion: bool,
    pub attempts: usize,
    pub gave_up_in: Option<City>,
    pub cities: BTreeMap<City, CityShots>,
    pub quiz_ratings: BTreeMap<City, QuizRating>,
    /// Every guessed shot was saved and every wrong guess conceded.
    pub keeper_consistent: bool,
}

impl PlayabilityRecord {
    fn from_summary(scenario_name: String, seed: &SeedInfo, summary: &SimulationSummary) -> Self {
        let mut cities: BTreeMap<City, CityShots> = BTreeMap::new();
        for shot in &summary.shots {
            let entry = cities.entry(shot.city).or_default();
            entry.shots += 1;
            if !shot.result.outcome.is_goal() {
                entry.saves += 1;
            }
            if shot.result.keeper_guessed {
                entry.guesses += 1;
            }
        }
        let keeper_consistent = summary
            .shots
            .iter()
            .all(|shot| shot.result.keeper_guessed != shot.result.outcome.is_goal());
        Self {
            scenario_name,
            strategy: summary.strategy,
            seed_label: seed.label(),
            seed_value: summary.seed,
            champion: summary.champion(),
            attempts: summary.shots.len(),
            gave_up_in: summary.gave_up_in,
            cities,
            quiz_ratings: summary
                .quiz_scores
                .iter()
                .map(|(city, score)| (*city, score.rating()))
                .collect(),
            keeper_consistent,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CityAggregate {
    pub city: City,
    pub save_probability: f64,
    pub shots: usize,
    pub saves: usize,
    pub guesses: usize,
}

impl CityAggregate {
    #[must_use]
    pub fn guess_rate(&self) -> f64 {
        ratio(self.guesses, self.shots)
    }

    #[must_use]
    pub fn save_rate(&self) -> f64 {
        ratio(self.saves, self.shots)
    }
}

#[derive(Debug, Clone)]
pub struct PlayabilityAggregate {
    pub scenario_name: String,
    pub strategy: GameplayStrategy,
    pub iterations: usize,
    pub champion_rate: f64,
    pub mean_attempts: f64,
    pub std_attempts: f64,
    /// Mean recorded quiz success across all cities played.
    pub mean_quiz_success: f64,
    pub cities: Vec<CityAggregate>,
}

pub fn run_playability_analysis(
    tester: &GameTester,
    seeds: &[SeedInfo],
    iterations: usize,
) -> Result<Vec<PlayabilityRecord>> {
    run_playability_analysis_with(tester, seeds, iterations, playability_plan)
}

fn playability_plan(strategy: GameplayStrategy) -> SimulationPlan {
    SimulationPlan::new(strategy)
        .with_max_attempts(PLAYABILITY_MAX_ATTEMPTS)
        .with_expectation(|summary: &SimulationSummary| -> Result<()> {
            ensure!(
                summary.champion() || summary.gave_up_in.is_some(),
                "run ended neither as champion nor by giving up"
            );
            Ok(())
        })
}

fn run_playability_analysis_with<F>(
    tester: &GameTester,
    seeds: &[SeedInfo],
    iterations: usize,
    mut plan_builder: F,
) -> Result<Vec<PlayabilityRecord>>
where
    F: FnMut(GameplayStrategy) -> SimulationPlan,
{
    let iterations = iterations.max(1);
    let mut records =
        Vec::with_capacity(seeds.len() * PLAYABILITY_STRATEGIES.len() * iterations);

    for &strategy in PLAYABILITY_STRATEGIES {
        let plan = plan_builder(strategy);
        for seed in seeds {
            for iteration in 0..iterations {
                let iteration_offset = u64::try_from(iteration).unwrap_or(0);
                let iteration_seed = seed.seed.wrapping_add(iteration_offset);
                let context = || {
                    format!(
                        "playability run failed for strategy {strategy}, seed {} (iteration {})",
                        seed.label(),
                        iteration + 1
                    )
                };
                let summary = tester.run_plan(&plan, iteration_seed).with_context(context)?;
                for expectation in &plan.expectations {
                    expectation.evaluate(&summary).with_context(context)?;
                }
                let scenario_name = format!("Full Tournament - {strategy}");
                records.push(PlayabilityRecord::from_summary(scenario_name, seed, &summary));
            }
        }
    }

    Ok(records)
}

pub fn aggregate_playability(records: &[PlayabilityRecord]) -> Vec<PlayabilityAggregate> {
    let mut aggregates: BTreeMap<String, AggregateBuilder> = BTreeMap::new();
    for record in records {
        aggregates
            .entry(record.scenario_name.clone())
            .or_insert_with(|| AggregateBuilder::new(record))
            .ingest(record);
    }
    aggregates
        .into_values()
        .map(AggregateBuilder::finish)
        .collect()
}

/// Check keeper behaviour and replay determinism across the collected runs.
pub fn validate_playability_targets(
    tester: &GameTester,
    aggregates: &[PlayabilityAggregate],
    records: &[PlayabilityRecord],
) -> Result<()> {
    validate_keeper_consistency(records)?;
    validate_keeper_rates(aggregates)?;
    validate_replay_determinism(tester, records)?;
    Ok(())
}

fn validate_keeper_consistency(records: &[PlayabilityRecord]) -> Result<()> {
    for record in records {
        ensure!(
            record.keeper_consistent,
            "keeper guess and outcome disagree for {} seed {}",
            record.scenario_name,
            record.seed_label
        );
    }
    Ok(())
}

fn validate_keeper_rates(aggregates: &[PlayabilityAggregate]) -> Result<()> {
    for aggregate in aggregates {
        for city in &aggregate.cities {
            if city.shots < MIN_SHOTS_FOR_RATE_CHECK {
                log::debug!(
                    "{}: {} has only {} shots, skipping rate check",
                    aggregate.scenario_name,
                    city.city,
                    city.shots
                );
                continue;
            }
            let tolerance = rate_tolerance(city.save_probability, city.shots);
            let observed = city.guess_rate();
            ensure!(
                (observed - city.save_probability).abs() <= tolerance,
                "{}: {} keeper guessed {observed:.3} of {} shots, expected {:.3} ± {tolerance:.3}",
                aggregate.scenario_name,
                city.city,
                city.shots,
                city.save_probability
            );
        }
    }
    Ok(())
}

fn validate_replay_determinism(tester: &GameTester, records: &[PlayabilityRecord]) -> Result<()> {
    let mut checked = HashSet::new();
    for record in records {
        if !checked.insert(record.strategy) {
            continue;
        }
        let plan = playability_plan(record.strategy);
        let replay = tester
            .run_plan(&plan, record.seed_value)
            .context("replaying playability seed")?;
        let replayed = PlayabilityRecord::from_summary(
            record.scenario_name.clone(),
            &SeedInfo::from_numeric(record.seed_value),
            &replay,
        );
        ensure!(
            replayed.cities == record.cities && replayed.champion == record.champion,
            "replay of {} seed {} diverged",
            record.scenario_name,
            record.seed_label
        );
    }
    Ok(())
}

/// Binomial standard error scaled by [`RATE_TOLERANCE_SIGMAS`], with a
/// small floor for probabilities at the edges of `[0, 1]`.
fn rate_tolerance(p: f64, shots: usize) -> f64 {
    let n = usize_to_f64(shots.max(1));
    let std_err = (p * (1.0 - p) / n).sqrt();
    (std_err * RATE_TOLERANCE_SIGMAS).max(0.005)
}

struct AggregateBuilder {
    scenario_name: String,
    strategy: GameplayStrategy,
    attempts: RunningStats,
    champions: usize,
    quiz_success_sum: f64,
    quiz_count: usize,
    cities: BTreeMap<City, CityShots>,
}

impl AggregateBuilder {
    fn new(record: &PlayabilityRecord) -> Self {
        Self {
            scenario_name: record.scenario_name.clone(),
            strategy: record.strategy,
            attempts: RunningStats::default(),
            champions: 0,
            quiz_success_sum: 0.0,
            quiz_count: 0,
            cities: BTreeMap::new(),
        }
    }

    fn ingest(&mut self, record: &PlayabilityRecord) {
        self.attempts.add(usize_to_f64(record.attempts));
        if record.champion {
            self.champions += 1;
        }
        let thresholds = QuizThresholds::default();
        for rating in record.quiz_ratings.values() {
            self.quiz_success_sum += thresholds.success(*rating);
            self.quiz_count += 1;
        }
        for (city, shots) in &record.cities {
            let entry = self.cities.entry(*city).or_default();
            entry.shots += shots.shots;
            entry.saves += shots.saves;
            entry.guesses += shots.guesses;
        }
    }

    fn finish(self) -> PlayabilityAggregate {
        let iterations = usize::try_from(self.attempts.count).unwrap_or(usize::MAX);
        let matches = fluency_game::MatchTable::default();
        PlayabilityAggregate {
            scenario_name: self.scenario_name,
            strategy: self.strategy,
            iterations,
            champion_rate: ratio(self.champions, iterations),
            mean_attempts: self.attempts.mean(),
            std_attempts: self.attempts.std_dev(),
            mean_quiz_success: if self.quiz_count == 0 {
                0.0
            } else {
                self.quiz_success_sum / usize_to_f64(self.quiz_count)
            },
            cities: self
                .cities
                .into_iter()
                .map(|(city, shots)| CityAggregate {
                    city,
                    save_probability: matches.save_probability(city),
                    shots: shots.shots,
                    saves: shots.saves,
                    guesses: shots.guesses,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Clone)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let count = f64::from(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    fn variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / f64::from(self.count - 1)
        } else {
            0.0
        }
    }

    fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        usize_to_f64(part) / usize_to_f64(whole)
    }
}

fn usize_to_f64(value: usize) -> f64 {
    // counts stay far below 2^32
    f64::from(u32::try_from(value).unwrap_or(u32::MAX))
}
