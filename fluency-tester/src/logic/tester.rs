use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::common::scenario::TestScenario;
use crate::logic::simulation::{GameTester, SimulationPlan, SimulationSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    verbose: bool,
}

impl LogicTester {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🧪 Testing scenario: {} (strategy: {} seed: {})",
                        scenario.name.bright_white(),
                        scenario.plan.strategy,
                        seed
                    );
                }
                self.run_single_scenario(scenario, seed, iterations)
            })
            .collect()
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let (successes, failures, performance_data) =
            self.run_simulation_iterations(&scenario.plan, seed, iterations);

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
        }
    }

    fn run_simulation_iterations(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        iterations: usize,
    ) -> (usize, Vec<String>, Vec<Duration>) {
        let tester = GameTester::new(self.verbose);

        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let outcome = tester
                .run_plan(plan, iteration_seed)
                .and_then(|summary| evaluate_expectations(plan, &summary).map(|()| summary));

            match outcome {
                Ok(summary) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) attempts:{} champion:{} strategy:{}",
                            i + 1,
                            iterations,
                            summary.shots.len(),
                            summary.champion(),
                            summary.strategy
                        );
                    }
                }
                Err(err) => {
                    let message = format!("{err:#}");
                    failures.push(format!(
                        "Iteration {} (strategy {}, seed {}): {}",
                        i + 1,
                        plan.strategy,
                        iteration_seed,
                        message
                    ));
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            message.red()
                        );
                    }
                }
            }
        }

        (successes, failures, performance_data)
    }
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> anyhow::Result<()> {
    for expectation in &plan.expectations {
        expectation
            .evaluate(summary)
            .map_err(|err| err.context(describe_run(summary)))?;
    }
    Ok(())
}

fn describe_run(summary: &SimulationSummary) -> String {
    let last_shots = summary
        .shots
        .iter()
        .rev()
        .take(3)
        .map(|shot| {
            format!(
                "{} #{}: {} vs keeper {} -> {}",
                shot.city,
                shot.attempt + 1,
                shot.result.shooter,
                shot.result.keeper,
                shot.result.outcome
            )
        })
        .collect::<Vec<_>>();
    let last_shots = if last_shots.is_empty() {
        "no shots recorded".to_string()
    } else {
        last_shots.join(" | ")
    };
    format!(
        "final screen {}, {} shots, champion {} | {}",
        summary.session.screen,
        summary.shots.len(),
        summary.champion(),
        last_shots
    )
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::policy::GameplayStrategy;

    #[test]
    fn failing_expectation_is_reported_with_seed() {
        let plan = SimulationPlan::new(GameplayStrategy::Centre)
            .with_expectation(|_: &SimulationSummary| -> anyhow::Result<()> {
                anyhow::bail!("always fails")
            });
        let scenario = TestScenario::simulation("failing", plan);
        let results = LogicTester::new(false).run_scenario(&scenario, &[10], 2);
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert!(!result.passed);
        assert_eq!(result.successful_iterations, 0);
        assert_eq!(result.failures.len(), 2);
        assert!(result.failures[1].contains("seed 11"));
        assert!(result.failures[0].contains("always fails"));
    }

    #[test]
    fn result_serializes_durations_as_millis() {
        let result = ScenarioResult {
            scenario_name: "x".into(),
            seed: 1,
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(12),
            performance_data: vec![Duration::from_millis(12)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 12);
        assert_eq!(json["performance_data"][0], 12);
        let back: ScenarioResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.average_duration, Duration::from_millis(12));
    }
}
