use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::playability::{PlayabilityAggregate, PlayabilityRecord};
use super::tester::ScenarioResult;

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    aggregates: &[PlayabilityAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(passed_tests, total_tests))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{} {} (seed {})",
            status,
            result.scenario_name.bold(),
            result.seed
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    if let (Some(fastest), Some(slowest)) = (
        results.iter().min_by_key(|r| r.average_duration),
        results.iter().max_by_key(|r| r.average_duration),
    ) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
        writeln!(out)?;
    }

    if !aggregates.is_empty() {
        writeln!(out, "{}", "⚽ Keeper Balance".bright_green().bold())?;
        writeln!(out, "{}", "================".green())?;
        for aggregate in aggregates {
            writeln!(
                out,
                "{} [{}] | runs {} champion {:.1}% attempts {:.1} ± {:.1} quiz {:.2}",
                aggregate.scenario_name.bold(),
                aggregate.strategy,
                aggregate.iterations,
                aggregate.champion_rate * 100.0,
                aggregate.mean_attempts,
                aggregate.std_attempts,
                aggregate.mean_quiz_success
            )?;
            for city in &aggregate.cities {
                writeln!(
                    out,
                    "   {:<10} shots {:>6} saved {:>5.1}% keeper read {:>5.1}% (p {:.2})",
                    city.city.name(),
                    city.shots,
                    city.save_rate() * 100.0,
                    city.guess_rate() * 100.0,
                    city.save_probability
                )?;
            }
        }
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, results)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Fluency FC Logic Test Results\n")?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {}", total_tests - passed_tests)?;
    writeln!(
        out,
        "- **Success rate**: {:.1}%\n",
        success_rate(passed_tests, total_tests)
    )?;

    writeln!(out, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(out, "### {} {} (seed {})\n", status, result.scenario_name, result.seed)?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// One row per run and city, for spreadsheet analysis of keeper balance.
pub fn generate_csv_report(out: &mut dyn Write, records: &[PlayabilityRecord]) -> Result<()> {
    writeln!(
        out,
        "scenario,strategy,seed_label,seed,champion,attempts,gave_up_in,city,shots,saves,keeper_reads,quiz_rating"
    )?;
    for record in records {
        let gave_up = record.gave_up_in.map_or("", |city| city.key());
        for (city, shots) in &record.cities {
            let rating = record
                .quiz_ratings
                .get(city)
                .map_or("", |rating| rating.as_str());
            writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{},{},{}",
                csv_field(&record.scenario_name),
                record.strategy,
                csv_field(&record.seed_label),
                record.seed_value,
                record.champion,
                record.attempts,
                gave_up,
                city.key(),
                shots.shots,
                shots.saves,
                shots.guesses,
                rating
            )?;
        }
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let passed = u32::try_from(passed).unwrap_or(u32::MAX);
    let total = u32::try_from(total).unwrap_or(u32::MAX);
    f64::from(passed) / f64::from(total) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::policy::GameplayStrategy;
    use fluency_game::{City, QuizRating};
    use std::collections::BTreeMap;

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke".into(),
            seed: 1337,
            passed,
            iterations_run: 2,
            successful_iterations: usize::from(passed) * 2,
            failures: if passed {
                Vec::new()
            } else {
                vec!["Iteration 1: boom".into()]
            },
            average_duration: Duration::from_millis(3),
            performance_data: vec![Duration::from_millis(3)],
        }
    }

    fn sample_record() -> PlayabilityRecord {
        let mut cities = BTreeMap::new();
        cities.insert(
            City::Sevilla,
            crate::logic::playability::CityShots {
                shots: 2,
                saves: 1,
                guesses: 1,
            },
        );
        let mut quiz_ratings = BTreeMap::new();
        quiz_ratings.insert(City::Sevilla, QuizRating::Fair);
        PlayabilityRecord {
            scenario_name: "Full Tournament - Corners".into(),
            strategy: GameplayStrategy::Corners,
            seed_label: "0x2a".into(),
            seed_value: 42,
            champion: false,
            attempts: 2,
            gave_up_in: Some(City::Sevilla),
            cities,
            quiz_ratings,
            keeper_consistent: true,
        }
    }

    #[test]
    fn csv_has_one_row_per_city() {
        let mut out = Vec::new();
        generate_csv_report(&mut out, &[sample_record()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "Full Tournament - Corners,Corners,0x2a,42,false,2,sevilla,sevilla,2,1,1,fair"
        );
    }

    #[test]
    fn markdown_lists_failures() {
        let mut out = Vec::new();
        generate_markdown_report(&mut out, &[sample_result(true), sample_result(false)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("# Fluency FC Logic Test Results"));
        assert!(text.contains("- **Failed**: 1"));
        assert!(text.contains("  - Iteration 1: boom"));
    }

    #[test]
    fn json_round_trips_results() {
        let mut out = Vec::new();
        generate_json_report(&mut out, &[sample_result(true)]).unwrap();
        let parsed: Vec<ScenarioResult> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0].scenario_name, "Smoke");
        assert_eq!(parsed[0].seed, 1337);
    }

    #[test]
    fn console_handles_empty_results() {
        let mut out = Vec::new();
        generate_console_report(&mut out, &[], &[], Duration::ZERO).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Total scenarios: 0"));
        assert!(text.contains("Success rate: 0.0%"));
    }

    #[test]
    fn console_labels_keeper_balance_by_strategy() {
        let aggregate = PlayabilityAggregate {
            scenario_name: "Full Tournament - Corners".into(),
            strategy: GameplayStrategy::Corners,
            iterations: 3,
            champion_rate: 1.0,
            mean_attempts: 5.0,
            std_attempts: 1.0,
            mean_quiz_success: 0.9,
            cities: vec![crate::logic::playability::CityAggregate {
                city: City::Barcelona,
                save_probability: 0.1,
                shots: 10,
                saves: 1,
                guesses: 1,
            }],
        };
        let mut out = Vec::new();
        generate_console_report(&mut out, &[], &[aggregate], Duration::ZERO).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[Corners] | runs 3"));
        assert!(text.contains("(p 0.10)"));
    }

    #[test]
    fn quotes_csv_fields_with_commas() {
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("plain"), "plain");
    }
}
