mod common;
mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::scenario::{get_scenario, list_scenarios};
use common::split_csv;
use logic::{
    GameTester, LogicTester, PlayabilityAggregate, PlayabilityRecord, SeedInfo,
    aggregate_playability, resolve_seed_inputs, run_playability_analysis,
    validate_playability_targets,
};

const ACCEPTANCE_ITERATIONS: usize = 100;

#[derive(Debug, Parser)]
#[command(name = "fluency-tester", version)]
#[command(about = "Automated QA for the Fluency FC penalty engine and tournament flow")]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds: integers, 0x hex, or ranges like 1..10 (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Raise playability iterations to the acceptance sample size
    #[arg(long)]
    acceptance: bool,

    /// Report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose per-iteration output
    #[arg(short, long)]
    verbose: bool,

    /// Write the report to a file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let playability_iterations = compute_playability_iterations(&args);
    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seed_tokens = split_csv(&args.seeds);
    let seed_infos = resolve_seed_inputs(&seed_tokens)?;
    let logic_seeds: Vec<u64> = seed_infos.iter().map(|s| s.seed).collect();
    let game_tester = GameTester::new(args.verbose);

    let all_results = run_logic_scenarios(&args, &scenarios, &logic_seeds);

    let (playability_records, playability_aggregates) =
        gather_playability(&args, &game_tester, &seed_infos, playability_iterations)?;

    write_reports(
        &args,
        &all_results,
        playability_records.as_deref(),
        playability_aggregates.as_deref(),
        start_time,
    )?;

    if let Some(aggregates) = playability_aggregates.as_ref() {
        let record_slice = playability_records.as_deref().unwrap_or(&[]);
        validate_playability_targets(&game_tester, aggregates, record_slice)?;
    }

    if all_results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎮 Fluency FC Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn compute_playability_iterations(args: &Args) -> usize {
    if args.acceptance {
        if args.iterations < ACCEPTANCE_ITERATIONS {
            println!(
                "🔁 Acceptance mode enabled: increasing playability iterations from {} to {ACCEPTANCE_ITERATIONS}",
                args.iterations
            );
        } else {
            println!(
                "🔁 Acceptance mode enabled: using {} playability iterations",
                args.iterations
            );
        }
        args.iterations.max(ACCEPTANCE_ITERATIONS)
    } else {
        args.iterations
    }
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        scenarios.retain(|s| !s.eq_ignore_ascii_case("all"));
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    logic_seeds: &[u64],
) -> Vec<logic::ScenarioResult> {
    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(args.verbose);
    let mut results = Vec::new();

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(logic_tester.run_scenario(&scenario, logic_seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

type PlayabilitySummary = (
    Option<Vec<PlayabilityRecord>>,
    Option<Vec<PlayabilityAggregate>>,
);

fn gather_playability(
    args: &Args,
    game_tester: &GameTester,
    seed_infos: &[SeedInfo],
    playability_iterations: usize,
) -> Result<PlayabilitySummary> {
    let require_playability =
        args.acceptance || matches!(args.report.as_str(), "console" | "csv");
    if !require_playability {
        return Ok((None, None));
    }
    let records = run_playability_analysis(game_tester, seed_infos, playability_iterations)?;
    let aggregates = aggregate_playability(&records);
    Ok((Some(records), Some(aggregates)))
}

fn write_reports(
    args: &Args,
    results: &[logic::ScenarioResult],
    playability_records: Option<&[PlayabilityRecord]>,
    playability_aggregates: Option<&[PlayabilityAggregate]>,
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Fluency FC Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        "csv" => {
            if let Some(records) = playability_records {
                logic::reports::generate_csv_report(&mut output_target, records)?;
            } else {
                writeln!(&mut output_target, "[]")?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() && playability_aggregates.is_none() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    playability_aggregates.unwrap_or(&[]),
                    duration,
                )?;
            }
        }
    }

    let duration = start_time.elapsed();
    writeln!(&mut output_target)?;
    writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::ScenarioResult;
    use crate::logic::policy::GameplayStrategy;
    use std::time::Duration;

    fn base_args() -> Args {
        Args {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            acceptance: false,
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn temp_file(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "fluency-tester-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke Test".to_string(),
            seed: 1337,
            passed,
            iterations_run: 3,
            successful_iterations: if passed { 3 } else { 2 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["failure".to_string()]
            },
            average_duration: Duration::from_millis(10),
            performance_data: vec![Duration::from_millis(10)],
        }
    }

    #[test]
    fn computes_playability_iterations_for_acceptance() {
        let mut args = base_args();
        args.acceptance = true;
        args.iterations = 5;
        assert_eq!(compute_playability_iterations(&args), ACCEPTANCE_ITERATIONS);
        args.iterations = 250;
        assert_eq!(compute_playability_iterations(&args), 250);
        args.acceptance = false;
        args.iterations = 7;
        assert_eq!(compute_playability_iterations(&args), 7);
    }

    #[test]
    fn expands_all_scenarios_keyword() {
        let scenarios = expand_scenarios("keeper-model,all");
        assert_eq!(scenarios[0], "keeper-model");
        assert_eq!(scenarios.len(), list_scenarios().len());
        assert!(scenarios.contains(&"smoke".to_string()));
    }

    #[test]
    fn expand_scenarios_without_all_preserves_order() {
        assert_eq!(
            expand_scenarios("power-bar, smoke"),
            vec!["power-bar".to_string(), "smoke".to_string()]
        );
    }

    #[test]
    fn gather_playability_skips_json_reports() {
        let args = base_args();
        let tester = GameTester::new(false);
        let (records, aggregates) =
            gather_playability(&args, &tester, &[SeedInfo::from_numeric(1)], 1).unwrap();
        assert!(records.is_none());
        assert!(aggregates.is_none());
    }

    #[test]
    fn gather_playability_covers_every_strategy_for_csv() {
        let mut args = base_args();
        args.report = "csv".to_string();
        let tester = GameTester::new(false);
        let (records, aggregates) =
            gather_playability(&args, &tester, &[SeedInfo::from_numeric(3)], 1).unwrap();
        assert_eq!(records.unwrap().len(), GameplayStrategy::ALL.len());
        assert_eq!(aggregates.unwrap().len(), GameplayStrategy::ALL.len());
    }

    #[test]
    fn write_reports_emits_json_for_results() {
        let path = temp_file("json");
        let mut args = base_args();
        args.output = Some(path.clone());
        write_reports(&args, &[sample_result(true)], None, None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("\"scenario_name\": \"Smoke Test\""));
        assert!(content.contains("Total time"));
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let path = temp_file("md");
        let mut args = base_args();
        args.report = "markdown".to_string();
        args.output = Some(path.clone());
        write_reports(&args, &[], None, None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("_No scenarios executed._"));
    }

    #[test]
    fn write_reports_console_lists_failures() {
        let path = temp_file("console");
        let mut args = base_args();
        args.report = "console".to_string();
        args.output = Some(path.clone());
        write_reports(&args, &[sample_result(false)], None, Some(&[]), Instant::now()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("Total scenarios: 1"));
        assert!(content.contains("failure"));
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let path = temp_file("list");
        let mut args = base_args();
        args.list_scenarios = true;
        args.output = Some(path.clone());
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("Available scenarios:"));
        assert!(content.contains("keeper-model"));
    }

    #[test]
    fn maybe_list_scenarios_returns_false_when_disabled() {
        assert!(!maybe_list_scenarios(&base_args()).unwrap());
    }
}
