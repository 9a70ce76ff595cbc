mod common;
mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use common::scenario::{get_scenario, list_scenarios};
use common::split_csv;
use logic::{
    CalibrationAggregate, CalibrationRecord, LogicTester, SeasonRunner, aggregate_calibration,
    resolve_seed_inputs, run_calibration, validate_calibration_targets,
};
use rivalry_engine::EngineConfig;

#[derive(Debug, Parser)]
#[command(name = "rivalry-sim", version = "0.1.0")]
#[command(about = "Seeded season simulator and QA harness for the fitness rivalry engine")]
struct Args {
    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated; decimal or 0x-prefixed hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Season length for the calibration sweep, in weeks
    #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(1..))]
    weeks: u32,

    /// Run extended acceptance sweeps (forces ≥100 calibration iterations)
    #[arg(long)]
    acceptance: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Engine configuration as JSON (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let config = load_engine_config(args.config.as_deref())?;
    let calibration_iterations = compute_calibration_iterations(&args);
    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let runner = SeasonRunner::new(config, args.verbose);

    let all_results = run_logic_scenarios(&args, &scenarios, &seeds, &runner);

    let (calibration_records, calibration_aggregates) =
        gather_calibration(&args, &runner, &seeds, calibration_iterations)?;

    write_reports(
        &args,
        &all_results,
        calibration_records.as_deref(),
        calibration_aggregates.as_deref(),
        start_time,
    )?;

    if let Some(aggregates) = calibration_aggregates.as_ref() {
        let record_slice = calibration_records.as_deref().unwrap_or(&[]);
        validate_calibration_targets(aggregates, record_slice)?;
    }

    if all_results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = EngineConfig::from_json(&raw)
        .with_context(|| format!("invalid engine config in {}", path.display()))?;
    info!("loaded engine config from {}", path.display());
    Ok(config)
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
    println!("{}", "🏋️ Rivalry Season Simulator".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn compute_calibration_iterations(args: &Args) -> usize {
    if args.acceptance {
        if args.iterations < 100 {
            println!(
                "🔁 Acceptance mode enabled: increasing calibration iterations from {} to 100",
                args.iterations
            );
        } else {
            println!(
                "🔁 Acceptance mode enabled: using {} calibration iterations",
                args.iterations
            );
        }
        args.iterations.max(100)
    } else {
        args.iterations
    }
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
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
    seeds: &[u64],
    runner: &SeasonRunner,
) -> Vec<logic::ScenarioResult> {
    println!("{}", "🧠 Running Season Scenarios".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(runner.clone());
    let mut results = Vec::new();

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(logic_tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

type CalibrationSummary = (
    Option<Vec<CalibrationRecord>>,
    Option<Vec<CalibrationAggregate>>,
);

fn gather_calibration(
    args: &Args,
    runner: &SeasonRunner,
    seeds: &[u64],
    calibration_iterations: usize,
) -> Result<CalibrationSummary> {
    let require_calibration =
        args.acceptance || matches!(args.report.as_str(), "console" | "csv");
    if !require_calibration {
        return Ok((None, None));
    }

    println!("{}", "🎯 Running Calibration Sweep".bright_magenta().bold());
    println!("{}", "-".repeat(30).magenta());

    let records = run_calibration(runner, seeds, calibration_iterations, args.weeks)?;
    let aggregates = aggregate_calibration(&records);
    Ok((Some(records), Some(aggregates)))
}

fn write_reports(
    args: &Args,
    results: &[logic::ScenarioResult],
    calibration_records: Option<&[CalibrationRecord]>,
    calibration_aggregates: Option<&[CalibrationAggregate]>,
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
                    "# Rivalry Season Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        "csv" => {
            if let Some(records) = calibration_records {
                logic::reports::generate_csv_report(&mut output_target, records)?;
            } else {
                writeln!(&mut output_target, "[]")?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No season scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    calibration_aggregates.unwrap_or(&[]),
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
