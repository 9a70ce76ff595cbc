use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;
use super::calibration::{CalibrationAggregate, CalibrationRecord};

#[allow(clippy::cast_precision_loss)]
fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    passed as f64 / results.len() as f64 * 100.0
}

pub fn generate_console_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[ScenarioResult],
    aggregates: &[CalibrationAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Season Scenario Results".bright_cyan().bold())?;
    writeln!(out, "{}", "==========================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(out, "{} {}", status, result.scenario_name.bold())?;
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

    if aggregates.is_empty() {
        return Ok(());
    }

    writeln!(out, "{}", "🎯 Calibration Summary".bright_magenta().bold())?;
    writeln!(out, "{}", "======================".magenta())?;
    writeln!(
        out,
        "{:<20} {:>5} {:>6} {:>6} {:>6} {:>8} {:>8} {:>7} {:>6} {:>9}",
        "opponent", "runs", "win%", "loss%", "tie%", "margin", "respect", "heat", "lead%", "vs user"
    )?;
    for aggregate in aggregates {
        let ratio = if aggregate.mean_user_volume > 0.0 {
            aggregate.mean_rival_volume / aggregate.mean_user_volume
        } else {
            0.0
        };
        writeln!(
            out,
            "{:<20} {:>5} {:>6.1} {:>6.1} {:>6.1} {:>8.1} {:>8.2} {:>7.1} {:>6.1} {:>8.2}x",
            aggregate.scenario_name,
            aggregate.iterations,
            aggregate.user_win_rate * 100.0,
            aggregate.rival_win_rate * 100.0,
            aggregate.tie_rate * 100.0,
            aggregate.mean_margin,
            aggregate.mean_final_respect,
            aggregate.mean_final_heat,
            aggregate.rival_outgrew_rate * 100.0,
            ratio
        )?;
        if aggregate.chaos_draws > 0 {
            writeln!(
                out,
                "{:<20} chaos {:.3}..{:.3} (mean {:.3} over {} draws)",
                "",
                aggregate.chaos_min,
                aggregate.chaos_max,
                aggregate.chaos_mean,
                aggregate.chaos_draws
            )?;
        }
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[ScenarioResult],
) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[ScenarioResult],
) -> Result<()> {
    writeln!(out, "# Rivalry Season Results\n")?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {failed_tests}")?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(out, "## Detailed Results\n")?;

    for result in results {
        let status = if result.passed { "✅" } else { "❌" };

        writeln!(out, "### {} {}\n", status, result.scenario_name)?;
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

/// One row per calibration season.
pub fn generate_csv_report<W: Write + ?Sized>(
    out: &mut W,
    records: &[CalibrationRecord],
) -> Result<()> {
    writeln!(
        out,
        "scenario,personality,difficulty,seed,encounters,user_wins,rival_wins,ties,final_respect,final_heat,peak_heat,longest_win_streak,longest_lose_streak,mean_margin,mean_user_volume,mean_rival_volume,rival_outgrew_user,growth_weeks,digest"
    )?;
    for record in records {
        let m = &record.metrics;
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{:.3},{:.1},{:.1},{},{},{}",
            record.scenario_name,
            record.personality,
            record.difficulty,
            record.seed,
            m.encounters,
            m.user_wins,
            m.rival_wins,
            m.ties,
            m.final_respect,
            m.final_heat,
            m.peak_heat,
            m.longest_win_streak,
            m.longest_lose_streak,
            m.mean_margin,
            m.mean_user_volume,
            m.mean_rival_volume,
            m.rival_outgrew_user,
            m.growth_weeks,
            record.digest_hex()
        )?;
    }
    Ok(())
}
