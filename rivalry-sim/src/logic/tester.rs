use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::common::scenario::TestScenario;
use crate::logic::season::{SeasonPlan, SeasonRunner, SeasonSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
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
    runner: SeasonRunner,
}

impl LogicTester {
    pub const fn new(runner: SeasonRunner) -> Self {
        Self { runner }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.runner.verbose() {
                println!(
                    "🧪 Testing scenario: {} ({} vs {}, seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.athlete,
                    scenario.plan.opponent,
                    seed
                );
            }

            let result = self.run_single_scenario(scenario, seed, iterations);
            results.push(result);
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let (successes, failures, performance_data) =
            self.run_season_iterations(&scenario.plan, seed, iterations);

        let avg_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration: avg_duration,
            performance_data,
        }
    }

    fn run_season_iterations(
        &self,
        plan: &SeasonPlan,
        seed: u64,
        iterations: usize,
    ) -> (usize, Vec<String>, Vec<Duration>) {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let outcome = self
                .runner
                .run_plan(plan, iteration_seed)
                .map_err(|err| (format!("{err:#}"), None))
                .and_then(|summary| match evaluate_expectations(plan, &summary) {
                    Some(err) => Err((err, Some(summary))),
                    None => Ok(summary),
                });

            match outcome {
                Ok(summary) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);

                    if self.runner.verbose() {
                        let metrics = &summary.metrics;
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) W/L/T {}/{}/{} respect:{} heat:{}",
                            i + 1,
                            iterations,
                            metrics.user_wins,
                            metrics.rival_wins,
                            metrics.ties,
                            metrics.final_respect,
                            metrics.final_heat
                        );
                    }
                }
                Err((err, summary)) => {
                    let context = summary
                        .as_ref()
                        .map_or_else(|| "season aborted".to_string(), summarize_last_weeks);
                    failures.push(format!(
                        "Iteration {} ({} vs {}, seed {}, weeks {}): {} | {}",
                        i + 1,
                        plan.athlete,
                        plan.opponent,
                        iteration_seed,
                        plan.weeks,
                        err,
                        context
                    ));

                    if self.runner.verbose() {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            err.clone().red()
                        );
                        println!("     ↳ Seed {iteration_seed} | {context}");
                    }
                }
            }
        }

        (successes, failures, performance_data)
    }
}

fn evaluate_expectations(plan: &SeasonPlan, summary: &SeasonSummary) -> Option<String> {
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(err.to_string());
        }
    }
    None
}

fn summarize_last_weeks(summary: &SeasonSummary) -> String {
    if summary.weeks.is_empty() {
        return "no weeks played".to_string();
    }

    summary
        .weeks
        .iter()
        .rev()
        .take(3)
        .map(|week| {
            let encounter = &week.encounter;
            format!(
                "{}: {} by {:.1} ({}) respect {} heat {} streak {}",
                encounter.week(),
                encounter.winner(),
                encounter.winning_margin(),
                encounter.result.dominant_factor.as_str(),
                week.relationship.respect_level,
                week.relationship.rivalry_heat,
                week.relationship.win_streak
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
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
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::athlete::AthleteProfile;
    use crate::logic::season::Opponent;
    use rivalry_engine::{EngineConfig, Personality};

    fn tester() -> LogicTester {
        LogicTester::new(SeasonRunner::new(EngineConfig::default(), false))
    }

    fn plan() -> SeasonPlan {
        SeasonPlan::new(
            AthleteProfile::Steady,
            Opponent::phantom(Personality::Mirror),
        )
        .with_weeks(3)
    }

    #[test]
    fn passing_expectations_count_as_successes() {
        let scenario = TestScenario::simulation(
            "three weeks",
            plan().with_expectation(|summary: &SeasonSummary| -> anyhow::Result<()> {
                anyhow::ensure!(summary.weeks.len() == 3, "expected three weeks");
                Ok(())
            }),
        );
        let results = tester().run_scenario(&scenario, &[1, 2], 2);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.passed));
        assert!(results.iter().all(|r| r.successful_iterations == 2));
    }

    #[test]
    fn failures_carry_seed_and_last_weeks() {
        let scenario = TestScenario::simulation(
            "always fails",
            plan().with_expectation(|_: &SeasonSummary| -> anyhow::Result<()> {
                anyhow::bail!("nope")
            }),
        );
        let results = tester().run_scenario(&scenario, &[9], 1);
        let result = &results[0];
        assert!(!result.passed);
        assert_eq!(result.successful_iterations, 0);
        assert!(result.failures[0].contains("seed 9"));
        assert!(result.failures[0].contains("nope"));
        assert!(result.failures[0].contains("2026-W03"));
    }

    #[test]
    fn durations_serialize_as_millis() {
        let result = ScenarioResult {
            scenario_name: "x".to_string(),
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(12),
            performance_data: vec![Duration::from_millis(12), Duration::from_millis(3)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 12);
        assert_eq!(json["performance_data"][1], 3);
        let back: ScenarioResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.performance_data.len(), 2);
    }
}
