//! Calibration sweep: every personality at every difficulty against a
//! steady athlete, aggregated and checked against tuning targets.
use anyhow::{Context, Result, ensure};
use rivalry_engine::{Difficulty, Personality};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::common::scenario::catalog::season_invariants;
use crate::logic::athlete::AthleteProfile;
use crate::logic::season::{Opponent, SeasonMetrics, SeasonPlan, SeasonRunner};

/// Chaos draws must stay inside the documented envelope.
const CHAOS_FLOOR: f64 = 0.7;
const CHAOS_CEILING: f64 = 1.3;
/// Share of weeks a mentor phantom must out-grow the athlete.
const MENTOR_LEAD_TARGET: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct CalibrationRecord {
    pub scenario_name: String,
    pub personality: Personality,
    pub difficulty: Difficulty,
    pub seed: u64,
    pub digest: [u8; 32],
    pub metrics: SeasonMetrics,
}

impl CalibrationRecord {
    #[must_use]
    pub fn digest_hex(&self) -> String {
        self.digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalibrationAggregate {
    pub scenario_name: String,
    pub personality: Personality,
    pub difficulty: Difficulty,
    pub iterations: usize,
    pub user_win_rate: f64,
    pub rival_win_rate: f64,
    pub tie_rate: f64,
    pub mean_margin: f64,
    pub std_margin: f64,
    pub mean_final_respect: f64,
    pub mean_final_heat: f64,
    pub peak_heat: u8,
    pub mean_user_volume: f64,
    pub mean_rival_volume: f64,
    pub std_rival_volume: f64,
    pub rival_outgrew_rate: f64,
    pub chaos_draws: usize,
    pub chaos_min: f64,
    pub chaos_max: f64,
    pub chaos_mean: f64,
}

fn scenario_label(personality: Personality, difficulty: Difficulty) -> String {
    format!("{personality} - {difficulty}")
}

/// Play one season per (personality, difficulty, seed, iteration).
///
/// The first iteration of each seed is played twice and must replay
/// byte-for-byte.
///
/// # Errors
///
/// Returns an error if a season fails, breaks an invariant or does not replay.
pub fn run_calibration(
    runner: &SeasonRunner,
    seeds: &[u64],
    iterations: usize,
    weeks: u32,
) -> Result<Vec<CalibrationRecord>> {
    let iterations = iterations.max(1);
    let combos = Personality::ALL.len() * Difficulty::ALL.len();
    let mut records = Vec::with_capacity(seeds.len() * combos * iterations);

    for personality in Personality::ALL {
        for difficulty in Difficulty::ALL {
            let plan = SeasonPlan::new(
                AthleteProfile::Steady,
                Opponent::Phantom {
                    personality,
                    difficulty,
                },
            )
            .with_weeks(weeks)
            .with_expectation(season_invariants);
            let scenario_name = scenario_label(personality, difficulty);

            for &seed in seeds {
                for iteration in 0..iterations {
                    let iteration_seed =
                        seed.wrapping_add(u64::try_from(iteration).unwrap_or(0));
                    let context = format!(
                        "Calibration failed for {scenario_name}, seed {seed} (iteration {})",
                        iteration + 1
                    );
                    let summary = runner
                        .run_plan(&plan, iteration_seed)
                        .with_context(|| context.clone())?;
                    for expectation in &plan.expectations {
                        expectation
                            .evaluate(&summary)
                            .with_context(|| context.clone())?;
                    }
                    let digest = summary.digest()?;
                    if iteration == 0 {
                        let replay = runner.run_plan(&plan, iteration_seed)?.digest()?;
                        ensure!(
                            replay == digest,
                            "{scenario_name} seed {iteration_seed} did not replay deterministically"
                        );
                    }

                    records.push(CalibrationRecord {
                        scenario_name: scenario_name.clone(),
                        personality,
                        difficulty,
                        seed: iteration_seed,
                        digest,
                        metrics: summary.metrics,
                    });
                }
            }
        }
    }

    Ok(records)
}

pub fn aggregate_calibration(records: &[CalibrationRecord]) -> Vec<CalibrationAggregate> {
    let mut aggregates: BTreeMap<(Personality, Difficulty), AggregateBuilder> = BTreeMap::new();

    for record in records {
        aggregates
            .entry((record.personality, record.difficulty))
            .or_insert_with(|| AggregateBuilder::new(record))
            .ingest(&record.metrics);
    }

    aggregates
        .into_values()
        .map(AggregateBuilder::finish)
        .collect()
}

/// # Errors
///
/// Returns the first calibration target that is missed.
pub fn validate_calibration_targets(
    aggregates: &[CalibrationAggregate],
    records: &[CalibrationRecord],
) -> Result<()> {
    validate_state_bounds(records)?;
    validate_chaos_envelope(aggregates)?;
    validate_difficulty_ladder(aggregates)?;
    validate_mentor_lead(aggregates)?;
    Ok(())
}

fn validate_state_bounds(records: &[CalibrationRecord]) -> Result<()> {
    for record in records {
        let metrics = &record.metrics;
        ensure!(
            (1..=5).contains(&metrics.final_respect),
            "{} seed {}: respect {} out of bounds",
            record.scenario_name,
            record.seed,
            metrics.final_respect
        );
        ensure!(
            metrics.peak_heat <= 100,
            "{} seed {}: heat {} out of bounds",
            record.scenario_name,
            record.seed,
            metrics.peak_heat
        );
        ensure!(
            metrics.user_wins + metrics.rival_wins + metrics.ties == metrics.encounters,
            "{} seed {}: outcome counts do not add up",
            record.scenario_name,
            record.seed
        );
    }
    Ok(())
}

fn validate_chaos_envelope(aggregates: &[CalibrationAggregate]) -> Result<()> {
    let mut nemesis_draws = 0;
    let mut spread: Option<(f64, f64)> = None;
    for aggregate in aggregates {
        if aggregate.personality != Personality::Nemesis {
            ensure!(
                aggregate.chaos_draws == 0,
                "{} drew chaos but only the nemesis may",
                aggregate.scenario_name
            );
            continue;
        }
        if aggregate.chaos_draws == 0 {
            continue;
        }
        ensure!(
            aggregate.chaos_min >= CHAOS_FLOOR && aggregate.chaos_max <= CHAOS_CEILING,
            "{} chaos left [{CHAOS_FLOOR}, {CHAOS_CEILING}]: {:.3}..{:.3}",
            aggregate.scenario_name,
            aggregate.chaos_min,
            aggregate.chaos_max
        );
        nemesis_draws += aggregate.chaos_draws;
        spread = Some(spread.map_or((aggregate.chaos_min, aggregate.chaos_max), |(lo, hi)| {
            (lo.min(aggregate.chaos_min), hi.max(aggregate.chaos_max))
        }));
    }
    if nemesis_draws > 1
        && let Some((lo, hi)) = spread
    {
        ensure!(hi > lo, "nemesis chaos never varied across {nemesis_draws} draws");
    }
    Ok(())
}

fn validate_difficulty_ladder(aggregates: &[CalibrationAggregate]) -> Result<()> {
    for personality in Personality::ALL {
        let volume_at = |difficulty: Difficulty| {
            aggregates
                .iter()
                .find(|a| a.personality == personality && a.difficulty == difficulty)
                .map(|a| a.mean_rival_volume)
        };
        if let (Some(easy), Some(elite)) =
            (volume_at(Difficulty::Easy), volume_at(Difficulty::Elite))
        {
            ensure!(
                elite > easy,
                "{personality} elite phantom ({elite:.0}) not ahead of easy ({easy:.0})"
            );
        }
    }
    Ok(())
}

fn validate_mentor_lead(aggregates: &[CalibrationAggregate]) -> Result<()> {
    for aggregate in aggregates
        .iter()
        .filter(|a| a.personality == Personality::Mentor)
    {
        ensure!(
            aggregate.rival_outgrew_rate > MENTOR_LEAD_TARGET,
            "{} out-grew the athlete in only {:.1}% of weeks",
            aggregate.scenario_name,
            aggregate.rival_outgrew_rate * 100.0
        );
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct AggregateBuilder {
    scenario_name: String,
    personality: Personality,
    difficulty: Difficulty,
    iterations: u32,
    encounters: u32,
    user_wins: u32,
    rival_wins: u32,
    ties: u32,
    stats_margin: RunningStats,
    stats_rival_volume: RunningStats,
    user_volume_sum: f64,
    respect_sum: u32,
    heat_sum: u32,
    peak_heat: u8,
    outgrew: u32,
    growth_weeks: u32,
    chaos: RunningStats,
    chaos_min: f64,
    chaos_max: f64,
}

impl AggregateBuilder {
    fn new(record: &CalibrationRecord) -> Self {
        Self {
            scenario_name: record.scenario_name.clone(),
            personality: record.personality,
            difficulty: record.difficulty,
            iterations: 0,
            encounters: 0,
            user_wins: 0,
            rival_wins: 0,
            ties: 0,
            stats_margin: RunningStats::default(),
            stats_rival_volume: RunningStats::default(),
            user_volume_sum: 0.0,
            respect_sum: 0,
            heat_sum: 0,
            peak_heat: 0,
            outgrew: 0,
            growth_weeks: 0,
            chaos: RunningStats::default(),
            chaos_min: f64::INFINITY,
            chaos_max: f64::NEG_INFINITY,
        }
    }

    fn ingest(&mut self, metrics: &SeasonMetrics) {
        self.iterations += 1;
        self.encounters = self.encounters.saturating_add(metrics.encounters);
        self.user_wins = self.user_wins.saturating_add(metrics.user_wins);
        self.rival_wins = self.rival_wins.saturating_add(metrics.rival_wins);
        self.ties = self.ties.saturating_add(metrics.ties);
        self.stats_margin.add(metrics.mean_margin);
        self.stats_rival_volume.add(metrics.mean_rival_volume);
        self.user_volume_sum += metrics.mean_user_volume;
        self.respect_sum = self
            .respect_sum
            .saturating_add(u32::from(metrics.final_respect));
        self.heat_sum = self.heat_sum.saturating_add(u32::from(metrics.final_heat));
        self.peak_heat = self.peak_heat.max(metrics.peak_heat);
        self.outgrew = self.outgrew.saturating_add(metrics.rival_outgrew_user);
        self.growth_weeks = self.growth_weeks.saturating_add(metrics.growth_weeks);
        for &factor in &metrics.chaos_factors {
            self.chaos.add(factor);
            self.chaos_min = self.chaos_min.min(factor);
            self.chaos_max = self.chaos_max.max(factor);
        }
    }

    fn finish(self) -> CalibrationAggregate {
        let iterations = usize::try_from(self.iterations).unwrap_or(usize::MAX);
        let denom = f64::from(self.iterations.max(1));
        let per_encounter = |count: u32| {
            if self.encounters == 0 {
                0.0
            } else {
                f64::from(count) / f64::from(self.encounters)
            }
        };
        CalibrationAggregate {
            user_win_rate: per_encounter(self.user_wins),
            rival_win_rate: per_encounter(self.rival_wins),
            tie_rate: per_encounter(self.ties),
            mean_margin: self.stats_margin.mean(),
            std_margin: self.stats_margin.std_dev(),
            mean_final_respect: f64::from(self.respect_sum) / denom,
            mean_final_heat: f64::from(self.heat_sum) / denom,
            peak_heat: self.peak_heat,
            mean_user_volume: self.user_volume_sum / denom,
            mean_rival_volume: self.stats_rival_volume.mean(),
            std_rival_volume: self.stats_rival_volume.std_dev(),
            rival_outgrew_rate: if self.growth_weeks == 0 {
                0.0
            } else {
                f64::from(self.outgrew) / f64::from(self.growth_weeks)
            },
            chaos_draws: usize::try_from(self.chaos.count).unwrap_or(usize::MAX),
            chaos_min: if self.chaos_min.is_finite() {
                self.chaos_min
            } else {
                0.0
            },
            chaos_max: if self.chaos_max.is_finite() {
                self.chaos_max
            } else {
                0.0
            },
            chaos_mean: self.chaos.mean(),
            scenario_name: self.scenario_name,
            personality: self.personality,
            difficulty: self.difficulty,
            iterations,
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
