//! Synthetic AI opponents ("phantoms").
//!
//! A phantom's week is a bounded random walk: it starts from the phantom's
//! previous week, moves at most `PHANTOM_MAX_STEP` of that anchor toward a
//! personality-specific target derived from the user's snapshot, and picks
//! up a little noise scaled by the configured volatility. Outputs are
//! always finite and non-negative.
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::ConfigError;
use crate::constants::{
    DAYS_PER_WEEK, PHANTOM_DEFAULT_BASELINE_VOLUME, PHANTOM_DEFAULT_BASELINE_WORKOUTS,
    PHANTOM_DEFAULT_VOLATILITY, PHANTOM_MAX_PRS, PHANTOM_MAX_STEP, PHANTOM_MENTOR_GROWTH_BONUS,
    PHANTOM_MENTOR_MAX_GROWTH, PHANTOM_MENTOR_MAX_LEAD, PHANTOM_MENTOR_WORKOUT_LEAD,
    PHANTOM_NEMESIS_VOLATILITY_BOOST, PHANTOM_NOISE_SCALE,
};
use crate::numbers::{finite_or_zero, round_f64_to_u32};
use crate::personality::Personality;
use crate::score::calculate_growth_rate;
use crate::snapshot::{GainList, ImprovementSnapshot, consistency_score};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Elite,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown phantom difficulty {0:?} (expected easy, normal, hard or elite)")]
pub struct DifficultyParseError(pub String);

impl Difficulty {
    pub const ALL: [Self; 4] = [Self::Easy, Self::Normal, Self::Hard, Self::Elite];

    /// Scale applied to the phantom's targets relative to the user.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Easy => 0.85,
            Self::Normal => 1.0,
            Self::Hard => 1.12,
            Self::Elite => 1.25,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
            Self::Elite => "elite",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = DifficultyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "normal" => Ok(Self::Normal),
            "hard" => Ok(Self::Hard),
            "elite" => Ok(Self::Elite),
            _ => Err(DifficultyParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhantomConfig {
    pub name: String,
    pub personality: Personality,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// 0 = metronome, 1 = erratic.
    #[serde(default = "PhantomConfig::default_volatility")]
    pub volatility: f64,
    /// Volume floor (before difficulty) so an idle user still faces a rival.
    #[serde(default = "PhantomConfig::default_baseline_volume")]
    pub baseline_volume: f64,
    #[serde(default = "PhantomConfig::default_baseline_workouts")]
    pub baseline_workouts: u32,
}

impl PhantomConfig {
    const fn default_volatility() -> f64 {
        PHANTOM_DEFAULT_VOLATILITY
    }

    const fn default_baseline_volume() -> f64 {
        PHANTOM_DEFAULT_BASELINE_VOLUME
    }

    const fn default_baseline_workouts() -> u32 {
        PHANTOM_DEFAULT_BASELINE_WORKOUTS
    }

    #[must_use]
    pub fn new(name: impl Into<String>, personality: Personality) -> Self {
        Self {
            name: name.into(),
            personality,
            difficulty: Difficulty::default(),
            volatility: Self::default_volatility(),
            baseline_volume: Self::default_baseline_volume(),
            baseline_workouts: Self::default_baseline_workouts(),
        }
    }

    #[must_use]
    pub const fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    #[must_use]
    pub const fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    /// # Errors
    ///
    /// Returns an error for an empty name, volatility outside `0..=1`, a
    /// negative volume floor, or more baseline workouts than days in a week.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Empty { field: "name" });
        }
        if !(0.0..=1.0).contains(&self.volatility) {
            return Err(ConfigError::RangeViolation {
                field: "volatility",
                min: 0.0,
                max: 1.0,
                value: self.volatility,
            });
        }
        if !self.baseline_volume.is_finite() || self.baseline_volume < 0.0 {
            return Err(ConfigError::RangeViolation {
                field: "baseline_volume",
                min: 0.0,
                max: f64::MAX,
                value: self.baseline_volume,
            });
        }
        if self.baseline_workouts > DAYS_PER_WEEK {
            return Err(ConfigError::RangeViolation {
                field: "baseline_workouts",
                min: 0.0,
                max: f64::from(DAYS_PER_WEEK),
                value: f64::from(self.baseline_workouts),
            });
        }
        Ok(())
    }

    fn effective_volatility(&self) -> f64 {
        let base = finite_or_zero(self.volatility).clamp(0.0, 1.0);
        if self.personality == Personality::Nemesis {
            (base * PHANTOM_NEMESIS_VOLATILITY_BOOST).min(1.0)
        } else {
            base
        }
    }
}

/// One generated phantom week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhantomStats {
    pub volume_this_week: f64,
    pub workouts_this_week: u32,
    pub prs_this_week: u32,
    pub consistency_score: u32,
    pub last_updated: DateTime<Utc>,
}

impl PhantomStats {
    /// Noise-free starting point for a phantom with no history, pitched at
    /// the user's previous week (or the configured floor).
    ///
    /// `target_workouts` is the weekly target the user's consistency is
    /// scored against, so both sides share one scale.
    #[must_use]
    pub fn opening(
        user: &ImprovementSnapshot,
        config: &PhantomConfig,
        target_workouts: u32,
        as_of: DateTime<Utc>,
    ) -> Self {
        let diff = config.difficulty.multiplier();
        let user_volume = if user.volume_last_week > 0.0 {
            user.volume_last_week
        } else {
            user.volume_this_week
        };
        let user_workouts = user.workouts_last_week.max(user.workouts_this_week);
        let volume = (finite_or_zero(user_volume) * diff).max(config.baseline_volume * diff);
        let workouts = round_f64_to_u32(f64::from(user_workouts) * diff)
            .max(config.baseline_workouts)
            .min(DAYS_PER_WEEK);
        let volume = if workouts == 0 { 0.0 } else { volume.max(0.0) };
        Self {
            volume_this_week: volume,
            workouts_this_week: workouts,
            prs_this_week: 0,
            consistency_score: consistency_score(workouts, target_workouts),
            last_updated: as_of,
        }
    }
}

struct Targets {
    volume: f64,
    workouts: f64,
    prs: f64,
}

fn targets(user: &ImprovementSnapshot, config: &PhantomConfig, anchor: &PhantomStats) -> Targets {
    let diff = config.difficulty.multiplier();
    let volume_floor = config.baseline_volume * diff;
    let workout_floor = f64::from(config.baseline_workouts);
    let this_volume = user.volume_this_week;
    let this_workouts = f64::from(user.workouts_this_week);
    let this_prs = f64::from(user.prs_this_week);

    let (volume, workouts, prs) = match config.personality {
        Personality::Mirror => {
            let avg_volume = if user.volume_last_week > 0.0 {
                (this_volume + user.volume_last_week) / 2.0
            } else {
                this_volume
            };
            let avg_workouts = (this_workouts + f64::from(user.workouts_last_week)) / 2.0;
            let avg_prs = (this_prs + f64::from(user.prs_last_week)) / 2.0;
            (avg_volume * diff, avg_workouts * diff, avg_prs * diff)
        }
        Personality::Rival | Personality::Nemesis => {
            (this_volume * diff, this_workouts * diff, this_prs * diff)
        }
        Personality::Mentor => {
            let user_growth = calculate_growth_rate(this_volume, user.volume_last_week) / 100.0;
            let growth = (user_growth.max(0.0) + PHANTOM_MENTOR_GROWTH_BONUS * diff)
                .min(PHANTOM_MENTOR_MAX_GROWTH);
            // Climb from last week while under a ceiling pinned to the user,
            // then deload back to the user's level and climb again.
            let reference = this_volume
                .max(user.volume_last_week)
                .max(config.baseline_volume);
            let ceiling = reference * diff * PHANTOM_MENTOR_MAX_LEAD;
            let climbed = anchor.volume_this_week * (1.0 + growth);
            let volume = if climbed > ceiling {
                reference * diff
            } else {
                climbed
            };
            (
                volume,
                this_workouts * diff + PHANTOM_MENTOR_WORKOUT_LEAD,
                this_prs * diff + 0.5,
            )
        }
    };

    Targets {
        volume: finite_or_zero(volume).max(volume_floor),
        workouts: finite_or_zero(workouts).max(workout_floor),
        prs: finite_or_zero(prs).max(0.0),
    }
}

/// Generate a phantom's week relative to the user's snapshot.
///
/// `previous` seeds the random walk; without it the phantom opens at
/// [`PhantomStats::opening`].
pub fn generate_phantom_stats<R: Rng + ?Sized>(
    user: &ImprovementSnapshot,
    config: &PhantomConfig,
    target_workouts: u32,
    previous: Option<&PhantomStats>,
    rng: &mut R,
    as_of: DateTime<Utc>,
) -> PhantomStats {
    let user = user.clone().sanitized();
    let anchor = previous
        .cloned()
        .unwrap_or_else(|| PhantomStats::opening(&user, config, target_workouts, as_of));
    let target = targets(&user, config, &anchor);
    let volatility = config.effective_volatility();

    let workouts = walk_workouts(anchor.workouts_this_week, target.workouts, volatility, rng);
    let (volume, prs) = if workouts == 0 {
        (0.0, 0)
    } else {
        (
            walk_volume(anchor.volume_this_week, target.volume, volatility, rng),
            draw_prs(target.prs, volatility, rng),
        )
    };

    log::debug!(
        "phantom {} ({}, {}): volume {:.0} -> {:.0}, workouts {} -> {}, prs {}",
        config.name,
        config.personality,
        config.difficulty,
        anchor.volume_this_week,
        volume,
        anchor.workouts_this_week,
        workouts,
        prs
    );

    PhantomStats {
        volume_this_week: volume,
        workouts_this_week: workouts,
        prs_this_week: prs,
        consistency_score: consistency_score(workouts, target_workouts),
        last_updated: as_of,
    }
}

fn walk_volume<R: Rng + ?Sized>(anchor: f64, target: f64, volatility: f64, rng: &mut R) -> f64 {
    let anchor = finite_or_zero(anchor).max(0.0);
    let base = if anchor > 0.0 { anchor } else { target };
    let step_limit = PHANTOM_MAX_STEP * base;
    let drift = if anchor > 0.0 {
        (target - anchor).clamp(-step_limit, step_limit)
    } else {
        target
    };
    let noise = rng.gen_range(-1.0..=1.0) * volatility * PHANTOM_NOISE_SCALE * base;
    finite_or_zero(anchor + drift + noise).max(0.0)
}

fn walk_workouts<R: Rng + ?Sized>(anchor: u32, target: f64, volatility: f64, rng: &mut R) -> u32 {
    let anchor = f64::from(anchor);
    let drift = (target - anchor).clamp(-1.5, 1.5);
    let jitter = if rng.gen_bool((volatility * 0.5).clamp(0.0, 1.0)) {
        if rng.gen_bool(0.5) { 1.0 } else { -1.0 }
    } else {
        0.0
    };
    round_f64_to_u32(anchor + drift + jitter).min(DAYS_PER_WEEK)
}

fn draw_prs<R: Rng + ?Sized>(target: f64, volatility: f64, rng: &mut R) -> u32 {
    let whole = target.floor();
    let fraction = (target - whole).clamp(0.0, 1.0);
    let mut prs = whole + if rng.gen_bool(fraction) { 1.0 } else { 0.0 };
    if rng.gen_bool((volatility * 0.3).clamp(0.0, 1.0)) {
        prs += if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    }
    round_f64_to_u32(prs).min(PHANTOM_MAX_PRS)
}

/// Present a phantom week as a snapshot comparable with the user's.
///
/// The "last week" fields come from `previous`; without it they repeat this
/// week, i.e. a flat trend.
#[must_use]
pub fn phantom_stats_to_snapshot(
    stats: &PhantomStats,
    previous: Option<&PhantomStats>,
) -> ImprovementSnapshot {
    let last = previous.unwrap_or(stats);
    ImprovementSnapshot {
        volume_this_week: finite_or_zero(stats.volume_this_week).max(0.0),
        volume_last_week: finite_or_zero(last.volume_this_week).max(0.0),
        workouts_this_week: stats.workouts_this_week,
        workouts_last_week: last.workouts_this_week,
        prs_this_week: stats.prs_this_week,
        prs_last_week: last.prs_this_week,
        consistency_score: stats.consistency_score.min(100),
        top_exercise_gains: GainList::new(),
    }
}
