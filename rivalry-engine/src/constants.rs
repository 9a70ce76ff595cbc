//! Centralized scoring and tuning constants for the rivalry engine.
//!
//! These values define the deterministic math behind every showdown.
//! Keeping them together ensures that competitive balance can only be
//! adjusted via code changes reviewed in version control.

// Snapshot defaults ----------------------------------------------------------
pub(crate) const DEFAULT_TARGET_WORKOUTS_PER_WEEK: u32 = 4;
pub(crate) const DEFAULT_TOP_GAINS_LIMIT: usize = 3;
pub(crate) const CONSISTENCY_MAX: u32 = 100;
pub(crate) const DAYS_PER_WEEK: u32 = 7;

// Improvement score ----------------------------------------------------------
pub(crate) const COMPOSITE_VOLUME_WEIGHT: f64 = 0.40;
pub(crate) const COMPOSITE_WORKOUT_WEIGHT: f64 = 0.35;
pub(crate) const COMPOSITE_PR_WEIGHT: f64 = 0.25;
/// Volume points per kilogram lifted (10 000 kg -> 100 points).
pub(crate) const VOLUME_POINTS_DIVISOR: f64 = 100.0;
pub(crate) const WORKOUT_POINTS: f64 = 100.0;
pub(crate) const PR_POINTS: f64 = 200.0;
pub(crate) const ZERO_BASE_VOLUME_CHANGE_PCT: f64 = 100.0;

// Mirror ---------------------------------------------------------------------
pub(crate) const MIRROR_VOLUME_WEIGHT: f64 = 0.40;
pub(crate) const MIRROR_WORKOUT_WEIGHT: f64 = 0.35;
pub(crate) const MIRROR_PR_WEIGHT: f64 = 0.25;
pub(crate) const MIRROR_BASELINE: f64 = 1.0;
pub(crate) const MIRROR_WIN_THRESHOLD: f64 = 1.05;
pub(crate) const MIRROR_LOSS_THRESHOLD: f64 = 0.95;
pub(crate) const MIRROR_CATEGORY_BAND: f64 = 0.02;
pub(crate) const MIRROR_PR_BASELINE_FLOOR: f64 = 0.5;
/// Ratio credited when the baseline is zero but the current value is not.
pub(crate) const MIRROR_ZERO_BASE_RATIO: f64 = 2.0;

// Rival ----------------------------------------------------------------------
pub(crate) const RIVAL_VOLUME_TIE_MARGIN: f64 = 0.05;
pub(crate) const RIVAL_VOLUME_UNIT: f64 = 1.0;
pub(crate) const RIVAL_WORKOUT_UNIT: f64 = 1_000.0;
pub(crate) const RIVAL_PR_UNIT: f64 = 5_000.0;
pub(crate) const RIVAL_MAJORITY: u8 = 2;

// Mentor ---------------------------------------------------------------------
pub(crate) const MENTOR_VOLUME_WEIGHT: f64 = 0.5;
pub(crate) const MENTOR_WORKOUT_WEIGHT: f64 = 0.3;
pub(crate) const MENTOR_PR_WEIGHT: f64 = 0.2;
pub(crate) const MENTOR_DEAD_ZONE: f64 = 2.0;
pub(crate) const MENTOR_PR_BONUS_BASE: f64 = 10.0;
pub(crate) const MENTOR_PR_BONUS_PER_PR: f64 = 5.0;
pub(crate) const ZERO_BASE_GROWTH_PCT: f64 = 50.0;

// Nemesis --------------------------------------------------------------------
pub(crate) const NEMESIS_VOLUME_DIVISOR: f64 = 10_000.0;
pub(crate) const NEMESIS_VOLUME_WEIGHT: f64 = 40.0;
pub(crate) const NEMESIS_WORKOUT_WEIGHT: f64 = 35.0;
pub(crate) const NEMESIS_PR_MULTIPLIER: f64 = 2.0;
pub(crate) const NEMESIS_PR_WEIGHT: f64 = 25.0;
pub(crate) const NEMESIS_WIN_FACTOR: f64 = 1.05;
pub const CHAOS_MIN: f64 = 0.7;
pub const CHAOS_MAX: f64 = 1.3;
pub(crate) const CHAOS_STUMBLE_BELOW: f64 = 0.85;
pub(crate) const CHAOS_BEAST_ABOVE: f64 = 1.15;

// Relationship ---------------------------------------------------------------
pub const RESPECT_MIN: u8 = 1;
pub const RESPECT_MAX: u8 = 5;
pub const HEAT_MIN: u8 = 0;
pub const HEAT_MAX: u8 = 100;
pub(crate) const RESPECT_STEP: i32 = 1;
pub(crate) const RESPECT_DECISIVE_MULTIPLIER: i32 = 2;
pub(crate) const DECISIVE_MARGIN: f64 = 20.0;
pub(crate) const HEAT_TIE: i32 = 10;
pub(crate) const HEAT_RIVAL_WIN: i32 = 15;
pub(crate) const HEAT_USER_WIN: i32 = 5;
pub(crate) const HEAT_STREAK_BONUS: i32 = 10;
pub(crate) const HEAT_STREAK_THRESHOLD: u32 = 3;

// Phantom --------------------------------------------------------------------
pub(crate) const PHANTOM_DEFAULT_VOLATILITY: f64 = 0.35;
pub(crate) const PHANTOM_DEFAULT_BASELINE_VOLUME: f64 = 5_000.0;
pub(crate) const PHANTOM_DEFAULT_BASELINE_WORKOUTS: u32 = 3;
/// Largest week-over-week move of the random walk, as a fraction of its anchor.
pub(crate) const PHANTOM_MAX_STEP: f64 = 0.25;
pub(crate) const PHANTOM_NOISE_SCALE: f64 = 0.10;
pub(crate) const PHANTOM_MENTOR_GROWTH_BONUS: f64 = 0.06;
pub(crate) const PHANTOM_MENTOR_MAX_GROWTH: f64 = 0.35;
/// Mentor volume ceiling as a multiple of the user's (difficulty-scaled) volume.
pub(crate) const PHANTOM_MENTOR_MAX_LEAD: f64 = 1.35;
pub(crate) const PHANTOM_MENTOR_WORKOUT_LEAD: f64 = 0.5;
pub(crate) const PHANTOM_NEMESIS_VOLATILITY_BOOST: f64 = 1.5;
pub(crate) const PHANTOM_MAX_PRS: u32 = 10;

// Engine ---------------------------------------------------------------------
pub(crate) const DEFAULT_COMMIT_ATTEMPTS: u32 = 3;
pub(crate) const HISTORY_WINDOW_WEEKS: usize = 4;
