//! Improvement scoring shared by every personality.
//!
//! Every function here is pure: the same snapshot always produces the same
//! score, so a user score and a rival score computed independently are
//! directly comparable.
use serde::{Deserialize, Serialize};

use crate::constants::{
    COMPOSITE_PR_WEIGHT, COMPOSITE_VOLUME_WEIGHT, COMPOSITE_WORKOUT_WEIGHT, NEMESIS_PR_MULTIPLIER,
    NEMESIS_PR_WEIGHT, NEMESIS_VOLUME_DIVISOR, NEMESIS_VOLUME_WEIGHT, NEMESIS_WORKOUT_WEIGHT,
    PR_POINTS, VOLUME_POINTS_DIVISOR, WORKOUT_POINTS, ZERO_BASE_GROWTH_PCT,
    ZERO_BASE_VOLUME_CHANGE_PCT,
};
use crate::numbers::finite_or_zero;
use crate::snapshot::ImprovementSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ImprovementScore {
    /// Week-over-week volume change in percent.
    pub volume_change: f64,
    pub consistency_score: u32,
    pub pr_score: f64,
    pub composite_score: f64,
}

/// Reduce a snapshot to its weighted sub-scores.
///
/// Composite points: 1 per 100 kg of volume, 100 per workout, 200 per PR,
/// blended 40/35/25. This is the same law as [`calculate_composite_score`].
#[must_use]
pub fn calculate_improvement_score(snapshot: &ImprovementSnapshot) -> ImprovementScore {
    let volume_score = snapshot.volume_this_week / VOLUME_POINTS_DIVISOR;
    let workout_score = f64::from(snapshot.workouts_this_week) * WORKOUT_POINTS;
    let pr_score = pr_score(snapshot.prs_this_week);
    let composite = volume_score * COMPOSITE_VOLUME_WEIGHT
        + workout_score * COMPOSITE_WORKOUT_WEIGHT
        + pr_score * COMPOSITE_PR_WEIGHT;

    ImprovementScore {
        volume_change: volume_change_pct(snapshot.volume_this_week, snapshot.volume_last_week),
        consistency_score: snapshot.consistency_score,
        pr_score,
        composite_score: finite_or_zero(composite).max(0.0),
    }
}

/// Linear PR credit; never negative.
#[must_use]
pub fn pr_score(prs: u32) -> f64 {
    f64::from(prs) * PR_POINTS
}

/// Percent change, crediting a flat 100% when last week was zero.
#[must_use]
pub fn volume_change_pct(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        finite_or_zero((current - previous) / previous * 100.0)
    } else if current > 0.0 {
        ZERO_BASE_VOLUME_CHANGE_PCT
    } else {
        0.0
    }
}

/// Percent growth, crediting a flat 50% when the previous value was zero.
#[must_use]
pub fn calculate_growth_rate(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        if current > 0.0 { ZERO_BASE_GROWTH_PCT } else { 0.0 }
    } else {
        finite_or_zero((current - previous) / previous * 100.0)
    }
}

/// Raw composite used by the Nemesis showdown:
/// `(volume / 10000) * 40 + workouts * 35 + prs * 2 * 25`.
#[must_use]
pub fn calculate_composite_score(snapshot: &ImprovementSnapshot) -> f64 {
    let volume = snapshot.volume_this_week / NEMESIS_VOLUME_DIVISOR * NEMESIS_VOLUME_WEIGHT;
    let workouts = f64::from(snapshot.workouts_this_week) * NEMESIS_WORKOUT_WEIGHT;
    let prs = f64::from(snapshot.prs_this_week) * NEMESIS_PR_MULTIPLIER * NEMESIS_PR_WEIGHT;
    finite_or_zero(volume + workouts + prs).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_rate_zero_base_policy() {
        assert!((calculate_growth_rate(10.0, 0.0) - 50.0).abs() < f64::EPSILON);
        assert!(calculate_growth_rate(0.0, 0.0).abs() < f64::EPSILON);
        assert!((calculate_growth_rate(150.0, 100.0) - 50.0).abs() < 1e-9);
        assert!((calculate_growth_rate(50.0, 100.0) + 50.0).abs() < 1e-9);
    }

    #[test]
    fn volume_change_zero_base_policy() {
        assert!((volume_change_pct(500.0, 0.0) - 100.0).abs() < f64::EPSILON);
        assert!(volume_change_pct(0.0, 0.0).abs() < f64::EPSILON);
        assert!((volume_change_pct(1_200.0, 1_000.0) - 20.0).abs() < 1e-9);
        assert!((volume_change_pct(0.0, 1_000.0) + 100.0).abs() < 1e-9);
    }

    #[test]
    fn improvement_score_matches_nemesis_composite() {
        let snap = ImprovementSnapshot::from_counts(12_500.0, 10_000.0, 3, 4, 2);
        let score = calculate_improvement_score(&snap);
        let raw = calculate_composite_score(&snap);
        assert!((score.composite_score - raw).abs() < 1e-9);
        // 12500/10000*40 + 3*35 + 2*2*25
        assert!((raw - 255.0).abs() < 1e-9);
        assert!((score.volume_change - 25.0).abs() < 1e-9);
        assert_eq!(score.consistency_score, 75);
        assert!((score.pr_score - 400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn improvement_score_is_pure() {
        let snap = ImprovementSnapshot::from_counts(8_000.0, 0.0, 2, 0, 1);
        assert_eq!(
            calculate_improvement_score(&snap),
            calculate_improvement_score(&snap)
        );
    }

    #[test]
    fn zero_snapshot_scores_zero() {
        let score = calculate_improvement_score(&ImprovementSnapshot::default());
        assert_eq!(score, ImprovementScore::default());
    }

    #[test]
    fn pr_score_is_monotonic() {
        let mut last = -1.0;
        for prs in 0..10 {
            let s = pr_score(prs);
            assert!(s > last);
            last = s;
        }
    }
}
