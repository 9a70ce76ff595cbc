//! Mirror: beat your own rolling average.
use super::{
    CategoryBreakdown, CategoryResult, DominantFactor, VictoryResult, Winner, standard_narrative,
    strongest_factor,
};
use crate::constants::{
    MIRROR_BASELINE, MIRROR_CATEGORY_BAND, MIRROR_LOSS_THRESHOLD, MIRROR_PR_BASELINE_FLOOR,
    MIRROR_PR_WEIGHT, MIRROR_VOLUME_WEIGHT, MIRROR_WIN_THRESHOLD, MIRROR_WORKOUT_WEIGHT,
    MIRROR_ZERO_BASE_RATIO,
};
use crate::encounter::UserHistory;
use crate::numbers::finite_or_zero;
use crate::personality::Personality;
use crate::snapshot::ImprovementSnapshot;

struct Baseline {
    volume: f64,
    workouts: f64,
    prs: f64,
    from_history: bool,
}

impl Baseline {
    fn resolve(user: &ImprovementSnapshot, history: Option<&UserHistory>) -> Self {
        match history.filter(|h| h.weeks > 0) {
            Some(h) => Self {
                volume: h.avg_volume_4_week,
                workouts: h.avg_workouts_4_week,
                prs: h.avg_prs_4_week,
                from_history: true,
            },
            None => Self {
                volume: user.volume_last_week,
                workouts: f64::from(user.workouts_last_week),
                prs: f64::from(user.prs_last_week),
                from_history: false,
            },
        }
    }
}

fn ratio(current: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        finite_or_zero(current / baseline)
    } else if current > 0.0 {
        MIRROR_ZERO_BASE_RATIO
    } else {
        MIRROR_BASELINE
    }
}

/// PR ratio against last week's raw count, which is floored since one PR
/// over zero would otherwise dwarf the other categories.
fn pr_ratio(current: f64, baseline: f64) -> f64 {
    if current <= 0.0 && baseline <= 0.0 {
        return MIRROR_BASELINE;
    }
    finite_or_zero(current / baseline.max(MIRROR_PR_BASELINE_FLOOR))
}

fn band(ratio: f64) -> Winner {
    if ratio > MIRROR_BASELINE + MIRROR_CATEGORY_BAND {
        Winner::User
    } else if ratio < MIRROR_BASELINE - MIRROR_CATEGORY_BAND {
        Winner::Rival
    } else {
        Winner::Tie
    }
}

pub(super) fn evaluate(user: &ImprovementSnapshot, history: Option<&UserHistory>) -> VictoryResult {
    let baseline = Baseline::resolve(user, history);
    let workouts = f64::from(user.workouts_this_week);
    let prs = f64::from(user.prs_this_week);

    let volume_ratio = ratio(user.volume_this_week, baseline.volume);
    let workout_ratio = ratio(workouts, baseline.workouts);
    let prs_ratio = if baseline.from_history {
        ratio(prs, baseline.prs)
    } else {
        pr_ratio(prs, baseline.prs)
    };

    let user_score = volume_ratio * MIRROR_VOLUME_WEIGHT
        + workout_ratio * MIRROR_WORKOUT_WEIGHT
        + prs_ratio * MIRROR_PR_WEIGHT;

    let winner = if user_score > MIRROR_WIN_THRESHOLD {
        Winner::User
    } else if user_score < MIRROR_LOSS_THRESHOLD {
        Winner::Rival
    } else {
        Winner::Tie
    };

    let breakdown = CategoryBreakdown {
        volume: CategoryResult::new(user.volume_this_week, baseline.volume, band(volume_ratio)),
        workouts: CategoryResult::new(workouts, baseline.workouts, band(workout_ratio)),
        prs: CategoryResult::new(prs, baseline.prs, band(prs_ratio)),
        growth_rate: None,
    };

    let dominant_factor = strongest_factor(
        winner,
        &[
            (
                DominantFactor::Volume,
                (volume_ratio - MIRROR_BASELINE) * MIRROR_VOLUME_WEIGHT,
            ),
            (
                DominantFactor::Workouts,
                (workout_ratio - MIRROR_BASELINE) * MIRROR_WORKOUT_WEIGHT,
            ),
            (
                DominantFactor::PersonalRecords,
                (prs_ratio - MIRROR_BASELINE) * MIRROR_PR_WEIGHT,
            ),
        ],
    );

    VictoryResult {
        personality: Personality::Mirror,
        winner,
        winning_margin: (user_score - MIRROR_BASELINE).abs() * 100.0,
        dominant_factor,
        breakdown,
        narrative: standard_narrative(Personality::Mirror, winner, dominant_factor, user),
        user_score,
        rival_score: MIRROR_BASELINE,
        chaos_factor: None,
    }
}
