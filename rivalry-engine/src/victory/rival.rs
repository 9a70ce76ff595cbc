//! Rival: best two of three categories, head to head.
use super::{
    CategoryBreakdown, CategoryResult, DominantFactor, VictoryResult, Winner, relative_band,
    standard_narrative,
};
use crate::constants::{
    RIVAL_MAJORITY, RIVAL_PR_UNIT, RIVAL_VOLUME_TIE_MARGIN, RIVAL_VOLUME_UNIT, RIVAL_WORKOUT_UNIT,
};
use crate::numbers::symmetric_pct_diff;
use crate::personality::Personality;
use crate::snapshot::ImprovementSnapshot;

fn exact(user: u32, rival: u32) -> Winner {
    match user.cmp(&rival) {
        std::cmp::Ordering::Greater => Winner::User,
        std::cmp::Ordering::Less => Winner::Rival,
        std::cmp::Ordering::Equal => Winner::Tie,
    }
}

/// Raw volume plus categorical counts inflated into volume-sized units.
fn total(snapshot: &ImprovementSnapshot) -> f64 {
    snapshot.volume_this_week * RIVAL_VOLUME_UNIT
        + f64::from(snapshot.workouts_this_week) * RIVAL_WORKOUT_UNIT
        + f64::from(snapshot.prs_this_week) * RIVAL_PR_UNIT
}

pub(super) fn evaluate(user: &ImprovementSnapshot, rival: &ImprovementSnapshot) -> VictoryResult {
    let breakdown = CategoryBreakdown {
        volume: CategoryResult::new(
            user.volume_this_week,
            rival.volume_this_week,
            relative_band(
                user.volume_this_week,
                rival.volume_this_week,
                RIVAL_VOLUME_TIE_MARGIN,
            ),
        ),
        workouts: CategoryResult::new(
            f64::from(user.workouts_this_week),
            f64::from(rival.workouts_this_week),
            exact(user.workouts_this_week, rival.workouts_this_week),
        ),
        prs: CategoryResult::new(
            f64::from(user.prs_this_week),
            f64::from(rival.prs_this_week),
            exact(user.prs_this_week, rival.prs_this_week),
        ),
        growth_rate: None,
    };

    let (user_wins, rival_wins) = breakdown.tally();
    let winner = if user_wins >= RIVAL_MAJORITY {
        Winner::User
    } else if rival_wins >= RIVAL_MAJORITY {
        Winner::Rival
    } else {
        Winner::Tie
    };

    let dominant_factor = [
        (DominantFactor::Volume, breakdown.volume.winner),
        (DominantFactor::Workouts, breakdown.workouts.winner),
        (DominantFactor::PersonalRecords, breakdown.prs.winner),
    ]
    .into_iter()
    .find(|(_, w)| winner != Winner::Tie && *w == winner)
    .map_or(DominantFactor::Balanced, |(factor, _)| factor);

    let user_score = total(user);
    let rival_score = total(rival);

    VictoryResult {
        personality: Personality::Rival,
        winner,
        winning_margin: symmetric_pct_diff(user_score, rival_score),
        dominant_factor,
        breakdown,
        narrative: standard_narrative(Personality::Rival, winner, dominant_factor, user),
        user_score,
        rival_score,
        chaos_factor: None,
    }
}
