//! Mentor: out-grow the mentor week over week.
use super::{
    CategoryBreakdown, CategoryResult, DominantFactor, VictoryResult, absolute_band,
    standard_narrative, strongest_factor,
};
use crate::constants::{
    MENTOR_DEAD_ZONE, MENTOR_PR_BONUS_BASE, MENTOR_PR_BONUS_PER_PR, MENTOR_PR_WEIGHT,
    MENTOR_VOLUME_WEIGHT, MENTOR_WORKOUT_WEIGHT,
};
use crate::personality::Personality;
use crate::score::calculate_growth_rate;
use crate::snapshot::ImprovementSnapshot;

/// Flat credit for setting any PR at all.
fn pr_bonus(prs: u32) -> f64 {
    if prs == 0 {
        0.0
    } else {
        MENTOR_PR_BONUS_BASE + f64::from(prs) * MENTOR_PR_BONUS_PER_PR
    }
}

struct Growth {
    volume: f64,
    workouts: f64,
    pr_bonus: f64,
}

impl Growth {
    fn of(snapshot: &ImprovementSnapshot) -> Self {
        Self {
            volume: calculate_growth_rate(snapshot.volume_this_week, snapshot.volume_last_week),
            workouts: calculate_growth_rate(
                f64::from(snapshot.workouts_this_week),
                f64::from(snapshot.workouts_last_week),
            ),
            pr_bonus: pr_bonus(snapshot.prs_this_week),
        }
    }

    fn score(&self) -> f64 {
        self.volume * MENTOR_VOLUME_WEIGHT
            + self.workouts * MENTOR_WORKOUT_WEIGHT
            + self.pr_bonus * MENTOR_PR_WEIGHT
    }
}

pub(super) fn evaluate(user: &ImprovementSnapshot, mentor: &ImprovementSnapshot) -> VictoryResult {
    let mine = Growth::of(user);
    let theirs = Growth::of(mentor);
    let user_score = mine.score();
    let rival_score = theirs.score();
    let winner = absolute_band(user_score, rival_score, MENTOR_DEAD_ZONE);

    let breakdown = CategoryBreakdown {
        volume: CategoryResult::new(
            mine.volume,
            theirs.volume,
            absolute_band(mine.volume, theirs.volume, MENTOR_DEAD_ZONE),
        ),
        workouts: CategoryResult::new(
            mine.workouts,
            theirs.workouts,
            absolute_band(mine.workouts, theirs.workouts, MENTOR_DEAD_ZONE),
        ),
        prs: CategoryResult::new(
            mine.pr_bonus,
            theirs.pr_bonus,
            absolute_band(mine.pr_bonus, theirs.pr_bonus, MENTOR_DEAD_ZONE),
        ),
        growth_rate: Some(CategoryResult::new(user_score, rival_score, winner)),
    };

    let dominant_factor = strongest_factor(
        winner,
        &[
            (
                DominantFactor::Volume,
                (mine.volume - theirs.volume) * MENTOR_VOLUME_WEIGHT,
            ),
            (
                DominantFactor::Workouts,
                (mine.workouts - theirs.workouts) * MENTOR_WORKOUT_WEIGHT,
            ),
            (
                DominantFactor::PersonalRecords,
                (mine.pr_bonus - theirs.pr_bonus) * MENTOR_PR_WEIGHT,
            ),
        ],
    );

    VictoryResult {
        personality: Personality::Mentor,
        winner,
        winning_margin: (user_score - rival_score).abs(),
        dominant_factor,
        breakdown,
        narrative: standard_narrative(Personality::Mentor, winner, dominant_factor, user),
        user_score,
        rival_score,
        chaos_factor: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::victory::Winner;

    #[test]
    fn pr_bonus_is_flat_plus_per_pr() {
        assert!(pr_bonus(0).abs() < f64::EPSILON);
        assert!((pr_bonus(1) - 15.0).abs() < f64::EPSILON);
        assert!((pr_bonus(3) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn faster_growth_wins() {
        // user: +20% volume, +0% workouts, no PRs -> 10
        let user = ImprovementSnapshot::from_counts(12_000.0, 10_000.0, 4, 4, 0);
        // mentor: +10% volume, +0% workouts, no PRs -> 5
        let mentor = ImprovementSnapshot::from_counts(11_000.0, 10_000.0, 4, 4, 0);
        let result = evaluate(&user, &mentor);
        assert_eq!(result.winner, Winner::User);
        assert!((result.winning_margin - 5.0).abs() < 1e-9);
        assert_eq!(result.dominant_factor, DominantFactor::Volume);
        let growth = result.breakdown.growth_rate.unwrap();
        assert!((growth.user_value - 10.0).abs() < 1e-9);
        assert!((growth.rival_value - 5.0).abs() < 1e-9);
    }

    #[test]
    fn dead_zone_is_two_points() {
        // user +3% volume -> 1.5, mentor flat -> 0.0
        let user = ImprovementSnapshot::from_counts(10_300.0, 10_000.0, 4, 4, 0);
        let mentor = ImprovementSnapshot::from_counts(10_000.0, 10_000.0, 4, 4, 0);
        assert_eq!(evaluate(&user, &mentor).winner, Winner::Tie);
    }

    #[test]
    fn starting_from_zero_earns_flat_credit() {
        let newcomer = ImprovementSnapshot::from_counts(3_000.0, 0.0, 2, 0, 0);
        let mentor = ImprovementSnapshot::from_counts(10_000.0, 10_000.0, 4, 4, 0);
        let result = evaluate(&newcomer, &mentor);
        // 50*0.5 + 50*0.3 = 40
        assert!((result.user_score - 40.0).abs() < 1e-9);
        assert_eq!(result.winner, Winner::User);
    }
}
