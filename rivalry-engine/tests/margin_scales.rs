//! Every personality reports its margin on its own scale, yet respect
//! doubles on the same `margin > 20` threshold. These tests pin each scale.
use chrono::{TimeZone, Utc};
use rivalry_engine::{
    FixedChaos, ImprovementSnapshot, Personality, RivalRelationship, UserHistory, VictoryResult,
    Winner, calculate_victory,
};

fn decide(
    personality: Personality,
    user: &ImprovementSnapshot,
    rival: &ImprovementSnapshot,
    history: Option<&UserHistory>,
    chaos: f64,
) -> VictoryResult {
    calculate_victory(personality, user, rival, history, &mut FixedChaos(chaos))
}

fn respect_delta(result: &VictoryResult) -> i32 {
    let rel = RivalRelationship::new_peer(
        "r",
        "u",
        "f",
        result.personality,
        Utc.with_ymd_and_hms(2026, 10, 18, 20, 0, 0).unwrap(),
    );
    rel.preview_outcome(result.winner, result.winning_margin)
        .respect_delta
}

#[test]
fn mirror_margin_is_points_around_one() {
    let history = UserHistory {
        avg_volume_4_week: 10_000.0,
        avg_workouts_4_week: 4.0,
        avg_prs_4_week: 1.0,
        weeks: 4,
    };
    // volume ratio 1.4 -> score 0.56 + 0.35 + 0.25 = 1.16
    let user = ImprovementSnapshot::from_counts(14_000.0, 0.0, 4, 0, 1);
    let result = decide(Personality::Mirror, &user, &user, Some(&history), 1.0);
    assert_eq!(result.winner, Winner::User);
    assert!((result.winning_margin - 16.0).abs() < 1e-6);
    assert_eq!(respect_delta(&result), 1);

    let bigger = ImprovementSnapshot::from_counts(16_000.0, 0.0, 4, 0, 1);
    let result = decide(Personality::Mirror, &bigger, &bigger, Some(&history), 1.0);
    assert!((result.winning_margin - 24.0).abs() < 1e-6);
    assert_eq!(respect_delta(&result), 2);
}

#[test]
fn rival_margin_is_symmetric_percent_of_weighted_totals() {
    // totals 20000 vs 15000 -> 25%
    let user = ImprovementSnapshot::from_counts(14_000.0, 0.0, 6, 0, 0);
    let rival = ImprovementSnapshot::from_counts(10_000.0, 0.0, 5, 0, 0);
    let result = decide(Personality::Rival, &user, &rival, None, 1.0);
    assert_eq!(result.winner, Winner::User);
    assert!((result.winning_margin - 25.0).abs() < 1e-9);
    assert_eq!(respect_delta(&result), 2);
}

#[test]
fn mentor_margin_is_raw_point_gap() {
    // user +50% volume -> 25 points, mentor flat -> 0
    let user = ImprovementSnapshot::from_counts(15_000.0, 10_000.0, 4, 4, 0);
    let mentor = ImprovementSnapshot::from_counts(10_000.0, 10_000.0, 4, 4, 0);
    let result = decide(Personality::Mentor, &user, &mentor, None, 1.0);
    assert!((result.winning_margin - 25.0).abs() < 1e-9);
    assert_eq!(respect_delta(&result), 2);

    // +30% -> 15 points: a clear win, but not decisive on this scale
    let user = ImprovementSnapshot::from_counts(13_000.0, 10_000.0, 4, 4, 0);
    let result = decide(Personality::Mentor, &user, &mentor, None, 1.0);
    assert_eq!(result.winner, Winner::User);
    assert!((result.winning_margin - 15.0).abs() < 1e-9);
    assert_eq!(respect_delta(&result), 1);
}

#[test]
fn nemesis_margin_is_symmetric_percent_after_chaos() {
    let even = ImprovementSnapshot::from_counts(10_000.0, 10_000.0, 3, 3, 1);
    // rival 195 * 0.7 = 136.5 -> (195 - 136.5) / 195 = 30%
    let result = decide(Personality::Nemesis, &even, &even, None, 0.7);
    assert_eq!(result.winner, Winner::User);
    assert!((result.winning_margin - 30.0).abs() < 1e-9);
    assert_eq!(respect_delta(&result), 2);

    // rival 195 * 1.2 = 234 -> (234 - 195) / 234 = 16.7%
    let result = decide(Personality::Nemesis, &even, &even, None, 1.2);
    assert_eq!(result.winner, Winner::Rival);
    assert!((result.winning_margin - 39.0 / 234.0 * 100.0).abs() < 1e-9);
    assert_eq!(respect_delta(&result), -1);
}

#[test]
fn ties_never_move_respect_whatever_the_margin() {
    // Rival: one category each way plus a tie is still a tie, even with a wide total gap.
    let user = ImprovementSnapshot::from_counts(40_000.0, 0.0, 2, 0, 1);
    let rival = ImprovementSnapshot::from_counts(5_000.0, 0.0, 3, 0, 1);
    let result = decide(Personality::Rival, &user, &rival, None, 1.0);
    assert_eq!(result.winner, Winner::Tie);
    assert!(result.winning_margin > 20.0);
    assert_eq!(respect_delta(&result), 0);
}
