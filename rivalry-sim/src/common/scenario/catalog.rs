use anyhow::{Result, ensure};
use rivalry_engine::{
    Difficulty, Personality, RivalRelationship, ShowdownStatus, UserHistory, Winner,
};

use super::TestScenario;
use crate::logic::season::SeasonSummary;
use crate::logic::{AthleteProfile, Opponent, SeasonPlan};

const RESPECT_RANGE: std::ops::RangeInclusive<u8> = 1..=5;
const HEAT_MAX: u8 = 100;
const CHAOS_RANGE: std::ops::RangeInclusive<f64> = 0.7..=1.3;

pub fn smoke_scenario() -> TestScenario {
    TestScenario::simulation(
        "Smoke Test",
        SeasonPlan::new(AthleteProfile::Steady, Opponent::phantom(Personality::Rival))
            .with_weeks(4)
            .with_expectation(season_invariants),
    )
}

pub fn state_bounds_scenario() -> TestScenario {
    TestScenario::simulation(
        "Respect and Heat Clamping",
        SeasonPlan::new(
            AthleteProfile::Climber,
            Opponent::Phantom {
                personality: Personality::Mirror,
                difficulty: Difficulty::Easy,
            },
        )
        .with_weeks(16)
        .with_expectation(season_invariants)
        .with_expectation(deltas_are_clamped),
    )
}

pub fn streak_reset_scenario() -> TestScenario {
    TestScenario::simulation(
        "Win Streak Transitions",
        SeasonPlan::new(
            AthleteProfile::Sporadic,
            Opponent::Peer {
                personality: Personality::Rival,
                friend: AthleteProfile::Sporadic,
            },
        )
        .with_weeks(16)
        .with_expectation(season_invariants)
        .with_expectation(streaks_follow_outcomes),
    )
}

pub fn idempotent_retries_scenario() -> TestScenario {
    TestScenario::simulation(
        "Idempotent Showdown Retries",
        SeasonPlan::new(
            AthleteProfile::Steady,
            Opponent::phantom(Personality::Nemesis),
        )
        .with_weeks(8)
        .with_replays()
        .with_expectation(season_invariants)
        .with_expectation(replays_change_nothing),
    )
}

pub fn chaos_liveness_scenario() -> TestScenario {
    TestScenario::simulation(
        "Nemesis Chaos Liveness",
        SeasonPlan::new(
            AthleteProfile::Steady,
            Opponent::phantom(Personality::Nemesis),
        )
        .with_expectation(season_invariants)
        .with_expectation(chaos_stays_live),
    )
}

pub fn mentor_growth_scenario() -> TestScenario {
    TestScenario::simulation(
        "Mentor Growth Bias",
        SeasonPlan::new(
            AthleteProfile::Steady,
            Opponent::phantom(Personality::Mentor),
        )
        .with_expectation(season_invariants)
        .with_expectation(mentor_keeps_ahead),
    )
}

pub fn idle_user_scenario() -> TestScenario {
    TestScenario::simulation(
        "Idle Athlete vs Nemesis",
        SeasonPlan::new(AthleteProfile::Idle, Opponent::phantom(Personality::Nemesis))
            .with_weeks(8)
            .with_expectation(season_invariants)
            .with_expectation(idle_athlete_always_loses),
    )
}

pub fn mirror_baseline_scenario() -> TestScenario {
    TestScenario::simulation(
        "Mirror Rolling Baseline",
        SeasonPlan::new(
            AthleteProfile::Climber,
            Opponent::phantom(Personality::Mirror),
        )
        .with_weeks(8)
        .with_expectation(season_invariants)
        .with_expectation(mirror_uses_rolling_average),
    )
}

pub fn peer_rivalry_scenario() -> TestScenario {
    TestScenario::simulation(
        "Peer Rivalry Season",
        SeasonPlan::new(
            AthleteProfile::Climber,
            Opponent::Peer {
                personality: Personality::Rival,
                friend: AthleteProfile::Slumping,
            },
        )
        .with_expectation(season_invariants)
        .with_expectation(climber_overtakes_slumping_friend),
    )
}

fn check_relationship(rel: &RivalRelationship, label: &str) -> Result<()> {
    ensure!(
        RESPECT_RANGE.contains(&rel.respect_level),
        "{label}: respect {} out of range",
        rel.respect_level
    );
    ensure!(rel.rivalry_heat <= HEAT_MAX, "{label}: heat {} over cap", rel.rivalry_heat);
    ensure!(
        rel.user_wins + rel.rival_wins + rel.ties == rel.encounter_count,
        "{label}: {} + {} + {} outcomes vs {} encounters",
        rel.user_wins,
        rel.rival_wins,
        rel.ties,
        rel.encounter_count
    );
    ensure!(
        rel.longest_win_streak >= rel.win_streak.max(0).unsigned_abs(),
        "{label}: longest win streak {} below current {}",
        rel.longest_win_streak,
        rel.win_streak
    );
    ensure!(
        rel.longest_lose_streak >= rel.win_streak.min(0).unsigned_abs(),
        "{label}: longest lose streak {} below current {}",
        rel.longest_lose_streak,
        rel.win_streak
    );
    Ok(())
}

/// Bounds, counts and ordering every season must satisfy.
pub fn season_invariants(summary: &SeasonSummary) -> Result<()> {
    let played = u32::try_from(summary.weeks.len())?;
    ensure!(
        summary.final_relationship.encounter_count == played,
        "{} encounters counted for {played} weeks",
        summary.final_relationship.encounter_count
    );
    ensure!(
        summary.encounter_log.len() == summary.weeks.len(),
        "encounter log holds {} entries for {played} weeks",
        summary.encounter_log.len()
    );
    ensure!(
        summary
            .encounter_log
            .windows(2)
            .all(|pair| pair[0].week() < pair[1].week()),
        "encounter log is not ordered by week"
    );
    check_relationship(&summary.final_relationship, "final")?;
    for week in &summary.weeks {
        let label = week.encounter.week().to_string();
        ensure!(
            week.status == ShowdownStatus::Recorded,
            "{label}: weekly showdown was not recorded"
        );
        ensure!(
            week.relationship.encounter_count == week.index + 1,
            "{label}: encounter count {} after week {}",
            week.relationship.encounter_count,
            week.index + 1
        );
        ensure!(
            week.encounter.winning_margin().is_finite() && week.encounter.winning_margin() >= 0.0,
            "{label}: margin {} is not a finite non-negative number",
            week.encounter.winning_margin()
        );
        check_relationship(&week.relationship, &label)?;
    }
    Ok(())
}

fn deltas_are_clamped(summary: &SeasonSummary) -> Result<()> {
    let (mut respect, mut heat) = (i32::from(*RESPECT_RANGE.start()), 0i32);
    for week in &summary.weeks {
        let deltas = &week.encounter.deltas;
        respect = (respect + deltas.respect_delta).clamp(
            i32::from(*RESPECT_RANGE.start()),
            i32::from(*RESPECT_RANGE.end()),
        );
        heat = (heat + deltas.heat_delta).clamp(0, i32::from(HEAT_MAX));
        ensure!(
            i32::from(week.relationship.respect_level) == respect,
            "{}: respect {} but clamped deltas give {respect}",
            week.encounter.week(),
            week.relationship.respect_level
        );
        ensure!(
            i32::from(week.relationship.rivalry_heat) == heat,
            "{}: heat {} but clamped deltas give {heat}",
            week.encounter.week(),
            week.relationship.rivalry_heat
        );
    }
    Ok(())
}

fn streaks_follow_outcomes(summary: &SeasonSummary) -> Result<()> {
    let mut streak = 0i32;
    for week in &summary.weeks {
        let deltas = &week.encounter.deltas;
        ensure!(
            deltas.streak_before == streak,
            "{}: streak_before {} but previous week ended on {streak}",
            week.encounter.week(),
            deltas.streak_before
        );
        let expected = match week.encounter.winner() {
            Winner::User if streak > 0 => streak + 1,
            Winner::User => 1,
            Winner::Rival if streak < 0 => streak - 1,
            Winner::Rival => -1,
            Winner::Tie => streak,
        };
        ensure!(
            deltas.streak_after == expected && week.relationship.win_streak == expected,
            "{}: {} moved streak {streak} to {} (expected {expected})",
            week.encounter.week(),
            week.encounter.winner(),
            week.relationship.win_streak
        );
        streak = expected;
    }
    Ok(())
}

fn replays_change_nothing(summary: &SeasonSummary) -> Result<()> {
    for week in &summary.weeks {
        ensure!(
            week.replay == Some(ShowdownStatus::AlreadyRecorded),
            "{}: replay returned {:?}",
            week.encounter.week(),
            week.replay
        );
    }
    ensure!(
        summary.metrics.replays_rejected == summary.metrics.encounters,
        "{} replays rejected for {} encounters",
        summary.metrics.replays_rejected,
        summary.metrics.encounters
    );
    Ok(())
}

fn chaos_stays_live(summary: &SeasonSummary) -> Result<()> {
    let draws = &summary.metrics.chaos_factors;
    ensure!(
        draws.len() == summary.weeks.len(),
        "{} chaos draws for {} nemesis weeks",
        draws.len(),
        summary.weeks.len()
    );
    ensure!(
        draws.iter().all(|d| CHAOS_RANGE.contains(d)),
        "chaos draw outside {CHAOS_RANGE:?}: {draws:?}"
    );
    if let Some(first) = draws.first() {
        ensure!(
            draws.len() < 2 || draws.iter().any(|d| (d - first).abs() > f64::EPSILON),
            "chaos factor frozen at {first}"
        );
    }
    ensure!(
        summary
            .weeks
            .iter()
            .all(|w| !w.encounter.result.narrative.is_empty()),
        "nemesis week without a narrative"
    );
    Ok(())
}

fn mentor_keeps_ahead(summary: &SeasonSummary) -> Result<()> {
    let metrics = &summary.metrics;
    ensure!(
        metrics.rival_outgrew_user * 3 >= metrics.growth_weeks,
        "mentor out-grew the athlete in only {} of {} weeks",
        metrics.rival_outgrew_user,
        metrics.growth_weeks
    );
    Ok(())
}

fn idle_athlete_always_loses(summary: &SeasonSummary) -> Result<()> {
    for week in &summary.weeks {
        ensure!(
            week.encounter.user_metrics.is_idle(),
            "{}: idle athlete logged training",
            week.encounter.week()
        );
        ensure!(
            week.encounter.winner() == Winner::Rival,
            "{}: idle athlete got a {}",
            week.encounter.week(),
            week.encounter.winner()
        );
    }
    let played = i32::try_from(summary.weeks.len())?;
    let rel = &summary.final_relationship;
    ensure!(rel.win_streak == -played, "streak {} after {played} losses", rel.win_streak);
    ensure!(
        rel.respect_level == *RESPECT_RANGE.start(),
        "respect {} after a losing season",
        rel.respect_level
    );
    Ok(())
}

fn mirror_uses_rolling_average(summary: &SeasonSummary) -> Result<()> {
    for (index, week) in summary.weeks.iter().enumerate() {
        let baseline = week.encounter.result.breakdown.volume.rival_value;
        let history = UserHistory::from_encounters(&summary.encounter_log, week.encounter.week());
        let expected = if history.is_empty() {
            week.encounter.user_metrics.volume_last_week
        } else {
            history.avg_volume_4_week
        };
        let window = summary.encounter_log[..index]
            .iter()
            .rev()
            .take(4)
            .map(|e| e.user_metrics.volume_this_week)
            .collect::<Vec<_>>();
        if !window.is_empty() {
            let manual = window.iter().sum::<f64>() / f64::from(u32::try_from(window.len())?);
            ensure!(
                (manual - expected).abs() < 1e-6,
                "{}: history average {expected:.1} differs from the last {} weeks ({manual:.1})",
                week.encounter.week(),
                window.len()
            );
        }
        ensure!(
            (baseline - expected).abs() < 1e-6,
            "{}: mirror baseline {baseline:.1}, expected {expected:.1}",
            week.encounter.week()
        );
    }
    Ok(())
}

fn climber_overtakes_slumping_friend(summary: &SeasonSummary) -> Result<()> {
    let metrics = &summary.metrics;
    ensure!(
        metrics.user_wins > metrics.rival_wins,
        "climber won {} and lost {} against a slumping friend",
        metrics.user_wins,
        metrics.rival_wins
    );
    if let Some(last) = summary.weeks.last() {
        ensure!(
            last.encounter.winner() == Winner::User,
            "climber lost the final week"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::SeasonRunner;
    use rivalry_engine::EngineConfig;

    fn run(scenario: &TestScenario, seed: u64) -> SeasonSummary {
        SeasonRunner::new(EngineConfig::default(), false)
            .run_plan(&scenario.plan, seed)
            .unwrap()
    }

    fn evaluate(scenario: &TestScenario, seed: u64) -> Result<()> {
        let summary = run(scenario, seed);
        for expectation in &scenario.plan.expectations {
            expectation.evaluate(&summary)?;
        }
        Ok(())
    }

    #[test]
    fn catalog_passes_on_default_seed() {
        for scenario in [
            smoke_scenario(),
            state_bounds_scenario(),
            streak_reset_scenario(),
            idempotent_retries_scenario(),
            chaos_liveness_scenario(),
            mentor_growth_scenario(),
            idle_user_scenario(),
            mirror_baseline_scenario(),
            peer_rivalry_scenario(),
        ] {
            evaluate(&scenario, 1337).unwrap_or_else(|e| panic!("{}: {e:#}", scenario.name));
        }
    }

    #[test]
    fn invariants_flag_a_tampered_relationship() {
        let mut summary = run(&smoke_scenario(), 5);
        summary.final_relationship.rivalry_heat = 101;
        assert!(season_invariants(&summary).is_err());

        let mut summary = run(&smoke_scenario(), 5);
        summary.final_relationship.ties += 1;
        assert!(season_invariants(&summary).is_err());
    }

    #[test]
    fn streak_check_catches_a_missed_reset() {
        let mut summary = run(&streak_reset_scenario(), 21);
        let Some(week) = summary
            .weeks
            .iter_mut()
            .find(|w| w.encounter.winner() != Winner::Tie)
        else {
            return;
        };
        week.relationship.win_streak += 7;
        assert!(streaks_follow_outcomes(&summary).is_err());
    }
}
