//! Nemesis: composite scores with chaos injected into the rival's side.
use serde::{Deserialize, Serialize};

use super::{
    CategoryBreakdown, CategoryResult, DominantFactor, VictoryResult, Winner, gain_flourish,
    relative_band, strongest_factor,
};
use crate::constants::{
    CHAOS_BEAST_ABOVE, CHAOS_MAX, CHAOS_MIN, CHAOS_STUMBLE_BELOW, NEMESIS_PR_MULTIPLIER,
    NEMESIS_PR_WEIGHT, NEMESIS_VOLUME_DIVISOR, NEMESIS_VOLUME_WEIGHT, NEMESIS_WIN_FACTOR,
    NEMESIS_WORKOUT_WEIGHT, RIVAL_VOLUME_TIE_MARGIN,
};
use crate::numbers::symmetric_pct_diff;
use crate::personality::Personality;
use crate::rng::ChaosSource;
use crate::score::calculate_composite_score;
use crate::snapshot::ImprovementSnapshot;

/// How the chaos draw treated the nemesis this week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChaosTier {
    Stumbled,
    HardFought,
    BeastMode,
}

impl ChaosTier {
    #[must_use]
    pub fn from_factor(factor: f64) -> Self {
        if factor < CHAOS_STUMBLE_BELOW {
            Self::Stumbled
        } else if factor > CHAOS_BEAST_ABOVE {
            Self::BeastMode
        } else {
            Self::HardFought
        }
    }
}

fn decide(user: f64, rival: f64) -> Winner {
    if user > rival * NEMESIS_WIN_FACTOR {
        Winner::User
    } else if rival > user * NEMESIS_WIN_FACTOR {
        Winner::Rival
    } else {
        Winner::Tie
    }
}

fn exact(user: u32, rival: u32) -> Winner {
    relative_band(f64::from(user), f64::from(rival), 0.0)
}

pub(super) fn evaluate<C: ChaosSource + ?Sized>(
    user: &ImprovementSnapshot,
    rival: &ImprovementSnapshot,
    chaos: &mut C,
) -> VictoryResult {
    let raw = chaos.chaos_factor();
    let factor = if raw.is_finite() {
        raw.clamp(CHAOS_MIN, CHAOS_MAX)
    } else {
        1.0
    };
    let user_score = calculate_composite_score(user);
    let rival_base = calculate_composite_score(rival);
    let rival_score = rival_base * factor;

    let winner = decide(user_score, rival_score);
    let unmodified = decide(user_score, rival_base);

    let dominant_factor = if winner != unmodified {
        DominantFactor::Chaos
    } else {
        strongest_factor(
            winner,
            &[
                (
                    DominantFactor::Volume,
                    (user.volume_this_week - rival.volume_this_week) / NEMESIS_VOLUME_DIVISOR
                        * NEMESIS_VOLUME_WEIGHT,
                ),
                (
                    DominantFactor::Workouts,
                    (f64::from(user.workouts_this_week) - f64::from(rival.workouts_this_week))
                        * NEMESIS_WORKOUT_WEIGHT,
                ),
                (
                    DominantFactor::PersonalRecords,
                    (f64::from(user.prs_this_week) - f64::from(rival.prs_this_week))
                        * NEMESIS_PR_MULTIPLIER
                        * NEMESIS_PR_WEIGHT,
                ),
            ],
        )
    };

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

    VictoryResult {
        personality: Personality::Nemesis,
        winner,
        winning_margin: symmetric_pct_diff(user_score, rival_score),
        dominant_factor,
        breakdown,
        narrative: narrative(winner, ChaosTier::from_factor(factor), user),
        user_score,
        rival_score,
        chaos_factor: Some(factor),
    }
}

fn narrative(winner: Winner, tier: ChaosTier, user: &ImprovementSnapshot) -> String {
    match (tier, winner) {
        (ChaosTier::Stumbled, Winner::User) => format!(
            "Your nemesis stumbled this week and you made them pay.{}",
            gain_flourish(user)
        ),
        (ChaosTier::Stumbled, Winner::Rival) => {
            "Your nemesis stumbled this week and still beat you. Regroup.".to_string()
        }
        (ChaosTier::Stumbled, Winner::Tie) => {
            "Your nemesis stumbled, yet you could only match them.".to_string()
        }
        (ChaosTier::BeastMode, Winner::User) => format!(
            "Your nemesis went beast mode and you still came out on top.{}",
            gain_flourish(user)
        ),
        (ChaosTier::BeastMode, Winner::Rival) => {
            "Your nemesis went beast mode this week. Nothing you could do.".to_string()
        }
        (ChaosTier::BeastMode, Winner::Tie) => {
            "Your nemesis went beast mode and you held the line to a draw.".to_string()
        }
        (ChaosTier::HardFought, Winner::User) => format!(
            "A hard-fought week, but you edged your nemesis.{}",
            gain_flourish(user)
        ),
        (ChaosTier::HardFought, Winner::Rival) => {
            "A hard-fought week, and your nemesis edged you.".to_string()
        }
        (ChaosTier::HardFought, Winner::Tie) => {
            "A hard-fought week with your nemesis ends dead level.".to_string()
        }
    }
}
