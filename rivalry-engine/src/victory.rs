//! Showdown resolution.
//!
//! Each personality is a separate comparison policy living in its own
//! submodule. They all report through the same [`VictoryResult`] and
//! [`CategoryBreakdown`] shapes so display code never needs to know which
//! policy ran.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::encounter::UserHistory;
use crate::personality::Personality;
use crate::rng::ChaosSource;
use crate::snapshot::ImprovementSnapshot;

mod mentor;
mod mirror;
mod nemesis;
mod rival;

pub use nemesis::ChaosTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    User,
    Rival,
    Tie,
}

impl Winner {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Rival => "rival",
            Self::Tie => "tie",
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The factor that decided a showdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominantFactor {
    Volume,
    Workouts,
    PersonalRecords,
    /// The chaos draw flipped what the raw scores would have said.
    Chaos,
    /// Nothing separated the two sides.
    Balanced,
}

impl DominantFactor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Workouts => "workouts",
            Self::PersonalRecords => "personal_records",
            Self::Chaos => "chaos",
            Self::Balanced => "balanced",
        }
    }

    const fn phrase(self) -> &'static str {
        match self {
            Self::Volume => "total volume",
            Self::Workouts => "showing up",
            Self::PersonalRecords => "new personal records",
            Self::Chaos => "pure chaos",
            Self::Balanced => "nothing at all",
        }
    }
}

impl fmt::Display for DominantFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One compared category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub user_value: f64,
    pub rival_value: f64,
    pub winner: Winner,
}

impl CategoryResult {
    #[must_use]
    pub const fn new(user_value: f64, rival_value: f64, winner: Winner) -> Self {
        Self {
            user_value,
            rival_value,
            winner,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub volume: CategoryResult,
    pub workouts: CategoryResult,
    pub prs: CategoryResult,
    /// Only the Mentor policy compares growth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<CategoryResult>,
}

impl CategoryBreakdown {
    /// Categories won by each side as `(user, rival)`, growth excluded.
    #[must_use]
    pub fn tally(&self) -> (u8, u8) {
        [self.volume, self.workouts, self.prs]
            .iter()
            .fold((0, 0), |(u, r), c| match c.winner {
                Winner::User => (u + 1, r),
                Winner::Rival => (u, r + 1),
                Winner::Tie => (u, r),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VictoryResult {
    pub personality: Personality,
    pub winner: Winner,
    /// Decisiveness, 0 for a dead heat. The scale depends on the personality.
    pub winning_margin: f64,
    pub dominant_factor: DominantFactor,
    pub breakdown: CategoryBreakdown,
    pub narrative: String,
    pub user_score: f64,
    pub rival_score: f64,
    /// The Nemesis draw; absent for every other personality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chaos_factor: Option<f64>,
}

/// Decide a showdown under the given personality's rules.
///
/// `user_history` only matters to Mirror; `chaos` is only drawn by Nemesis.
pub fn calculate_victory<C: ChaosSource + ?Sized>(
    personality: Personality,
    user: &ImprovementSnapshot,
    rival: &ImprovementSnapshot,
    user_history: Option<&UserHistory>,
    chaos: &mut C,
) -> VictoryResult {
    let user = user.clone().sanitized();
    let rival = rival.clone().sanitized();
    let result = match personality {
        Personality::Mirror => mirror::evaluate(&user, user_history),
        Personality::Rival => rival::evaluate(&user, &rival),
        Personality::Mentor => mentor::evaluate(&user, &rival),
        Personality::Nemesis => nemesis::evaluate(&user, &rival, chaos),
    };
    log::debug!(
        "{personality} showdown: {} by {:.2} ({}), user {:.2} vs rival {:.2}",
        result.winner,
        result.winning_margin,
        result.dominant_factor,
        result.user_score,
        result.rival_score
    );
    result
}

/// Head-to-head comparison where the user must clear the rival's value by
/// `band` (as a fraction of the rival's value) to take the category.
pub(crate) fn relative_band(user: f64, rival: f64, band: f64) -> Winner {
    if user > rival * (1.0 + band) {
        Winner::User
    } else if user < rival * (1.0 - band) {
        Winner::Rival
    } else {
        Winner::Tie
    }
}

/// Comparison with an absolute dead zone around equality.
pub(crate) fn absolute_band(user: f64, rival: f64, band: f64) -> Winner {
    if user > rival + band {
        Winner::User
    } else if rival > user + band {
        Winner::Rival
    } else {
        Winner::Tie
    }
}

/// Pick the winner's strongest category from `(factor, signed advantage)`
/// pairs, where a positive advantage favours the user.
pub(crate) fn strongest_factor(winner: Winner, advantages: &[(DominantFactor, f64)]) -> DominantFactor {
    let sign = match winner {
        Winner::User => 1.0,
        Winner::Rival => -1.0,
        Winner::Tie => return DominantFactor::Balanced,
    };
    advantages
        .iter()
        .map(|(factor, adv)| (*factor, adv * sign))
        .filter(|(_, adv)| *adv > 0.0)
        .fold(None, |best: Option<(DominantFactor, f64)>, (factor, adv)| match best {
            Some((_, top)) if top >= adv => best,
            _ => Some((factor, adv)),
        })
        .map_or(DominantFactor::Balanced, |(factor, _)| factor)
}

/// Closing line naming the user's biggest lift gain, if any.
pub(crate) fn gain_flourish(user: &ImprovementSnapshot) -> String {
    user.top_exercise_gains
        .first()
        .map(|g| format!(" Biggest jump: {} (+{:.1} kg).", g.exercise, g.gain))
        .unwrap_or_default()
}

pub(crate) fn standard_narrative(
    personality: Personality,
    winner: Winner,
    factor: DominantFactor,
    user: &ImprovementSnapshot,
) -> String {
    let opponent = personality.opponent_label();
    match winner {
        Winner::User => format!(
            "You beat {opponent} this week on {}.{}",
            factor.phrase(),
            gain_flourish(user)
        ),
        Winner::Rival => format!(
            "{} edged you out this week on {}. Next week is yours to take.",
            capitalize(opponent),
            factor.phrase()
        ),
        Winner::Tie => format!("Dead even with {opponent} this week. Break the deadlock next week."),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::FixedChaos;

    #[test]
    fn bands_split_three_ways() {
        assert_eq!(relative_band(106.0, 100.0, 0.05), Winner::User);
        assert_eq!(relative_band(94.0, 100.0, 0.05), Winner::Rival);
        assert_eq!(relative_band(103.0, 100.0, 0.05), Winner::Tie);
        assert_eq!(absolute_band(12.5, 10.0, 2.0), Winner::User);
        assert_eq!(absolute_band(10.0, 12.0, 2.0), Winner::Tie);
        assert_eq!(absolute_band(10.0, 12.1, 2.0), Winner::Rival);
    }

    #[test]
    fn strongest_factor_follows_winner() {
        let adv = [
            (DominantFactor::Volume, 3.0),
            (DominantFactor::Workouts, -5.0),
            (DominantFactor::PersonalRecords, 1.0),
        ];
        assert_eq!(strongest_factor(Winner::User, &adv), DominantFactor::Volume);
        assert_eq!(strongest_factor(Winner::Rival, &adv), DominantFactor::Workouts);
        assert_eq!(strongest_factor(Winner::Tie, &adv), DominantFactor::Balanced);
    }

    #[test]
    fn every_personality_fills_the_same_breakdown_shape() {
        let user = ImprovementSnapshot::from_counts(12_000.0, 10_000.0, 4, 3, 1);
        let rival = ImprovementSnapshot::from_counts(9_000.0, 9_500.0, 3, 3, 0);
        for personality in Personality::ALL {
            let result = calculate_victory(personality, &user, &rival, None, &mut FixedChaos(1.0));
            assert_eq!(result.personality, personality);
            assert!(result.winning_margin >= 0.0);
            assert!(result.winning_margin.is_finite());
            assert!(!result.narrative.is_empty());
            assert_eq!(
                result.breakdown.growth_rate.is_some(),
                personality == Personality::Mentor
            );
            assert_eq!(
                result.chaos_factor.is_some(),
                personality == Personality::Nemesis
            );
        }
    }

    #[test]
    fn idle_parties_never_produce_nan() {
        let idle = ImprovementSnapshot::default();
        for personality in Personality::ALL {
            let result = calculate_victory(personality, &idle, &idle, None, &mut FixedChaos(1.0));
            assert!(result.user_score.is_finite());
            assert!(result.rival_score.is_finite());
            assert!(result.winning_margin.is_finite());
            assert_eq!(result.winner, Winner::Tie, "{personality}");
        }
    }

    #[test]
    fn tally_counts_categories() {
        let breakdown = CategoryBreakdown {
            volume: CategoryResult::new(1.0, 0.0, Winner::User),
            workouts: CategoryResult::new(1.0, 1.0, Winner::Tie),
            prs: CategoryResult::new(0.0, 1.0, Winner::Rival),
            growth_rate: None,
        };
        assert_eq!(breakdown.tally(), (1, 1));
    }

    #[test]
    fn user_win_narrative_mentions_top_gain() {
        let mut user = ImprovementSnapshot::from_counts(1.0, 1.0, 1, 1, 0);
        user.top_exercise_gains.push(crate::snapshot::ExerciseGain {
            exercise: "squat".into(),
            gain: 5.0,
        });
        let text = standard_narrative(
            Personality::Rival,
            Winner::User,
            DominantFactor::Volume,
            &user,
        );
        assert!(text.contains("squat"));
        assert!(text.contains("your rival"));
        let loss = standard_narrative(
            Personality::Mentor,
            Winner::Rival,
            DominantFactor::Workouts,
            &user,
        );
        assert!(loss.starts_with("Your mentor"));
    }
}
