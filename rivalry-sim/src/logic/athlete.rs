//! Synthetic athletes that fill a workout log week by week.
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rivalry_engine::{ExerciseLog, MemoryWorkoutLog, SetLog, WorkoutSession};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lift id, fraction of the working weight, reps per set.
const LIFTS: [(&str, f64, u32); 3] = [("squat", 1.0, 5), ("bench", 0.7, 8), ("deadlift", 1.2, 5)];
const SETS_PER_LIFT: usize = 3;
/// Sessions land Monday..Saturday evening before the Sunday showdown.
const MAX_SESSIONS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AthleteProfile {
    /// Four sessions most weeks with slow linear progress.
    Steady,
    /// Adds a session every third week and a plate every week.
    Climber,
    /// Anywhere from zero to five sessions, flat loading, sometimes quits mid-session.
    Sporadic,
    /// Training tapers off and loads drop.
    Slumping,
    /// Never logs anything.
    Idle,
}

impl AthleteProfile {
    pub const ALL: [Self; 5] = [
        Self::Steady,
        Self::Climber,
        Self::Sporadic,
        Self::Slumping,
        Self::Idle,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Steady => "steady",
            Self::Climber => "climber",
            Self::Sporadic => "sporadic",
            Self::Slumping => "slumping",
            Self::Idle => "idle",
        }
    }

    /// Plan week `index` (zero-based) of a season.
    pub fn plan_week<R: Rng + ?Sized>(self, index: u32, rng: &mut R) -> WeekPlan {
        let week = f64::from(index);
        let (sessions, weight, abandoned) = match self {
            Self::Steady => {
                let sessions = match rng.gen_range(0..10) {
                    0 => 3,
                    1 => 5,
                    _ => 4,
                };
                (sessions, 80.0 + week * 0.5, false)
            }
            Self::Climber => (3 + index / 3, 70.0 + week * 2.5, false),
            Self::Sporadic => (
                rng.gen_range(0..=5),
                75.0 + rng.gen_range(-5.0..=5.0),
                rng.gen_bool(0.15),
            ),
            Self::Slumping => (
                5u32.saturating_sub(index / 2).max(1),
                (100.0 - week * 1.5).max(40.0),
                false,
            ),
            Self::Idle => (0, 0.0, false),
        };
        WeekPlan {
            sessions: sessions.min(MAX_SESSIONS),
            weight,
            abandoned,
        }
    }
}

impl fmt::Display for AthleteProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AthleteProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|profile| profile.as_str().eq_ignore_ascii_case(s.trim()))
            .with_context(|| format!("unknown athlete profile: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekPlan {
    pub sessions: u32,
    /// Working weight for the main lift in kg.
    pub weight: f64,
    /// Log one extra session that was started and never completed.
    pub abandoned: bool,
}

fn session(id: String, at: DateTime<Utc>, weight: f64) -> WorkoutSession {
    let exercises = LIFTS
        .iter()
        .map(|&(lift, ratio, reps)| {
            ExerciseLog::new(lift, vec![SetLog::new(weight * ratio, reps); SETS_PER_LIFT])
        })
        .collect();
    WorkoutSession::new(id, at, exercises)
}

/// Write the planned sessions into the week ending on `sunday`.
///
/// # Errors
///
/// Returns an error if the log cannot be written.
pub fn log_week(
    log: &MemoryWorkoutLog,
    user_id: &str,
    sunday: DateTime<Utc>,
    plan: &WeekPlan,
) -> Result<()> {
    let mut sessions: Vec<WorkoutSession> = (0..plan.sessions)
        .map(|day| {
            let at = sunday - Duration::days(i64::from(day) + 1);
            session(format!("{user_id}-{}", at.date_naive()), at, plan.weight)
        })
        .collect();
    if plan.abandoned {
        let at = sunday - Duration::hours(2);
        let mut quit = session(
            format!("{user_id}-{}-abandoned", at.date_naive()),
            at,
            plan.weight * 1.5,
        );
        quit.completed = false;
        sessions.push(quit);
    }
    log.extend(user_id, sessions)
        .with_context(|| format!("failed to log training for {user_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn idle_athletes_never_train() {
        let mut rng = SmallRng::seed_from_u64(1);
        for week in 0..20 {
            let plan = AthleteProfile::Idle.plan_week(week, &mut rng);
            assert_eq!(plan.sessions, 0);
            assert!(!plan.abandoned);
        }
    }

    #[test]
    fn climbers_add_load_and_sessions() {
        let mut rng = SmallRng::seed_from_u64(2);
        let first = AthleteProfile::Climber.plan_week(0, &mut rng);
        let later = AthleteProfile::Climber.plan_week(9, &mut rng);
        assert!(later.sessions > first.sessions);
        assert!(later.weight > first.weight);
        let capped = AthleteProfile::Climber.plan_week(40, &mut rng);
        assert_eq!(capped.sessions, MAX_SESSIONS);
    }

    #[test]
    fn slumping_never_drops_below_one_session() {
        let mut rng = SmallRng::seed_from_u64(3);
        let plan = AthleteProfile::Slumping.plan_week(30, &mut rng);
        assert_eq!(plan.sessions, 1);
        assert!(plan.weight >= 40.0);
    }

    #[test]
    fn parses_profiles_case_insensitively() {
        assert_eq!(
            "Climber".parse::<AthleteProfile>().unwrap(),
            AthleteProfile::Climber
        );
        assert!("couch".parse::<AthleteProfile>().is_err());
    }

    #[test]
    fn logged_week_only_counts_completed_sessions() {
        use chrono::TimeZone;
        use rivalry_engine::{WeekKey, WorkoutHistoryLoader};

        let sunday = Utc.with_ymd_and_hms(2026, 7, 26, 20, 0, 0).unwrap();
        let log = MemoryWorkoutLog::new();
        let plan = WeekPlan {
            sessions: 3,
            weight: 100.0,
            abandoned: true,
        };
        log_week(&log, "sim", sunday, &plan).unwrap();
        let history = log
            .load_history("sim", WeekKey::from_datetime(sunday))
            .unwrap();
        let snapshot = rivalry_engine::ImprovementSnapshot::from_history(&history, 4, 3);
        assert_eq!(snapshot.workouts_this_week, 3);
    }
}
