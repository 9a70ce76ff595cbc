//! Season runner: drives weekly showdowns through a real engine backed by
//! the in-memory store, one isolated world per seed.
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use log::debug;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rivalry_engine::{
    Difficulty, Encounter, EngineConfig, MemoryRivalryStore, MemoryWorkoutLog, Personality,
    PhantomConfig, RivalRelationship, RivalryEngine, RivalryStorage, ShowdownRequest,
    ShowdownStatus, WeekKey, calculate_growth_rate,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

use super::athlete::{AthleteProfile, log_week};

pub const DEFAULT_SEASON_WEEKS: u32 = 12;
pub const ATHLETE_ID: &str = "athlete";
pub const FRIEND_ID: &str = "friend";
const OPENING_YEAR: i32 = 2026;
const OPENING_WEEK: u32 = 1;
const FRIEND_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Who the simulated athlete is up against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opponent {
    Phantom {
        personality: Personality,
        difficulty: Difficulty,
    },
    Peer {
        personality: Personality,
        friend: AthleteProfile,
    },
}

impl Opponent {
    #[must_use]
    pub const fn phantom(personality: Personality) -> Self {
        Self::Phantom {
            personality,
            difficulty: Difficulty::Normal,
        }
    }

    #[must_use]
    pub const fn personality(self) -> Personality {
        match self {
            Self::Phantom { personality, .. } | Self::Peer { personality, .. } => personality,
        }
    }

    fn relationship(self, id: &str, now: DateTime<Utc>) -> RivalRelationship {
        match self {
            Self::Phantom {
                personality,
                difficulty,
            } => RivalRelationship::new_phantom(
                id,
                ATHLETE_ID,
                PhantomConfig::new(format!("{personality} phantom"), personality)
                    .with_difficulty(difficulty),
                now,
            ),
            Self::Peer { personality, .. } => {
                RivalRelationship::new_peer(id, ATHLETE_ID, FRIEND_ID, personality, now)
            }
        }
    }
}

impl fmt::Display for Opponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Phantom {
                personality,
                difficulty,
            } => write!(f, "{personality} phantom ({difficulty})"),
            Self::Peer {
                personality,
                friend,
            } => write!(f, "{personality} peer ({friend})"),
        }
    }
}

/// Assertion hook run after a season completes.
type SeasonExpectationFn = Arc<dyn Fn(&SeasonSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SeasonExpectation(SeasonExpectationFn);

impl fmt::Debug for SeasonExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeasonExpectation").finish()
    }
}

impl SeasonExpectation {
    /// # Errors
    ///
    /// Returns the expectation's failure.
    pub fn evaluate(&self, summary: &SeasonSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SeasonExpectation
where
    F: Fn(&SeasonSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

#[derive(Debug, Clone)]
pub struct SeasonPlan {
    pub athlete: AthleteProfile,
    pub opponent: Opponent,
    pub weeks: u32,
    /// Fire an on-demand showdown right after each weekly one.
    pub replay_triggers: bool,
    pub expectations: Vec<SeasonExpectation>,
}

impl SeasonPlan {
    #[must_use]
    pub const fn new(athlete: AthleteProfile, opponent: Opponent) -> Self {
        Self {
            athlete,
            opponent,
            weeks: DEFAULT_SEASON_WEEKS,
            replay_triggers: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_weeks(mut self, weeks: u32) -> Self {
        self.weeks = weeks;
        self
    }

    #[must_use]
    pub const fn with_replays(mut self) -> Self {
        self.replay_triggers = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SeasonExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// One settled week as the engine reported it.
#[derive(Debug, Clone)]
pub struct WeekRecord {
    pub index: u32,
    pub status: ShowdownStatus,
    pub replay: Option<ShowdownStatus>,
    pub encounter: Encounter,
    pub relationship: RivalRelationship,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeasonMetrics {
    pub encounters: u32,
    pub user_wins: u32,
    pub rival_wins: u32,
    pub ties: u32,
    pub final_respect: u8,
    pub final_heat: u8,
    pub peak_heat: u8,
    pub longest_win_streak: u32,
    pub longest_lose_streak: u32,
    pub mean_margin: f64,
    pub mean_user_volume: f64,
    pub mean_rival_volume: f64,
    pub chaos_factors: Vec<f64>,
    /// Weeks after the first where the rival's volume grew faster than the user's.
    pub rival_outgrew_user: u32,
    pub growth_weeks: u32,
    pub replays_rejected: u32,
}

impl SeasonMetrics {
    fn collect(weeks: &[WeekRecord], relationship: &RivalRelationship) -> Self {
        let mut metrics = Self {
            final_respect: relationship.respect_level,
            final_heat: relationship.rivalry_heat,
            longest_win_streak: relationship.longest_win_streak,
            longest_lose_streak: relationship.longest_lose_streak,
            user_wins: relationship.user_wins,
            rival_wins: relationship.rival_wins,
            ties: relationship.ties,
            encounters: relationship.encounter_count,
            ..Self::default()
        };
        let mut margin_sum = 0.0;
        let mut user_volume = 0.0;
        let mut rival_volume = 0.0;
        for week in weeks {
            let encounter = &week.encounter;
            metrics.peak_heat = metrics.peak_heat.max(week.relationship.rivalry_heat);
            margin_sum += encounter.winning_margin();
            user_volume += encounter.user_metrics.volume_this_week;
            rival_volume += encounter.rival_metrics.volume_this_week;
            if let Some(factor) = encounter.result.chaos_factor {
                metrics.chaos_factors.push(factor);
            }
            if week.index > 0 {
                metrics.growth_weeks += 1;
                let user = &encounter.user_metrics;
                let rival = &encounter.rival_metrics;
                if calculate_growth_rate(rival.volume_this_week, rival.volume_last_week)
                    > calculate_growth_rate(user.volume_this_week, user.volume_last_week)
                {
                    metrics.rival_outgrew_user += 1;
                }
            }
            if week.replay == Some(ShowdownStatus::AlreadyRecorded) {
                metrics.replays_rejected += 1;
            }
        }
        if let Ok(count) = u32::try_from(weeks.len())
            && count > 0
        {
            let denom = f64::from(count);
            metrics.mean_margin = margin_sum / denom;
            metrics.mean_user_volume = user_volume / denom;
            metrics.mean_rival_volume = rival_volume / denom;
        }
        metrics
    }
}

#[derive(Debug, Clone)]
pub struct SeasonSummary {
    pub seed: u64,
    pub athlete: AthleteProfile,
    pub opponent: Opponent,
    pub weeks: Vec<WeekRecord>,
    /// The encounter log as stored, oldest first.
    pub encounter_log: Vec<Encounter>,
    pub final_relationship: RivalRelationship,
    pub metrics: SeasonMetrics,
}

impl SeasonSummary {
    /// SHA-256 over the serialized encounter log.
    ///
    /// # Errors
    ///
    /// Returns an error if an encounter fails to serialize.
    pub fn digest(&self) -> Result<[u8; 32]> {
        let bytes = serde_json::to_vec(&self.encounter_log).context("serialize encounter log")?;
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let mut digest = [0_u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        Ok(digest)
    }
}

/// Showdown time for a week: Sunday 20:00 UTC.
#[must_use]
pub fn showdown_time(week: WeekKey) -> DateTime<Utc> {
    week.start() + Duration::days(6) + Duration::hours(20)
}

#[derive(Debug, Clone)]
pub struct SeasonRunner {
    config: EngineConfig,
    verbose: bool,
}

impl SeasonRunner {
    #[must_use]
    pub const fn new(config: EngineConfig, verbose: bool) -> Self {
        Self { config, verbose }
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Play `plan` from an empty world. The same seed replays the same season.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the config or a showdown fails.
    pub fn run_plan(&self, plan: &SeasonPlan, seed: u64) -> Result<SeasonSummary> {
        let mut athlete_rng = SmallRng::seed_from_u64(seed);
        let mut friend_rng = SmallRng::seed_from_u64(seed ^ FRIEND_STREAM);
        let opening = WeekKey::new(OPENING_YEAR, OPENING_WEEK)?;
        let id = format!("season-{seed:016x}");

        let store = MemoryRivalryStore::new();
        store.insert_relationship(plan.opponent.relationship(&id, opening.start()))?;
        let engine = RivalryEngine::new(MemoryWorkoutLog::new(), store)
            .with_config(self.config.clone())?;

        let mut weeks = Vec::with_capacity(usize::try_from(plan.weeks).unwrap_or(0));
        let mut week = opening;
        for index in 0..plan.weeks {
            let at = showdown_time(week);
            let athlete_week = plan.athlete.plan_week(index, &mut athlete_rng);
            log_week(engine.loader(), ATHLETE_ID, at, &athlete_week)?;
            if let Opponent::Peer { friend, .. } = plan.opponent {
                let friend_week = friend.plan_week(index, &mut friend_rng);
                log_week(engine.loader(), FRIEND_ID, at, &friend_week)?;
            }

            let outcome = engine
                .run_showdown(&ShowdownRequest::weekly(id.as_str(), at))
                .with_context(|| format!("weekly showdown for {week} (seed {seed})"))?;
            let replay = if plan.replay_triggers {
                let again = engine
                    .run_showdown(&ShowdownRequest::on_demand(id.as_str(), at))
                    .with_context(|| format!("replayed showdown for {week} (seed {seed})"))?;
                Some(again.status)
            } else {
                None
            };

            if self.verbose {
                debug!(
                    "seed {seed} {week}: {} by {:.1} (respect {}, heat {}, streak {})",
                    outcome.encounter.winner(),
                    outcome.encounter.winning_margin(),
                    outcome.relationship.respect_level,
                    outcome.relationship.rivalry_heat,
                    outcome.relationship.win_streak
                );
            }

            weeks.push(WeekRecord {
                index,
                status: outcome.status,
                replay,
                encounter: outcome.encounter,
                relationship: outcome.relationship,
            });
            week = week.next();
        }

        let encounter_log = engine.storage().encounters_for(&id)?;
        let final_relationship = engine
            .storage()
            .load_relationship(&id)?
            .with_context(|| format!("rivalry {id} vanished from the store"))?;
        let metrics = SeasonMetrics::collect(&weeks, &final_relationship);

        Ok(SeasonSummary {
            seed,
            athlete: plan.athlete,
            opponent: plan.opponent,
            weeks,
            encounter_log,
            final_relationship,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivalry_engine::Winner;

    fn runner() -> SeasonRunner {
        SeasonRunner::new(EngineConfig::default(), false)
    }

    #[test]
    fn showdowns_fall_on_sunday_evening() {
        let week = WeekKey::new(2026, 1).unwrap();
        let at = showdown_time(week);
        assert_eq!(WeekKey::from_datetime(at), week);
        assert_eq!(at.format("%a %H:%M").to_string(), "Sun 20:00");
    }

    #[test]
    fn season_records_every_week() {
        let plan = SeasonPlan::new(
            AthleteProfile::Steady,
            Opponent::phantom(Personality::Rival),
        )
        .with_weeks(6);
        let summary = runner().run_plan(&plan, 42).unwrap();
        assert_eq!(summary.weeks.len(), 6);
        assert_eq!(summary.encounter_log.len(), 6);
        assert_eq!(summary.metrics.encounters, 6);
        assert_eq!(
            summary.metrics.user_wins + summary.metrics.rival_wins + summary.metrics.ties,
            6
        );
        assert!(
            summary
                .weeks
                .iter()
                .all(|w| w.status == ShowdownStatus::Recorded)
        );
    }

    #[test]
    fn same_seed_same_season() {
        let plan = SeasonPlan::new(
            AthleteProfile::Sporadic,
            Opponent::phantom(Personality::Nemesis),
        )
        .with_weeks(5);
        let first = runner().run_plan(&plan, 7).unwrap();
        let second = runner().run_plan(&plan, 7).unwrap();
        assert_eq!(first.digest().unwrap(), second.digest().unwrap());
        let other = runner().run_plan(&plan, 8).unwrap();
        assert_ne!(first.digest().unwrap(), other.digest().unwrap());
    }

    #[test]
    fn replays_are_rejected() {
        let plan = SeasonPlan::new(
            AthleteProfile::Climber,
            Opponent::Peer {
                personality: Personality::Mentor,
                friend: AthleteProfile::Steady,
            },
        )
        .with_weeks(4)
        .with_replays();
        let summary = runner().run_plan(&plan, 3).unwrap();
        assert_eq!(summary.metrics.replays_rejected, 4);
        assert_eq!(summary.final_relationship.encounter_count, 4);
    }

    #[test]
    fn idle_athlete_loses_every_nemesis_week() {
        let plan = SeasonPlan::new(
            AthleteProfile::Idle,
            Opponent::phantom(Personality::Nemesis),
        )
        .with_weeks(4);
        let summary = runner().run_plan(&plan, 11).unwrap();
        assert!(
            summary
                .weeks
                .iter()
                .all(|w| w.encounter.winner() == Winner::Rival)
        );
        assert_eq!(summary.final_relationship.win_streak, -4);
        assert_eq!(summary.metrics.chaos_factors.len(), 4);
    }
}
