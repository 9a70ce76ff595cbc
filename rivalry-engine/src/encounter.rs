//! Append-only encounter log entries and the values derived from them.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::HISTORY_WINDOW_WEEKS;
use crate::numbers::usize_to_f64;
use crate::personality::Personality;
use crate::phantom::PhantomStats;
use crate::relationship::RelationshipDeltas;
use crate::score::ImprovementScore;
use crate::snapshot::ImprovementSnapshot;
use crate::victory::{VictoryResult, Winner};
use crate::week::WeekKey;

/// Idempotency key: one encounter per relationship per ISO week.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EncounterKey {
    pub relationship_id: String,
    pub week: WeekKey,
}

impl EncounterKey {
    #[must_use]
    pub fn new(relationship_id: impl Into<String>, week: WeekKey) -> Self {
        Self {
            relationship_id: relationship_id.into(),
            week,
        }
    }
}

impl fmt::Display for EncounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.relationship_id, self.week)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EncounterTrigger {
    #[default]
    WeeklyShowdown,
    OnDemand,
}

impl EncounterTrigger {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WeeklyShowdown => "weekly_showdown",
            Self::OnDemand => "on_demand",
        }
    }
}

impl fmt::Display for EncounterTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable comparison and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    pub key: EncounterKey,
    pub trigger: EncounterTrigger,
    pub encounter_date: DateTime<Utc>,
    pub personality: Personality,
    pub user_metrics: ImprovementSnapshot,
    pub rival_metrics: ImprovementSnapshot,
    pub user_score: ImprovementScore,
    pub rival_score: ImprovementScore,
    pub result: VictoryResult,
    pub deltas: RelationshipDeltas,
}

impl Encounter {
    #[must_use]
    pub const fn winner(&self) -> Winner {
        self.result.winner
    }

    #[must_use]
    pub const fn week(&self) -> WeekKey {
        self.key.week
    }

    #[must_use]
    pub const fn winning_margin(&self) -> f64 {
        self.result.winning_margin
    }
}

/// The opponent's last recorded week, used to continue a phantom's walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousOpponentStats {
    pub week: WeekKey,
    pub stats: PhantomStats,
}

impl PreviousOpponentStats {
    #[must_use]
    pub fn from_encounter(encounter: &Encounter) -> Self {
        let rival = &encounter.rival_metrics;
        Self {
            week: encounter.week(),
            stats: PhantomStats {
                volume_this_week: rival.volume_this_week,
                workouts_this_week: rival.workouts_this_week,
                prs_this_week: rival.prs_this_week,
                consistency_score: rival.consistency_score,
                last_updated: encounter.encounter_date,
            },
        }
    }

    /// Stats older than the week just before `week` no longer count as
    /// "last week" for continuity.
    #[must_use]
    pub fn is_adjacent_to(&self, week: WeekKey) -> bool {
        self.week == week.previous()
    }
}

/// Rolling averages that form the Mirror baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct UserHistory {
    pub avg_volume_4_week: f64,
    pub avg_workouts_4_week: f64,
    pub avg_prs_4_week: f64,
    /// Weeks that contributed; zero means no history.
    pub weeks: usize,
}

impl UserHistory {
    /// Average the user's weekly metrics over up to four snapshots.
    #[must_use]
    pub fn from_snapshots<'a, I>(snapshots: I) -> Self
    where
        I: IntoIterator<Item = &'a ImprovementSnapshot>,
    {
        let mut sums = (0.0, 0.0, 0.0);
        let mut weeks = 0usize;
        for snap in snapshots.into_iter().take(HISTORY_WINDOW_WEEKS) {
            sums.0 += snap.volume_this_week;
            sums.1 += f64::from(snap.workouts_this_week);
            sums.2 += f64::from(snap.prs_this_week);
            weeks += 1;
        }
        if weeks == 0 {
            return Self::default();
        }
        let n = usize_to_f64(weeks);
        Self {
            avg_volume_4_week: sums.0 / n,
            avg_workouts_4_week: sums.1 / n,
            avg_prs_4_week: sums.2 / n,
            weeks,
        }
    }

    /// History from the most recent encounters strictly before `week`.
    #[must_use]
    pub fn from_encounters(encounters: &[Encounter], week: WeekKey) -> Self {
        let mut prior: Vec<&Encounter> = encounters.iter().filter(|e| e.week() < week).collect();
        prior.sort_by(|a, b| b.week().cmp(&a.week()));
        prior.dedup_by_key(|e| e.week());
        Self::from_snapshots(prior.into_iter().map(|e| &e.user_metrics))
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.weeks == 0
    }
}
