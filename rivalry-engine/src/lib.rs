//! Rivalry Engine
//!
//! Weekly fitness showdowns between a user and a rival (a friend or a
//! generated phantom). The crate turns raw workout logs into comparable
//! snapshots, decides each showdown under one of four personality rules and
//! evolves the persistent rivalry state. It owns no storage or transport;
//! callers plug those in through [`WorkoutHistoryLoader`] and
//! [`RivalryStorage`].

pub mod config;
pub mod constants;
pub mod encounter;
pub mod engine;
pub mod numbers;
pub mod personality;
pub mod phantom;
pub mod relationship;
pub mod rng;
pub mod score;
pub mod snapshot;
pub mod store;
pub mod victory;
pub mod week;
pub mod workout;

pub use config::{ConfigError, EngineConfig};
pub use encounter::{
    Encounter, EncounterKey, EncounterTrigger, PreviousOpponentStats, UserHistory,
};
pub use engine::{EngineError, RivalryEngine, ShowdownOutcome, ShowdownRequest, ShowdownStatus};
pub use personality::{Personality, PersonalityParseError};
pub use phantom::{
    Difficulty, DifficultyParseError, PhantomConfig, PhantomStats, generate_phantom_stats,
    phantom_stats_to_snapshot,
};
pub use relationship::{HeatBand, RelationshipDeltas, RespectTier, RivalKind, RivalRelationship};
pub use rng::{ChaosSource, EncounterRng, FixedChaos, RngChaos, encounter_seed};
pub use score::{
    ImprovementScore, calculate_composite_score, calculate_growth_rate,
    calculate_improvement_score,
};
pub use snapshot::{ExerciseGain, ImprovementSnapshot, build_improvement_snapshot};
pub use store::{MemoryRivalryStore, MemoryWorkoutLog, StoreError};
pub use victory::{
    CategoryBreakdown, CategoryResult, ChaosTier, DominantFactor, VictoryResult, Winner,
    calculate_victory,
};
pub use week::{WeekKey, WeekKeyParseError};
pub use workout::{ExerciseLog, RecordBook, SetLog, WorkoutHistory, WorkoutSession};

/// Source of raw training data.
/// Implementations must treat missing users as empty histories.
pub trait WorkoutHistoryLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the two weeks of training around `week` plus record books.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load_history(&self, user_id: &str, week: WeekKey) -> Result<WorkoutHistory, Self::Error>;
}

/// A relationship update and its encounter, written together or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterCommit {
    /// The relationship's `encounter_count` the update was computed from.
    pub expected_encounter_count: u32,
    pub relationship: RivalRelationship,
    pub encounter: Encounter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Committed,
    /// An encounter already exists for the key; nothing was written.
    Duplicate(Box<Encounter>),
    /// The relationship moved on since it was read; nothing was written.
    Conflict { found: u32 },
}

/// Persistence for rivalries and their encounter log.
pub trait RivalryStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// # Errors
    ///
    /// Returns an error if the relationship cannot be read.
    fn load_relationship(&self, id: &str) -> Result<Option<RivalRelationship>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the encounter log cannot be read.
    fn find_encounter(&self, key: &EncounterKey) -> Result<Option<Encounter>, Self::Error>;

    /// Up to `limit` encounters strictly before `before`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the encounter log cannot be read.
    fn recent_encounters(
        &self,
        relationship_id: &str,
        before: WeekKey,
        limit: usize,
    ) -> Result<Vec<Encounter>, Self::Error>;

    /// The opponent's most recent recorded week before `before`.
    ///
    /// # Errors
    ///
    /// Returns an error if the encounter log cannot be read.
    fn previous_opponent_stats(
        &self,
        relationship_id: &str,
        before: WeekKey,
    ) -> Result<Option<PreviousOpponentStats>, Self::Error>;

    /// Atomically append the encounter and replace the relationship.
    ///
    /// Must refuse (without writing) when the key already has an encounter
    /// or when the stored `encounter_count` differs from
    /// `expected_encounter_count`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the relationship is unknown.
    fn commit_encounter(&self, commit: EncounterCommit) -> Result<CommitOutcome, Self::Error>;
}
