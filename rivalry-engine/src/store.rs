//! In-memory persistence for rivalries and workout logs.
//!
//! Both types are `Sync` and can be shared across threads; every operation
//! holds a single lock for its whole duration, which is what makes
//! [`MemoryRivalryStore::commit_encounter`] atomic.
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

use crate::encounter::{Encounter, EncounterKey, PreviousOpponentStats};
use crate::relationship::RivalRelationship;
use crate::week::WeekKey;
use crate::workout::{WorkoutHistory, WorkoutSession};
use crate::{CommitOutcome, EncounterCommit, RivalryStorage, WorkoutHistoryLoader};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store lock poisoned")]
    Poisoned,
    #[error("rivalry {0} already exists")]
    DuplicateRelationship(String),
    #[error("rivalry {0} does not exist")]
    UnknownRelationship(String),
}

#[derive(Debug, Default)]
struct RivalryTables {
    relationships: BTreeMap<String, RivalRelationship>,
    encounters: BTreeMap<EncounterKey, Encounter>,
}

#[derive(Debug, Default)]
pub struct MemoryRivalryStore {
    tables: Mutex<RivalryTables>,
}

impl MemoryRivalryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, RivalryTables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Register a new rivalry.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is taken or the lock is poisoned.
    pub fn insert_relationship(&self, relationship: RivalRelationship) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.relationships.contains_key(&relationship.id) {
            return Err(StoreError::DuplicateRelationship(relationship.id));
        }
        tables
            .relationships
            .insert(relationship.id.clone(), relationship);
        Ok(())
    }

    /// Every encounter of one rivalry, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn encounters_for(&self, relationship_id: &str) -> Result<Vec<Encounter>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .encounters
            .values()
            .filter(|e| e.key.relationship_id == relationship_id)
            .cloned()
            .collect())
    }

    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn relationships(&self) -> Result<Vec<RivalRelationship>, StoreError> {
        Ok(self.lock()?.relationships.values().cloned().collect())
    }
}

impl RivalryStorage for MemoryRivalryStore {
    type Error = StoreError;

    fn load_relationship(&self, id: &str) -> Result<Option<RivalRelationship>, Self::Error> {
        Ok(self.lock()?.relationships.get(id).cloned())
    }

    fn find_encounter(&self, key: &EncounterKey) -> Result<Option<Encounter>, Self::Error> {
        Ok(self.lock()?.encounters.get(key).cloned())
    }

    fn recent_encounters(
        &self,
        relationship_id: &str,
        before: WeekKey,
        limit: usize,
    ) -> Result<Vec<Encounter>, Self::Error> {
        let tables = self.lock()?;
        Ok(tables
            .encounters
            .values()
            .rev()
            .filter(|e| e.key.relationship_id == relationship_id && e.week() < before)
            .take(limit)
            .cloned()
            .collect())
    }

    fn previous_opponent_stats(
        &self,
        relationship_id: &str,
        before: WeekKey,
    ) -> Result<Option<PreviousOpponentStats>, Self::Error> {
        let tables = self.lock()?;
        Ok(tables
            .encounters
            .values()
            .rev()
            .find(|e| e.key.relationship_id == relationship_id && e.week() < before)
            .map(PreviousOpponentStats::from_encounter))
    }

    fn commit_encounter(&self, commit: EncounterCommit) -> Result<CommitOutcome, Self::Error> {
        let mut tables = self.lock()?;
        if let Some(existing) = tables.encounters.get(&commit.encounter.key) {
            return Ok(CommitOutcome::Duplicate(Box::new(existing.clone())));
        }
        let current = tables
            .relationships
            .get(&commit.relationship.id)
            .ok_or_else(|| StoreError::UnknownRelationship(commit.relationship.id.clone()))?;
        if current.encounter_count != commit.expected_encounter_count {
            return Ok(CommitOutcome::Conflict {
                found: current.encounter_count,
            });
        }
        let EncounterCommit {
            relationship,
            encounter,
            ..
        } = commit;
        tables.encounters.insert(encounter.key.clone(), encounter);
        tables
            .relationships
            .insert(relationship.id.clone(), relationship);
        Ok(CommitOutcome::Committed)
    }
}

/// Raw training logs keyed by user id.
#[derive(Debug, Default)]
pub struct MemoryWorkoutLog {
    sessions: Mutex<HashMap<String, Vec<WorkoutSession>>>,
}

impl MemoryWorkoutLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn record(&self, user_id: &str, session: WorkoutSession) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .entry(user_id.to_string())
            .or_default()
            .push(session);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn extend<I>(&self, user_id: &str, sessions: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = WorkoutSession>,
    {
        self.sessions
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .entry(user_id.to_string())
            .or_default()
            .extend(sessions);
        Ok(())
    }
}

impl WorkoutHistoryLoader for MemoryWorkoutLog {
    type Error = StoreError;

    fn load_history(&self, user_id: &str, week: WeekKey) -> Result<WorkoutHistory, Self::Error> {
        let sessions = self.sessions.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(sessions
            .get(user_id)
            .map(|log| WorkoutHistory::from_sessions(log, week))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::EncounterTrigger;
    use crate::personality::Personality;
    use crate::relationship::RelationshipDeltas;
    use crate::rng::FixedChaos;
    use crate::score::calculate_improvement_score;
    use crate::snapshot::ImprovementSnapshot;
    use crate::victory::calculate_victory;
    use crate::workout::{ExerciseLog, SetLog};
    use chrono::{DateTime, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 20, 0, 0).unwrap()
    }

    fn commit_for(rel: &RivalRelationship, week: WeekKey, expected: u32) -> EncounterCommit {
        let snap = ImprovementSnapshot::from_counts(5_000.0, 4_000.0, 3, 2, 1);
        let result = calculate_victory(Personality::Rival, &snap, &snap, None, &mut FixedChaos(1.0));
        let mut updated = rel.clone();
        let deltas: RelationshipDeltas =
            updated.apply_outcome(result.winner, result.winning_margin, now());
        EncounterCommit {
            expected_encounter_count: expected,
            relationship: updated,
            encounter: Encounter {
                key: EncounterKey::new(rel.id.clone(), week),
                trigger: EncounterTrigger::OnDemand,
                encounter_date: now(),
                personality: Personality::Rival,
                user_metrics: snap.clone(),
                rival_metrics: snap.clone(),
                user_score: calculate_improvement_score(&snap),
                rival_score: calculate_improvement_score(&snap),
                result,
                deltas,
            },
        }
    }

    #[test]
    fn commit_is_once_per_key() {
        let store = MemoryRivalryStore::new();
        let rel = RivalRelationship::new_peer("r1", "u1", "f1", Personality::Rival, now());
        store.insert_relationship(rel.clone()).unwrap();
        let week = WeekKey::from_datetime(now());

        let first = store.commit_encounter(commit_for(&rel, week, 0)).unwrap();
        assert_eq!(first, CommitOutcome::Committed);
        let second = store.commit_encounter(commit_for(&rel, week, 0)).unwrap();
        assert!(matches!(second, CommitOutcome::Duplicate(_)));

        let stored = store.load_relationship("r1").unwrap().unwrap();
        assert_eq!(stored.encounter_count, 1);
        assert_eq!(store.encounters_for("r1").unwrap().len(), 1);
    }

    #[test]
    fn stale_count_is_a_conflict() {
        let store = MemoryRivalryStore::new();
        let rel = RivalRelationship::new_peer("r1", "u1", "f1", Personality::Rival, now());
        store.insert_relationship(rel.clone()).unwrap();
        let week = WeekKey::from_datetime(now());
        store.commit_encounter(commit_for(&rel, week, 0)).unwrap();
        let stale = store
            .commit_encounter(commit_for(&rel, week.next(), 0))
            .unwrap();
        assert_eq!(stale, CommitOutcome::Conflict { found: 1 });
    }

    #[test]
    fn unknown_relationship_is_an_error() {
        let store = MemoryRivalryStore::new();
        let rel = RivalRelationship::new_peer("ghost", "u1", "f1", Personality::Rival, now());
        let err = store
            .commit_encounter(commit_for(&rel, WeekKey::from_datetime(now()), 0))
            .unwrap_err();
        assert_eq!(err, StoreError::UnknownRelationship("ghost".into()));
    }

    #[test]
    fn duplicate_relationship_rejected() {
        let store = MemoryRivalryStore::new();
        let rel = RivalRelationship::new_peer("r1", "u1", "f1", Personality::Rival, now());
        store.insert_relationship(rel.clone()).unwrap();
        assert!(store.insert_relationship(rel).is_err());
    }

    #[test]
    fn previous_stats_pick_latest_prior_week() {
        let store = MemoryRivalryStore::new();
        let mut rel = RivalRelationship::new_peer("r1", "u1", "f1", Personality::Rival, now());
        store.insert_relationship(rel.clone()).unwrap();
        let week = WeekKey::from_datetime(now());
        for (i, w) in [week.previous().previous(), week.previous(), week]
            .into_iter()
            .enumerate()
        {
            let commit = commit_for(&rel, w, u32::try_from(i).unwrap());
            rel = commit.relationship.clone();
            store.commit_encounter(commit).unwrap();
        }
        let prev = store.previous_opponent_stats("r1", week).unwrap().unwrap();
        assert_eq!(prev.week, week.previous());
        let recent = store.recent_encounters("r1", week, 4).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].week(), week.previous());
    }

    #[test]
    fn workout_log_windows_by_week() {
        let log = MemoryWorkoutLog::new();
        let session = WorkoutSession::new(
            "s1",
            now(),
            vec![ExerciseLog::new("squat", vec![SetLog::new(100.0, 5)])],
        );
        log.record("u1", session).unwrap();
        let history = log.load_history("u1", WeekKey::from_datetime(now())).unwrap();
        assert_eq!(history.current_week.len(), 1);
        assert!(log.load_history("nobody", WeekKey::from_datetime(now())).unwrap().is_empty());
    }
}
