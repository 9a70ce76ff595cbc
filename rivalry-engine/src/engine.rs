//! Showdown orchestration: load, score, decide, commit.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, EngineConfig};
use crate::constants::HISTORY_WINDOW_WEEKS;
use crate::encounter::{Encounter, EncounterKey, EncounterTrigger, UserHistory};
use crate::phantom::{PhantomStats, generate_phantom_stats, phantom_stats_to_snapshot};
use crate::relationship::{RivalKind, RivalRelationship};
use crate::rng::EncounterRng;
use crate::score::calculate_improvement_score;
use crate::snapshot::ImprovementSnapshot;
use crate::victory::calculate_victory;
use crate::week::WeekKey;
use crate::{CommitOutcome, EncounterCommit, RivalryStorage, WorkoutHistoryLoader};

#[derive(Debug, Error)]
pub enum EngineError<LE, SE>
where
    LE: std::error::Error + 'static,
    SE: std::error::Error + 'static,
{
    #[error("rivalry {0} not found")]
    RelationshipNotFound(String),
    #[error("failed to load workout history")]
    Loader(#[source] LE),
    #[error("rivalry storage failed")]
    Storage(#[source] SE),
    #[error("encounter {key} still conflicting after {attempts} attempts")]
    CommitConflict { key: EncounterKey, attempts: u32 },
}

/// One request to settle a rivalry for a week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowdownRequest {
    pub relationship_id: String,
    pub week: WeekKey,
    pub trigger: EncounterTrigger,
    pub now: DateTime<Utc>,
}

impl ShowdownRequest {
    /// The scheduled end-of-week showdown for the week containing `now`.
    #[must_use]
    pub fn weekly(relationship_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            relationship_id: relationship_id.into(),
            week: WeekKey::from_datetime(now),
            trigger: EncounterTrigger::WeeklyShowdown,
            now,
        }
    }

    #[must_use]
    pub fn on_demand(relationship_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            trigger: EncounterTrigger::OnDemand,
            ..Self::weekly(relationship_id, now)
        }
    }

    #[must_use]
    pub fn key(&self) -> EncounterKey {
        EncounterKey::new(self.relationship_id.clone(), self.week)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowdownStatus {
    Recorded,
    /// The week was already settled; the stored encounter is returned as-is.
    AlreadyRecorded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowdownOutcome {
    pub status: ShowdownStatus,
    pub encounter: Encounter,
    pub relationship: RivalRelationship,
    pub attempts: u32,
}

/// Main engine tying the pure scoring code to loader and storage.
pub struct RivalryEngine<L, S>
where
    L: WorkoutHistoryLoader,
    S: RivalryStorage,
{
    loader: L,
    storage: S,
    config: EngineConfig,
}

type ShowdownResult<T, L, S> = Result<
    T,
    EngineError<<L as WorkoutHistoryLoader>::Error, <S as RivalryStorage>::Error>,
>;

impl<L, S> RivalryEngine<L, S>
where
    L: WorkoutHistoryLoader,
    S: RivalryStorage,
{
    pub fn new(loader: L, storage: S) -> Self {
        Self {
            loader,
            storage,
            config: EngineConfig::default(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_config(mut self, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub const fn loader(&self) -> &L {
        &self.loader
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Settle one rivalry week, at most once.
    ///
    /// A repeated request for an already-settled week returns the stored
    /// encounter with [`ShowdownStatus::AlreadyRecorded`] and changes
    /// nothing. A concurrent writer causes a reload and recompute.
    ///
    /// # Errors
    ///
    /// Returns an error if the relationship is missing, loading or storage
    /// fails, or the commit keeps conflicting past `commit_attempts`.
    pub fn run_showdown(&self, request: &ShowdownRequest) -> ShowdownResult<ShowdownOutcome, L, S> {
        let key = request.key();
        for attempt in 1..=self.config.commit_attempts {
            let relationship = self
                .storage
                .load_relationship(&request.relationship_id)
                .map_err(EngineError::Storage)?
                .ok_or_else(|| EngineError::RelationshipNotFound(request.relationship_id.clone()))?;

            if let Some(existing) = self
                .storage
                .find_encounter(&key)
                .map_err(EngineError::Storage)?
            {
                log::warn!("showdown {key} already settled; returning stored encounter");
                return Ok(ShowdownOutcome {
                    status: ShowdownStatus::AlreadyRecorded,
                    encounter: existing,
                    relationship,
                    attempts: attempt,
                });
            }

            let (updated, encounter) = self.settle(&relationship, request)?;
            let commit = EncounterCommit {
                expected_encounter_count: relationship.encounter_count,
                relationship: updated.clone(),
                encounter: encounter.clone(),
            };
            match self
                .storage
                .commit_encounter(commit)
                .map_err(EngineError::Storage)?
            {
                CommitOutcome::Committed => {
                    log::info!(
                        "showdown {key} ({}): {} by {:.2}, respect {} heat {}",
                        encounter.trigger,
                        encounter.winner(),
                        encounter.winning_margin(),
                        updated.respect_level,
                        updated.rivalry_heat
                    );
                    return Ok(ShowdownOutcome {
                        status: ShowdownStatus::Recorded,
                        encounter,
                        relationship: updated,
                        attempts: attempt,
                    });
                }
                CommitOutcome::Duplicate(existing) => {
                    log::warn!("showdown {key} settled concurrently; discarding recomputation");
                    let relationship = self
                        .storage
                        .load_relationship(&request.relationship_id)
                        .map_err(EngineError::Storage)?
                        .unwrap_or(relationship);
                    return Ok(ShowdownOutcome {
                        status: ShowdownStatus::AlreadyRecorded,
                        encounter: *existing,
                        relationship,
                        attempts: attempt,
                    });
                }
                CommitOutcome::Conflict { found } => {
                    log::debug!(
                        "showdown {key} attempt {attempt}: expected {} encounters, found {found}",
                        relationship.encounter_count
                    );
                }
            }
        }
        Err(EngineError::CommitConflict {
            key,
            attempts: self.config.commit_attempts,
        })
    }

    /// Build the user's snapshot for `week` from the loader.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be loaded.
    pub fn snapshot_for(&self, user_id: &str, week: WeekKey) -> Result<ImprovementSnapshot, L::Error> {
        let history = self.loader.load_history(user_id, week)?;
        Ok(ImprovementSnapshot::from_history(
            &history,
            self.config.target_workouts_per_week,
            self.config.top_gains_limit,
        ))
    }

    fn settle(
        &self,
        relationship: &RivalRelationship,
        request: &ShowdownRequest,
    ) -> ShowdownResult<(RivalRelationship, Encounter), L, S> {
        let week = request.week;
        let user = self
            .snapshot_for(&relationship.user_id, week)
            .map_err(EngineError::Loader)?;
        let mut rng = EncounterRng::for_encounter(&relationship.id, week);

        let rival = match &relationship.kind {
            RivalKind::Peer { friend_id, .. } => self
                .snapshot_for(friend_id, week)
                .map_err(EngineError::Loader)?,
            RivalKind::AiPhantom { phantom_config } => {
                let previous = self
                    .storage
                    .previous_opponent_stats(&relationship.id, week)
                    .map_err(EngineError::Storage)?;
                if let Some(prev) = previous.as_ref().filter(|p| !p.is_adjacent_to(week)) {
                    log::debug!(
                        "phantom {} resuming from {} after a gap",
                        phantom_config.name,
                        prev.week
                    );
                }
                let target = self.config.target_workouts_per_week;
                let seed = previous.map_or_else(
                    || PhantomStats::opening(&user, phantom_config, target, request.now),
                    |p| p.stats,
                );
                let stats = generate_phantom_stats(
                    &user,
                    phantom_config,
                    target,
                    Some(&seed),
                    rng.phantom(),
                    request.now,
                );
                phantom_stats_to_snapshot(&stats, Some(&seed))
            }
        };

        let recent = self
            .storage
            .recent_encounters(&relationship.id, week, HISTORY_WINDOW_WEEKS)
            .map_err(EngineError::Storage)?;
        let history = UserHistory::from_encounters(&recent, week);
        let history = (!history.is_empty()).then_some(&history);

        let personality = relationship.personality();
        let result = calculate_victory(personality, &user, &rival, history, &mut rng.chaos());

        let mut updated = relationship.clone();
        let deltas = updated.apply_outcome(result.winner, result.winning_margin, request.now);
        let encounter = Encounter {
            key: request.key(),
            trigger: request.trigger,
            encounter_date: request.now,
            personality,
            user_score: calculate_improvement_score(&user),
            rival_score: calculate_improvement_score(&rival),
            user_metrics: user,
            rival_metrics: rival,
            result,
            deltas,
        };
        Ok((updated, encounter))
    }
}
