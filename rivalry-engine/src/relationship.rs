//! Persistent rivalry state and its single transition: recording an outcome.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    DECISIVE_MARGIN, HEAT_MAX, HEAT_MIN, HEAT_RIVAL_WIN, HEAT_STREAK_BONUS, HEAT_STREAK_THRESHOLD,
    HEAT_TIE, HEAT_USER_WIN, RESPECT_DECISIVE_MULTIPLIER, RESPECT_MAX, RESPECT_MIN, RESPECT_STEP,
};
use crate::numbers::clamp_i32_to_u8;
use crate::personality::Personality;
use crate::phantom::PhantomConfig;
use crate::victory::Winner;

/// Who sits on the other side of the rivalry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rival_type", rename_all = "snake_case")]
pub enum RivalKind {
    Peer {
        friend_id: String,
        personality: Personality,
    },
    AiPhantom {
        phantom_config: PhantomConfig,
    },
}

/// Display tier for a respect level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RespectTier {
    Stranger,
    Acquaintance,
    Contender,
    Respected,
    Legend,
}

impl RespectTier {
    #[must_use]
    pub const fn from_level(level: u8) -> Self {
        match level {
            0 | 1 => Self::Stranger,
            2 => Self::Acquaintance,
            3 => Self::Contender,
            4 => Self::Respected,
            _ => Self::Legend,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stranger => "stranger",
            Self::Acquaintance => "acquaintance",
            Self::Contender => "contender",
            Self::Respected => "respected",
            Self::Legend => "legend",
        }
    }
}

impl fmt::Display for RespectTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display band for rivalry heat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatBand {
    Cold,
    Warm,
    Heated,
    Blazing,
}

impl HeatBand {
    #[must_use]
    pub const fn from_heat(heat: u8) -> Self {
        match heat {
            0..=24 => Self::Cold,
            25..=49 => Self::Warm,
            50..=74 => Self::Heated,
            _ => Self::Blazing,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cold => "cold",
            Self::Warm => "warm",
            Self::Heated => "heated",
            Self::Blazing => "blazing",
        }
    }
}

impl fmt::Display for HeatBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State changes produced by one recorded outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDeltas {
    pub outcome: Winner,
    pub respect_delta: i32,
    pub heat_delta: i32,
    pub streak_before: i32,
    pub streak_after: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RivalRelationship {
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub kind: RivalKind,
    pub respect_level: u8,
    pub rivalry_heat: u8,
    /// Positive while the user is on a winning streak, negative while the
    /// rival is.
    pub win_streak: i32,
    pub longest_win_streak: u32,
    pub longest_lose_streak: u32,
    pub user_wins: u32,
    pub rival_wins: u32,
    pub ties: u32,
    pub encounter_count: u32,
    pub last_encounter: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RivalRelationship {
    fn fresh(id: String, user_id: String, kind: RivalKind, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            kind,
            respect_level: RESPECT_MIN,
            rivalry_heat: HEAT_MIN,
            win_streak: 0,
            longest_win_streak: 0,
            longest_lose_streak: 0,
            user_wins: 0,
            rival_wins: 0,
            ties: 0,
            encounter_count: 0,
            last_encounter: None,
            created_at: now,
        }
    }

    #[must_use]
    pub fn new_peer(
        id: impl Into<String>,
        user_id: impl Into<String>,
        friend_id: impl Into<String>,
        personality: Personality,
        now: DateTime<Utc>,
    ) -> Self {
        let kind = RivalKind::Peer {
            friend_id: friend_id.into(),
            personality,
        };
        Self::fresh(id.into(), user_id.into(), kind, now)
    }

    #[must_use]
    pub fn new_phantom(
        id: impl Into<String>,
        user_id: impl Into<String>,
        phantom_config: PhantomConfig,
        now: DateTime<Utc>,
    ) -> Self {
        Self::fresh(
            id.into(),
            user_id.into(),
            RivalKind::AiPhantom { phantom_config },
            now,
        )
    }

    #[must_use]
    pub const fn personality(&self) -> Personality {
        match &self.kind {
            RivalKind::Peer { personality, .. } => *personality,
            RivalKind::AiPhantom { phantom_config } => phantom_config.personality,
        }
    }

    #[must_use]
    pub const fn phantom_config(&self) -> Option<&PhantomConfig> {
        match &self.kind {
            RivalKind::AiPhantom { phantom_config } => Some(phantom_config),
            RivalKind::Peer { .. } => None,
        }
    }

    /// Name used in feeds: the friend id or the phantom's name.
    #[must_use]
    pub fn rival_name(&self) -> &str {
        match &self.kind {
            RivalKind::Peer { friend_id, .. } => friend_id,
            RivalKind::AiPhantom { phantom_config } => &phantom_config.name,
        }
    }

    #[must_use]
    pub const fn respect_tier(&self) -> RespectTier {
        RespectTier::from_level(self.respect_level)
    }

    #[must_use]
    pub const fn heat_band(&self) -> HeatBand {
        HeatBand::from_heat(self.rivalry_heat)
    }

    /// Deltas the outcome would produce, without touching state.
    #[must_use]
    pub fn preview_outcome(&self, winner: Winner, winning_margin: f64) -> RelationshipDeltas {
        let respect_delta = match winner {
            Winner::Tie => 0,
            Winner::User | Winner::Rival => {
                let step = if winning_margin > DECISIVE_MARGIN {
                    RESPECT_STEP * RESPECT_DECISIVE_MULTIPLIER
                } else {
                    RESPECT_STEP
                };
                if winner == Winner::User { step } else { -step }
            }
        };

        let streak_before = self.win_streak;
        let streak_after = match winner {
            Winner::User if streak_before >= 0 => streak_before.saturating_add(1),
            Winner::User => 1,
            Winner::Rival if streak_before <= 0 => streak_before.saturating_sub(1),
            Winner::Rival => -1,
            Winner::Tie => streak_before,
        };

        let base_heat = match winner {
            Winner::Tie => HEAT_TIE,
            Winner::Rival => HEAT_RIVAL_WIN,
            Winner::User => HEAT_USER_WIN,
        };
        let streak_bonus = if streak_after.unsigned_abs() >= HEAT_STREAK_THRESHOLD {
            HEAT_STREAK_BONUS
        } else {
            0
        };

        RelationshipDeltas {
            outcome: winner,
            respect_delta,
            heat_delta: base_heat + streak_bonus,
            streak_before,
            streak_after,
        }
    }

    /// Record one encounter outcome. Callers must apply each encounter at
    /// most once; the engine enforces that through the storage commit.
    pub fn apply_outcome(
        &mut self,
        winner: Winner,
        winning_margin: f64,
        now: DateTime<Utc>,
    ) -> RelationshipDeltas {
        let deltas = self.preview_outcome(winner, winning_margin);

        self.respect_level = clamp_i32_to_u8(
            i32::from(self.respect_level) + deltas.respect_delta,
            RESPECT_MIN,
            RESPECT_MAX,
        );
        self.rivalry_heat = clamp_i32_to_u8(
            i32::from(self.rivalry_heat) + deltas.heat_delta,
            HEAT_MIN,
            HEAT_MAX,
        );
        self.win_streak = deltas.streak_after;
        if self.win_streak > 0 {
            self.longest_win_streak = self.longest_win_streak.max(self.win_streak.unsigned_abs());
        } else if self.win_streak < 0 {
            self.longest_lose_streak = self.longest_lose_streak.max(self.win_streak.unsigned_abs());
        }
        match winner {
            Winner::User => self.user_wins = self.user_wins.saturating_add(1),
            Winner::Rival => self.rival_wins = self.rival_wins.saturating_add(1),
            Winner::Tie => self.ties = self.ties.saturating_add(1),
        }
        self.encounter_count = self.encounter_count.saturating_add(1);
        self.last_encounter = Some(now);
        deltas
    }
}
