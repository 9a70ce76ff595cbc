//! Engine tuning loaded from JSON.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_COMMIT_ATTEMPTS, DEFAULT_TARGET_WORKOUTS_PER_WEEK, DEFAULT_TOP_GAINS_LIMIT,
};

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u32,
        value: u32,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("invalid configuration json: {0}")]
    Json(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "EngineConfig::default_target_workouts")]
    pub target_workouts_per_week: u32,
    #[serde(default = "EngineConfig::default_top_gains_limit")]
    pub top_gains_limit: usize,
    /// Optimistic commit retries before a showdown gives up.
    #[serde(default = "EngineConfig::default_commit_attempts")]
    pub commit_attempts: u32,
}

impl EngineConfig {
    const fn default_target_workouts() -> u32 {
        DEFAULT_TARGET_WORKOUTS_PER_WEEK
    }

    const fn default_top_gains_limit() -> usize {
        DEFAULT_TOP_GAINS_LIMIT
    }

    const fn default_commit_attempts() -> u32 {
        DEFAULT_COMMIT_ATTEMPTS
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// Returns an error if the weekly target or retry budget is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_workouts_per_week == 0 {
            return Err(ConfigError::MinViolation {
                field: "target_workouts_per_week",
                min: 1,
                value: self.target_workouts_per_week,
            });
        }
        if self.commit_attempts == 0 {
            return Err(ConfigError::MinViolation {
                field: "commit_attempts",
                min: 1,
                value: self.commit_attempts,
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_workouts_per_week: Self::default_target_workouts(),
            top_gains_limit: Self::default_top_gains_limit(),
            commit_attempts: Self::default_commit_attempts(),
        }
    }
}
