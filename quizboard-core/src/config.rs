//! Game configuration.

use crate::board::{Tier, UnknownTier};
use crate::state::DEFAULT_WINNING_SCORE;
use crate::turn::TurnSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable selecting the difficulty tier.
pub const ENV_TIER: &str = "QUIZBOARD_TIER";
/// Environment variable overriding the winning score.
pub const ENV_WINNING_SCORE: &str = "QUIZBOARD_WINNING_SCORE";
/// Environment variable naming the save file.
pub const ENV_SAVE_PATH: &str = "QUIZBOARD_SAVE_PATH";
/// Environment variable seeding dice and draws.
pub const ENV_SEED: &str = "QUIZBOARD_SEED";

/// Errors from reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Tier(#[from] UnknownTier),

    #[error("{name} must be a non-negative integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Configuration for a game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub tier: Tier,

    pub winning_score: u32,

    /// Length of the dice animation.
    pub roll_animation_ms: u64,

    /// Faces shown while the dice roll.
    pub roll_frames: usize,

    /// How long answer feedback stays up before the turn ends.
    pub feedback_ms: u64,

    /// Delay before the processing latch is released.
    pub latch_release_ms: u64,

    /// Longest chain of extra rolls from sixes; unlimited when absent.
    pub max_extra_rolls: Option<u32>,

    /// Seed for dice and draws; entropy when absent.
    pub seed: Option<u64>,

    /// Where to save the game; in memory only when absent.
    pub save_path: Option<PathBuf>,

    /// Custom question bank; built-in content when absent.
    pub bank_path: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(Tier::default())
    }
}

impl GameConfig {
    pub fn new(tier: Tier) -> Self {
        let pacing = TurnSettings::default();
        Self {
            tier,
            winning_score: DEFAULT_WINNING_SCORE,
            roll_animation_ms: pacing.roll_animation.as_millis() as u64,
            roll_frames: pacing.roll_frames,
            feedback_ms: pacing.feedback.as_millis() as u64,
            latch_release_ms: pacing.latch_release.as_millis() as u64,
            max_extra_rolls: None,
            seed: None,
            save_path: None,
            bank_path: None,
        }
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_winning_score(mut self, score: u32) -> Self {
        self.winning_score = score;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }

    pub fn with_bank_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.bank_path = Some(path.into());
        self
    }

    pub fn with_max_extra_rolls(mut self, max: u32) -> Self {
        self.max_extra_rolls = Some(max);
        self
    }

    /// Set the roll animation, feedback window and latch delay.
    pub fn with_pacing(mut self, roll_animation_ms: u64, feedback_ms: u64, latch_release_ms: u64) -> Self {
        self.roll_animation_ms = roll_animation_ms;
        self.feedback_ms = feedback_ms;
        self.latch_release_ms = latch_release_ms;
        self
    }

    /// Defaults overridden by `QUIZBOARD_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().merge_env(|name| std::env::var(name).ok())
    }

    /// Override fields from a variable lookup.
    pub fn merge_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tier) = lookup(ENV_TIER) {
            self.tier = tier.parse()?;
        }
        if let Some(score) = lookup(ENV_WINNING_SCORE) {
            self.winning_score = parse_number(ENV_WINNING_SCORE, &score)?;
        }
        if let Some(seed) = lookup(ENV_SEED) {
            self.seed = Some(parse_number(ENV_SEED, &seed)?);
        }
        if let Some(path) = lookup(ENV_SAVE_PATH).filter(|p| !p.trim().is_empty()) {
            self.save_path = Some(PathBuf::from(path));
        }
        Ok(self)
    }

    pub fn turn_settings(&self) -> TurnSettings {
        TurnSettings {
            roll_animation: Duration::from_millis(self.roll_animation_ms),
            roll_frames: self.roll_frames,
            feedback: Duration::from_millis(self.feedback_ms),
            latch_release: Duration::from_millis(self.latch_release_ms),
            max_extra_rolls: self.max_extra_rolls,
        }
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        name,
        value: value.to_string(),
    })
}
