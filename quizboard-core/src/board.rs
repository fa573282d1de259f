//! Difficulty tiers and the linear track.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error parsing a tier name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown difficulty tier: {0} (expected beginner, intermediate or expert)")]
pub struct UnknownTier(pub String);

/// Difficulty tier. Selects track length and content pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Beginner, Tier::Intermediate, Tier::Expert];

    /// Number of spaces on this tier's track.
    pub fn track_length(self) -> usize {
        match self {
            Tier::Beginner => 20,
            Tier::Intermediate => 50,
            Tier::Expert => 100,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tier::Beginner => "beginner",
            Tier::Intermediate => "intermediate",
            Tier::Expert => "expert",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Tier::Beginner),
            "intermediate" => Ok(Tier::Intermediate),
            "expert" => Ok(Tier::Expert),
            _ => Err(UnknownTier(s.to_string())),
        }
    }
}

/// What a space does when a player lands on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceKind {
    Start,
    Finish,
    Question,
}

/// One position on the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: usize,
    pub kind: SpaceKind,
    /// Only present on question spaces.
    pub points: Option<u32>,
}

impl Space {
    pub fn is_question(&self) -> bool {
        self.kind == SpaceKind::Question
    }
}

/// Point value of an interior space.
///
/// Every 15th space is worth 5, every 7th is worth 3, the rest 1.
pub fn space_points(index: usize) -> u32 {
    if index % 15 == 0 {
        5
    } else if index % 7 == 0 {
        3
    } else {
        1
    }
}

/// The fixed sequence of spaces for a tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    tier: Tier,
    spaces: Vec<Space>,
}

impl Track {
    pub fn for_tier(tier: Tier) -> Self {
        let length = tier.track_length();
        let last = length - 1;
        let spaces = (0..length)
            .map(|id| match id {
                0 => Space {
                    id,
                    kind: SpaceKind::Start,
                    points: None,
                },
                _ if id == last => Space {
                    id,
                    kind: SpaceKind::Finish,
                    points: None,
                },
                _ => Space {
                    id,
                    kind: SpaceKind::Question,
                    points: Some(space_points(id)),
                },
            })
            .collect();

        Self { tier, spaces }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.spaces.len().saturating_sub(1)
    }

    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    pub fn space(&self, index: usize) -> Option<&Space> {
        self.spaces.get(index)
    }

    pub fn is_question(&self, index: usize) -> bool {
        self.space(index).is_some_and(Space::is_question)
    }

    /// Clamp an unbounded position onto the track.
    pub fn clamp(&self, position: i64) -> usize {
        position.clamp(0, self.last_index() as i64) as usize
    }
}
