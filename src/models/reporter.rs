//! Anonymous reporters and their reputation tier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Score at which a reporter leaves `New`
pub const NORMAL_LEVEL_MIN_SCORE: i64 = 5;
/// Score at which a reporter becomes `Trusted`
pub const TRUSTED_LEVEL_MIN_SCORE: i64 = 10;

/// Coarse reputation tier, always derived from the numeric score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReputationLevel {
    New,
    Normal,
    Trusted,
}

impl ReputationLevel {
    pub fn from_score(score: i64) -> Self {
        if score >= TRUSTED_LEVEL_MIN_SCORE {
            ReputationLevel::Trusted
        } else if score >= NORMAL_LEVEL_MIN_SCORE {
            ReputationLevel::Normal
        } else {
            ReputationLevel::New
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReputationLevel::New => "NEW",
            ReputationLevel::Normal => "NORMAL",
            ReputationLevel::Trusted => "TRUSTED",
        }
    }

    pub fn is_trusted(&self) -> bool {
        matches!(self, ReputationLevel::Trusted)
    }
}

impl fmt::Display for ReputationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reporter {
    pub id: i64,
    pub display_name: String,
    /// Never negative
    pub reputation_score: i64,
    pub reputation_level: ReputationLevel,
}

impl Reporter {
    /// Build a reporter from a stored score; the level is recomputed, never trusted from input.
    pub fn new(id: i64, display_name: impl Into<String>, reputation_score: i64) -> Self {
        let reputation_score = reputation_score.max(0);
        Self {
            id,
            display_name: display_name.into(),
            reputation_score,
            reputation_level: ReputationLevel::from_score(reputation_score),
        }
    }
}
