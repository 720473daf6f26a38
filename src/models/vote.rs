//! Verification votes cast by reporters against a station.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PulseError;
use crate::models::reporter::ReputationLevel;

/// What a reporter observed at the station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteValue {
    Working,
    NotWorking,
    Busy,
}

impl VoteValue {
    pub const ALL: [VoteValue; 3] = [VoteValue::Working, VoteValue::NotWorking, VoteValue::Busy];

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteValue::Working => "WORKING",
            VoteValue::NotWorking => "NOT_WORKING",
            VoteValue::Busy => "BUSY",
        }
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteValue {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WORKING" => Ok(VoteValue::Working),
            "NOT_WORKING" => Ok(VoteValue::NotWorking),
            "BUSY" => Ok(VoteValue::Busy),
            _ => Err(PulseError::InvalidVote(s.to_string())),
        }
    }
}

/// A persisted verification vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationVote {
    pub id: i64,
    pub station_id: i64,
    pub reporter_id: i64,
    pub value: VoteValue,
    pub cast_at: DateTime<Utc>,
}

/// A vote about to be written through the store's upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewVote {
    pub station_id: i64,
    pub reporter_id: i64,
    pub value: VoteValue,
}

/// One row of a station's public verification history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteHistoryEntry {
    pub vote_id: i64,
    pub value: VoteValue,
    pub cast_at: DateTime<Utc>,
    pub reporter_display_name: String,
    pub reporter_level: ReputationLevel,
}
