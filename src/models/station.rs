//! Charging station status as seen by the inference engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operational status of a station
///
/// `Maintenance` is only ever set by the manual override flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StationStatus {
    Operational,
    Offline,
    Maintenance,
}

impl StationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StationStatus::Operational => "OPERATIONAL",
            StationStatus::Offline => "OFFLINE",
            StationStatus::Maintenance => "MAINTENANCE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPERATIONAL" => Some(StationStatus::Operational),
            "OFFLINE" => Some(StationStatus::Offline),
            "MAINTENANCE" => Some(StationStatus::Maintenance),
            _ => None,
        }
    }
}

/// Data trust flag maintained by the report-flooding flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrustLevel {
    Normal,
    Low,
}

impl TrustLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustLevel::Normal => "NORMAL",
            TrustLevel::Low => "LOW",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NORMAL" => Some(TrustLevel::Normal),
            "LOW" => Some(TrustLevel::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: i64,
    pub name: String,
    pub status: StationStatus,
    pub trust_level: TrustLevel,
    pub updated_at: DateTime<Utc>,
}

impl Station {
    pub fn new(id: i64, name: impl Into<String>, status: StationStatus) -> Self {
        Self {
            id,
            name: name.into(),
            status,
            trust_level: TrustLevel::Normal,
            updated_at: Utc::now(),
        }
    }
}
