//! Reputation Events
//!
//! The ledger is append-only. An event is keyed by
//! `(reporter, event type, station scope, reason scope)` and at most one event
//! per key may fall inside the event's window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReputationEventType {
    /// Vote agreed with a settled consensus
    VerificationReward,
    /// Votes repeatedly disagreed with the consensus that followed them
    ContradictionPenalty,
    /// Issue report was corroborated by other reporters
    ReportReward,
}

impl ReputationEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReputationEventType::VerificationReward => "verification_reward",
            ReputationEventType::ContradictionPenalty => "contradiction_penalty",
            ReputationEventType::ReportReward => "report_reward",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "verification_reward" => Some(ReputationEventType::VerificationReward),
            "contradiction_penalty" => Some(ReputationEventType::ContradictionPenalty),
            "report_reward" => Some(ReputationEventType::ReportReward),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ReputationEventType::VerificationReward => "Vote matched station consensus",
            ReputationEventType::ContradictionPenalty => "Votes repeatedly contradicted consensus",
            ReputationEventType::ReportReward => "Issue report corroborated by other reporters",
        }
    }
}

/// A persisted ledger row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationEvent {
    pub id: i64,
    pub reporter_id: i64,
    pub event_type: ReputationEventType,
    pub station_scope: Option<i64>,
    pub reason_scope: Option<String>,
    pub delta: i64,
    pub created_at: DateTime<Utc>,
}

impl ReputationEvent {
    /// Whether this event occupies `award`'s dedup slot at `now`
    pub fn blocks(&self, award: &ReputationAward, now: DateTime<Utc>) -> bool {
        self.reporter_id == award.reporter_id
            && self.event_type == award.event_type
            && self.station_scope == award.station_scope
            && self.reason_scope == award.reason_scope
            && self.created_at >= award.window_start(now)
    }
}

/// A request to apply one delta, idempotent within its window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReputationAward {
    pub reporter_id: i64,
    pub event_type: ReputationEventType,
    pub delta: i64,
    pub station_scope: Option<i64>,
    pub reason_scope: Option<String>,
    pub window: Duration,
}

impl ReputationAward {
    pub fn verification_reward(
        reporter_id: i64,
        station_id: i64,
        delta: i64,
        window: Duration,
    ) -> Self {
        Self {
            reporter_id,
            event_type: ReputationEventType::VerificationReward,
            delta,
            station_scope: Some(station_id),
            reason_scope: None,
            window,
        }
    }

    pub fn contradiction_penalty(reporter_id: i64, delta: i64, window: Duration) -> Self {
        Self {
            reporter_id,
            event_type: ReputationEventType::ContradictionPenalty,
            delta,
            station_scope: None,
            reason_scope: None,
            window,
        }
    }

    pub fn report_reward(
        reporter_id: i64,
        station_id: i64,
        reason: &str,
        delta: i64,
        window: Duration,
    ) -> Self {
        Self {
            reporter_id,
            event_type: ReputationEventType::ReportReward,
            delta,
            station_scope: Some(station_id),
            reason_scope: Some(reason.to_string()),
            window,
        }
    }

    /// Oldest `created_at` that still counts as a duplicate
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }
}
