use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::confidence::FeatureFlag;
use crate::error::PulseResult;
use crate::store::VerificationStore;

/// Lookback for "recent" verifications
pub const RECENT_VERIFICATION_DAYS: i64 = 7;
/// Lookback for unresolved issue reports
pub const RECENT_REPORT_DAYS: i64 = 30;

const POINTS_PER_VERIFICATION: u64 = 5;
const VERIFICATION_CAP: u64 = 20;
const REPORT_BASE: u64 = 30;
const POINTS_PER_UNRESOLVED_REPORT: u64 = 10;
const MAX_SCORE: u32 = 100;

/// Raw station history the estimate is computed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceSignals {
    pub total_verifications: u64,
    /// Verifications in the last 7 days
    pub recent_verifications: u64,
    /// Pending reports created in the last 30 days
    pub unresolved_recent_reports: u64,
    /// Latest of station update, last verification, last report
    pub last_activity_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceComponents {
    pub verification_score: u32,
    pub report_score: u32,
    pub recency_score: u32,
    pub days_since_last_activity: f64,
    pub total_verifications: u64,
    pub recent_verifications: u64,
    pub unresolved_recent_reports: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationConfidence {
    pub station_id: i64,
    /// 0..=100
    pub score: u32,
    pub label: &'static str,
    pub components: ConfidenceComponents,
}

/// Outcome of an estimate; `Unavailable` is not an error
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConfidenceEstimate {
    Available(StationConfidence),
    Unavailable,
}

impl ConfidenceEstimate {
    pub fn is_available(&self) -> bool {
        matches!(self, ConfidenceEstimate::Available(_))
    }
}

impl StationConfidence {
    /// Pure scoring of a station's signals at `now`
    pub fn from_signals(station_id: i64, signals: &ConfidenceSignals, now: DateTime<Utc>) -> Self {
        let verification_score = signals
            .total_verifications
            .saturating_mul(POINTS_PER_VERIFICATION)
            .min(VERIFICATION_CAP)
            + signals
                .recent_verifications
                .saturating_mul(POINTS_PER_VERIFICATION)
                .min(VERIFICATION_CAP);

        let report_score = REPORT_BASE.saturating_sub(
            signals
                .unresolved_recent_reports
                .saturating_mul(POINTS_PER_UNRESOLVED_REPORT),
        );

        let elapsed = (now - signals.last_activity_at).max(Duration::zero());
        let days = elapsed.num_seconds() as f64 / 86_400.0;
        let recency = recency_score(days);

        let score = (verification_score as u32 + report_score as u32 + recency).min(MAX_SCORE);

        Self {
            station_id,
            score,
            label: confidence_label(score),
            components: ConfidenceComponents {
                verification_score: verification_score as u32,
                report_score: report_score as u32,
                recency_score: recency,
                days_since_last_activity: days,
                total_verifications: signals.total_verifications,
                recent_verifications: signals.recent_verifications,
                unresolved_recent_reports: signals.unresolved_recent_reports,
            },
        }
    }
}

/// Step function over days since the station last saw activity
pub fn recency_score(days: f64) -> u32 {
    if days <= 1.0 {
        30
    } else if days <= 3.0 {
        25
    } else if days <= 7.0 {
        20
    } else if days <= 14.0 {
        15
    } else if days <= 30.0 {
        10
    } else {
        5
    }
}

pub fn confidence_label(score: u32) -> &'static str {
    match score {
        80.. => "Highly Trusted",
        60..=79 => "Trusted",
        40..=59 => "Moderate",
        20..=39 => "Low Trust",
        _ => "Unverified",
    }
}

/// Reads station signals and scores them when the feature is enabled
pub struct StationConfidenceEstimator<S> {
    store: Arc<S>,
    flag: Arc<dyn FeatureFlag>,
}

impl<S> Clone for StationConfidenceEstimator<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            flag: self.flag.clone(),
        }
    }
}

impl<S: VerificationStore> StationConfidenceEstimator<S> {
    pub fn new(store: Arc<S>, flag: Arc<dyn FeatureFlag>) -> Self {
        Self { store, flag }
    }

    pub async fn estimate(&self, station_id: i64) -> PulseResult<ConfidenceEstimate> {
        self.estimate_at(station_id, Utc::now()).await
    }

    pub async fn estimate_at(
        &self,
        station_id: i64,
        now: DateTime<Utc>,
    ) -> PulseResult<ConfidenceEstimate> {
        if !self.flag.is_enabled() {
            return Ok(ConfidenceEstimate::Unavailable);
        }

        let Some(signals) = self.store.confidence_signals(station_id, now).await? else {
            debug!(station_id, "Confidence requested for unknown station");
            return Ok(ConfidenceEstimate::Unavailable);
        };

        Ok(ConfidenceEstimate::Available(StationConfidence::from_signals(
            station_id, &signals, now,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(
        total: u64,
        recent: u64,
        unresolved: u64,
        days_ago: i64,
        now: DateTime<Utc>,
    ) -> ConfidenceSignals {
        ConfidenceSignals {
            total_verifications: total,
            recent_verifications: recent,
            unresolved_recent_reports: unresolved,
            last_activity_at: now - Duration::days(days_ago),
        }
    }

    /// The documented moderate-station example (4 verifications, 1 unresolved
    /// report, total 50) quotes 10 idle days for a recency of 10. The recency
    /// steps put 10 days in the two-week step (15, total 55, covered below), so
    /// this fixture uses 20 idle days to land on recency 10 and total 50.
    #[test]
    fn test_moderate_station_breakdown() {
        let now = Utc::now();
        let confidence = StationConfidence::from_signals(1, &signals(4, 0, 1, 20, now), now);

        assert_eq!(confidence.components.verification_score, 20);
        assert_eq!(confidence.components.report_score, 20);
        assert_eq!(confidence.components.recency_score, 10);
        assert_eq!(confidence.score, 50);
        assert_eq!(confidence.label, "Moderate");
    }

    /// 10 idle days is inside the `<= 14` step, not the `<= 30` one
    #[test]
    fn test_ten_days_falls_in_two_week_step() {
        let now = Utc::now();
        let confidence = StationConfidence::from_signals(1, &signals(4, 0, 1, 10, now), now);
        assert_eq!(confidence.components.recency_score, 15);
        assert_eq!(confidence.score, 55);
    }

    #[test]
    fn test_score_is_capped() {
        let now = Utc::now();
        let confidence = StationConfidence::from_signals(1, &signals(100, 100, 0, 0, now), now);
        assert_eq!(confidence.components.verification_score, 40);
        assert_eq!(confidence.components.report_score, 30);
        assert_eq!(confidence.components.recency_score, 30);
        assert_eq!(confidence.score, 100);
        assert_eq!(confidence.label, "Highly Trusted");
    }

    #[test]
    fn test_report_score_floors_at_zero() {
        let now = Utc::now();
        let confidence = StationConfidence::from_signals(1, &signals(0, 0, 7, 90, now), now);
        assert_eq!(confidence.components.report_score, 0);
        assert_eq!(confidence.components.recency_score, 5);
        assert_eq!(confidence.score, 5);
        assert_eq!(confidence.label, "Unverified");
    }

    #[test]
    fn test_recency_steps() {
        assert_eq!(recency_score(0.0), 30);
        assert_eq!(recency_score(1.0), 30);
        assert_eq!(recency_score(1.5), 25);
        assert_eq!(recency_score(7.0), 20);
        assert_eq!(recency_score(14.0), 15);
        assert_eq!(recency_score(30.0), 10);
        assert_eq!(recency_score(30.5), 5);
    }

    #[test]
    fn test_labels() {
        assert_eq!(confidence_label(80), "Highly Trusted");
        assert_eq!(confidence_label(79), "Trusted");
        assert_eq!(confidence_label(60), "Trusted");
        assert_eq!(confidence_label(40), "Moderate");
        assert_eq!(confidence_label(20), "Low Trust");
        assert_eq!(confidence_label(19), "Unverified");
    }

    #[test]
    fn test_estimate_serializes_with_state_tag() {
        let json = serde_json::to_value(ConfidenceEstimate::Unavailable).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "unavailable" }));

        let now = Utc::now();
        let confidence = StationConfidence::from_signals(3, &signals(1, 1, 0, 0, now), now);
        let json = serde_json::to_value(ConfidenceEstimate::Available(confidence)).unwrap();
        assert_eq!(json["state"], "available");
        assert_eq!(json["station_id"], 3);
        assert_eq!(json["score"], 70);
        assert_eq!(json["label"], "Trusted");
    }
}
