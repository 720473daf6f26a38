//! Verification Service
//!
//! The operations exposed to the surrounding application. Primary writes and
//! the status transition happen before a call returns; reputation effects are
//! spawned afterwards and never affect the caller's result.
//!
//! ```text
//! submit_verification
//!   ├─ parse vote ─► station ─► reporter      (validation, nothing written)
//!   ├─ upsert_vote                             (overwrite inside window)
//!   ├─ ConsensusEvaluator::summary_at
//!   ├─ StatusPolicy::decide ─► set_station_status
//!   └─ spawn_vote_triggers                     (best-effort, detached)
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::PulseConfig;
use crate::confidence::{ConfidenceEstimate, FeatureFlag, StationConfidenceEstimator};
use crate::consensus::{ConsensusEvaluator, ConsensusTally, StatusPolicy, StatusTransition};
use crate::error::{PulseError, PulseResult};
use crate::models::{
    IssueReport, NewIssueReport, NewVote, Reporter, ReputationLevel, Station, VerificationVote,
    VoteHistoryEntry, VoteValue,
};
use crate::reputation::{
    ReputationEvent, ReputationRules, ReputationScore, ReputationTriggers, spawn_report_triggers,
    spawn_vote_triggers,
};
use crate::store::VerificationStore;

/// Longest accepted issue report reason, matching the storage column
pub const MAX_REASON_LEN: usize = 100;

/// Outcome of a submitted verification
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReceipt {
    pub vote: VerificationVote,
    pub summary: ConsensusTally,
    /// Status change applied by this vote, if any
    pub transition: Option<StatusTransition>,
}

/// Service tunables not covered by [`ReputationRules`]
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub window: Duration,
    pub transition_min_votes: usize,
    pub history_window: Duration,
    pub history_limit: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            window: Duration::minutes(30),
            transition_min_votes: 3,
            history_window: Duration::hours(24),
            history_limit: 50,
        }
    }
}

impl From<&PulseConfig> for ServiceSettings {
    fn from(config: &PulseConfig) -> Self {
        Self {
            window: config.consensus.window(),
            transition_min_votes: config.consensus.transition_min_votes,
            history_window: config.consensus.history_window(),
            history_limit: config.consensus.history_limit,
        }
    }
}

pub struct VerificationService<S> {
    store: Arc<S>,
    settings: ServiceSettings,
    evaluator: ConsensusEvaluator<S>,
    policy: StatusPolicy,
    triggers: Arc<ReputationTriggers<S>>,
    confidence: StationConfidenceEstimator<S>,
}

impl<S: VerificationStore> VerificationService<S> {
    pub fn new(
        store: Arc<S>,
        settings: ServiceSettings,
        rules: ReputationRules,
        confidence_flag: Arc<dyn FeatureFlag>,
    ) -> Self {
        let evaluator = ConsensusEvaluator::new(store.clone(), settings.window);
        Self {
            policy: StatusPolicy::new(settings.transition_min_votes),
            triggers: Arc::new(ReputationTriggers::new(store.clone(), evaluator.clone(), rules)),
            confidence: StationConfidenceEstimator::new(store.clone(), confidence_flag),
            evaluator,
            settings,
            store,
        }
    }

    /// Build a service from loaded configuration
    pub fn from_config(store: Arc<S>, config: &PulseConfig) -> Self {
        Self::new(
            store,
            ServiceSettings::from(config),
            config.reputation.to_rules(),
            Arc::new(config.confidence.enabled),
        )
    }

    pub fn triggers(&self) -> &Arc<ReputationTriggers<S>> {
        &self.triggers
    }

    pub async fn submit_verification(
        &self,
        station_id: i64,
        reporter_id: i64,
        vote: &str,
    ) -> PulseResult<VerificationReceipt> {
        self.submit_verification_at(station_id, reporter_id, vote, Utc::now())
            .await
            .map(|(receipt, _)| receipt)
    }

    /// Submit a vote as of `now`.
    ///
    /// Also returns the handle of the spawned reputation triggers; dropping it
    /// detaches the task.
    pub async fn submit_verification_at(
        &self,
        station_id: i64,
        reporter_id: i64,
        vote: &str,
        now: DateTime<Utc>,
    ) -> PulseResult<(VerificationReceipt, JoinHandle<()>)> {
        let value: VoteValue = vote.parse()?;
        let station = self.require_station(station_id).await?;
        let reporter = self.require_reporter(reporter_id).await?;

        let stored = self
            .store
            .upsert_vote(
                NewVote {
                    station_id,
                    reporter_id,
                    value,
                },
                now,
                self.settings.window,
            )
            .await?;

        let summary = self.evaluator.summary_at(station_id, now).await?;

        let transition =
            self.policy
                .decide(station.status, reporter.reputation_level, value, &summary);
        if let Some(transition) = &transition {
            self.store
                .set_station_status(station_id, transition.to, now)
                .await?;
            info!(
                station_id,
                reporter_id,
                from = transition.from.as_str(),
                to = transition.to.as_str(),
                cause = ?transition.cause,
                "Station status changed"
            );
        } else {
            debug!(
                station_id,
                reporter_id,
                value = value.as_str(),
                total_votes = summary.total_votes,
                "Vote recorded without status change"
            );
        }

        let handle = spawn_vote_triggers(self.triggers.clone(), stored.clone(), now);

        Ok((
            VerificationReceipt {
                vote: stored,
                summary,
                transition,
            },
            handle,
        ))
    }

    pub async fn get_verification_summary(&self, station_id: i64) -> PulseResult<ConsensusTally> {
        self.get_verification_summary_at(station_id, Utc::now()).await
    }

    pub async fn get_verification_summary_at(
        &self,
        station_id: i64,
        now: DateTime<Utc>,
    ) -> PulseResult<ConsensusTally> {
        self.require_station(station_id).await?;
        self.evaluator.summary_at(station_id, now).await
    }

    pub async fn get_verification_history(
        &self,
        station_id: i64,
    ) -> PulseResult<Vec<VoteHistoryEntry>> {
        self.get_verification_history_at(station_id, Utc::now()).await
    }

    /// Newest-first votes over the trailing history window, capped
    pub async fn get_verification_history_at(
        &self,
        station_id: i64,
        now: DateTime<Utc>,
    ) -> PulseResult<Vec<VoteHistoryEntry>> {
        self.require_station(station_id).await?;
        self.store
            .vote_history(
                station_id,
                now - self.settings.history_window,
                self.settings.history_limit,
            )
            .await
    }

    pub async fn get_reporter_reputation_level(
        &self,
        reporter_id: i64,
    ) -> PulseResult<ReputationLevel> {
        Ok(self.get_reporter_reputation(reporter_id).await?.level)
    }

    pub async fn get_reporter_reputation(&self, reporter_id: i64) -> PulseResult<ReputationScore> {
        self.triggers.ledger().reputation(reporter_id).await
    }

    pub async fn get_reputation_history(
        &self,
        reporter_id: i64,
        limit: usize,
    ) -> PulseResult<Vec<ReputationEvent>> {
        self.require_reporter(reporter_id).await?;
        self.triggers.ledger().history(reporter_id, limit).await
    }

    pub async fn estimate_station_confidence(
        &self,
        station_id: i64,
    ) -> PulseResult<ConfidenceEstimate> {
        self.confidence.estimate(station_id).await
    }

    pub async fn estimate_station_confidence_at(
        &self,
        station_id: i64,
        now: DateTime<Utc>,
    ) -> PulseResult<ConfidenceEstimate> {
        self.confidence.estimate_at(station_id, now).await
    }

    pub async fn submit_issue_report(
        &self,
        station_id: i64,
        reporter_id: i64,
        reason: &str,
    ) -> PulseResult<IssueReport> {
        self.submit_issue_report_at(station_id, reporter_id, reason, Utc::now())
            .await
            .map(|(report, _)| report)
    }

    /// Persist a pending report as of `now`, then spawn the report reward
    pub async fn submit_issue_report_at(
        &self,
        station_id: i64,
        reporter_id: i64,
        reason: &str,
        now: DateTime<Utc>,
    ) -> PulseResult<(IssueReport, JoinHandle<()>)> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(PulseError::InvalidReport("reason is empty".to_string()));
        }
        if reason.chars().count() > MAX_REASON_LEN {
            return Err(PulseError::InvalidReport(format!(
                "reason exceeds {} characters",
                MAX_REASON_LEN
            )));
        }
        self.require_station(station_id).await?;
        self.require_reporter(reporter_id).await?;

        let report = self
            .store
            .insert_report(
                NewIssueReport {
                    station_id,
                    reporter_id,
                    reason: reason.to_string(),
                },
                now,
            )
            .await?;

        debug!(
            report_id = report.id,
            station_id,
            reporter_id,
            reason = %report.reason,
            "Issue report recorded"
        );

        let handle = spawn_report_triggers(self.triggers.clone(), report.clone(), now);
        Ok((report, handle))
    }

    /// Drop ledger events older than `retention` before `now`
    pub async fn prune_reputation_events(
        &self,
        now: DateTime<Utc>,
        retention: Duration,
    ) -> PulseResult<u64> {
        self.triggers.ledger().prune(now - retention).await
    }

    async fn require_station(&self, station_id: i64) -> PulseResult<Station> {
        self.store
            .get_station(station_id)
            .await?
            .ok_or(PulseError::StationNotFound(station_id))
    }

    async fn require_reporter(&self, reporter_id: i64) -> PulseResult<Reporter> {
        self.store
            .get_reporter(reporter_id)
            .await?
            .ok_or(PulseError::ReporterNotFound(reporter_id))
    }
}
