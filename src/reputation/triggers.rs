//! Reputation Trigger Rules
//!
//! Decide when a primary write (a vote or an issue report) earns a reward or
//! a penalty, and hand qualifying awards to the ledger.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::consensus::{ConsensusEvaluator, ContradictionDetector};
use crate::error::PulseResult;
use crate::models::{IssueReport, VerificationVote};
use crate::reputation::{ReputationAward, ReputationLedger, ReputationRules};
use crate::store::VerificationStore;

pub struct ReputationTriggers<S> {
    store: Arc<S>,
    ledger: ReputationLedger<S>,
    evaluator: ConsensusEvaluator<S>,
    detector: ContradictionDetector<S>,
    rules: ReputationRules,
}

impl<S: VerificationStore> ReputationTriggers<S> {
    pub fn new(
        store: Arc<S>,
        evaluator: ConsensusEvaluator<S>,
        rules: ReputationRules,
    ) -> Self {
        Self {
            ledger: ReputationLedger::new(store.clone()),
            detector: ContradictionDetector::new(store.clone(), &rules),
            store,
            evaluator,
            rules,
        }
    }

    pub fn ledger(&self) -> &ReputationLedger<S> {
        &self.ledger
    }

    /// verification_reward: the vote matches a leader backed by enough votes
    pub async fn reward_agreement(
        &self,
        vote: &VerificationVote,
        now: DateTime<Utc>,
    ) -> PulseResult<bool> {
        let tally = self.evaluator.summary_at(vote.station_id, now).await?;

        if tally.dominant(self.rules.verification_min_support) != Some(vote.value) {
            return Ok(false);
        }

        let award = ReputationAward::verification_reward(
            vote.reporter_id,
            vote.station_id,
            self.rules.verification_reward,
            self.rules.verification_window(),
        );
        self.ledger.try_award(&award, now).await
    }

    /// contradiction_penalty: enough recent votes were overturned by the crowd
    pub async fn penalize_contradictions(
        &self,
        reporter_id: i64,
        now: DateTime<Utc>,
    ) -> PulseResult<bool> {
        let contradictions = self.detector.count_contradictions(reporter_id, now).await?;

        if contradictions < self.rules.contradiction_threshold {
            return Ok(false);
        }

        let award = ReputationAward::contradiction_penalty(
            reporter_id,
            self.rules.contradiction_penalty,
            self.rules.contradiction_window(),
        );
        self.ledger.try_award(&award, now).await
    }

    /// report_reward: enough reports share the station and reason; every
    /// distinct reporter among them gets an independent award attempt.
    ///
    /// Returns how many awards were applied. A failing attempt is logged and
    /// does not stop the others.
    pub async fn reward_corroborated_report(
        &self,
        report: &IssueReport,
        now: DateTime<Utc>,
    ) -> PulseResult<usize> {
        let reports = self
            .store
            .reports_for_reason(report.station_id, &report.reason, now - self.rules.report_window())
            .await?;

        if reports.len() < self.rules.report_min_count {
            debug!(
                station_id = report.station_id,
                reason = %report.reason,
                reports = reports.len(),
                "Report not yet corroborated"
            );
            return Ok(0);
        }

        let reporters: BTreeSet<i64> = reports.iter().map(|r| r.reporter_id).collect();

        let mut applied = 0;
        for reporter_id in reporters {
            let award = ReputationAward::report_reward(
                reporter_id,
                report.station_id,
                &report.reason,
                self.rules.report_reward,
                self.rules.report_window(),
            );
            match self.ledger.try_award(&award, now).await {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(e) => warn!(
                    reporter_id,
                    station_id = report.station_id,
                    error = %e,
                    "Report reward attempt failed"
                ),
            }
        }

        Ok(applied)
    }
}
