//! Fire-and-forget dispatch of reputation triggers.
//!
//! The primary write has already committed when these run. Failures are
//! logged and dropped: nothing is retried and nothing marks the attempt, so
//! the next qualifying write evaluates again.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::models::{IssueReport, VerificationVote};
use crate::reputation::ReputationTriggers;
use crate::store::VerificationStore;

/// Evaluate verification_reward then contradiction_penalty for a cast vote
pub fn spawn_vote_triggers<S: VerificationStore>(
    triggers: Arc<ReputationTriggers<S>>,
    vote: VerificationVote,
    now: DateTime<Utc>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = triggers.reward_agreement(&vote, now).await {
            warn!(
                reporter_id = vote.reporter_id,
                station_id = vote.station_id,
                error = %e,
                "Verification reward evaluation failed"
            );
        }

        if let Err(e) = triggers.penalize_contradictions(vote.reporter_id, now).await {
            warn!(
                reporter_id = vote.reporter_id,
                error = %e,
                "Contradiction penalty evaluation failed"
            );
        }
    })
}

/// Evaluate report_reward for a newly created issue report
pub fn spawn_report_triggers<S: VerificationStore>(
    triggers: Arc<ReputationTriggers<S>>,
    report: IssueReport,
    now: DateTime<Utc>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = triggers.reward_corroborated_report(&report, now).await {
            warn!(
                report_id = report.id,
                station_id = report.station_id,
                error = %e,
                "Report reward evaluation failed"
            );
        }
    })
}
