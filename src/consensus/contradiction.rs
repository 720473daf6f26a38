use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::consensus::ConsensusTally;
use crate::error::PulseResult;
use crate::models::{VerificationVote, VoteValue};
use crate::reputation::ReputationRules;
use crate::store::VerificationStore;

/// Whether some value other than the vote's reached `min_support` in the
/// follow-up tally. Ties and outvoted opposition still count.
pub fn contradicts(vote: &VerificationVote, followup: &ConsensusTally, min_support: usize) -> bool {
    VoteValue::ALL
        .iter()
        .any(|value| *value != vote.value && followup.count(*value) >= min_support)
}

/// Counts how often a reporter's recent votes were overturned by the crowd
pub struct ContradictionDetector<S> {
    store: Arc<S>,
    lookback: Duration,
    followup: Duration,
    min_support: usize,
}

impl<S> Clone for ContradictionDetector<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            lookback: self.lookback,
            followup: self.followup,
            min_support: self.min_support,
        }
    }
}

impl<S: VerificationStore> ContradictionDetector<S> {
    pub fn new(store: Arc<S>, rules: &ReputationRules) -> Self {
        Self {
            store,
            lookback: rules.contradiction_window(),
            followup: rules.contradiction_followup(),
            min_support: rules.contradiction_min_support,
        }
    }

    /// Contradicted votes among the reporter's votes in `[now - lookback, now]`.
    ///
    /// Re-scans the whole lookback on every call.
    pub async fn count_contradictions(
        &self,
        reporter_id: i64,
        now: DateTime<Utc>,
    ) -> PulseResult<usize> {
        let votes = self.store.reporter_votes(reporter_id, now - self.lookback).await?;

        let mut contradictions = 0;
        for vote in &votes {
            let followers = self
                .store
                .station_votes(vote.station_id, vote.cast_at, vote.cast_at + self.followup)
                .await?;
            let tally = ConsensusTally::from_votes(vote.station_id, &followers);
            if contradicts(vote, &tally, self.min_support) {
                contradictions += 1;
            }
        }

        debug!(
            reporter_id,
            scanned = votes.len(),
            contradictions,
            "Contradiction scan complete"
        );
        Ok(contradictions)
    }
}
