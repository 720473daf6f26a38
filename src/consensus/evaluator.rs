use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::consensus::ConsensusTally;
use crate::error::PulseResult;
use crate::store::VerificationStore;

/// Tallies station votes over the trailing consensus window
pub struct ConsensusEvaluator<S> {
    store: Arc<S>,
    window: Duration,
}

impl<S> Clone for ConsensusEvaluator<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            window: self.window,
        }
    }
}

impl<S: VerificationStore> ConsensusEvaluator<S> {
    pub fn new(store: Arc<S>, window: Duration) -> Self {
        Self { store, window }
    }

    /// Tally of votes cast in `[now - window, now]`
    pub async fn summary_at(
        &self,
        station_id: i64,
        now: DateTime<Utc>,
    ) -> PulseResult<ConsensusTally> {
        self.tally_between(station_id, now - self.window, now).await
    }

    pub async fn tally_between(
        &self,
        station_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> PulseResult<ConsensusTally> {
        let votes = self.store.station_votes(station_id, from, to).await?;
        Ok(ConsensusTally::from_votes(station_id, &votes))
    }
}
