//! Reputation Ledger
//!
//! Thin orchestration over the store's locked award transaction. The store
//! owns atomicity; the ledger owns logging and the read side.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{PulseError, PulseResult};
use crate::reputation::{ReputationAward, ReputationEvent, ReputationScore};
use crate::store::VerificationStore;

pub struct ReputationLedger<S> {
    store: Arc<S>,
}

impl<S> Clone for ReputationLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: VerificationStore> ReputationLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Apply `award` as of `now` unless its key already has an event inside
    /// the window.
    ///
    /// Returns whether the delta was applied.
    pub async fn try_award(
        &self,
        award: &ReputationAward,
        now: DateTime<Utc>,
    ) -> PulseResult<bool> {
        let applied = self.store.apply_award(award, now).await?;

        if applied {
            info!(
                reporter_id = award.reporter_id,
                event_type = award.event_type.as_str(),
                station_scope = ?award.station_scope,
                reason_scope = ?award.reason_scope,
                delta = award.delta,
                "Applied reputation event"
            );
        } else {
            debug!(
                reporter_id = award.reporter_id,
                event_type = award.event_type.as_str(),
                station_scope = ?award.station_scope,
                "Reputation event already applied in window"
            );
        }

        Ok(applied)
    }

    pub async fn reputation(&self, reporter_id: i64) -> PulseResult<ReputationScore> {
        let reporter = self
            .store
            .get_reporter(reporter_id)
            .await?
            .ok_or(PulseError::ReporterNotFound(reporter_id))?;
        Ok(ReputationScore::from(&reporter))
    }

    /// Most recent events for a reporter, newest first
    pub async fn history(
        &self,
        reporter_id: i64,
        limit: usize,
    ) -> PulseResult<Vec<ReputationEvent>> {
        self.store.reputation_events(reporter_id, limit).await
    }

    /// Remove events created before `before`
    pub async fn prune(&self, before: DateTime<Utc>) -> PulseResult<u64> {
        let removed = self.store.prune_reputation_events(before).await?;
        if removed > 0 {
            info!(removed, before = %before, "Pruned reputation events");
        }
        Ok(removed)
    }
}
