//! PostgreSQL Database Module
//!
//! Provides the PostgreSQL backend of [`VerificationStore`]: stations, votes,
//! reports, reporters and the reputation ledger.

pub mod ledger;
pub mod pool;
pub mod reporters;
pub mod reports;
pub mod stations;
pub mod votes;

use chrono::{DateTime, Duration, Utc};

pub use ledger::LedgerRepository;
pub use pool::DatabasePool;
pub use reporters::ReporterRepository;
pub use reports::ReportRepository;
pub use stations::StationRepository;
pub use votes::VoteRepository;

use crate::confidence::{ConfidenceSignals, RECENT_REPORT_DAYS, RECENT_VERIFICATION_DAYS};
use crate::error::{PulseError, PulseResult};
use crate::models::{
    IssueReport, NewIssueReport, NewVote, Reporter, Station, StationStatus, VerificationVote,
    VoteHistoryEntry,
};
use crate::reputation::{ReputationAward, ReputationEvent};
use crate::store::VerificationStore;

impl VerificationStore for DatabasePool {
    async fn get_station(&self, station_id: i64) -> PulseResult<Option<Station>> {
        self.stations()
            .get_station(station_id)
            .await
            .map_err(PulseError::Storage)
    }

    async fn set_station_status(
        &self,
        station_id: i64,
        status: StationStatus,
        at: DateTime<Utc>,
    ) -> PulseResult<()> {
        self.stations()
            .set_status(station_id, status, at)
            .await
            .map_err(PulseError::Storage)
    }

    async fn get_reporter(&self, reporter_id: i64) -> PulseResult<Option<Reporter>> {
        self.reporters()
            .get_reporter(reporter_id)
            .await
            .map_err(PulseError::Storage)
    }

    async fn upsert_vote(
        &self,
        vote: NewVote,
        at: DateTime<Utc>,
        window: Duration,
    ) -> PulseResult<VerificationVote> {
        self.votes()
            .upsert_vote(vote, at, window)
            .await
            .map_err(PulseError::Storage)
    }

    async fn station_votes(
        &self,
        station_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> PulseResult<Vec<VerificationVote>> {
        self.votes()
            .station_votes(station_id, from, to)
            .await
            .map_err(PulseError::Storage)
    }

    async fn reporter_votes(
        &self,
        reporter_id: i64,
        since: DateTime<Utc>,
    ) -> PulseResult<Vec<VerificationVote>> {
        self.votes()
            .reporter_votes(reporter_id, since)
            .await
            .map_err(PulseError::Storage)
    }

    async fn vote_history(
        &self,
        station_id: i64,
        since: DateTime<Utc>,
        limit: usize,
    ) -> PulseResult<Vec<VoteHistoryEntry>> {
        self.votes()
            .history(station_id, since, limit)
            .await
            .map_err(PulseError::Storage)
    }

    async fn insert_report(
        &self,
        report: NewIssueReport,
        at: DateTime<Utc>,
    ) -> PulseResult<IssueReport> {
        self.reports()
            .insert_report(&report, at)
            .await
            .map_err(PulseError::Storage)
    }

    async fn reports_for_reason(
        &self,
        station_id: i64,
        reason: &str,
        since: DateTime<Utc>,
    ) -> PulseResult<Vec<IssueReport>> {
        self.reports()
            .reports_for_reason(station_id, reason, since)
            .await
            .map_err(PulseError::Storage)
    }

    async fn apply_award(&self, award: &ReputationAward, at: DateTime<Utc>) -> PulseResult<bool> {
        self.ledger()
            .apply_award(award, at)
            .await
            .map_err(PulseError::Storage)
    }

    async fn reputation_events(
        &self,
        reporter_id: i64,
        limit: usize,
    ) -> PulseResult<Vec<ReputationEvent>> {
        self.ledger()
            .events_for_reporter(reporter_id, limit)
            .await
            .map_err(PulseError::Storage)
    }

    async fn prune_reputation_events(&self, before: DateTime<Utc>) -> PulseResult<u64> {
        self.ledger()
            .prune_before(before)
            .await
            .map_err(PulseError::Storage)
    }

    async fn confidence_signals(
        &self,
        station_id: i64,
        now: DateTime<Utc>,
    ) -> PulseResult<Option<ConfidenceSignals>> {
        let Some(station) = self.get_station(station_id).await? else {
            return Ok(None);
        };

        let (total, recent, newest_vote) = self
            .votes()
            .station_activity(station_id, now - Duration::days(RECENT_VERIFICATION_DAYS))
            .await
            .map_err(PulseError::Storage)?;
        let (unresolved, newest_report) = self
            .reports()
            .station_activity(station_id, now - Duration::days(RECENT_REPORT_DAYS))
            .await
            .map_err(PulseError::Storage)?;

        let last_activity_at = [Some(station.updated_at), newest_vote, newest_report]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(station.updated_at);

        Ok(Some(ConfidenceSignals {
            total_verifications: total.max(0) as u64,
            recent_verifications: recent.max(0) as u64,
            unresolved_recent_reports: unresolved.max(0) as u64,
            last_activity_at,
        }))
    }
}

/// `LIMIT` bind value; a `usize` past `i64::MAX` means no limit
pub(crate) fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_limit_saturates() {
        assert_eq!(sql_limit(50), 50);
        assert_eq!(sql_limit(0), 0);
        assert_eq!(sql_limit(usize::MAX), i64::MAX);
        assert!(sql_limit(usize::MAX) > 0);
    }
}
