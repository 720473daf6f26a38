//! Storage seam consumed by the inference engine.
//!
//! Stations, votes, reports and reporters are owned by collaborators outside
//! this crate; the engine only needs the narrow operations below. Two
//! backends implement it: [`crate::database::DatabasePool`] (PostgreSQL) and
//! [`crate::memory::MemoryStore`].

use chrono::{DateTime, Duration, Utc};
use std::future::Future;

use crate::confidence::ConfidenceSignals;
use crate::error::PulseResult;
use crate::models::{
    IssueReport, NewIssueReport, NewVote, Reporter, Station, StationStatus, VerificationVote,
    VoteHistoryEntry,
};
use crate::reputation::{ReputationAward, ReputationEvent};

pub trait VerificationStore: Send + Sync + 'static {
    fn get_station(
        &self,
        station_id: i64,
    ) -> impl Future<Output = PulseResult<Option<Station>>> + Send;

    fn set_station_status(
        &self,
        station_id: i64,
        status: StationStatus,
        at: DateTime<Utc>,
    ) -> impl Future<Output = PulseResult<()>> + Send;

    fn get_reporter(
        &self,
        reporter_id: i64,
    ) -> impl Future<Output = PulseResult<Option<Reporter>>> + Send;

    /// Write a vote, overwriting value and `cast_at` of the reporter's vote for
    /// the same station if one was cast within `window` of `at`.
    fn upsert_vote(
        &self,
        vote: NewVote,
        at: DateTime<Utc>,
        window: Duration,
    ) -> impl Future<Output = PulseResult<VerificationVote>> + Send;

    /// Votes for a station with `from <= cast_at <= to`
    fn station_votes(
        &self,
        station_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = PulseResult<Vec<VerificationVote>>> + Send;

    /// Votes cast by a reporter at or after `since`, oldest first
    fn reporter_votes(
        &self,
        reporter_id: i64,
        since: DateTime<Utc>,
    ) -> impl Future<Output = PulseResult<Vec<VerificationVote>>> + Send;

    /// Newest-first station votes joined with their reporter
    fn vote_history(
        &self,
        station_id: i64,
        since: DateTime<Utc>,
        limit: usize,
    ) -> impl Future<Output = PulseResult<Vec<VoteHistoryEntry>>> + Send;

    fn insert_report(
        &self,
        report: NewIssueReport,
        at: DateTime<Utc>,
    ) -> impl Future<Output = PulseResult<IssueReport>> + Send;

    /// Reports for `(station, reason)` created at or after `since`
    fn reports_for_reason(
        &self,
        station_id: i64,
        reason: &str,
        since: DateTime<Utc>,
    ) -> impl Future<Output = PulseResult<Vec<IssueReport>>> + Send;

    /// Apply an award inside one transaction holding the reporter's lock.
    ///
    /// Returns `false` without side effects when an event with the same key
    /// exists inside the award's window. Otherwise the event is appended, the
    /// score moves by `max(0, score + delta)` with its level recomputed, and
    /// `true` is returned.
    fn apply_award(
        &self,
        award: &ReputationAward,
        at: DateTime<Utc>,
    ) -> impl Future<Output = PulseResult<bool>> + Send;

    /// Most recent ledger events for a reporter, newest first
    fn reputation_events(
        &self,
        reporter_id: i64,
        limit: usize,
    ) -> impl Future<Output = PulseResult<Vec<ReputationEvent>>> + Send;

    /// Drop ledger events created before `before`; returns how many were removed
    fn prune_reputation_events(
        &self,
        before: DateTime<Utc>,
    ) -> impl Future<Output = PulseResult<u64>> + Send;

    /// Inputs of the confidence estimate, `None` when the station does not exist
    fn confidence_signals(
        &self,
        station_id: i64,
        now: DateTime<Utc>,
    ) -> impl Future<Output = PulseResult<Option<ConfidenceSignals>>> + Send;
}
