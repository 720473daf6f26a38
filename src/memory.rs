//! In-process storage backend.
//!
//! Keeps the same contract as the PostgreSQL backend: every reporter has its
//! own async mutex standing in for the row lock, and award deduplication is
//! checked against the stored event log while that lock is held. Nothing here
//! survives a restart, so it serves tests and single-process development only.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio::sync::{Mutex, RwLock};

use crate::confidence::{ConfidenceSignals, RECENT_REPORT_DAYS, RECENT_VERIFICATION_DAYS};
use crate::error::{PulseError, PulseResult};
use crate::models::{
    IssueReport, NewIssueReport, NewVote, ReportStatus, Reporter, Station, StationStatus,
    VerificationVote, VoteHistoryEntry, VoteValue,
};
use crate::reputation::{ReputationAward, ReputationEvent, apply_delta};
use crate::store::VerificationStore;

#[derive(Default)]
pub struct MemoryStore {
    stations: RwLock<HashMap<i64, Station>>,
    reporters: DashMap<i64, Arc<Mutex<Reporter>>>,
    votes: RwLock<Vec<VerificationVote>>,
    reports: RwLock<Vec<IssueReport>>,
    events: RwLock<Vec<ReputationEvent>>,
    next_id: AtomicI64,
    fail_awards: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub async fn add_station(&self, station: Station) {
        self.stations.write().await.insert(station.id, station);
    }

    pub fn add_reporter(&self, reporter: Reporter) {
        self.reporters
            .insert(reporter.id, Arc::new(Mutex::new(reporter)));
    }

    /// Insert a vote row as-is, bypassing the overwrite rule
    pub async fn insert_vote(
        &self,
        station_id: i64,
        reporter_id: i64,
        value: VoteValue,
        cast_at: DateTime<Utc>,
    ) -> VerificationVote {
        let vote = VerificationVote {
            id: self.next_id(),
            station_id,
            reporter_id,
            value,
            cast_at,
        };
        self.votes.write().await.push(vote.clone());
        vote
    }

    /// Mark a report resolved, as the review workflow would
    pub async fn resolve_report(&self, report_id: i64, at: DateTime<Utc>) {
        let mut reports = self.reports.write().await;
        if let Some(report) = reports.iter_mut().find(|r| r.id == report_id) {
            report.status = ReportStatus::Resolved;
            report.resolved_at = Some(at);
        }
    }

    /// Make every award transaction fail, as a broken database would
    pub fn set_fail_awards(&self, fail: bool) {
        self.fail_awards.store(fail, Ordering::SeqCst);
    }

    pub async fn all_events(&self) -> Vec<ReputationEvent> {
        self.events.read().await.clone()
    }

    pub async fn vote_count(&self) -> usize {
        self.votes.read().await.len()
    }

    fn reporter_lock(&self, reporter_id: i64) -> PulseResult<Arc<Mutex<Reporter>>> {
        self.reporters
            .get(&reporter_id)
            .map(|entry| entry.value().clone())
            .ok_or(PulseError::ReporterNotFound(reporter_id))
    }
}

impl VerificationStore for MemoryStore {
    async fn get_station(&self, station_id: i64) -> PulseResult<Option<Station>> {
        Ok(self.stations.read().await.get(&station_id).cloned())
    }

    async fn set_station_status(
        &self,
        station_id: i64,
        status: StationStatus,
        at: DateTime<Utc>,
    ) -> PulseResult<()> {
        let mut stations = self.stations.write().await;
        let station = stations
            .get_mut(&station_id)
            .ok_or(PulseError::StationNotFound(station_id))?;
        station.status = status;
        station.updated_at = at;
        Ok(())
    }

    async fn get_reporter(&self, reporter_id: i64) -> PulseResult<Option<Reporter>> {
        let Ok(lock) = self.reporter_lock(reporter_id) else {
            return Ok(None);
        };
        let reporter = lock.lock().await.clone();
        Ok(Some(reporter))
    }

    async fn upsert_vote(
        &self,
        vote: NewVote,
        at: DateTime<Utc>,
        window: Duration,
    ) -> PulseResult<VerificationVote> {
        let lock = self.reporter_lock(vote.reporter_id)?;
        let _reporter = lock.lock().await;

        let mut votes = self.votes.write().await;
        let live = votes
            .iter_mut()
            .filter(|v| {
                v.station_id == vote.station_id
                    && v.reporter_id == vote.reporter_id
                    && v.cast_at >= at - window
            })
            .max_by_key(|v| v.cast_at);

        if let Some(existing) = live {
            existing.value = vote.value;
            existing.cast_at = at;
            return Ok(existing.clone());
        }

        let inserted = VerificationVote {
            id: self.next_id(),
            station_id: vote.station_id,
            reporter_id: vote.reporter_id,
            value: vote.value,
            cast_at: at,
        };
        votes.push(inserted.clone());
        Ok(inserted)
    }

    async fn station_votes(
        &self,
        station_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> PulseResult<Vec<VerificationVote>> {
        Ok(self
            .votes
            .read()
            .await
            .iter()
            .filter(|v| v.station_id == station_id && v.cast_at >= from && v.cast_at <= to)
            .cloned()
            .collect())
    }

    async fn reporter_votes(
        &self,
        reporter_id: i64,
        since: DateTime<Utc>,
    ) -> PulseResult<Vec<VerificationVote>> {
        let mut votes: Vec<VerificationVote> = self
            .votes
            .read()
            .await
            .iter()
            .filter(|v| v.reporter_id == reporter_id && v.cast_at >= since)
            .cloned()
            .collect();
        votes.sort_by_key(|v| v.cast_at);
        Ok(votes)
    }

    async fn vote_history(
        &self,
        station_id: i64,
        since: DateTime<Utc>,
        limit: usize,
    ) -> PulseResult<Vec<VoteHistoryEntry>> {
        let mut votes: Vec<VerificationVote> = self
            .votes
            .read()
            .await
            .iter()
            .filter(|v| v.station_id == station_id && v.cast_at >= since)
            .cloned()
            .collect();
        votes.sort_by(|a, b| b.cast_at.cmp(&a.cast_at));
        votes.truncate(limit);

        let mut history = Vec::with_capacity(votes.len());
        for vote in votes {
            let Some(reporter) = self.get_reporter(vote.reporter_id).await? else {
                continue;
            };
            history.push(VoteHistoryEntry {
                vote_id: vote.id,
                value: vote.value,
                cast_at: vote.cast_at,
                reporter_display_name: reporter.display_name,
                reporter_level: reporter.reputation_level,
            });
        }
        Ok(history)
    }

    async fn insert_report(
        &self,
        report: NewIssueReport,
        at: DateTime<Utc>,
    ) -> PulseResult<IssueReport> {
        let report = IssueReport {
            id: self.next_id(),
            station_id: report.station_id,
            reporter_id: report.reporter_id,
            reason: report.reason,
            status: ReportStatus::Pending,
            created_at: at,
            resolved_at: None,
        };
        self.reports.write().await.push(report.clone());
        Ok(report)
    }

    async fn reports_for_reason(
        &self,
        station_id: i64,
        reason: &str,
        since: DateTime<Utc>,
    ) -> PulseResult<Vec<IssueReport>> {
        Ok(self
            .reports
            .read()
            .await
            .iter()
            .filter(|r| r.station_id == station_id && r.reason == reason && r.created_at >= since)
            .cloned()
            .collect())
    }

    async fn apply_award(&self, award: &ReputationAward, at: DateTime<Utc>) -> PulseResult<bool> {
        if self.fail_awards.load(Ordering::SeqCst) {
            return Err(PulseError::Storage("award transaction aborted".to_string()));
        }

        let lock = self.reporter_lock(award.reporter_id)?;
        let mut reporter = lock.lock().await;

        let mut events = self.events.write().await;
        if events.iter().any(|e| e.blocks(award, at)) {
            return Ok(false);
        }

        events.push(ReputationEvent {
            id: self.next_id(),
            reporter_id: award.reporter_id,
            event_type: award.event_type,
            station_scope: award.station_scope,
            reason_scope: award.reason_scope.clone(),
            delta: award.delta,
            created_at: at,
        });

        let update = apply_delta(reporter.reputation_score, award.delta);
        reporter.reputation_score = update.score;
        reporter.reputation_level = update.level;
        Ok(true)
    }

    async fn reputation_events(
        &self,
        reporter_id: i64,
        limit: usize,
    ) -> PulseResult<Vec<ReputationEvent>> {
        let mut events: Vec<ReputationEvent> = self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.reporter_id == reporter_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        events.truncate(limit);
        Ok(events)
    }

    async fn prune_reputation_events(&self, before: DateTime<Utc>) -> PulseResult<u64> {
        let mut events = self.events.write().await;
        let initial = events.len();
        events.retain(|e| e.created_at >= before);
        Ok((initial - events.len()) as u64)
    }

    async fn confidence_signals(
        &self,
        station_id: i64,
        now: DateTime<Utc>,
    ) -> PulseResult<Option<ConfidenceSignals>> {
        let Some(station) = self.get_station(station_id).await? else {
            return Ok(None);
        };

        let mut last_activity_at = station.updated_at;
        let mut total_verifications = 0;
        let mut recent_verifications = 0;
        {
            let recent_from = now - Duration::days(RECENT_VERIFICATION_DAYS);
            for vote in self.votes.read().await.iter().filter(|v| v.station_id == station_id) {
                total_verifications += 1;
                if vote.cast_at >= recent_from {
                    recent_verifications += 1;
                }
                last_activity_at = last_activity_at.max(vote.cast_at);
            }
        }

        let mut unresolved_recent_reports = 0;
        {
            let recent_from = now - Duration::days(RECENT_REPORT_DAYS);
            for report in self.reports.read().await.iter().filter(|r| r.station_id == station_id) {
                if report.status == ReportStatus::Pending && report.created_at >= recent_from {
                    unresolved_recent_reports += 1;
                }
                last_activity_at = last_activity_at.max(report.created_at);
            }
        }

        Ok(Some(ConfidenceSignals {
            total_verifications,
            recent_verifications,
            unresolved_recent_reports,
            last_activity_at,
        }))
    }
}
