//! Vote Repository - windowed reads and the overwrite-on-resubmit upsert

use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::debug;

use crate::database::sql_limit;
use crate::models::{NewVote, ReputationLevel, VerificationVote, VoteHistoryEntry, VoteValue};

pub struct VoteRepository {
    pool: PgPool,
}

impl VoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Overwrite the reporter's live vote for the station or insert a new one.
    ///
    /// The reporter row is locked for the duration so concurrent submissions
    /// from the same reporter cannot both insert.
    pub async fn upsert_vote(
        &self,
        vote: NewVote,
        at: DateTime<Utc>,
        window: Duration,
    ) -> Result<VerificationVote, String> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| format!("Failed to begin vote transaction: {}", e))?;

        sqlx::query("SELECT id FROM pulse.reporters WHERE id = $1 FOR UPDATE")
            .bind(vote.reporter_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| format!("Failed to lock reporter: {}", e))?
            .ok_or_else(|| format!("Reporter {} does not exist", vote.reporter_id))?;

        let existing = sqlx::query(r#"
            SELECT id FROM pulse.verification_votes
            WHERE station_id = $1 AND reporter_id = $2 AND cast_at >= $3
            ORDER BY cast_at DESC
            LIMIT 1
        "#)
        .bind(vote.station_id)
        .bind(vote.reporter_id)
        .bind(at - window)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| format!("Failed to find live vote: {}", e))?;

        let row = match existing {
            Some(row) => {
                let vote_id: i64 = row.get("id");
                sqlx::query(r#"
                    UPDATE pulse.verification_votes
                    SET value = $2, cast_at = $3
                    WHERE id = $1
                    RETURNING id, station_id, reporter_id, value, cast_at
                "#)
                .bind(vote_id)
                .bind(vote.value.as_str())
                .bind(at)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| format!("Failed to overwrite vote: {}", e))?
            }
            None => sqlx::query(r#"
                    INSERT INTO pulse.verification_votes (station_id, reporter_id, value, cast_at)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id, station_id, reporter_id, value, cast_at
                "#)
                .bind(vote.station_id)
                .bind(vote.reporter_id)
                .bind(vote.value.as_str())
                .bind(at)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| format!("Failed to insert vote: {}", e))?,
        };

        tx.commit()
            .await
            .map_err(|e| format!("Failed to commit vote: {}", e))?;

        let stored = vote_from_row(&row)?;
        debug!(
            vote_id = stored.id,
            station_id = stored.station_id,
            reporter_id = stored.reporter_id,
            value = stored.value.as_str(),
            "Vote stored"
        );
        Ok(stored)
    }

    pub async fn station_votes(
        &self,
        station_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<VerificationVote>, String> {
        let rows = sqlx::query(r#"
            SELECT id, station_id, reporter_id, value, cast_at
            FROM pulse.verification_votes
            WHERE station_id = $1 AND cast_at >= $2 AND cast_at <= $3
        "#)
        .bind(station_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to get station votes: {}", e))?;

        rows.iter().map(vote_from_row).collect()
    }

    pub async fn reporter_votes(
        &self,
        reporter_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<VerificationVote>, String> {
        let rows = sqlx::query(r#"
            SELECT id, station_id, reporter_id, value, cast_at
            FROM pulse.verification_votes
            WHERE reporter_id = $1 AND cast_at >= $2
            ORDER BY cast_at ASC
        "#)
        .bind(reporter_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to get reporter votes: {}", e))?;

        rows.iter().map(vote_from_row).collect()
    }

    pub async fn history(
        &self,
        station_id: i64,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<VoteHistoryEntry>, String> {
        let rows = sqlx::query(r#"
            SELECT v.id, v.value, v.cast_at, r.display_name, r.reputation_score
            FROM pulse.verification_votes v
            JOIN pulse.reporters r ON r.id = v.reporter_id
            WHERE v.station_id = $1 AND v.cast_at >= $2
            ORDER BY v.cast_at DESC
            LIMIT $3
        "#)
        .bind(station_id)
        .bind(since)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to get vote history: {}", e))?;

        rows.iter()
            .map(|row| {
                Ok(VoteHistoryEntry {
                    vote_id: row.get("id"),
                    value: parse_value(row)?,
                    cast_at: row.get("cast_at"),
                    reporter_display_name: row.get("display_name"),
                    reporter_level: ReputationLevel::from_score(row.get("reputation_score")),
                })
            })
            .collect()
    }

    /// Vote counts and newest vote for a station: `(total, since_recent, newest)`
    pub async fn station_activity(
        &self,
        station_id: i64,
        recent_from: DateTime<Utc>,
    ) -> Result<(i64, i64, Option<DateTime<Utc>>), String> {
        let row = sqlx::query(r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE cast_at >= $2) AS recent,
                   MAX(cast_at) AS newest
            FROM pulse.verification_votes
            WHERE station_id = $1
        "#)
        .bind(station_id)
        .bind(recent_from)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| format!("Failed to get station vote activity: {}", e))?;

        Ok((row.get("total"), row.get("recent"), row.get("newest")))
    }
}

fn parse_value(row: &PgRow) -> Result<VoteValue, String> {
    let value: String = row.get("value");
    value
        .parse()
        .map_err(|_| format!("Unknown vote value in storage: {}", value))
}

fn vote_from_row(row: &PgRow) -> Result<VerificationVote, String> {
    Ok(VerificationVote {
        id: row.get("id"),
        station_id: row.get("station_id"),
        reporter_id: row.get("reporter_id"),
        value: parse_value(row)?,
        cast_at: row.get("cast_at"),
    })
}
