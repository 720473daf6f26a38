//! Ledger Repository - append-only reputation events and the award transaction

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::debug;

use crate::database::sql_limit;
use crate::reputation::{ReputationAward, ReputationEvent, ReputationEventType, apply_delta};

pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check-then-insert-then-update under `SELECT ... FOR UPDATE` on the reporter.
    ///
    /// Concurrent awards for one reporter serialize on the row lock; awards for
    /// different reporters never touch the same row.
    pub async fn apply_award(
        &self,
        award: &ReputationAward,
        at: DateTime<Utc>,
    ) -> Result<bool, String> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| format!("Failed to begin award transaction: {}", e))?;

        let reporter = sqlx::query(r#"
            SELECT reputation_score FROM pulse.reporters
            WHERE id = $1
            FOR UPDATE
        "#)
        .bind(award.reporter_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| format!("Failed to lock reporter: {}", e))?
        .ok_or_else(|| format!("Reporter {} does not exist", award.reporter_id))?;
        let current_score: i64 = reporter.get("reputation_score");

        let duplicate = sqlx::query(r#"
            SELECT id FROM pulse.reputation_events
            WHERE reporter_id = $1
              AND event_type = $2
              AND station_scope IS NOT DISTINCT FROM $3
              AND reason_scope IS NOT DISTINCT FROM $4
              AND created_at >= $5
            LIMIT 1
        "#)
        .bind(award.reporter_id)
        .bind(award.event_type.as_str())
        .bind(award.station_scope)
        .bind(award.reason_scope.as_deref())
        .bind(award.window_start(at))
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| format!("Failed to check reputation events: {}", e))?;

        if duplicate.is_some() {
            tx.rollback()
                .await
                .map_err(|e| format!("Failed to roll back award transaction: {}", e))?;
            return Ok(false);
        }

        sqlx::query(r#"
            INSERT INTO pulse.reputation_events
                (reporter_id, event_type, station_scope, reason_scope, delta, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#)
        .bind(award.reporter_id)
        .bind(award.event_type.as_str())
        .bind(award.station_scope)
        .bind(award.reason_scope.as_deref())
        .bind(award.delta)
        .bind(at)
        .execute(&mut *tx)
        .await
        .map_err(|e| format!("Failed to insert reputation event: {}", e))?;

        let update = apply_delta(current_score, award.delta);
        sqlx::query(r#"
            UPDATE pulse.reporters
            SET reputation_score = $2, reputation_level = $3, updated_at = $4
            WHERE id = $1
        "#)
        .bind(award.reporter_id)
        .bind(update.score)
        .bind(update.level.as_str())
        .bind(at)
        .execute(&mut *tx)
        .await
        .map_err(|e| format!("Failed to update reporter score: {}", e))?;

        tx.commit()
            .await
            .map_err(|e| format!("Failed to commit award transaction: {}", e))?;

        debug!(
            reporter_id = award.reporter_id,
            previous_score = update.previous_score,
            score = update.score,
            level = update.level.as_str(),
            "Reporter score updated"
        );
        Ok(true)
    }

    pub async fn events_for_reporter(
        &self,
        reporter_id: i64,
        limit: usize,
    ) -> Result<Vec<ReputationEvent>, String> {
        let rows = sqlx::query(r#"
            SELECT id, reporter_id, event_type, station_scope, reason_scope, delta, created_at
            FROM pulse.reputation_events
            WHERE reporter_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
        "#)
        .bind(reporter_id)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to get reputation events: {}", e))?;

        rows.iter().map(event_from_row).collect()
    }

    pub async fn prune_before(&self, before: DateTime<Utc>) -> Result<u64, String> {
        let result = sqlx::query("DELETE FROM pulse.reputation_events WHERE created_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to prune reputation events: {}", e))?;

        Ok(result.rows_affected())
    }
}

fn event_from_row(row: &PgRow) -> Result<ReputationEvent, String> {
    let event_type: String = row.get("event_type");
    Ok(ReputationEvent {
        id: row.get("id"),
        reporter_id: row.get("reporter_id"),
        event_type: ReputationEventType::parse(&event_type)
            .ok_or_else(|| format!("Unknown reputation event type: {}", event_type))?,
        station_scope: row.get("station_scope"),
        reason_scope: row.get("reason_scope"),
        delta: row.get("delta"),
        created_at: row.get("created_at"),
    })
}
