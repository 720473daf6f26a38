//! Reporter Repository - reputation reads

use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::models::Reporter;

pub struct ReporterRepository {
    pool: PgPool,
}

impl ReporterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_reporter(&self, reporter_id: i64) -> Result<Option<Reporter>, String> {
        let row = sqlx::query(r#"
            SELECT id, display_name, reputation_score
            FROM pulse.reporters
            WHERE id = $1
        "#)
        .bind(reporter_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to get reporter: {}", e))?;

        Ok(row.map(|row| reporter_from_row(&row)))
    }
}

/// The stored level column is ignored; the level is always recomputed from the score.
fn reporter_from_row(row: &PgRow) -> Reporter {
    Reporter::new(
        row.get("id"),
        row.get::<String, _>("display_name"),
        row.get("reputation_score"),
    )
}
