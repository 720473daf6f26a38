//! Station Repository - status reads and writes

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::debug;

use crate::models::{Station, StationStatus, TrustLevel};

pub struct StationRepository {
    pool: PgPool,
}

impl StationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_station(&self, station_id: i64) -> Result<Option<Station>, String> {
        let row = sqlx::query(r#"
            SELECT id, name, status, trust_level, updated_at
            FROM pulse.stations
            WHERE id = $1
        "#)
        .bind(station_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to get station: {}", e))?;

        row.map(|row| station_from_row(&row)).transpose()
    }

    pub async fn set_status(
        &self,
        station_id: i64,
        status: StationStatus,
        at: DateTime<Utc>,
    ) -> Result<(), String> {
        let result = sqlx::query(r#"
            UPDATE pulse.stations
            SET status = $2, updated_at = $3
            WHERE id = $1
        "#)
        .bind(station_id)
        .bind(status.as_str())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to update station status: {}", e))?;

        if result.rows_affected() == 0 {
            return Err(format!("Station {} does not exist", station_id));
        }

        debug!(station_id, status = status.as_str(), "Station status written");
        Ok(())
    }
}

fn station_from_row(row: &PgRow) -> Result<Station, String> {
    let status: String = row.get("status");
    let trust_level: String = row.get("trust_level");

    Ok(Station {
        id: row.get("id"),
        name: row.get("name"),
        status: StationStatus::parse(&status)
            .ok_or_else(|| format!("Unknown station status: {}", status))?,
        trust_level: TrustLevel::parse(&trust_level)
            .ok_or_else(|| format!("Unknown trust level: {}", trust_level))?,
        updated_at: row.get("updated_at"),
    })
}
