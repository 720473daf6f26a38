//! Report Repository - issue reports by station, reason and window

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::models::{IssueReport, NewIssueReport, ReportStatus};

pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_report(
        &self,
        report: &NewIssueReport,
        at: DateTime<Utc>,
    ) -> Result<IssueReport, String> {
        let row = sqlx::query(r#"
            INSERT INTO pulse.issue_reports (station_id, reporter_id, reason, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, station_id, reporter_id, reason, status, created_at, resolved_at
        "#)
        .bind(report.station_id)
        .bind(report.reporter_id)
        .bind(&report.reason)
        .bind(ReportStatus::Pending.as_str())
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| format!("Failed to insert issue report: {}", e))?;

        report_from_row(&row)
    }

    pub async fn reports_for_reason(
        &self,
        station_id: i64,
        reason: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<IssueReport>, String> {
        let rows = sqlx::query(r#"
            SELECT id, station_id, reporter_id, reason, status, created_at, resolved_at
            FROM pulse.issue_reports
            WHERE station_id = $1 AND reason = $2 AND created_at >= $3
        "#)
        .bind(station_id)
        .bind(reason)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to get reports for reason: {}", e))?;

        rows.iter().map(report_from_row).collect()
    }

    /// Pending reports since `recent_from` and the newest report: `(unresolved, newest)`
    pub async fn station_activity(
        &self,
        station_id: i64,
        recent_from: DateTime<Utc>,
    ) -> Result<(i64, Option<DateTime<Utc>>), String> {
        let row = sqlx::query(r#"
            SELECT COUNT(*) FILTER (WHERE status = 'pending' AND created_at >= $2) AS unresolved,
                   MAX(created_at) AS newest
            FROM pulse.issue_reports
            WHERE station_id = $1
        "#)
        .bind(station_id)
        .bind(recent_from)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| format!("Failed to get station report activity: {}", e))?;

        Ok((row.get("unresolved"), row.get("newest")))
    }
}

fn report_from_row(row: &PgRow) -> Result<IssueReport, String> {
    let status: String = row.get("status");
    Ok(IssueReport {
        id: row.get("id"),
        station_id: row.get("station_id"),
        reporter_id: row.get("reporter_id"),
        reason: row.get("reason"),
        status: ReportStatus::parse(&status)
            .ok_or_else(|| format!("Unknown report status: {}", status))?,
        created_at: row.get("created_at"),
        resolved_at: row.get("resolved_at"),
    })
}
