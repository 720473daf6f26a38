//! Database Connection Pool using sqlx

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::database::ledger::LedgerRepository;
use crate::database::reporters::ReporterRepository;
use crate::database::reports::ReportRepository;
use crate::database::stations::StationRepository;
use crate::database::votes::VoteRepository;

pub struct DatabasePool {
    pool: PgPool,
    stations: StationRepository,
    reporters: ReporterRepository,
    votes: VoteRepository,
    reports: ReportRepository,
    ledger: LedgerRepository,
}

impl DatabasePool {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, String> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await
            .map_err(|e| format!("Failed to connect to PostgreSQL: {}", e))?;

        info!(max_connections, "Connected to PostgreSQL");

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            stations: StationRepository::new(pool.clone()),
            reporters: ReporterRepository::new(pool.clone()),
            votes: VoteRepository::new(pool.clone()),
            reports: ReportRepository::new(pool.clone()),
            ledger: LedgerRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create the `pulse` schema, its tables and indexes if missing
    pub async fn init_schema(&self) -> Result<(), String> {
        info!("Initializing database schema...");

        sqlx::query("CREATE SCHEMA IF NOT EXISTS pulse")
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to create pulse schema: {}", e))?;

        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS pulse.stations (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'OPERATIONAL',
                trust_level VARCHAR(20) NOT NULL DEFAULT 'NORMAL',
                updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
        "#)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create stations table: {}", e))?;

        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS pulse.reporters (
                id BIGSERIAL PRIMARY KEY,
                display_name VARCHAR(255) NOT NULL,
                reputation_score BIGINT NOT NULL DEFAULT 0 CHECK (reputation_score >= 0),
                reputation_level VARCHAR(20) NOT NULL DEFAULT 'NEW',
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
        "#)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create reporters table: {}", e))?;

        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS pulse.verification_votes (
                id BIGSERIAL PRIMARY KEY,
                station_id BIGINT NOT NULL REFERENCES pulse.stations(id),
                reporter_id BIGINT NOT NULL REFERENCES pulse.reporters(id),
                value VARCHAR(20) NOT NULL,
                cast_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
        "#)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create verification_votes table: {}", e))?;

        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS pulse.issue_reports (
                id BIGSERIAL PRIMARY KEY,
                station_id BIGINT NOT NULL REFERENCES pulse.stations(id),
                reporter_id BIGINT NOT NULL REFERENCES pulse.reporters(id),
                reason VARCHAR(100) NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'pending',
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                resolved_at TIMESTAMP WITH TIME ZONE
            )
        "#)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create issue_reports table: {}", e))?;

        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS pulse.reputation_events (
                id BIGSERIAL PRIMARY KEY,
                reporter_id BIGINT NOT NULL REFERENCES pulse.reporters(id),
                event_type VARCHAR(50) NOT NULL,
                station_scope BIGINT,
                reason_scope VARCHAR(100),
                delta BIGINT NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
        "#)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create reputation_events table: {}", e))?;

        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_votes_station_cast ON pulse.verification_votes(station_id, cast_at)",
            "CREATE INDEX IF NOT EXISTS idx_votes_reporter_cast ON pulse.verification_votes(reporter_id, cast_at)",
            "CREATE INDEX IF NOT EXISTS idx_reports_station_reason ON pulse.issue_reports(station_id, reason, created_at)",
            "CREATE INDEX IF NOT EXISTS idx_events_key ON pulse.reputation_events(reporter_id, event_type, created_at)",
            "CREATE INDEX IF NOT EXISTS idx_events_created ON pulse.reputation_events(created_at)",
        ];
        for statement in indexes {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| format!("Failed to create index: {}", e))?;
        }

        info!("Database schema initialized");
        Ok(())
    }

    pub fn stations(&self) -> &StationRepository {
        &self.stations
    }

    pub fn reporters(&self) -> &ReporterRepository {
        &self.reporters
    }

    pub fn votes(&self) -> &VoteRepository {
        &self.votes
    }

    pub fn reports(&self) -> &ReportRepository {
        &self.reports
    }

    pub fn ledger(&self) -> &LedgerRepository {
        &self.ledger
    }
}
