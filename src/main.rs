use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::{Level, error, info};

use chargepulse::{DatabasePool, PulseConfig, VerificationService};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first - this validates every rule and window
    let config = PulseConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {:#}", e);
        eprintln!("Please check CHARGEPULSE_* environment variables.");
        e
    })?;

    init_logging(&config)?;

    info!("Starting ChargePulse verification daemon");

    if config.database.postgres_url.is_empty() {
        return Err(anyhow::anyhow!(
            "CHARGEPULSE_POSTGRES_URL environment variable is required"
        ));
    }

    let pool = DatabasePool::new(&config.database.postgres_url, config.database.max_connections)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to open database pool")?;
    pool.init_schema()
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to initialize database schema")?;

    let service = Arc::new(VerificationService::from_config(Arc::new(pool), &config));
    info!(
        window_minutes = config.consensus.window_minutes,
        transition_min_votes = config.consensus.transition_min_votes,
        confidence_enabled = config.confidence.enabled,
        "Verification service initialized"
    );

    if config.retention.is_enabled() {
        info!(
            retention_days = config.retention.event_retention_days,
            sweep_interval_secs = config.retention.sweep_interval_secs,
            "Reputation event retention enabled"
        );
        tokio::select! {
            _ = run_retention_sweep(service, &config) => {}
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for shutdown signal")?;
            }
        }
    } else {
        info!("Reputation event retention disabled, events are kept forever");
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for shutdown signal")?;
    }

    info!("Shutting down");
    Ok(())
}

/// Prune expired reputation events on a fixed interval
async fn run_retention_sweep(
    service: Arc<VerificationService<DatabasePool>>,
    config: &PulseConfig,
) {
    let retention = config.retention.retention();
    let mut interval =
        tokio::time::interval(StdDuration::from_secs(config.retention.sweep_interval_secs));

    loop {
        interval.tick().await;
        match service.prune_reputation_events(Utc::now(), retention).await {
            Ok(removed) => info!(removed, "Retention sweep complete"),
            Err(e) => error!(error = %e, "Retention sweep failed"),
        }
    }
}

fn init_logging(config: &PulseConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
