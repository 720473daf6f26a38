use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::{PulseError, PulseResult};
use crate::reputation::ReputationRules;

/// Configuration for the ChargePulse inference daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Consensus window and status policy
    pub consensus: ConsensusConfig,
    /// Reputation trigger rules
    pub reputation: ReputationConfig,
    /// Station confidence feature
    pub confidence: ConfidenceConfig,
    /// Ledger retention sweep
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub postgres_url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Trailing window a station summary covers
    pub window_minutes: i64,
    /// Votes the leading value needs before a non-trusted vote moves a station
    pub transition_min_votes: usize,
    /// How far back the verification history looks
    pub history_hours: i64,
    pub history_limit: usize,
}

/// Configuration for the reputation ledger triggers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationConfig {
    pub verification_reward: i64,
    pub verification_window_minutes: i64,
    pub verification_min_support: usize,
    pub contradiction_penalty: i64,
    pub contradiction_window_hours: i64,
    pub contradiction_followup_minutes: i64,
    pub contradiction_min_support: usize,
    pub contradiction_threshold: usize,
    pub report_reward: i64,
    pub report_window_hours: i64,
    pub report_min_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    /// Station confidence estimates are unavailable while this is off
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Days reputation events are kept; 0 keeps them forever
    pub event_retention_days: i64,
    pub sweep_interval_secs: u64,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self::from(&ReputationRules::default())
    }
}

impl From<&ReputationRules> for ReputationConfig {
    fn from(rules: &ReputationRules) -> Self {
        Self {
            verification_reward: rules.verification_reward,
            verification_window_minutes: rules.verification_window_minutes,
            verification_min_support: rules.verification_min_support,
            contradiction_penalty: rules.contradiction_penalty,
            contradiction_window_hours: rules.contradiction_window_hours,
            contradiction_followup_minutes: rules.contradiction_followup_minutes,
            contradiction_min_support: rules.contradiction_min_support,
            contradiction_threshold: rules.contradiction_threshold,
            report_reward: rules.report_reward,
            report_window_hours: rules.report_window_hours,
            report_min_count: rules.report_min_count,
        }
    }
}

impl ReputationConfig {
    /// Convert to ReputationRules for use by ReputationTriggers
    pub fn to_rules(&self) -> ReputationRules {
        ReputationRules {
            verification_reward: self.verification_reward,
            verification_window_minutes: self.verification_window_minutes,
            verification_min_support: self.verification_min_support,
            contradiction_penalty: self.contradiction_penalty,
            contradiction_window_hours: self.contradiction_window_hours,
            contradiction_followup_minutes: self.contradiction_followup_minutes,
            contradiction_min_support: self.contradiction_min_support,
            contradiction_threshold: self.contradiction_threshold,
            report_reward: self.report_reward,
            report_window_hours: self.report_window_hours,
            report_min_count: self.report_min_count,
        }
    }
}

impl ConsensusConfig {
    pub fn window(&self) -> Duration {
        Duration::minutes(self.window_minutes)
    }

    pub fn history_window(&self) -> Duration {
        Duration::hours(self.history_hours)
    }
}

impl RetentionConfig {
    pub fn is_enabled(&self) -> bool {
        self.event_retention_days > 0
    }

    pub fn retention(&self) -> Duration {
        Duration::days(self.event_retention_days)
    }
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            database: DatabaseConfig {
                postgres_url: String::new(), // Must be set via environment
                max_connections: 10,
            },
            consensus: ConsensusConfig {
                window_minutes: 30,
                transition_min_votes: 3,
                history_hours: 24,
                history_limit: 50,
            },
            reputation: ReputationConfig::default(),
            confidence: ConfidenceConfig { enabled: false },
            retention: RetentionConfig {
                event_retention_days: 0,
                sweep_interval_secs: 3600,
            },
        }
    }
}

impl PulseConfig {
    /// Load configuration from `CHARGEPULSE_*` environment variables and validate it
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Logging configuration
        if let Some(level) = lookup("CHARGEPULSE_LOG_LEVEL") {
            config.logging.level = level;
        }

        // Database configuration
        if let Some(url) = lookup("CHARGEPULSE_POSTGRES_URL") {
            config.database.postgres_url = url;
        }
        set_parsed(
            &lookup,
            "CHARGEPULSE_POSTGRES_MAX_CONNECTIONS",
            &mut config.database.max_connections,
        )?;

        // Consensus configuration
        set_parsed(
            &lookup,
            "CHARGEPULSE_CONSENSUS_WINDOW_MINUTES",
            &mut config.consensus.window_minutes,
        )?;
        set_parsed(
            &lookup,
            "CHARGEPULSE_TRANSITION_MIN_VOTES",
            &mut config.consensus.transition_min_votes,
        )?;
        set_parsed(&lookup, "CHARGEPULSE_HISTORY_HOURS", &mut config.consensus.history_hours)?;
        set_parsed(&lookup, "CHARGEPULSE_HISTORY_LIMIT", &mut config.consensus.history_limit)?;

        // Reputation configuration
        let reputation = &mut config.reputation;
        set_parsed(
            &lookup,
            "CHARGEPULSE_VERIFICATION_REWARD",
            &mut reputation.verification_reward,
        )?;
        set_parsed(
            &lookup,
            "CHARGEPULSE_VERIFICATION_WINDOW_MINUTES",
            &mut reputation.verification_window_minutes,
        )?;
        set_parsed(
            &lookup,
            "CHARGEPULSE_VERIFICATION_MIN_SUPPORT",
            &mut reputation.verification_min_support,
        )?;
        set_parsed(
            &lookup,
            "CHARGEPULSE_CONTRADICTION_PENALTY",
            &mut reputation.contradiction_penalty,
        )?;
        set_parsed(
            &lookup,
            "CHARGEPULSE_CONTRADICTION_WINDOW_HOURS",
            &mut reputation.contradiction_window_hours,
        )?;
        set_parsed(
            &lookup,
            "CHARGEPULSE_CONTRADICTION_FOLLOWUP_MINUTES",
            &mut reputation.contradiction_followup_minutes,
        )?;
        set_parsed(
            &lookup,
            "CHARGEPULSE_CONTRADICTION_MIN_SUPPORT",
            &mut reputation.contradiction_min_support,
        )?;
        set_parsed(
            &lookup,
            "CHARGEPULSE_CONTRADICTION_THRESHOLD",
            &mut reputation.contradiction_threshold,
        )?;
        set_parsed(&lookup, "CHARGEPULSE_REPORT_REWARD", &mut reputation.report_reward)?;
        set_parsed(
            &lookup,
            "CHARGEPULSE_REPORT_WINDOW_HOURS",
            &mut reputation.report_window_hours,
        )?;
        set_parsed(&lookup, "CHARGEPULSE_REPORT_MIN_COUNT", &mut reputation.report_min_count)?;

        // Feature flags
        set_parsed(&lookup, "CHARGEPULSE_CONFIDENCE_ENABLED", &mut config.confidence.enabled)?;

        // Retention
        set_parsed(
            &lookup,
            "CHARGEPULSE_EVENT_RETENTION_DAYS",
            &mut config.retention.event_retention_days,
        )?;
        set_parsed(
            &lookup,
            "CHARGEPULSE_RETENTION_SWEEP_INTERVAL_SECS",
            &mut config.retention.sweep_interval_secs,
        )?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration for consistency
    pub fn validate(&self) -> PulseResult<()> {
        const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
        if !LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(PulseError::InvalidConfig(format!(
                "Unknown log level: {}",
                self.logging.level
            )));
        }

        if self.database.max_connections == 0 {
            return Err(PulseError::InvalidConfig(
                "PostgreSQL max connections must be non-zero".to_string(),
            ));
        }

        if self.consensus.window_minutes <= 0 || self.consensus.history_hours <= 0 {
            return Err(PulseError::InvalidConfig(
                "Consensus and history windows must be positive".to_string(),
            ));
        }

        if self.consensus.transition_min_votes == 0 || self.consensus.history_limit == 0 {
            return Err(PulseError::InvalidConfig(
                "Transition minimum votes and history limit must be non-zero".to_string(),
            ));
        }

        let rules = &self.reputation;
        if rules.verification_reward <= 0 || rules.report_reward <= 0 {
            return Err(PulseError::InvalidConfig(
                "Reputation rewards must be positive".to_string(),
            ));
        }

        if rules.contradiction_penalty >= 0 {
            return Err(PulseError::InvalidConfig(
                "Contradiction penalty must be negative".to_string(),
            ));
        }

        if rules.verification_window_minutes <= 0
            || rules.contradiction_window_hours <= 0
            || rules.contradiction_followup_minutes <= 0
            || rules.report_window_hours <= 0
        {
            return Err(PulseError::InvalidConfig(
                "Reputation windows must be positive".to_string(),
            ));
        }

        if rules.verification_min_support == 0
            || rules.contradiction_min_support == 0
            || rules.contradiction_threshold == 0
            || rules.report_min_count == 0
        {
            return Err(PulseError::InvalidConfig(
                "Reputation thresholds must be non-zero".to_string(),
            ));
        }

        if self.retention.event_retention_days < 0 {
            return Err(PulseError::InvalidConfig(
                "Event retention days cannot be negative".to_string(),
            ));
        }

        // Pruning inside a dedup window would let the same award apply twice
        if self.retention.is_enabled() {
            let longest = rules.to_rules().longest_window();
            if self.retention.retention() < longest {
                return Err(PulseError::InvalidConfig(format!(
                    "Event retention of {} days is shorter than the longest ledger window ({} hours)",
                    self.retention.event_retention_days,
                    longest.num_hours()
                )));
            }

            if self.retention.sweep_interval_secs == 0 {
                return Err(PulseError::InvalidConfig(
                    "Retention sweep interval must be non-zero".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn set_parsed<F, T>(lookup: &F, key: &str, target: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {} value", key))?;
    }
    Ok(())
}
