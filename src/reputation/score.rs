//! Reputation Score Arithmetic and Rules
//!
//! A reporter's score starts at 0, moves by ledger deltas and never drops
//! below zero. The level is recomputed from the clamped score on every update.
//! Rules hold the deltas, windows and support thresholds of each trigger.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::models::{Reporter, ReputationLevel};

/// Snapshot of a reporter's reputation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationScore {
    pub reporter_id: i64,
    pub score: i64,
    pub level: ReputationLevel,
}

impl From<&Reporter> for ReputationScore {
    fn from(reporter: &Reporter) -> Self {
        Self {
            reporter_id: reporter.id,
            score: reporter.reputation_score,
            level: reporter.reputation_level,
        }
    }
}

/// Result of applying one delta to a score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub previous_score: i64,
    pub score: i64,
    pub level: ReputationLevel,
}

/// `max(0, score + delta)` with the level recomputed from the result
pub fn apply_delta(score: i64, delta: i64) -> ScoreUpdate {
    let next = score.saturating_add(delta).max(0);
    ScoreUpdate {
        previous_score: score,
        score: next,
        level: ReputationLevel::from_score(next),
    }
}

/// Trigger parameters for the reputation ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationRules {
    /// Points for agreeing with a settled consensus
    pub verification_reward: i64,
    pub verification_window_minutes: i64,
    /// Votes the leading value needs before agreement is rewarded
    pub verification_min_support: usize,

    /// Points (negative) for repeatedly contradicting consensus
    pub contradiction_penalty: i64,
    pub contradiction_window_hours: i64,
    /// How long after a vote the follow-up consensus is looked for
    pub contradiction_followup_minutes: i64,
    /// Votes the opposing consensus needs to count as a contradiction
    pub contradiction_min_support: usize,
    /// Contradictions within the window before the penalty applies
    pub contradiction_threshold: usize,

    /// Points for each corroborated issue report
    pub report_reward: i64,
    pub report_window_hours: i64,
    /// Reports with the same station and reason needed for the reward
    pub report_min_count: usize,
}

impl ReputationRules {
    pub fn verification_window(&self) -> Duration {
        Duration::minutes(self.verification_window_minutes)
    }

    pub fn contradiction_window(&self) -> Duration {
        Duration::hours(self.contradiction_window_hours)
    }

    pub fn contradiction_followup(&self) -> Duration {
        Duration::minutes(self.contradiction_followup_minutes)
    }

    pub fn report_window(&self) -> Duration {
        Duration::hours(self.report_window_hours)
    }

    /// Longest window any ledger event is deduplicated over
    pub fn longest_window(&self) -> Duration {
        self.verification_window()
            .max(self.contradiction_window())
            .max(self.report_window())
    }
}

impl Default for ReputationRules {
    fn default() -> Self {
        Self {
            verification_reward: 1,
            verification_window_minutes: 30,
            verification_min_support: 3,
            contradiction_penalty: -1,
            contradiction_window_hours: 24,
            contradiction_followup_minutes: 30,
            contradiction_min_support: 3,
            contradiction_threshold: 3,
            report_reward: 2,
            report_window_hours: 24,
            report_min_count: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_delta_clamps_at_zero() {
        let update = apply_delta(0, -1);
        assert_eq!(update.score, 0);
        assert_eq!(update.level, ReputationLevel::New);

        let update = apply_delta(1, -5);
        assert_eq!(update.previous_score, 1);
        assert_eq!(update.score, 0);
    }

    #[test]
    fn test_apply_delta_relevels() {
        assert_eq!(apply_delta(4, 1).level, ReputationLevel::Normal);
        assert_eq!(apply_delta(9, 2).level, ReputationLevel::Trusted);
        assert_eq!(apply_delta(10, -1).level, ReputationLevel::Normal);
    }

    #[test]
    fn test_longest_window() {
        let rules = ReputationRules::default();
        assert_eq!(rules.longest_window(), Duration::hours(24));
    }
}
