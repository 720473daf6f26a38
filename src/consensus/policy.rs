//! Station status transitions driven by votes.
//!
//! Evaluated synchronously for every vote, in priority order:
//! 1. A `Trusted` reporter's vote is authoritative on its own.
//! 2. Otherwise the crowd needs a strict leader with enough supporters.
//!
//! Ties and thin tallies leave the status unchanged. `Maintenance` is never a
//! target.

use serde::{Deserialize, Serialize};

use crate::consensus::ConsensusTally;
use crate::models::{ReputationLevel, StationStatus, VoteValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    TrustedOverride,
    Consensus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub from: StationStatus,
    pub to: StationStatus,
    pub cause: TransitionCause,
}

#[derive(Debug, Clone, Copy)]
pub struct StatusPolicy {
    /// Votes a crowd leader needs before the status flips
    pub transition_min_votes: usize,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            transition_min_votes: 3,
        }
    }
}

impl StatusPolicy {
    pub fn new(transition_min_votes: usize) -> Self {
        Self {
            transition_min_votes,
        }
    }

    /// Decide the transition for a vote just cast by a reporter at `level`.
    ///
    /// `tally` is only consulted when the reporter is not trusted.
    pub fn decide(
        &self,
        current: StationStatus,
        level: ReputationLevel,
        vote: VoteValue,
        tally: &ConsensusTally,
    ) -> Option<StatusTransition> {
        let (target, cause) = if level.is_trusted() {
            (Self::target_for(vote)?, TransitionCause::TrustedOverride)
        } else {
            let dominant = tally.dominant(self.transition_min_votes)?;
            (Self::target_for(dominant)?, TransitionCause::Consensus)
        };

        (target != current).then_some(StatusTransition {
            from: current,
            to: target,
            cause,
        })
    }

    fn target_for(value: VoteValue) -> Option<StationStatus> {
        match value {
            VoteValue::Working => Some(StationStatus::Operational),
            VoteValue::NotWorking => Some(StationStatus::Offline),
            VoteValue::Busy => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VerificationVote;
    use chrono::Utc;

    fn tally(values: &[VoteValue]) -> ConsensusTally {
        let now = Utc::now();
        let votes: Vec<VerificationVote> = values
            .iter()
            .enumerate()
            .map(|(i, value)| VerificationVote {
                id: i as i64,
                station_id: 1,
                reporter_id: i as i64,
                value: *value,
                cast_at: now,
            })
            .collect();
        ConsensusTally::from_votes(1, &votes)
    }

    #[test]
    fn test_trusted_working_overrides_crowd() {
        use VoteValue::*;
        let policy = StatusPolicy::default();
        let crowd = tally(&[NotWorking, NotWorking, NotWorking, NotWorking, NotWorking, Working]);

        let transition = policy
            .decide(StationStatus::Offline, ReputationLevel::Trusted, Working, &crowd)
            .unwrap();
        assert_eq!(transition.to, StationStatus::Operational);
        assert_eq!(transition.cause, TransitionCause::TrustedOverride);
    }

    #[test]
    fn test_trusted_noop_and_busy() {
        use VoteValue::*;
        let policy = StatusPolicy::default();
        let empty = ConsensusTally::empty(1);

        assert_eq!(
            policy.decide(StationStatus::Operational, ReputationLevel::Trusted, Working, &empty),
            None
        );
        assert_eq!(
            policy.decide(StationStatus::Operational, ReputationLevel::Trusted, Busy, &empty),
            None
        );
        assert_eq!(
            policy
                .decide(StationStatus::Operational, ReputationLevel::Trusted, NotWorking, &empty)
                .map(|t| t.to),
            Some(StationStatus::Offline)
        );
    }

    #[test]
    fn test_crowd_needs_three_and_strict_lead() {
        use VoteValue::*;
        let policy = StatusPolicy::default();

        let two = tally(&[NotWorking, NotWorking]);
        assert_eq!(
            policy.decide(StationStatus::Operational, ReputationLevel::New, NotWorking, &two),
            None
        );

        let three = tally(&[NotWorking, NotWorking, NotWorking]);
        let transition = policy
            .decide(StationStatus::Operational, ReputationLevel::Normal, NotWorking, &three)
            .unwrap();
        assert_eq!(transition.to, StationStatus::Offline);
        assert_eq!(transition.cause, TransitionCause::Consensus);

        let tied = tally(&[NotWorking, NotWorking, NotWorking, Working, Working, Working]);
        assert_eq!(
            policy.decide(StationStatus::Operational, ReputationLevel::New, NotWorking, &tied),
            None
        );
    }

    #[test]
    fn test_crowd_uses_tally_not_own_vote() {
        use VoteValue::*;
        let policy = StatusPolicy::default();
        let crowd = tally(&[Working, Working, Working, Busy]);

        let transition = policy
            .decide(StationStatus::Offline, ReputationLevel::New, Busy, &crowd)
            .unwrap();
        assert_eq!(transition.to, StationStatus::Operational);
    }

    #[test]
    fn test_busy_majority_changes_nothing() {
        use VoteValue::*;
        let policy = StatusPolicy::default();
        let crowd = tally(&[Busy, Busy, Busy]);
        assert_eq!(policy.decide(StationStatus::Offline, ReputationLevel::New, Busy, &crowd), None);
    }
}
