use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{VerificationVote, VoteValue};

/// Top count at which a station counts as verified
pub const VERIFIED_MIN_VOTES: usize = 2;
/// Top count at which a station counts as strongly verified
pub const STRONG_VERIFIED_MIN_VOTES: usize = 3;

/// Vote counts for one station over one window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusTally {
    pub station_id: i64,
    pub working: usize,
    pub not_working: usize,
    pub busy: usize,
    pub total_votes: usize,
    /// Value with strictly the highest count; `None` on a tie or with no votes
    pub leading_value: Option<VoteValue>,
    pub is_verified: bool,
    pub is_strong_verified: bool,
    pub last_verified_at: Option<DateTime<Utc>>,
}

impl ConsensusTally {
    pub fn empty(station_id: i64) -> Self {
        Self::from_votes(station_id, &[])
    }

    pub fn from_votes(station_id: i64, votes: &[VerificationVote]) -> Self {
        let mut working = 0;
        let mut not_working = 0;
        let mut busy = 0;
        let mut last_verified_at: Option<DateTime<Utc>> = None;

        for vote in votes {
            match vote.value {
                VoteValue::Working => working += 1,
                VoteValue::NotWorking => not_working += 1,
                VoteValue::Busy => busy += 1,
            }
            if last_verified_at.map_or(true, |last| vote.cast_at > last) {
                last_verified_at = Some(vote.cast_at);
            }
        }

        let max_count = working.max(not_working).max(busy);
        let leaders: Vec<VoteValue> = VoteValue::ALL
            .into_iter()
            .filter(|value| match value {
                VoteValue::Working => working == max_count,
                VoteValue::NotWorking => not_working == max_count,
                VoteValue::Busy => busy == max_count,
            })
            .collect();
        let leading_value = match leaders.as_slice() {
            [only] if max_count > 0 => Some(*only),
            _ => None,
        };

        Self {
            station_id,
            working,
            not_working,
            busy,
            total_votes: working + not_working + busy,
            leading_value,
            is_verified: max_count >= VERIFIED_MIN_VOTES,
            is_strong_verified: max_count >= STRONG_VERIFIED_MIN_VOTES,
            last_verified_at,
        }
    }

    pub fn count(&self, value: VoteValue) -> usize {
        match value {
            VoteValue::Working => self.working,
            VoteValue::NotWorking => self.not_working,
            VoteValue::Busy => self.busy,
        }
    }

    /// Leading value, if it also has at least `min_votes` supporters
    pub fn dominant(&self, min_votes: usize) -> Option<VoteValue> {
        self.leading_value
            .filter(|value| self.count(*value) >= min_votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn votes(values: &[VoteValue]) -> Vec<VerificationVote> {
        let start = Utc::now() - Duration::minutes(20);
        values
            .iter()
            .enumerate()
            .map(|(i, value)| VerificationVote {
                id: i as i64 + 1,
                station_id: 9,
                reporter_id: i as i64 + 100,
                value: *value,
                cast_at: start + Duration::minutes(i as i64),
            })
            .collect()
    }

    #[test]
    fn test_empty_tally() {
        let tally = ConsensusTally::empty(9);
        assert_eq!(tally.total_votes, 0);
        assert_eq!(tally.leading_value, None);
        assert!(!tally.is_verified);
        assert_eq!(tally.last_verified_at, None);
    }

    #[test]
    fn test_strict_leader() {
        use VoteValue::*;
        let tally =
            ConsensusTally::from_votes(9, &votes(&[NotWorking, Working, NotWorking, NotWorking]));
        assert_eq!(tally.not_working, 3);
        assert_eq!(tally.working, 1);
        assert_eq!(tally.total_votes, 4);
        assert_eq!(tally.leading_value, Some(NotWorking));
        assert!(tally.is_verified);
        assert!(tally.is_strong_verified);
        assert_eq!(tally.dominant(3), Some(NotWorking));
    }

    #[test]
    fn test_tie_has_no_leader() {
        use VoteValue::*;
        let tally = ConsensusTally::from_votes(9, &votes(&[Working, Working, Busy, Busy]));
        assert_eq!(tally.leading_value, None);
        assert!(tally.is_verified);
        assert!(!tally.is_strong_verified);
        assert_eq!(tally.dominant(1), None);
    }

    #[test]
    fn test_dominant_needs_support() {
        use VoteValue::*;
        let tally = ConsensusTally::from_votes(9, &votes(&[Working, Working]));
        assert_eq!(tally.leading_value, Some(Working));
        assert_eq!(tally.dominant(3), None);
    }

    #[test]
    fn test_last_verified_at_is_newest_vote() {
        use VoteValue::*;
        let mut list = votes(&[Working, Busy, Working]);
        list.reverse();
        let newest = list.iter().map(|v| v.cast_at).max();
        let tally = ConsensusTally::from_votes(9, &list);
        assert_eq!(tally.last_verified_at, newest);
    }
}
