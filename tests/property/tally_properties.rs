use chargepulse::consensus::ConsensusTally;
use chargepulse::{VerificationVote, VoteValue};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

fn vote_value() -> impl Strategy<Value = VoteValue> {
    prop_oneof![
        Just(VoteValue::Working),
        Just(VoteValue::NotWorking),
        Just(VoteValue::Busy),
    ]
}

/// Votes spread over a 30-minute window, one per second at most
fn window_votes() -> impl Strategy<Value = Vec<VerificationVote>> {
    prop::collection::vec((vote_value(), 0i64..1800), 0..60).prop_map(|entries| {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (value, offset))| VerificationVote {
                id: i as i64 + 1,
                station_id: 7,
                reporter_id: i as i64 + 1,
                value,
                cast_at: start + Duration::seconds(offset),
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn counts_sum_to_total(votes in window_votes()) {
        let tally = ConsensusTally::from_votes(7, &votes);
        prop_assert_eq!(tally.working + tally.not_working + tally.busy, tally.total_votes);
        prop_assert_eq!(tally.total_votes, votes.len());
    }

    #[test]
    fn leader_absent_iff_top_two_tie(votes in window_votes()) {
        let tally = ConsensusTally::from_votes(7, &votes);
        let mut counts = [tally.working, tally.not_working, tally.busy];
        counts.sort_unstable_by(|a, b| b.cmp(a));

        prop_assert_eq!(tally.leading_value.is_none(), counts[0] == counts[1]);
        if let Some(leader) = tally.leading_value {
            prop_assert_eq!(tally.count(leader), counts[0]);
        }
    }

    #[test]
    fn dominant_requires_support(votes in window_votes(), min_votes in 1usize..10) {
        let tally = ConsensusTally::from_votes(7, &votes);
        match tally.dominant(min_votes) {
            Some(value) => {
                prop_assert_eq!(Some(value), tally.leading_value);
                prop_assert!(tally.count(value) >= min_votes);
            }
            None => prop_assert!(
                tally.leading_value.map_or(true, |leader| tally.count(leader) < min_votes)
            ),
        }
    }

    #[test]
    fn vote_order_does_not_matter(votes in window_votes()) {
        let forward = ConsensusTally::from_votes(7, &votes);
        let mut reversed_votes = votes.clone();
        reversed_votes.reverse();
        let reversed = ConsensusTally::from_votes(7, &reversed_votes);
        prop_assert_eq!(forward, reversed);
    }

    #[test]
    fn vote_value_parse_is_case_insensitive(value in vote_value(), upper in any::<bool>()) {
        let text = if upper { value.as_str().to_string() } else { value.as_str().to_lowercase() };
        prop_assert_eq!(text.parse::<VoteValue>().unwrap(), value);
    }
}
