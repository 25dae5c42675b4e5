//! Invariants of the lower-bound search over a rate history:
//! - every entry before the returned index is strictly earlier than the query
//! - every entry from the returned index onward is at or after the query

use cont_rewards::rate_history::first_index_at_or_after;
use cont_rewards::RateChange;
use proptest::prelude::*;
use soroban_sdk::{Env, Vec};

fn sorted_log(env: &Env, mut timestamps: std::vec::Vec<u64>) -> Vec<RateChange> {
    timestamps.sort_unstable();
    let mut log = Vec::new(env);
    for timestamp in timestamps {
        log.push_back(RateChange {
            timestamp,
            reduction: 0,
        });
    }
    log
}

proptest! {
    #[test]
    fn prop_search_partitions_log(
        timestamps in prop::collection::vec(0u64..1_000, 0..40),
        query in 0u64..1_100,
    ) {
        let env = Env::default();
        let log = sorted_log(&env, timestamps);
        let index = first_index_at_or_after(&log, query);

        prop_assert!(index <= log.len());
        for i in 0..index {
            prop_assert!(log.get(i).unwrap().timestamp < query);
        }
        for i in index..log.len() {
            prop_assert!(log.get(i).unwrap().timestamp >= query);
        }
    }

    #[test]
    fn prop_search_bounds(timestamps in prop::collection::vec(10u64..1_000, 1..40)) {
        let env = Env::default();
        let log = sorted_log(&env, timestamps);
        let last = log.last().unwrap().timestamp;

        prop_assert_eq!(first_index_at_or_after(&log, 0), 0);
        prop_assert_eq!(first_index_at_or_after(&log, last + 1), log.len());
    }
}
