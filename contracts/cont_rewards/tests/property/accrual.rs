//! Invariants of the accrual engine:
//! - a zero-length window earns nothing
//! - without rate changes, inside one decay period, the reward has a closed form
//! - rewards add up across a split at a decay boundary
//! - rewards add up across a split at a scheduled change, whatever came before
//! - with non-negative reductions the APR never rises over time

use cont_rewards::accrual::{accrued_reward, rate_at, AutoReduce};
use cont_rewards::{Cont, ContType, RateChange, APR_SCALE, SECONDS_PER_YEAR};
use proptest::prelude::*;
use soroban_sdk::{Env, String, Vec};

const CREATED: u64 = 1_000_000;

fn cont(env: &Env, apr: u128, price: i128) -> Cont {
    Cont {
        name: String::from_str(env, "prop"),
        creation_time: CREATED,
        last_update_time: CREATED,
        initial_apr: apr,
        buy_price: price,
        cont_type: ContType::Bronze,
    }
}

fn anchor_only(env: &Env) -> Vec<RateChange> {
    let mut log = Vec::new(env);
    log.push_back(RateChange {
        timestamp: 0,
        reduction: 0,
    });
    log
}

fn log_from(env: &Env, mut changes: std::vec::Vec<(u64, i128)>) -> Vec<RateChange> {
    changes.sort_by_key(|c| c.0);
    let mut log = anchor_only(env);
    for (offset, reduction) in changes {
        log.push_back(RateChange {
            timestamp: CREATED + offset,
            reduction,
        });
    }
    log
}

proptest! {
    #[test]
    fn prop_empty_window_earns_nothing(
        apr in 0u128..=APR_SCALE,
        price in 0i128..1_000_000_000_000,
        at in 0u64..100_000_000,
        decay in 0i128..50_000_000,
    ) {
        let env = Env::default();
        let c = cont(&env, apr, price);
        let auto = AutoReduce { interval: SECONDS_PER_YEAR, rate: decay };
        let t = CREATED + at;
        prop_assert_eq!(accrued_reward(&env, &c, &anchor_only(&env), &auto, t, t).unwrap(), 0);
    }

    #[test]
    fn prop_single_period_closed_form(
        apr in 0u128..=APR_SCALE,
        price in 0i128..1_000_000_000_000,
        start in 0u64..SECONDS_PER_YEAR,
        len in 0u64..SECONDS_PER_YEAR,
        decay in 0i128..50_000_000,
    ) {
        let env = Env::default();
        let c = cont(&env, apr, price);
        let auto = AutoReduce { interval: SECONDS_PER_YEAR, rate: decay };
        let from = CREATED + start;
        let to = CREATED + (start + len).min(SECONDS_PER_YEAR);

        let expected = (price as u128 * apr / APR_SCALE) * (to - from) as u128
            / SECONDS_PER_YEAR as u128;
        let reward = accrued_reward(&env, &c, &anchor_only(&env), &auto, from, to).unwrap();
        prop_assert_eq!(reward as u128, expected);
    }

    #[test]
    fn prop_additive_across_decay_boundary(
        apr in 1u128..=APR_SCALE,
        price in 1i128..1_000_000_000_000,
        interval in 1_000u64..10_000_000,
        periods in 1u64..5,
        before in 0u64..=1_000_000,
        after in 0u64..20_000_000,
        decay in 0i128..90_000_000,
    ) {
        let env = Env::default();
        let c = cont(&env, apr, price);
        let auto = AutoReduce { interval, rate: decay };
        let log = anchor_only(&env);

        let mid = CREATED + periods * interval;
        let from = mid - before.min(periods * interval);
        let to = mid + after;

        let whole = accrued_reward(&env, &c, &log, &auto, from, to).unwrap();
        let left = accrued_reward(&env, &c, &log, &auto, from, mid).unwrap();
        let right = accrued_reward(&env, &c, &log, &auto, mid, to).unwrap();
        prop_assert_eq!(whole, left + right);
    }

    #[test]
    fn prop_additive_with_interleaved_changes(
        apr in 1u128..=APR_SCALE,
        price in 1i128..1_000_000_000_000_000,
        changes in prop::collection::vec((0u64..50_000_000, -20_000_000i128..60_000_000), 1..8),
        split in 0usize..8,
        after in 0u64..20_000_000,
        decay in 0i128..60_000_000,
    ) {
        let env = Env::default();
        let c = cont(&env, apr, price);
        let auto = AutoReduce { interval: 7_000_000, rate: decay };

        let mut offsets: std::vec::Vec<u64> = changes.iter().map(|(offset, _)| *offset).collect();
        offsets.sort();
        let mid = CREATED + offsets[split % offsets.len()];
        let log = log_from(&env, changes);
        let to = mid + after;

        let whole = accrued_reward(&env, &c, &log, &auto, CREATED, to).unwrap();
        let left = accrued_reward(&env, &c, &log, &auto, CREATED, mid).unwrap();
        let right = accrued_reward(&env, &c, &log, &auto, mid, to).unwrap();
        prop_assert_eq!(whole, left + right);
    }

    #[test]
    fn prop_rate_never_rises_without_increases(
        apr in 0u128..=APR_SCALE,
        changes in prop::collection::vec((0u64..50_000_000, 0i128..50_000_000), 0..8),
        decay in 0i128..50_000_000,
        t in 0u64..60_000_000,
        dt in 0u64..60_000_000,
    ) {
        let env = Env::default();
        let c = cont(&env, apr, 1);
        let log = log_from(&env, changes);
        let auto = AutoReduce { interval: 10_000_000, rate: decay };

        let earlier = rate_at(&env, &c, &log, &auto, CREATED + t).unwrap();
        let later = rate_at(&env, &c, &log, &auto, CREATED + t + dt).unwrap();
        prop_assert!(later <= earlier);
    }

    #[test]
    fn prop_reward_bounded_by_initial_rate(
        apr in 0u128..=APR_SCALE,
        price in 0i128..1_000_000_000_000,
        changes in prop::collection::vec((0u64..50_000_000, 0i128..50_000_000), 0..8),
        len in 0u64..60_000_000,
    ) {
        let env = Env::default();
        let c = cont(&env, apr, price);
        let log = log_from(&env, changes);
        let auto = AutoReduce { interval: 10_000_000, rate: 5_000_000 };

        let reward = accrued_reward(&env, &c, &log, &auto, CREATED, CREATED + len).unwrap();
        let ceiling = (price as u128 * apr / APR_SCALE) * len as u128 / SECONDS_PER_YEAR as u128;
        prop_assert!(reward as u128 <= ceiling);
    }
}
