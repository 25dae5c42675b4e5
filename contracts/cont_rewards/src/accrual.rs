//! Reward accrual over a piecewise-constant APR.
//!
//! A cont's APR changes at two kinds of boundary:
//!
//! * scheduled rate changes from its category's history, and
//! * auto-decay boundaries at `creation_time + k * interval`.
//!
//! Between consecutive boundaries the APR is constant and the reward for the
//! span is `⌊⌊principal * apr / APR_SCALE⌋ * seconds / SECONDS_PER_YEAR⌋`.
//! Every product and quotient is evaluated in 256-bit host integers; the
//! truncation order above is part of the contract and must not change.
//!
//! Nothing in this module touches storage.

use soroban_sdk::{Env, Vec, U256};

use crate::ledger::Cont;
use crate::rate_history::{first_index_at_or_after, RateChange};
use crate::ContractError;

/// Fixed-point scale for APRs and reductions: `100_000_000` is 100 %.
pub const APR_SCALE: u128 = 100_000_000;

/// Length of the reward year.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Default auto-decay period: one Julian year.
pub const DEFAULT_AUTO_REDUCE_INTERVAL: u64 = 31_557_600;

/// Automatic decay applied to every cont once per full `interval` since
/// its creation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AutoReduce {
    pub interval: u64,
    pub rate: i128,
}

/// Applies one proportional change: `rate * (APR_SCALE - reduction) / APR_SCALE`.
pub fn reduce(env: &Env, rate: u128, reduction: i128) -> Result<u128, ContractError> {
    if reduction >= APR_SCALE as i128 {
        return Err(ContractError::InvalidReduction);
    }
    if rate == 0 || reduction == 0 {
        return Ok(rate);
    }

    let factor = (APR_SCALE as i128)
        .checked_sub(reduction)
        .ok_or(ContractError::ArithmeticOverflow)? as u128;

    U256::from_u128(env, rate)
        .mul(&U256::from_u128(env, factor))
        .div(&U256::from_u128(env, APR_SCALE))
        .to_u128()
        .ok_or(ContractError::ArithmeticOverflow)
}

/// APR a cont created at `now` starts with: the category's base APR folded
/// with every rate change strictly before `now`.
pub fn new_cont_apr(
    env: &Env,
    base_apr: u128,
    log: &Vec<RateChange>,
    now: u64,
) -> Result<u128, ContractError> {
    let mut rate = base_apr;
    let end = first_index_at_or_after(log, now);
    for i in 0..end {
        rate = reduce(env, rate, log.get_unchecked(i).reduction)?;
    }
    Ok(rate)
}

/// Instantaneous APR of `cont` at `timestamp`.
///
/// Rate changes in `[creation_time, timestamp)` are folded first, in log
/// order, then the auto-decay is compounded once per full interval elapsed
/// since creation.
pub fn rate_at(
    env: &Env,
    cont: &Cont,
    log: &Vec<RateChange>,
    auto: &AutoReduce,
    timestamp: u64,
) -> Result<u128, ContractError> {
    let mut rate = cont.initial_apr;

    let start = first_index_at_or_after(log, cont.creation_time);
    let end = first_index_at_or_after(log, timestamp);
    for i in start..end {
        if rate == 0 {
            return Ok(0);
        }
        rate = reduce(env, rate, log.get_unchecked(i).reduction)?;
    }

    if auto.interval == 0 || auto.rate == 0 || timestamp <= cont.creation_time {
        return Ok(rate);
    }

    let periods = (timestamp - cont.creation_time) / auto.interval;
    for _ in 0..periods {
        if rate == 0 {
            break;
        }
        rate = reduce(env, rate, auto.rate)?;
    }
    Ok(rate)
}

/// Reward earned by `cont` over `[from, to]`.
///
/// Walks every constant-APR span in order from the cont's creation, so the
/// rate entering `from` is the one an uninterrupted walk reaches and split
/// settlements agree with a single one. Spans before `from` only advance the
/// rate. When an auto-decay boundary and a scheduled change share a
/// timestamp, the auto-decay is applied first and the scheduled change on
/// the next (zero-length) step.
pub fn accrued_reward(
    env: &Env,
    cont: &Cont,
    log: &Vec<RateChange>,
    auto: &AutoReduce,
    from: u64,
    to: u64,
) -> Result<i128, ContractError> {
    if from > to || from < cont.creation_time {
        return Err(ContractError::InvalidTimeRange);
    }
    if from == to {
        return Ok(0);
    }
    if auto.interval == 0 {
        return Err(ContractError::InvalidInput);
    }

    let principal = u128::try_from(cont.buy_price).map_err(|_| ContractError::InvalidInput)?;
    let principal = U256::from_u128(env, principal);
    let scale = U256::from_u128(env, APR_SCALE);
    let year = U256::from_u128(env, SECONDS_PER_YEAR as u128);

    let changes = log.len();
    let mut next_change = first_index_at_or_after(log, cont.creation_time);
    // A zero auto rate never moves the APR, so its boundaries are skipped.
    // `None` also covers a boundary past u64::MAX.
    let mut next_auto = if auto.rate == 0 {
        None
    } else {
        cont.creation_time.checked_add(auto.interval)
    };

    let mut rate = cont.initial_apr;
    let mut total = U256::from_u32(env, 0);
    let mut cursor = cont.creation_time;

    // Once the rate is zero no reduction can lift it again.
    while cursor < to && rate > 0 {
        let change = if next_change < changes {
            Some(log.get_unchecked(next_change))
        } else {
            None
        };

        let mut next = to;
        if let Some(boundary) = next_auto {
            next = next.min(boundary);
        }
        if let Some(change) = &change {
            next = next.min(change.timestamp);
        }

        let start = cursor.max(from);
        if next > start {
            let per_year = principal.mul(&U256::from_u128(env, rate)).div(&scale);
            let span = U256::from_u128(env, (next - start) as u128);
            total = total.add(&per_year.mul(&span).div(&year));
        }

        cursor = next;
        if cursor == to {
            break;
        }

        if next_auto == Some(cursor) {
            rate = reduce(env, rate, auto.rate)?;
            next_auto = cursor.checked_add(auto.interval);
        } else if let Some(change) = change {
            rate = reduce(env, rate, change.reduction)?;
            next_change += 1;
        }
    }

    let total = total.to_u128().ok_or(ContractError::ArithmeticOverflow)?;
    i128::try_from(total).map_err(|_| ContractError::ArithmeticOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::ContType;
    use soroban_sdk::String;

    const TEN_PERCENT: u128 = 10_000_000;
    const YEAR: u64 = SECONDS_PER_YEAR;

    fn cont(env: &Env, created: u64, apr: u128, price: i128) -> Cont {
        Cont {
            name: String::from_str(env, "cont"),
            creation_time: created,
            last_update_time: created,
            initial_apr: apr,
            buy_price: price,
            cont_type: ContType::Bronze,
        }
    }

    fn log_of(env: &Env, changes: &[(u64, i128)]) -> Vec<RateChange> {
        let mut log = Vec::new(env);
        for &(timestamp, reduction) in changes {
            log.push_back(RateChange {
                timestamp,
                reduction,
            });
        }
        log
    }

    fn no_decay() -> AutoReduce {
        AutoReduce {
            interval: YEAR,
            rate: 0,
        }
    }

    #[test]
    fn reduce_applies_proportional_cut() {
        let env = Env::default();
        assert_eq!(reduce(&env, TEN_PERCENT, 10_000_000).unwrap(), 9_000_000);
        assert_eq!(reduce(&env, TEN_PERCENT, 50_000_000).unwrap(), 5_000_000);
    }

    #[test]
    fn reduce_negative_raises_rate() {
        let env = Env::default();
        assert_eq!(reduce(&env, TEN_PERCENT, -10_000_000).unwrap(), 11_000_000);
    }

    #[test]
    fn reduce_truncates() {
        let env = Env::default();
        // 7 * 0.66666667 = 4.66666669
        assert_eq!(reduce(&env, 7, 33_333_333).unwrap(), 4);
    }

    #[test]
    fn reduce_rejects_full_cut() {
        let env = Env::default();
        assert_eq!(
            reduce(&env, TEN_PERCENT, APR_SCALE as i128),
            Err(ContractError::InvalidReduction)
        );
    }

    #[test]
    fn one_year_at_ten_percent() {
        let env = Env::default();
        let c = cont(&env, 1_000, TEN_PERCENT, 1_000_000);
        let log = log_of(&env, &[(0, 0)]);
        let auto = AutoReduce {
            interval: YEAR,
            rate: 0,
        };
        let reward = accrued_reward(&env, &c, &log, &auto, 1_000, 1_000 + YEAR).unwrap();
        assert_eq!(reward, 100_000);
    }

    #[test]
    fn two_years_with_ten_percent_auto_decay() {
        let env = Env::default();
        let c = cont(&env, 1_000, TEN_PERCENT, 1_000_000);
        let log = log_of(&env, &[(0, 0)]);
        let auto = AutoReduce {
            interval: YEAR,
            rate: 10_000_000,
        };
        let reward = accrued_reward(&env, &c, &log, &auto, 1_000, 1_000 + 2 * YEAR).unwrap();
        assert_eq!(reward, 190_000);
        assert_eq!(rate_at(&env, &c, &log, &auto, 1_000 + YEAR).unwrap(), 9_000_000);
        assert_eq!(
            rate_at(&env, &c, &log, &auto, 1_000 + 2 * YEAR).unwrap(),
            8_100_000
        );
    }

    #[test]
    fn empty_window_yields_nothing() {
        let env = Env::default();
        let c = cont(&env, 0, TEN_PERCENT, 1_000_000);
        let log = log_of(&env, &[(0, 0)]);
        assert_eq!(accrued_reward(&env, &c, &log, &no_decay(), 500, 500).unwrap(), 0);
    }

    #[test]
    fn reversed_window_is_rejected() {
        let env = Env::default();
        let c = cont(&env, 0, TEN_PERCENT, 1_000_000);
        let log = log_of(&env, &[(0, 0)]);
        assert_eq!(
            accrued_reward(&env, &c, &log, &no_decay(), 10, 5),
            Err(ContractError::InvalidTimeRange)
        );
    }

    #[test]
    fn window_before_creation_is_rejected() {
        let env = Env::default();
        let c = cont(&env, 100, TEN_PERCENT, 1_000_000);
        let log = log_of(&env, &[(0, 0)]);
        assert_eq!(
            accrued_reward(&env, &c, &log, &no_decay(), 50, 200),
            Err(ContractError::InvalidTimeRange)
        );
    }

    #[test]
    fn scheduled_change_splits_the_window() {
        let env = Env::default();
        let c = cont(&env, 0, TEN_PERCENT, 1_000_000);
        // Halve the rate half-way through the year.
        let half = YEAR / 2;
        let log = log_of(&env, &[(0, 0), (half, 50_000_000)]);
        let reward = accrued_reward(&env, &c, &log, &no_decay(), 0, YEAR).unwrap();
        assert_eq!(reward, 50_000 + 25_000);
        assert_eq!(rate_at(&env, &c, &log, &no_decay(), half).unwrap(), TEN_PERCENT);
        assert_eq!(rate_at(&env, &c, &log, &no_decay(), half + 1).unwrap(), 5_000_000);
    }

    #[test]
    fn changes_before_creation_are_ignored() {
        let env = Env::default();
        let c = cont(&env, 1_000, TEN_PERCENT, 1_000_000);
        let log = log_of(&env, &[(0, 0), (500, 50_000_000)]);
        assert_eq!(rate_at(&env, &c, &log, &no_decay(), 2_000).unwrap(), TEN_PERCENT);
        let reward = accrued_reward(&env, &c, &log, &no_decay(), 1_000, 1_000 + YEAR).unwrap();
        assert_eq!(reward, 100_000);
    }

    #[test]
    fn change_at_window_start_applies_to_whole_window() {
        let env = Env::default();
        let c = cont(&env, 0, TEN_PERCENT, 1_000_000);
        let log = log_of(&env, &[(0, 0), (YEAR, 50_000_000)]);
        let reward = accrued_reward(&env, &c, &log, &no_decay(), YEAR, 2 * YEAR).unwrap();
        assert_eq!(reward, 50_000);
    }

    #[test]
    fn auto_decay_wins_coincident_boundary() {
        let env = Env::default();
        let c = cont(&env, 0, 100_000_000, 1_000_000_000);
        let auto = AutoReduce {
            interval: YEAR,
            rate: 50_000_000,
        };
        let log = log_of(&env, &[(0, 0), (YEAR, 10_000_000)]);

        // Year 1 at 100 %, then both the 50 % decay and 10 % cut take effect.
        let reward = accrued_reward(&env, &c, &log, &auto, 0, 2 * YEAR).unwrap();
        assert_eq!(reward, 1_000_000_000 + 450_000_000);
    }

    #[test]
    fn coincident_boundary_applies_decay_before_cut() {
        let env = Env::default();
        // 5 -> decay 50 % -> 2 -> cut 10 % -> 1, whereas cutting first gives 2.
        let c = cont(&env, 0, 5, 100 * APR_SCALE as i128);
        let auto = AutoReduce {
            interval: YEAR,
            rate: 50_000_000,
        };
        let log = log_of(&env, &[(0, 0), (YEAR, 10_000_000)]);

        let second_year = accrued_reward(&env, &c, &log, &auto, YEAR, 2 * YEAR).unwrap();
        assert_eq!(second_year, 100);
    }

    #[test]
    fn split_settlement_replays_interleaved_boundaries() {
        let env = Env::default();
        // 5 -> decay -> 2 -> cut at 1.5y -> 1 -> decay -> 0.
        let c = cont(&env, 0, 5, 10_000_000_000_000_000);
        let auto = AutoReduce {
            interval: YEAR,
            rate: 50_000_000,
        };
        let log = log_of(&env, &[(0, 0), (YEAR + YEAR / 2, 10_000_000)]);

        let whole = accrued_reward(&env, &c, &log, &auto, 0, 3 * YEAR).unwrap();
        let head = accrued_reward(&env, &c, &log, &auto, 0, 2 * YEAR).unwrap();
        let tail = accrued_reward(&env, &c, &log, &auto, 2 * YEAR, 3 * YEAR).unwrap();
        assert_eq!(whole, 500_000_000 + 100_000_000 + 50_000_000);
        assert_eq!(head, whole);
        assert_eq!(tail, 0);
    }

    #[test]
    fn short_interval_stops_once_rate_is_exhausted() {
        let env = Env::default();
        let c = cont(&env, 0, TEN_PERCENT, 1_000_000_000_000_000);
        let auto = AutoReduce {
            interval: 60,
            rate: 50_000_000,
        };
        let log = log_of(&env, &[(0, 0)]);

        // Roughly 525k boundaries in ten years; the rate is gone after 24.
        let early = accrued_reward(&env, &c, &log, &auto, 0, 3_600).unwrap();
        let long = accrued_reward(&env, &c, &log, &auto, 0, 10 * YEAR).unwrap();
        assert!(early > 0);
        assert_eq!(long, early);
        assert_eq!(rate_at(&env, &c, &log, &auto, 3_600).unwrap(), 0);
    }

    #[test]
    fn zero_auto_rate_skips_decay_boundaries() {
        let env = Env::default();
        let c = cont(&env, 0, TEN_PERCENT, 1_000_000);
        let auto = AutoReduce {
            interval: 1,
            rate: 0,
        };
        let log = log_of(&env, &[(0, 0)]);
        assert_eq!(accrued_reward(&env, &c, &log, &auto, 0, 10 * YEAR).unwrap(), 1_000_000);
    }

    #[test]
    fn zero_rate_accrues_nothing() {
        let env = Env::default();
        let c = cont(&env, 0, 0, 1_000_000);
        let log = log_of(&env, &[(0, 0)]);
        assert_eq!(accrued_reward(&env, &c, &log, &no_decay(), 0, 10 * YEAR).unwrap(), 0);
    }

    #[test]
    fn new_cont_apr_excludes_changes_at_now() {
        let env = Env::default();
        let log = log_of(&env, &[(0, 0), (100, 10_000_000), (200, 10_000_000)]);
        assert_eq!(new_cont_apr(&env, TEN_PERCENT, &log, 150).unwrap(), 9_000_000);
        assert_eq!(new_cont_apr(&env, TEN_PERCENT, &log, 200).unwrap(), 9_000_000);
        assert_eq!(new_cont_apr(&env, TEN_PERCENT, &log, 201).unwrap(), 8_100_000);
    }

    #[test]
    fn huge_principal_overflows_result() {
        let env = Env::default();
        let c = cont(&env, 0, 100 * APR_SCALE, i128::MAX);
        let log = log_of(&env, &[(0, 0)]);
        assert_eq!(
            accrued_reward(&env, &c, &log, &no_decay(), 0, YEAR),
            Err(ContractError::ArithmeticOverflow)
        );
    }
}
