//! Append-only per-category log of proportional APR changes.
//!
//! Every category's log holds at least one entry: a zero-reduction anchor
//! written when the contract is constructed. Entries are appended at the
//! ledger's current timestamp, so insertion order is chronological order and
//! the log can be binary-searched by timestamp.

use soroban_sdk::{contracttype, symbol_short, Env, Symbol, Vec};

use common::ttl::extend_persistent;

use crate::accrual::APR_SCALE;
use crate::category::{self, ContType};
use crate::ContractError;

const APR_LOG: Symbol = symbol_short!("APR_LOG");

/// One scheduled change to a category's APR.
///
/// `reduction` is a fixed-point percentage out of [`APR_SCALE`]; a negative
/// value raises the rate.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RateChange {
    pub timestamp: u64,
    pub reduction: i128,
}

fn log_key(cont_type: ContType) -> (Symbol, ContType) {
    (APR_LOG, cont_type)
}

pub fn load(env: &Env, cont_type: ContType) -> Result<Vec<RateChange>, ContractError> {
    let key = log_key(cont_type);
    let log: Vec<RateChange> = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(ContractError::NotInitialized)?;
    extend_persistent(env, &key);
    Ok(log)
}

fn store(env: &Env, cont_type: ContType, log: &Vec<RateChange>) {
    let key = log_key(cont_type);
    env.storage().persistent().set(&key, log);
    extend_persistent(env, &key);
}

/// Seeds a category's log with its zero-reduction anchor at `now`.
pub fn init(env: &Env, cont_type: ContType, now: u64) {
    let mut log = Vec::new(env);
    log.push_back(RateChange {
        timestamp: now,
        reduction: 0,
    });
    store(env, cont_type, &log);
}

/// Appends a rate change and returns the new log length.
pub fn append(
    env: &Env,
    cont_type: ContType,
    timestamp: u64,
    reduction: i128,
) -> Result<u32, ContractError> {
    if reduction >= APR_SCALE as i128 {
        return Err(ContractError::InvalidReduction);
    }

    let mut log = load(env, cont_type)?;
    if let Some(last) = log.last() {
        if timestamp < last.timestamp {
            return Err(ContractError::InvalidTimeRange);
        }
    }

    log.push_back(RateChange {
        timestamp,
        reduction,
    });
    store(env, cont_type, &log);
    Ok(log.len())
}

/// Pops the newest rate change. The anchor entry can never be removed.
pub fn undo_last(env: &Env, cont_type: ContType) -> Result<RateChange, ContractError> {
    let mut log = load(env, cont_type)?;
    if log.len() <= 1 {
        return Err(ContractError::NothingToUndo);
    }

    let removed = log.pop_back().ok_or(ContractError::NothingToUndo)?;
    store(env, cont_type, &log);
    Ok(removed)
}

/// Collapses the log back to a single zero entry at its original anchor
/// timestamp and installs `new_base_apr` as the category's base rate.
///
/// Returns the anchor timestamp.
pub fn reset(env: &Env, cont_type: ContType, new_base_apr: u128) -> Result<u64, ContractError> {
    let log = load(env, cont_type)?;
    let anchor = log.first().ok_or(ContractError::NotInitialized)?.timestamp;
    let mut config = category::load(env, cont_type)?;

    let mut fresh = Vec::new(env);
    fresh.push_back(RateChange {
        timestamp: anchor,
        reduction: 0,
    });
    config.base_apr = new_base_apr;

    store(env, cont_type, &fresh);
    category::store(env, cont_type, &config);
    Ok(anchor)
}

/// Lower-bound search: the smallest index whose entry is at or after
/// `timestamp`, or `log.len()` when every entry is earlier.
pub fn first_index_at_or_after(log: &Vec<RateChange>, timestamp: u64) -> u32 {
    let mut lo = 0u32;
    let mut hi = log.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if log.get_unchecked(mid).timestamp < timestamp {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}
