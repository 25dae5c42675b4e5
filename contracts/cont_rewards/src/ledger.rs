use soroban_sdk::{contracttype, symbol_short, Address, Env, Map, String, Symbol, Vec};

use common::ttl::extend_persistent;
use common::IterableMap;

use crate::accrual::{self, AutoReduce};
use crate::category::{self, ContType};
use crate::rate_history::{self, RateChange};
use crate::ContractError;

const CONTS: Symbol = symbol_short!("CONTS");
const OWNERS: Symbol = symbol_short!("OWNERS");

/// One reward-bearing cont. Its position in the owner's sequence is its
/// index for cash-outs and views.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cont {
    pub name: String,
    pub creation_time: u64,
    /// Moves forward on every cash-out; rewards accrue from here.
    pub last_update_time: u64,
    pub initial_apr: u128,
    pub buy_price: i128,
    pub cont_type: ContType,
}

fn conts_key(owner: &Address) -> (Symbol, Address) {
    (CONTS, owner.clone())
}

/// Registry of every address that has been issued a cont, with its count.
pub fn owners() -> IterableMap {
    IterableMap::new(OWNERS)
}

pub fn load_conts(env: &Env, owner: &Address) -> Vec<Cont> {
    let key = conts_key(owner);
    match env.storage().persistent().get(&key) {
        Some(conts) => {
            extend_persistent(env, &key);
            conts
        }
        None => Vec::new(env),
    }
}

fn store_conts(env: &Env, owner: &Address, conts: &Vec<Cont>) {
    let key = conts_key(owner);
    env.storage().persistent().set(&key, conts);
    extend_persistent(env, &key);
}

pub fn load_cont(env: &Env, owner: &Address, index: u32) -> Result<Cont, ContractError> {
    load_conts(env, owner)
        .get(index)
        .ok_or(ContractError::IndexOutOfRange)
}

/// A cont may be cashed out once `timeout` seconds have passed since its
/// last settlement.
pub fn is_claimable(last_update_time: u64, now: u64, timeout: u64) -> bool {
    now.saturating_sub(last_update_time) >= timeout
}

/// The latest settlement time across `conts`; gates a bulk cash-out.
pub fn latest_update(conts: &Vec<Cont>) -> Option<u64> {
    conts.iter().map(|c| c.last_update_time).max()
}

/// Issues one cont per name to `owner` and returns the owner's new count.
pub fn create(
    env: &Env,
    owner: &Address,
    names: &Vec<String>,
    cont_type: ContType,
    now: u64,
) -> Result<u32, ContractError> {
    if names.is_empty() {
        return Err(ContractError::InvalidInput);
    }

    let mut config = category::load(env, cont_type)?;
    let log = rate_history::load(env, cont_type)?;
    let apr = accrual::new_cont_apr(env, config.base_apr, &log, now)?;

    let mut conts = load_conts(env, owner);
    for name in names.iter() {
        conts.push_back(Cont {
            name,
            creation_time: now,
            last_update_time: now,
            initial_apr: apr,
            buy_price: config.price,
            cont_type,
        });
    }
    config.created = config
        .created
        .checked_add(names.len() as u64)
        .ok_or(ContractError::ArithmeticOverflow)?;

    store_conts(env, owner, &conts);
    category::store(env, cont_type, &config);
    owners().set(env, owner, conts.len());
    Ok(conts.len())
}

/// Rate histories loaded once per call and shared by every cont of the
/// same category.
struct Histories<'a> {
    env: &'a Env,
    logs: Map<ContType, Vec<RateChange>>,
}

impl<'a> Histories<'a> {
    fn new(env: &'a Env) -> Self {
        Self {
            env,
            logs: Map::new(env),
        }
    }

    fn get(&mut self, cont_type: ContType) -> Result<Vec<RateChange>, ContractError> {
        if let Some(log) = self.logs.get(cont_type) {
            return Ok(log);
        }
        let log = rate_history::load(self.env, cont_type)?;
        self.logs.set(cont_type, log.clone());
        Ok(log)
    }
}

/// Reward `cont` has earned since its last settlement, as of `now`.
pub fn pending_reward(
    env: &Env,
    cont: &Cont,
    auto: &AutoReduce,
    now: u64,
) -> Result<i128, ContractError> {
    let log = rate_history::load(env, cont.cont_type)?;
    accrual::accrued_reward(env, cont, &log, auto, cont.last_update_time, now)
}

/// Pending reward of every cont `owner` holds, in index order.
pub fn pending_rewards(
    env: &Env,
    owner: &Address,
    auto: &AutoReduce,
    now: u64,
) -> Result<Vec<i128>, ContractError> {
    let mut histories = Histories::new(env);
    let mut rewards = Vec::new(env);
    for cont in load_conts(env, owner).iter() {
        let log = histories.get(cont.cont_type)?;
        rewards.push_back(accrual::accrued_reward(
            env,
            &cont,
            &log,
            auto,
            cont.last_update_time,
            now,
        )?);
    }
    Ok(rewards)
}

/// Current APR of `cont` as of `now`.
pub fn current_apr(
    env: &Env,
    cont: &Cont,
    auto: &AutoReduce,
    now: u64,
) -> Result<u128, ContractError> {
    let log = rate_history::load(env, cont.cont_type)?;
    accrual::rate_at(env, cont, &log, auto, now)
}

/// Current APR of every cont `owner` holds, in index order.
pub fn current_aprs(
    env: &Env,
    owner: &Address,
    auto: &AutoReduce,
    now: u64,
) -> Result<Vec<u128>, ContractError> {
    let mut histories = Histories::new(env);
    let mut aprs = Vec::new(env);
    for cont in load_conts(env, owner).iter() {
        let log = histories.get(cont.cont_type)?;
        aprs.push_back(accrual::rate_at(env, &cont, &log, auto, now)?);
    }
    Ok(aprs)
}

/// Settles the cont at `index`, returning the reward paid out.
pub fn settle_one(
    env: &Env,
    owner: &Address,
    index: u32,
    auto: &AutoReduce,
    timeout: u64,
    now: u64,
) -> Result<i128, ContractError> {
    let mut conts = load_conts(env, owner);
    let mut cont = conts.get(index).ok_or(ContractError::IndexOutOfRange)?;

    if !is_claimable(cont.last_update_time, now, timeout) {
        return Err(ContractError::ClaimTooEarly);
    }

    let reward = pending_reward(env, &cont, auto, now)?;
    cont.last_update_time = now;
    conts.set(index, cont);
    store_conts(env, owner, &conts);
    Ok(reward)
}

/// Settles every cont `owner` holds and returns the total.
///
/// The most recently settled cont decides whether the batch may proceed,
/// so a single fresh cash-out blocks the whole set until it matures.
pub fn settle_all(
    env: &Env,
    owner: &Address,
    auto: &AutoReduce,
    timeout: u64,
    now: u64,
) -> Result<i128, ContractError> {
    let conts = load_conts(env, owner);
    let latest = latest_update(&conts).ok_or(ContractError::NoConts)?;
    if !is_claimable(latest, now, timeout) {
        return Err(ContractError::ClaimTooEarly);
    }

    let mut histories = Histories::new(env);
    let mut total: i128 = 0;
    let mut settled = Vec::new(env);
    for mut cont in conts.iter() {
        let log = histories.get(cont.cont_type)?;
        let reward =
            accrual::accrued_reward(env, &cont, &log, auto, cont.last_update_time, now)?;
        total = total
            .checked_add(reward)
            .ok_or(ContractError::ArithmeticOverflow)?;
        cont.last_update_time = now;
        settled.push_back(cont);
    }

    store_conts(env, owner, &settled);
    Ok(total)
}
