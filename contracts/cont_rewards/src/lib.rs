#![no_std]

pub mod accrual;
pub mod category;
pub mod events;
pub mod ledger;
pub mod rate_history;

use soroban_sdk::{
    contract, contractimpl, panic_with_error, symbol_short, Address, Env, String, Symbol, Vec,
};

use common::ttl;

pub use accrual::{AutoReduce, APR_SCALE, DEFAULT_AUTO_REDUCE_INTERVAL, SECONDS_PER_YEAR};
pub use category::{CategoryConfig, CategoryInit, ContType};
pub use ledger::Cont;
pub use rate_history::RateChange;

// ── Storage key constants ────────────────────────────────────────────────────

const ADMIN: Symbol = symbol_short!("ADMIN");
const TOKEN: Symbol = symbol_short!("TOKEN");
const CASHOUT_TIMEOUT: Symbol = symbol_short!("CASH_TO");
const AUTO_INTERVAL: Symbol = symbol_short!("AUTO_INT");
const AUTO_RATE: Symbol = symbol_short!("AUTO_RT");
const TOTAL_CREATED: Symbol = symbol_short!("TOT_CNT");

// ── Contract errors ──────────────────────────────────────────────────────────

#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ContractError {
    NotInitialized = 1,
    Unauthorized = 3,
    InvalidInput = 4,
    IndexOutOfRange = 5,
    NothingToUndo = 6,
    InvalidReduction = 7,
    ClaimTooEarly = 8,
    NoConts = 9,
    ArithmeticOverflow = 10,
    InvalidTimeRange = 11,
}

// ── Contract ─────────────────────────────────────────────────────────────────

#[contract]
pub struct ContRewardsContract;

#[contractimpl]
impl ContRewardsContract {
    // ── Construction ────────────────────────────────────────────────────────

    /// Deploy-time setup.
    ///
    /// * `admin`      – principal allowed to tune prices, rates and timeouts.
    /// * `token`      – the token contract that issues and cashes out conts.
    /// * `categories` – starting price and APR for every [`ContType`], each
    ///                  listed exactly once.
    ///
    /// Every category's rate history is anchored at the deploy timestamp.
    pub fn __constructor(env: Env, admin: Address, token: Address, categories: Vec<CategoryInit>) {
        if categories.len() != ContType::ALL.len() as u32 {
            panic_with_error!(&env, ContractError::InvalidInput);
        }

        let now = env.ledger().timestamp();
        for cont_type in ContType::ALL {
            let mut matching = categories.iter().filter(|c| c.cont_type == cont_type);
            let init = match (matching.next(), matching.next()) {
                (Some(init), None) => init,
                _ => panic_with_error!(&env, ContractError::InvalidInput),
            };
            if init.price < 0 {
                panic_with_error!(&env, ContractError::InvalidInput);
            }

            category::store(
                &env,
                cont_type,
                &CategoryConfig {
                    price: init.price,
                    base_apr: init.apr,
                    created: 0,
                },
            );
            rate_history::init(&env, cont_type, now);
        }

        let storage = env.storage().instance();
        storage.set(&ADMIN, &admin);
        storage.set(&TOKEN, &token);
        storage.set(&CASHOUT_TIMEOUT, &0u64);
        storage.set(&AUTO_INTERVAL, &DEFAULT_AUTO_REDUCE_INTERVAL);
        storage.set(&AUTO_RATE, &0i128);
        storage.set(&TOTAL_CREATED, &0u64);
        ttl::extend_instance(&env);

        events::publish_initialized(&env, admin, token);
    }

    // ── Token entry points ──────────────────────────────────────────────────

    /// Issue one cont per entry of `names` to `owner`, all created now at the
    /// category's current APR and price. Returns the owner's new cont count.
    pub fn create_conts(
        env: Env,
        caller: Address,
        owner: Address,
        names: Vec<String>,
        cont_type: ContType,
    ) -> Result<u32, ContractError> {
        caller.require_auth();
        Self::require_token(&env, &caller)?;

        let now = env.ledger().timestamp();
        let total: u64 = env.storage().instance().get(&TOTAL_CREATED).unwrap_or(0);
        let total = total
            .checked_add(names.len() as u64)
            .ok_or(ContractError::ArithmeticOverflow)?;

        let owned = ledger::create(&env, &owner, &names, cont_type, now)?;
        env.storage().instance().set(&TOTAL_CREATED, &total);
        ttl::extend_instance(&env);

        let apr = ledger::load_cont(&env, &owner, owned - 1)?.initial_apr;
        events::publish_conts_created(&env, owner, cont_type, names.len(), apr, owned);

        Ok(owned)
    }

    /// Settle the cont at `index` and return the reward for the token
    /// contract to pay out.
    ///
    /// Fails with `ClaimTooEarly` until `cashout_timeout` seconds have passed
    /// since the cont was last settled.
    pub fn cash_out(
        env: Env,
        caller: Address,
        owner: Address,
        index: u32,
    ) -> Result<i128, ContractError> {
        caller.require_auth();
        Self::require_token(&env, &caller)?;

        let auto = Self::auto_reduce(&env)?;
        let timeout = Self::cashout_timeout(&env)?;
        let now = env.ledger().timestamp();

        let amount = ledger::settle_one(&env, &owner, index, &auto, timeout, now)?;

        events::publish_cashed_out(&env, owner, index, amount);
        Ok(amount)
    }

    /// Settle every cont `owner` holds and return the total.
    ///
    /// The whole batch is refused while the most recently settled cont is
    /// still inside its timeout.
    pub fn cash_out_all(env: Env, caller: Address, owner: Address) -> Result<i128, ContractError> {
        caller.require_auth();
        Self::require_token(&env, &caller)?;

        let auto = Self::auto_reduce(&env)?;
        let timeout = Self::cashout_timeout(&env)?;
        let now = env.ledger().timestamp();

        let amount = ledger::settle_all(&env, &owner, &auto, timeout, now)?;

        events::publish_cashed_out_all(&env, owner, amount);
        Ok(amount)
    }

    // ── Admin functions ──────────────────────────────────────────────────────

    pub fn set_admin(env: Env, caller: Address, new_admin: Address) -> Result<(), ContractError> {
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        env.storage().instance().set(&ADMIN, &new_admin);
        ttl::extend_instance(&env);

        events::publish_admin_set(&env, caller, new_admin);
        Ok(())
    }

    pub fn set_token(env: Env, caller: Address, new_token: Address) -> Result<(), ContractError> {
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        let old_token = Self::get_token(env.clone())?;
        env.storage().instance().set(&TOKEN, &new_token);
        ttl::extend_instance(&env);

        events::publish_token_set(&env, old_token, new_token);
        Ok(())
    }

    /// Set the price of new conts in `cont_type`. Existing conts keep the
    /// price they were bought at.
    pub fn set_price(
        env: Env,
        caller: Address,
        cont_type: ContType,
        price: i128,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        if price < 0 {
            return Err(ContractError::InvalidInput);
        }

        let mut config = category::load(&env, cont_type)?;
        config.price = price;
        category::store(&env, cont_type, &config);

        events::publish_price_set(&env, cont_type, price);
        Ok(())
    }

    /// Schedule a proportional APR change for `cont_type`, effective now.
    ///
    /// `reduction` is out of [`APR_SCALE`] and must stay below 100 %; a
    /// negative value raises the rate. Applies to existing conts from this
    /// moment and to the starting APR of conts created later.
    pub fn change_apr(
        env: Env,
        caller: Address,
        cont_type: ContType,
        reduction: i128,
    ) -> Result<u32, ContractError> {
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        let now = env.ledger().timestamp();
        let len = rate_history::append(&env, cont_type, now, reduction)?;

        events::publish_apr_changed(&env, cont_type, reduction, len);
        Ok(len)
    }

    /// Drop the most recent APR change of `cont_type`.
    pub fn undo_apr_change(
        env: Env,
        caller: Address,
        cont_type: ContType,
    ) -> Result<RateChange, ContractError> {
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        let removed = rate_history::undo_last(&env, cont_type)?;

        events::publish_apr_change_undone(&env, cont_type, removed.timestamp, removed.reduction);
        Ok(removed)
    }

    /// Discard the whole APR history of `cont_type` and start over from
    /// `new_apr`.
    pub fn reset_apr_changes(
        env: Env,
        caller: Address,
        cont_type: ContType,
        new_apr: u128,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        let anchor = rate_history::reset(&env, cont_type, new_apr)?;

        events::publish_apr_reset(&env, cont_type, new_apr, anchor);
        Ok(())
    }

    pub fn set_cashout_timeout(
        env: Env,
        caller: Address,
        timeout: u64,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        env.storage().instance().set(&CASHOUT_TIMEOUT, &timeout);
        ttl::extend_instance(&env);

        events::publish_cashout_timeout_set(&env, timeout);
        Ok(())
    }

    pub fn set_auto_reduce_interval(
        env: Env,
        caller: Address,
        interval: u64,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        if interval == 0 {
            return Err(ContractError::InvalidInput);
        }
        env.storage().instance().set(&AUTO_INTERVAL, &interval);
        ttl::extend_instance(&env);

        events::publish_auto_reduce_interval_set(&env, interval);
        Ok(())
    }

    pub fn set_auto_reduce_rate(env: Env, caller: Address, rate: i128) -> Result<(), ContractError> {
        caller.require_auth();
        Self::require_admin(&env, &caller)?;

        if rate < 0 || rate >= APR_SCALE as i128 {
            return Err(ContractError::InvalidReduction);
        }
        env.storage().instance().set(&AUTO_RATE, &rate);
        ttl::extend_instance(&env);

        events::publish_auto_reduce_rate_set(&env, rate);
        Ok(())
    }

    // ── Configuration views ──────────────────────────────────────────────────

    pub fn get_admin(env: Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&ADMIN)
            .ok_or(ContractError::NotInitialized)
    }

    pub fn get_token(env: Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&TOKEN)
            .ok_or(ContractError::NotInitialized)
    }

    pub fn get_cashout_timeout(env: Env) -> Result<u64, ContractError> {
        Self::cashout_timeout(&env)
    }

    pub fn get_auto_reduce_interval(env: Env) -> Result<u64, ContractError> {
        Ok(Self::auto_reduce(&env)?.interval)
    }

    pub fn get_auto_reduce_rate(env: Env) -> Result<i128, ContractError> {
        Ok(Self::auto_reduce(&env)?.rate)
    }

    // ── Category views ───────────────────────────────────────────────────────

    pub fn get_price(env: Env, cont_type: ContType) -> Result<i128, ContractError> {
        Ok(category::load(&env, cont_type)?.price)
    }

    /// Base APR of `cont_type`, before its history is applied.
    pub fn get_base_apr(env: Env, cont_type: ContType) -> Result<u128, ContractError> {
        Ok(category::load(&env, cont_type)?.base_apr)
    }

    /// APR a cont of `cont_type` created right now would start with.
    pub fn get_new_cont_apr(env: Env, cont_type: ContType) -> Result<u128, ContractError> {
        let config = category::load(&env, cont_type)?;
        let log = rate_history::load(&env, cont_type)?;
        accrual::new_cont_apr(&env, config.base_apr, &log, env.ledger().timestamp())
    }

    pub fn get_created_count(env: Env, cont_type: ContType) -> Result<u64, ContractError> {
        Ok(category::load(&env, cont_type)?.created)
    }

    pub fn get_total_created(env: Env) -> u64 {
        env.storage().instance().get(&TOTAL_CREATED).unwrap_or(0)
    }

    pub fn get_apr_history(env: Env, cont_type: ContType) -> Result<Vec<RateChange>, ContractError> {
        rate_history::load(&env, cont_type)
    }

    // ── Owner views ──────────────────────────────────────────────────────────

    pub fn get_conts(env: Env, owner: Address) -> Vec<Cont> {
        ledger::load_conts(&env, &owner)
    }

    pub fn get_cont_count(env: Env, owner: Address) -> u32 {
        ledger::load_conts(&env, &owner).len()
    }

    pub fn get_cont_names(env: Env, owner: Address) -> Vec<String> {
        let mut names = Vec::new(&env);
        for cont in ledger::load_conts(&env, &owner).iter() {
            names.push_back(cont.name);
        }
        names
    }

    pub fn get_cont_creation_times(env: Env, owner: Address) -> Vec<u64> {
        let mut times = Vec::new(&env);
        for cont in ledger::load_conts(&env, &owner).iter() {
            times.push_back(cont.creation_time);
        }
        times
    }

    pub fn get_cont_last_update_times(env: Env, owner: Address) -> Vec<u64> {
        let mut times = Vec::new(&env);
        for cont in ledger::load_conts(&env, &owner).iter() {
            times.push_back(cont.last_update_time);
        }
        times
    }

    pub fn get_cont_types(env: Env, owner: Address) -> Vec<ContType> {
        let mut types = Vec::new(&env);
        for cont in ledger::load_conts(&env, &owner).iter() {
            types.push_back(cont.cont_type);
        }
        types
    }

    pub fn get_cont_initial_aprs(env: Env, owner: Address) -> Vec<u128> {
        let mut aprs = Vec::new(&env);
        for cont in ledger::load_conts(&env, &owner).iter() {
            aprs.push_back(cont.initial_apr);
        }
        aprs
    }

    /// APR every cont of `owner` earns at this moment.
    pub fn get_cont_current_aprs(env: Env, owner: Address) -> Result<Vec<u128>, ContractError> {
        let auto = Self::auto_reduce(&env)?;
        ledger::current_aprs(&env, &owner, &auto, env.ledger().timestamp())
    }

    /// Unsettled reward of every cont of `owner`.
    pub fn get_cont_rewards(env: Env, owner: Address) -> Result<Vec<i128>, ContractError> {
        let auto = Self::auto_reduce(&env)?;
        ledger::pending_rewards(&env, &owner, &auto, env.ledger().timestamp())
    }

    pub fn get_cont_reward(env: Env, owner: Address, index: u32) -> Result<i128, ContractError> {
        let auto = Self::auto_reduce(&env)?;
        let cont = ledger::load_cont(&env, &owner, index)?;
        ledger::pending_reward(&env, &cont, &auto, env.ledger().timestamp())
    }

    pub fn get_cont_apr(env: Env, owner: Address, index: u32) -> Result<u128, ContractError> {
        let auto = Self::auto_reduce(&env)?;
        let cont = ledger::load_cont(&env, &owner, index)?;
        ledger::current_apr(&env, &cont, &auto, env.ledger().timestamp())
    }

    /// What `cash_out_all` would pay right now, ignoring the timeout.
    pub fn get_total_rewards(env: Env, owner: Address) -> Result<i128, ContractError> {
        let mut total: i128 = 0;
        for reward in Self::get_cont_rewards(env, owner)?.iter() {
            total = total
                .checked_add(reward)
                .ok_or(ContractError::ArithmeticOverflow)?;
        }
        Ok(total)
    }

    pub fn is_cashout_allowed(env: Env, owner: Address, index: u32) -> Result<bool, ContractError> {
        let cont = ledger::load_cont(&env, &owner, index)?;
        Ok(ledger::is_claimable(
            cont.last_update_time,
            env.ledger().timestamp(),
            Self::cashout_timeout(&env)?,
        ))
    }

    pub fn is_cashout_all_allowed(env: Env, owner: Address) -> Result<bool, ContractError> {
        let conts = ledger::load_conts(&env, &owner);
        let latest = ledger::latest_update(&conts).ok_or(ContractError::NoConts)?;
        Ok(ledger::is_claimable(
            latest,
            env.ledger().timestamp(),
            Self::cashout_timeout(&env)?,
        ))
    }

    // ── Owner registry views ─────────────────────────────────────────────────

    /// Whether `owner` has ever been issued a cont.
    pub fn is_owner(env: Env, owner: Address) -> bool {
        ledger::owners().contains(&env, &owner)
    }

    pub fn get_owner_count(env: Env) -> u32 {
        ledger::owners().size(&env)
    }

    /// Every owner in registration order.
    pub fn get_owners(env: Env) -> Vec<Address> {
        ledger::owners().keys(&env)
    }

    pub fn get_owner_at(env: Env, index: u32) -> Result<Address, ContractError> {
        ledger::owners()
            .key_at(&env, index)
            .ok_or(ContractError::IndexOutOfRange)
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    /// Guard: revert if `caller` is not the stored admin.
    fn require_admin(env: &Env, caller: &Address) -> Result<(), ContractError> {
        let admin: Address = env
            .storage()
            .instance()
            .get(&ADMIN)
            .ok_or(ContractError::NotInitialized)?;
        if *caller != admin {
            return Err(ContractError::Unauthorized);
        }
        Ok(())
    }

    /// Guard: revert if `caller` is not the stored token contract.
    fn require_token(env: &Env, caller: &Address) -> Result<(), ContractError> {
        let token: Address = env
            .storage()
            .instance()
            .get(&TOKEN)
            .ok_or(ContractError::NotInitialized)?;
        if *caller != token {
            return Err(ContractError::Unauthorized);
        }
        Ok(())
    }

    fn cashout_timeout(env: &Env) -> Result<u64, ContractError> {
        env.storage()
            .instance()
            .get(&CASHOUT_TIMEOUT)
            .ok_or(ContractError::NotInitialized)
    }

    fn auto_reduce(env: &Env) -> Result<AutoReduce, ContractError> {
        let interval: u64 = env
            .storage()
            .instance()
            .get(&AUTO_INTERVAL)
            .ok_or(ContractError::NotInitialized)?;
        let rate: i128 = env
            .storage()
            .instance()
            .get(&AUTO_RATE)
            .ok_or(ContractError::NotInitialized)?;
        Ok(AutoReduce { interval, rate })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
