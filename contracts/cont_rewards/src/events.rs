#![allow(deprecated)] // events().publish migration tracked separately

use soroban_sdk::{symbol_short, Address, Env};

use crate::category::ContType;

// ── Event payloads ──────────────────────────────────────────────────────────

/// Fired once when the contract is constructed.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InitializedEvent {
    pub admin: Address,
    pub token: Address,
    pub timestamp: u64,
}

/// Fired when conts are issued to an owner.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContsCreatedEvent {
    pub owner: Address,
    pub cont_type: ContType,
    pub count: u32,
    pub apr: u128,
    pub total_owned: u32,
    pub timestamp: u64,
}

/// Fired when a single cont is cashed out.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CashedOutEvent {
    pub owner: Address,
    pub index: u32,
    pub amount: i128,
    pub timestamp: u64,
}

/// Fired when every cont of an owner is cashed out at once.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CashedOutAllEvent {
    pub owner: Address,
    pub amount: i128,
    pub timestamp: u64,
}

/// Fired when a rate change is appended to a category's history.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AprChangedEvent {
    pub cont_type: ContType,
    pub reduction: i128,
    pub history_len: u32,
    pub timestamp: u64,
}

#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AprChangeUndoneEvent {
    pub cont_type: ContType,
    pub removed_at: u64,
    pub removed_reduction: i128,
    pub timestamp: u64,
}

#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AprResetEvent {
    pub cont_type: ContType,
    pub new_apr: u128,
    pub anchor: u64,
    pub timestamp: u64,
}

#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriceSetEvent {
    pub cont_type: ContType,
    pub price: i128,
    pub timestamp: u64,
}

// ── Publishers ──────────────────────────────────────────────────────────────

pub fn publish_initialized(env: &Env, admin: Address, token: Address) {
    env.events().publish(
        (symbol_short!("INIT"),),
        InitializedEvent {
            admin,
            token,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_conts_created(
    env: &Env,
    owner: Address,
    cont_type: ContType,
    count: u32,
    apr: u128,
    total_owned: u32,
) {
    env.events().publish(
        (symbol_short!("CREATED"), owner.clone()),
        ContsCreatedEvent {
            owner,
            cont_type,
            count,
            apr,
            total_owned,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_cashed_out(env: &Env, owner: Address, index: u32, amount: i128) {
    env.events().publish(
        (symbol_short!("CASHOUT"), owner.clone()),
        CashedOutEvent {
            owner,
            index,
            amount,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_cashed_out_all(env: &Env, owner: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("CASH_ALL"), owner.clone()),
        CashedOutAllEvent {
            owner,
            amount,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_apr_changed(env: &Env, cont_type: ContType, reduction: i128, history_len: u32) {
    env.events().publish(
        (symbol_short!("APR_CHG"),),
        AprChangedEvent {
            cont_type,
            reduction,
            history_len,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_apr_change_undone(
    env: &Env,
    cont_type: ContType,
    removed_at: u64,
    removed_reduction: i128,
) {
    env.events().publish(
        (symbol_short!("APR_UNDO"),),
        AprChangeUndoneEvent {
            cont_type,
            removed_at,
            removed_reduction,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_apr_reset(env: &Env, cont_type: ContType, new_apr: u128, anchor: u64) {
    env.events().publish(
        (symbol_short!("APR_RST"),),
        AprResetEvent {
            cont_type,
            new_apr,
            anchor,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_price_set(env: &Env, cont_type: ContType, price: i128) {
    env.events().publish(
        (symbol_short!("PRICE"),),
        PriceSetEvent {
            cont_type,
            price,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_cashout_timeout_set(env: &Env, timeout: u64) {
    env.events().publish(
        (symbol_short!("TIMEOUT"),),
        (timeout, env.ledger().timestamp()),
    );
}

pub fn publish_auto_reduce_interval_set(env: &Env, interval: u64) {
    env.events().publish(
        (symbol_short!("AUTO_INT"),),
        (interval, env.ledger().timestamp()),
    );
}

pub fn publish_auto_reduce_rate_set(env: &Env, rate: i128) {
    env.events().publish(
        (symbol_short!("AUTO_RT"),),
        (rate, env.ledger().timestamp()),
    );
}

pub fn publish_admin_set(env: &Env, old_admin: Address, new_admin: Address) {
    env.events().publish(
        (symbol_short!("ADM_SET"),),
        (old_admin, new_admin, env.ledger().timestamp()),
    );
}

pub fn publish_token_set(env: &Env, old_token: Address, new_token: Address) {
    env.events().publish(
        (symbol_short!("TOK_SET"),),
        (old_token, new_token, env.ledger().timestamp()),
    );
}
