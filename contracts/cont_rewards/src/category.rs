use soroban_sdk::{contracttype, symbol_short, Env, Symbol};

use common::ttl::extend_persistent;

use crate::ContractError;

const CATEGORY: Symbol = symbol_short!("CATEGORY");

/// The closed set of cont categories. Each has its own price, base APR and
/// rate-change history.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ContType {
    Bronze = 0,
    Silver = 1,
    Gold = 2,
}

impl ContType {
    pub const ALL: [ContType; 3] = [ContType::Bronze, ContType::Silver, ContType::Gold];
}

/// Per-category state.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CategoryConfig {
    /// Price charged for one new cont, stored as the cont's principal.
    pub price: i128,
    /// APR before any rate change in the category's history is applied.
    pub base_apr: u128,
    /// Number of conts ever created in this category.
    pub created: u64,
}

/// Constructor input: the starting price and APR of one category.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CategoryInit {
    pub cont_type: ContType,
    pub price: i128,
    pub apr: u128,
}

fn category_key(cont_type: ContType) -> (Symbol, ContType) {
    (CATEGORY, cont_type)
}

pub fn load(env: &Env, cont_type: ContType) -> Result<CategoryConfig, ContractError> {
    let key = category_key(cont_type);
    let config: CategoryConfig = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(ContractError::NotInitialized)?;
    extend_persistent(env, &key);
    Ok(config)
}

pub fn store(env: &Env, cont_type: ContType, config: &CategoryConfig) {
    let key = category_key(cont_type);
    env.storage().persistent().set(&key, config);
    extend_persistent(env, &key);
}
