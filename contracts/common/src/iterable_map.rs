//! # Iterable address map
//!
//! An insertion-ordered `Address → u32` map kept in persistent storage.
//! Entries are addressable both by key and by position, which makes the
//! map enumerable without ever loading it whole:
//!
//! - `Len(ns)`           → number of entries
//! - `Key(ns, i)`        → key stored at position `i`
//! - `Index(ns, key)`    → position of `key`
//! - `Value(ns, key)`    → value stored under `key`
//!
//! Removal swaps the last entry into the vacated position, so positions are
//! stable only while nothing is removed.
//!
//! ```ignore
//! let owners = IterableMap::new(symbol_short!("OWNERS"));
//! owners.set(&env, &owner, 3);
//! assert!(owners.contains(&env, &owner));
//! ```

use soroban_sdk::{contracttype, Address, Env, Symbol, Vec};

use crate::ttl::extend_persistent;

// ── Storage keys ─────────────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
enum MapKey {
    Len(Symbol),
    Key(Symbol, u32),
    Index(Symbol, Address),
    Value(Symbol, Address),
}

/// Handle to one namespaced iterable map. Holds no data itself; every call
/// reads and writes the contract's persistent storage.
#[derive(Clone, Debug)]
pub struct IterableMap {
    ns: Symbol,
}

impl IterableMap {
    pub fn new(ns: Symbol) -> Self {
        Self { ns }
    }

    /// Number of entries currently in the map.
    pub fn size(&self, env: &Env) -> u32 {
        env.storage()
            .persistent()
            .get(&MapKey::Len(self.ns.clone()))
            .unwrap_or(0)
    }

    pub fn contains(&self, env: &Env, key: &Address) -> bool {
        env.storage()
            .persistent()
            .has(&MapKey::Index(self.ns.clone(), key.clone()))
    }

    pub fn get(&self, env: &Env, key: &Address) -> Option<u32> {
        let slot = MapKey::Value(self.ns.clone(), key.clone());
        let value = env.storage().persistent().get(&slot);
        if value.is_some() {
            extend_persistent(env, &slot);
        }
        value
    }

    /// Key stored at `index`, or `None` past the end.
    pub fn key_at(&self, env: &Env, index: u32) -> Option<Address> {
        if index >= self.size(env) {
            return None;
        }
        env.storage()
            .persistent()
            .get(&MapKey::Key(self.ns.clone(), index))
    }

    /// All keys in position order.
    pub fn keys(&self, env: &Env) -> Vec<Address> {
        let mut keys = Vec::new(env);
        for i in 0..self.size(env) {
            if let Some(key) = self.key_at(env, i) {
                keys.push_back(key);
            }
        }
        keys
    }

    /// Inserts `key` at the end of the map, or overwrites its value in place
    /// if it is already present.
    pub fn set(&self, env: &Env, key: &Address, value: u32) {
        let value_key = MapKey::Value(self.ns.clone(), key.clone());
        let index_key = MapKey::Index(self.ns.clone(), key.clone());
        let storage = env.storage().persistent();

        if !storage.has(&index_key) {
            let len = self.size(env);
            let position_key = MapKey::Key(self.ns.clone(), len);
            storage.set(&position_key, key);
            storage.set(&index_key, &len);
            storage.set(&MapKey::Len(self.ns.clone()), &(len + 1));
            extend_persistent(env, &position_key);
            extend_persistent(env, &index_key);
        }

        storage.set(&value_key, &value);
        extend_persistent(env, &value_key);
    }

    /// Removes `key`, moving the last entry into its position.
    ///
    /// Returns `false` if `key` was not present.
    pub fn remove(&self, env: &Env, key: &Address) -> bool {
        let index_key = MapKey::Index(self.ns.clone(), key.clone());
        let storage = env.storage().persistent();

        let index: u32 = match storage.get(&index_key) {
            Some(i) => i,
            None => return false,
        };
        let last = self.size(env) - 1;

        if index != last {
            let last_key: Address = storage
                .get(&MapKey::Key(self.ns.clone(), last))
                .unwrap_or_else(|| key.clone());
            storage.set(&MapKey::Key(self.ns.clone(), index), &last_key);
            storage.set(&MapKey::Index(self.ns.clone(), last_key), &index);
        }

        storage.remove(&MapKey::Key(self.ns.clone(), last));
        storage.remove(&index_key);
        storage.remove(&MapKey::Value(self.ns.clone(), key.clone()));
        storage.set(&MapKey::Len(self.ns.clone()), &last);
        true
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
