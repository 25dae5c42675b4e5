use soroban_sdk::{Env, IntoVal, Val};

/// Remaining-ledger threshold below which a key's TTL is bumped (~30 days).
pub const TTL_THRESHOLD: u32 = 518_400;
/// Ledger count a bumped key is extended to (~180 days), kept under the
/// network's maximum entry TTL.
pub const TTL_EXTEND_TO: u32 = 3_110_400;

/// Extends the TTL of a persistent key so the entry stays live.
pub fn extend_persistent<K>(env: &Env, key: &K)
where
    K: IntoVal<Env, Val>,
{
    env.storage()
        .persistent()
        .extend_ttl(key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

/// Extends the TTL of the contract instance (and every instance key).
pub fn extend_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
}
