//! Persistent storage for stake pools and positions.
//!
//! Pools are keyed `(POOL, id)` with ids handed out sequentially, positions
//! `(USER, pool_id, account)`. Registered pairs are tracked under
//! `(PAIR, pair)` so one pair is never listed twice.

use common::{TTL_EXTEND_TO, TTL_THRESHOLD};
use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol, U256};

// ── Storage key constants ────────────────────────────────────────────────────

const POOL_COUNT: Symbol = symbol_short!("POOL_CNT");
const POOL: Symbol = symbol_short!("POOL");
const USER: Symbol = symbol_short!("USER");
const PAIR: Symbol = symbol_short!("PAIR");

// ── Types ────────────────────────────────────────────────────────────────────

/// One staking pool over an accumulator pair's share token.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakePool {
    pub pair: Address,
    /// Token users stake: the pair's share token.
    pub share_token: Address,
    /// Rewards per staked unit since creation, scaled by
    /// [`ACC_PRECISION`](crate::rewards::ACC_PRECISION).
    pub acc_reward_per_share: i128,
    pub last_reward_block: u32,
    pub total_deposited: i128,
    /// `true` when the reward token is the pair's `token_0`.
    pub reward_is_token_0: bool,
    /// Rewards booked to this pool and not yet paid or forfeited.
    pub reward_owed: i128,
    /// Pair accumulator (other asset per reward token) at `price_timestamp`.
    pub price_cumulative: U256,
    pub price_timestamp: u64,
    /// UQ112.112 mean price over the window that ended at `price_timestamp`.
    pub price_average: U256,
}

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UserPosition {
    pub deposited: i128,
    pub reward_debt: i128,
}

// ── Pools ────────────────────────────────────────────────────────────────────

pub fn pool_count(env: &Env) -> u32 {
    env.storage().instance().get(&POOL_COUNT).unwrap_or(0)
}

pub fn get_pool(env: &Env, pool_id: u32) -> Option<StakePool> {
    env.storage().persistent().get(&(POOL, pool_id))
}

pub fn set_pool(env: &Env, pool_id: u32, pool: &StakePool) {
    let key = (POOL, pool_id);
    env.storage().persistent().set(&key, pool);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

/// Append `pool` and return its id.
pub fn push_pool(env: &Env, pool: &StakePool) -> u32 {
    let pool_id = pool_count(env);
    set_pool(env, pool_id, pool);
    env.storage().instance().set(&POOL_COUNT, &(pool_id + 1));

    let pair_key = (PAIR, pool.pair.clone());
    env.storage().persistent().set(&pair_key, &pool_id);
    env.storage()
        .persistent()
        .extend_ttl(&pair_key, TTL_THRESHOLD, TTL_EXTEND_TO);

    pool_id
}

pub fn is_registered(env: &Env, pair: &Address) -> bool {
    env.storage().persistent().has(&(PAIR, pair.clone()))
}

// ── Positions ────────────────────────────────────────────────────────────────

pub fn get_position(env: &Env, pool_id: u32, account: &Address) -> UserPosition {
    env.storage()
        .persistent()
        .get(&(USER, pool_id, account.clone()))
        .unwrap_or_default()
}

pub fn set_position(env: &Env, pool_id: u32, account: &Address, position: &UserPosition) {
    let key = (USER, pool_id, account.clone());
    env.storage().persistent().set(&key, position);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}
