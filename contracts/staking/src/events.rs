#![allow(deprecated)] // events().publish migration tracked separately

use soroban_sdk::{symbol_short, Address, Env};

use crate::EmissionConfig;

// ── Event payloads ──────────────────────────────────────────────────────────

/// Fired once when the engine is bootstrapped.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InitializedEvent {
    pub admin: Address,
    pub reward_token: Address,
    pub usd_oracle: Address,
    pub config: EmissionConfig,
    pub start_block: u32,
    pub timestamp: u64,
}

/// Fired when a pair is listed for staking.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolAddedEvent {
    pub pool_id: u32,
    pub pair: Address,
    pub share_token: Address,
    pub timestamp: u64,
}

/// Fired when a pool books new rewards.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolUpdatedEvent {
    pub pool_id: u32,
    pub accrued: i128,
    pub acc_reward_per_share: i128,
    pub block: u32,
    pub timestamp: u64,
}

#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DepositedEvent {
    pub pool_id: u32,
    pub staker: Address,
    pub amount: i128,
    pub new_total_deposited: i128,
    pub timestamp: u64,
}

#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawnEvent {
    pub pool_id: u32,
    pub staker: Address,
    pub amount: i128,
    pub new_total_deposited: i128,
    pub timestamp: u64,
}

/// Fired whenever pending rewards are paid out.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HarvestedEvent {
    pub pool_id: u32,
    pub staker: Address,
    pub amount: i128,
    pub timestamp: u64,
}

/// Fired when a staker leaves without rewards.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EmergencyWithdrawnEvent {
    pub pool_id: u32,
    pub staker: Address,
    pub amount: i128,
    pub forfeited: i128,
    pub timestamp: u64,
}

#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EmissionConfigSetEvent {
    pub config: EmissionConfig,
    pub timestamp: u64,
}

#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReservesFundedEvent {
    pub from: Address,
    pub amount: i128,
    pub new_balance: i128,
    pub timestamp: u64,
}

#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReservesRemovedEvent {
    pub to: Address,
    pub amount: i128,
    pub new_balance: i128,
    pub timestamp: u64,
}

// ── Publishers ──────────────────────────────────────────────────────────────

pub fn publish_initialized(
    env: &Env,
    admin: Address,
    reward_token: Address,
    usd_oracle: Address,
    config: EmissionConfig,
    start_block: u32,
) {
    env.events().publish(
        (symbol_short!("INIT"),),
        InitializedEvent {
            admin,
            reward_token,
            usd_oracle,
            config,
            start_block,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_pool_added(env: &Env, pool_id: u32, pair: Address, share_token: Address) {
    env.events().publish(
        (symbol_short!("POOL_ADD"), pool_id),
        PoolAddedEvent {
            pool_id,
            pair,
            share_token,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_pool_updated(
    env: &Env,
    pool_id: u32,
    accrued: i128,
    acc_reward_per_share: i128,
    block: u32,
) {
    env.events().publish(
        (symbol_short!("POOL_UPD"), pool_id),
        PoolUpdatedEvent {
            pool_id,
            accrued,
            acc_reward_per_share,
            block,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_deposited(
    env: &Env,
    pool_id: u32,
    staker: Address,
    amount: i128,
    new_total_deposited: i128,
) {
    env.events().publish(
        (symbol_short!("DEPOSIT"), staker.clone()),
        DepositedEvent {
            pool_id,
            staker,
            amount,
            new_total_deposited,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_withdrawn(
    env: &Env,
    pool_id: u32,
    staker: Address,
    amount: i128,
    new_total_deposited: i128,
) {
    env.events().publish(
        (symbol_short!("WITHDRAW"), staker.clone()),
        WithdrawnEvent {
            pool_id,
            staker,
            amount,
            new_total_deposited,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_harvested(env: &Env, pool_id: u32, staker: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("HARVEST"), staker.clone()),
        HarvestedEvent {
            pool_id,
            staker,
            amount,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_emergency_withdrawn(
    env: &Env,
    pool_id: u32,
    staker: Address,
    amount: i128,
    forfeited: i128,
) {
    env.events().publish(
        (symbol_short!("EMRG_WD"), staker.clone()),
        EmergencyWithdrawnEvent {
            pool_id,
            staker,
            amount,
            forfeited,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_emission_config_set(env: &Env, config: EmissionConfig) {
    env.events().publish(
        (symbol_short!("CFG_SET"),),
        EmissionConfigSetEvent {
            config,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_reserves_funded(env: &Env, from: Address, amount: i128, new_balance: i128) {
    env.events().publish(
        (symbol_short!("RSV_FUND"), from.clone()),
        ReservesFundedEvent {
            from,
            amount,
            new_balance,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_reserves_removed(env: &Env, to: Address, amount: i128, new_balance: i128) {
    env.events().publish(
        (symbol_short!("RSV_RMV"), to.clone()),
        ReservesRemovedEvent {
            to,
            amount,
            new_balance,
            timestamp: env.ledger().timestamp(),
        },
    );
}
