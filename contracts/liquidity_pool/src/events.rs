#![allow(deprecated)] // events().publish migration tracked separately

use soroban_sdk::{symbol_short, Address, Env};

// ── Event payloads ──────────────────────────────────────────────────────────

/// Fired when liquidity is added.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DepositedEvent {
    pub provider: Address,
    pub amount_0: i128,
    pub amount_1: i128,
    pub shares: i128,
    pub timestamp: u64,
}

/// Fired when shares are burned for the underlying assets.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawnEvent {
    pub provider: Address,
    pub amount_0: i128,
    pub amount_1: i128,
    pub shares: i128,
    pub timestamp: u64,
}

#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SwappedEvent {
    pub trader: Address,
    pub token_in: Address,
    pub amount_in: i128,
    pub amount_out: i128,
    pub timestamp: u64,
}

// ── Publishers ──────────────────────────────────────────────────────────────

pub fn publish_deposited(
    env: &Env,
    provider: Address,
    amount_0: i128,
    amount_1: i128,
    shares: i128,
) {
    env.events().publish(
        (symbol_short!("LP_DEP"), provider.clone()),
        DepositedEvent {
            provider,
            amount_0,
            amount_1,
            shares,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_withdrawn(
    env: &Env,
    provider: Address,
    amount_0: i128,
    amount_1: i128,
    shares: i128,
) {
    env.events().publish(
        (symbol_short!("LP_WD"), provider.clone()),
        WithdrawnEvent {
            provider,
            amount_0,
            amount_1,
            shares,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_swapped(
    env: &Env,
    trader: Address,
    token_in: Address,
    amount_in: i128,
    amount_out: i128,
) {
    env.events().publish(
        (symbol_short!("SWAP"), trader.clone()),
        SwappedEvent {
            trader,
            token_in,
            amount_in,
            amount_out,
            timestamp: env.ledger().timestamp(),
        },
    );
}
