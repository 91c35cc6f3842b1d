#![allow(deprecated)] // events().publish migration tracked separately

use soroban_sdk::{symbol_short, Address, Env};

// ── Event payloads ──────────────────────────────────────────────────────────

/// Fired on every accepted push.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriceSetEvent {
    pub admin: Address,
    pub price: i128,
    pub timestamp: u64,
}

// ── Publishers ──────────────────────────────────────────────────────────────

pub fn publish_price_set(env: &Env, admin: Address, price: i128) {
    env.events().publish(
        (symbol_short!("FEED_SET"), admin.clone()),
        PriceSetEvent {
            admin,
            price,
            timestamp: env.ledger().timestamp(),
        },
    );
}
