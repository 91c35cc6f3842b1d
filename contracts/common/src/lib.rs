//! Shared interfaces and fixed-point helpers for the oracle and staking suite.
//!
//! This crate provides:
//! - [`interfaces`]: contract clients for the capabilities every contract
//!   consumes: a [`PriceSource`](interfaces::PriceSource) and an
//!   [`AccumulatorPool`](interfaces::AccumulatorPool).
//! - [`math`]: `U256`-backed mul-div, UQ112.112 encoding and decimal
//!   rescaling used by the oracles and the staking engine.
//! - Storage TTL constants shared by every contract.

#![no_std]

use soroban_sdk::Env;

// ── Modules ──────────────────────────────────────────────────────────────────

pub mod interfaces;
pub mod math;

pub use interfaces::*;

// ── Shared constants ─────────────────────────────────────────────────────────

/// Every price exchanged between contracts carries this many decimals.
pub const PRICE_DECIMALS: u32 = 8;

/// `10^PRICE_DECIMALS`.
pub const PRICE_SCALE: i128 = 100_000_000;

/// Remaining-TTL threshold (in ledgers) below which entries are extended.
pub const TTL_THRESHOLD: u32 = 17_280;

/// TTL (in ledgers) entries are extended to, roughly 30 days of 5s ledgers.
pub const TTL_EXTEND_TO: u32 = 518_400;

/// Bump the TTL of the calling contract's instance storage.
pub fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
}
