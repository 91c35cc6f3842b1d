#![no_std]

//! Pushed USD reference price.
//!
//! Stands in for a canonical external feed on deployments where the quote
//! currency's USD price is not derived from a stable-pair pool. An operator
//! pushes prices; readers get a hard failure instead of a stale or missing
//! value.

pub mod events;

use soroban_sdk::{contract, contractimpl, contracttype, symbol_short, Address, Env, Symbol};

// ── Storage key constants ────────────────────────────────────────────────────

const ADMIN: Symbol = symbol_short!("ADMIN");
const MAX_AGE: Symbol = symbol_short!("MAX_AGE");
const LATEST: Symbol = symbol_short!("LATEST");

// ── Contract errors ──────────────────────────────────────────────────────────

#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ContractError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    InvalidInput = 4,
    PriceUnavailable = 5,
    StalePrice = 6,
}

/// Latest pushed price and when it was recorded.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriceRecord {
    pub price: i128,
    pub updated_at: u64,
}

// ── Contract ─────────────────────────────────────────────────────────────────

#[contract]
pub struct ReferenceFeedContract;

#[contractimpl]
impl ReferenceFeedContract {
    /// `max_age` is the staleness bound in seconds; zero disables it.
    pub fn initialize(env: Env, admin: Address, max_age: u64) -> Result<(), ContractError> {
        if env.storage().instance().has(&ADMIN) {
            return Err(ContractError::AlreadyInitialized);
        }
        env.storage().instance().set(&ADMIN, &admin);
        env.storage().instance().set(&MAX_AGE, &max_age);
        common::extend_instance_ttl(&env);
        Ok(())
    }

    /// Record a new price at the current ledger timestamp.
    pub fn set_price(env: Env, admin: Address, price: i128) -> Result<(), ContractError> {
        admin.require_auth();
        Self::require_admin(&env, &admin)?;
        if price <= 0 {
            return Err(ContractError::InvalidInput);
        }

        let record = PriceRecord {
            price,
            updated_at: env.ledger().timestamp(),
        };
        env.storage().instance().set(&LATEST, &record);
        common::extend_instance_ttl(&env);

        events::publish_price_set(&env, admin, price);

        Ok(())
    }

    pub fn set_max_age(env: Env, admin: Address, max_age: u64) -> Result<(), ContractError> {
        admin.require_auth();
        Self::require_admin(&env, &admin)?;
        env.storage().instance().set(&MAX_AGE, &max_age);
        Ok(())
    }

    /// Latest price, failing when nothing has been pushed yet or the last
    /// push is older than `max_age`.
    pub fn get_price(env: Env) -> Result<i128, ContractError> {
        if !env.storage().instance().has(&ADMIN) {
            return Err(ContractError::NotInitialized);
        }
        let record: PriceRecord = env
            .storage()
            .instance()
            .get(&LATEST)
            .ok_or(ContractError::PriceUnavailable)?;

        let max_age: u64 = env.storage().instance().get(&MAX_AGE).unwrap_or(0);
        let age = env.ledger().timestamp().saturating_sub(record.updated_at);
        if max_age > 0 && age > max_age {
            return Err(ContractError::StalePrice);
        }

        Ok(record.price)
    }

    pub fn get_record(env: Env) -> Option<PriceRecord> {
        env.storage().instance().get(&LATEST)
    }

    pub fn get_max_age(env: Env) -> u64 {
        env.storage().instance().get(&MAX_AGE).unwrap_or(0)
    }

    pub fn get_admin(env: Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&ADMIN)
            .ok_or(ContractError::NotInitialized)
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

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
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test;
