//! Two-asset constant-product pool with UQ112.112 cumulative-price
//! accumulators.
//!
//! Shares are issued through a separate share token whose admin is this
//! contract. The accumulators are what the TWAP oracle reads.

#![no_std]

pub mod events;

use common::math;
use soroban_sdk::{
    contract, contractimpl, symbol_short, token, Address, Env, Symbol, U256,
};

// ── Storage key constants ────────────────────────────────────────────────────

const TOKEN_0: Symbol = symbol_short!("TOKEN_0");
const TOKEN_1: Symbol = symbol_short!("TOKEN_1");
const SHARE_TOKEN: Symbol = symbol_short!("SHR_TOK");
const TOTAL_SHARES: Symbol = symbol_short!("TOT_SHR");
const RESERVE_0: Symbol = symbol_short!("RSV_0");
const RESERVE_1: Symbol = symbol_short!("RSV_1");
const TIMESTAMP_LAST: Symbol = symbol_short!("TS_LAST");
const CUMULATIVE_0: Symbol = symbol_short!("CUM_0");
const CUMULATIVE_1: Symbol = symbol_short!("CUM_1");

/// Shares burned on the first deposit so the pool can never be fully drained.
pub const MINIMUM_LIQUIDITY: i128 = 1_000;

/// Swap fee in basis points.
pub const FEE_BPS: i128 = 30;
const BPS: i128 = 10_000;

// ── Contract errors ──────────────────────────────────────────────────────────

#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ContractError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    InvalidInput = 3,
    TokensIdentical = 4,
    InsufficientLiquidity = 5,
    SlippageExceeded = 6,
    MathOverflow = 7,
}

// ── Contract ─────────────────────────────────────────────────────────────────

#[contract]
pub struct LiquidityPoolContract;

#[contractimpl]
impl LiquidityPoolContract {
    /// Bind the pool to its two assets and the share token it mints.
    ///
    /// The share token must already list this contract as its admin.
    pub fn initialize(
        env: Env,
        token_0: Address,
        token_1: Address,
        share_token: Address,
    ) -> Result<(), ContractError> {
        if env.storage().instance().has(&TOKEN_0) {
            return Err(ContractError::AlreadyInitialized);
        }
        if token_0 == token_1 {
            return Err(ContractError::TokensIdentical);
        }

        env.storage().instance().set(&TOKEN_0, &token_0);
        env.storage().instance().set(&TOKEN_1, &token_1);
        env.storage().instance().set(&SHARE_TOKEN, &share_token);
        env.storage()
            .instance()
            .set(&TIMESTAMP_LAST, &env.ledger().timestamp());
        common::extend_instance_ttl(&env);

        Ok(())
    }

    // ── Liquidity ────────────────────────────────────────────────────────────

    /// Add both assets and receive pool shares.
    ///
    /// The first provider receives `sqrt(a0 * a1) - MINIMUM_LIQUIDITY`; later
    /// providers are minted against whichever side is the tighter ratio.
    pub fn deposit(
        env: Env,
        provider: Address,
        amount_0: i128,
        amount_1: i128,
    ) -> Result<i128, ContractError> {
        provider.require_auth();
        if amount_0 <= 0 || amount_1 <= 0 {
            return Err(ContractError::InvalidInput);
        }

        let (reserve_0, reserve_1, _) = Self::get_reserves(env.clone());
        let total = Self::total_shares(env.clone());

        let (shares, locked) = if total == 0 {
            let product = (amount_0 as u128)
                .checked_mul(amount_1 as u128)
                .ok_or(ContractError::MathOverflow)?;
            let root =
                i128::try_from(math::isqrt(product)).map_err(|_| ContractError::MathOverflow)?;
            (root - MINIMUM_LIQUIDITY, MINIMUM_LIQUIDITY)
        } else {
            let by_0 = math::mul_div(&env, amount_0, total, reserve_0)
                .ok_or(ContractError::MathOverflow)?;
            let by_1 = math::mul_div(&env, amount_1, total, reserve_1)
                .ok_or(ContractError::MathOverflow)?;
            (by_0.min(by_1), 0)
        };
        if shares <= 0 {
            return Err(ContractError::InsufficientLiquidity);
        }

        let contract = env.current_contract_address();
        token::Client::new(&env, &Self::token_0(env.clone())?)
            .transfer(&provider, &contract, &amount_0);
        token::Client::new(&env, &Self::token_1(env.clone())?)
            .transfer(&provider, &contract, &amount_1);
        token::StellarAssetClient::new(&env, &Self::share_token(env.clone())?)
            .mint(&provider, &shares);

        let new_total = total
            .checked_add(shares)
            .and_then(|t| t.checked_add(locked))
            .ok_or(ContractError::MathOverflow)?;
        env.storage().instance().set(&TOTAL_SHARES, &new_total);

        let new_0 = reserve_0
            .checked_add(amount_0)
            .ok_or(ContractError::MathOverflow)?;
        let new_1 = reserve_1
            .checked_add(amount_1)
            .ok_or(ContractError::MathOverflow)?;
        Self::update(&env, new_0, new_1)?;

        events::publish_deposited(&env, provider, amount_0, amount_1, shares);

        Ok(shares)
    }

    /// Burn `shares` and receive the matching slice of both reserves.
    pub fn withdraw(
        env: Env,
        provider: Address,
        shares: i128,
    ) -> Result<(i128, i128), ContractError> {
        provider.require_auth();
        if shares <= 0 {
            return Err(ContractError::InvalidInput);
        }

        let (reserve_0, reserve_1, _) = Self::get_reserves(env.clone());
        let total = Self::total_shares(env.clone());
        if shares > total {
            return Err(ContractError::InsufficientLiquidity);
        }

        let amount_0 =
            math::mul_div(&env, shares, reserve_0, total).ok_or(ContractError::MathOverflow)?;
        let amount_1 =
            math::mul_div(&env, shares, reserve_1, total).ok_or(ContractError::MathOverflow)?;
        if amount_0 <= 0 || amount_1 <= 0 {
            return Err(ContractError::InsufficientLiquidity);
        }

        token::Client::new(&env, &Self::share_token(env.clone())?).burn(&provider, &shares);

        let contract = env.current_contract_address();
        token::Client::new(&env, &Self::token_0(env.clone())?)
            .transfer(&contract, &provider, &amount_0);
        token::Client::new(&env, &Self::token_1(env.clone())?)
            .transfer(&contract, &provider, &amount_1);

        env.storage()
            .instance()
            .set(&TOTAL_SHARES, &(total - shares));
        Self::update(&env, reserve_0 - amount_0, reserve_1 - amount_1)?;

        events::publish_withdrawn(&env, provider, amount_0, amount_1, shares);

        Ok((amount_0, amount_1))
    }

    // ── Trading ──────────────────────────────────────────────────────────────

    /// Sell `amount_in` of `token_in` for the other asset.
    ///
    /// Fails with `SlippageExceeded` when the output is below `min_out`.
    pub fn swap(
        env: Env,
        trader: Address,
        token_in: Address,
        amount_in: i128,
        min_out: i128,
    ) -> Result<i128, ContractError> {
        trader.require_auth();
        if amount_in <= 0 || min_out < 0 {
            return Err(ContractError::InvalidInput);
        }

        let token_0 = Self::token_0(env.clone())?;
        let token_1 = Self::token_1(env.clone())?;
        let sells_token_0 = if token_in == token_0 {
            true
        } else if token_in == token_1 {
            false
        } else {
            return Err(ContractError::InvalidInput);
        };

        let (reserve_0, reserve_1, _) = Self::get_reserves(env.clone());
        let (reserve_in, reserve_out) = if sells_token_0 {
            (reserve_0, reserve_1)
        } else {
            (reserve_1, reserve_0)
        };
        if reserve_in == 0 || reserve_out == 0 {
            return Err(ContractError::InsufficientLiquidity);
        }

        let in_with_fee = amount_in
            .checked_mul(BPS - FEE_BPS)
            .ok_or(ContractError::MathOverflow)?;
        let denominator = reserve_in
            .checked_mul(BPS)
            .and_then(|d| d.checked_add(in_with_fee))
            .ok_or(ContractError::MathOverflow)?;
        let amount_out = math::mul_div(&env, in_with_fee, reserve_out, denominator)
            .ok_or(ContractError::MathOverflow)?;
        if amount_out <= 0 || amount_out >= reserve_out {
            return Err(ContractError::InsufficientLiquidity);
        }
        if amount_out < min_out {
            return Err(ContractError::SlippageExceeded);
        }

        let (token_out, new_0, new_1) = if sells_token_0 {
            (token_1, reserve_0 + amount_in, reserve_1 - amount_out)
        } else {
            (token_0, reserve_0 - amount_out, reserve_1 + amount_in)
        };

        let contract = env.current_contract_address();
        token::Client::new(&env, &token_in).transfer(&trader, &contract, &amount_in);
        token::Client::new(&env, &token_out).transfer(&contract, &trader, &amount_out);

        Self::update(&env, new_0, new_1)?;

        events::publish_swapped(&env, trader, token_in, amount_in, amount_out);

        Ok(amount_out)
    }

    // ── View functions ───────────────────────────────────────────────────────

    pub fn token_0(env: Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&TOKEN_0)
            .ok_or(ContractError::NotInitialized)
    }

    pub fn token_1(env: Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&TOKEN_1)
            .ok_or(ContractError::NotInitialized)
    }

    pub fn share_token(env: Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&SHARE_TOKEN)
            .ok_or(ContractError::NotInitialized)
    }

    /// Outstanding shares, including the permanently locked minimum.
    pub fn total_shares(env: Env) -> i128 {
        env.storage().instance().get(&TOTAL_SHARES).unwrap_or(0)
    }

    /// `(reserve_0, reserve_1, timestamp of the last accumulator update)`.
    pub fn get_reserves(env: Env) -> (i128, i128, u64) {
        let reserve_0: i128 = env.storage().instance().get(&RESERVE_0).unwrap_or(0);
        let reserve_1: i128 = env.storage().instance().get(&RESERVE_1).unwrap_or(0);
        let last: u64 = env.storage().instance().get(&TIMESTAMP_LAST).unwrap_or(0);
        (reserve_0, reserve_1, last)
    }

    pub fn price_0_cumulative_last(env: Env) -> U256 {
        env.storage()
            .instance()
            .get(&CUMULATIVE_0)
            .unwrap_or(U256::from_u32(&env, 0))
    }

    pub fn price_1_cumulative_last(env: Env) -> U256 {
        env.storage()
            .instance()
            .get(&CUMULATIVE_1)
            .unwrap_or(U256::from_u32(&env, 0))
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    /// Fold the interval since the last update into the accumulators using the
    /// reserves that were in force during it, then store the new reserves.
    fn update(env: &Env, new_reserve_0: i128, new_reserve_1: i128) -> Result<(), ContractError> {
        let (reserve_0, reserve_1, last) = Self::get_reserves(env.clone());
        let now = env.ledger().timestamp();
        let elapsed = now.saturating_sub(last);

        if elapsed > 0 && reserve_0 > 0 && reserve_1 > 0 {
            let elapsed = U256::from_u128(env, elapsed as u128);
            let price_0 = math::encode_q112(env, reserve_1, reserve_0)
                .ok_or(ContractError::MathOverflow)?;
            let price_1 = math::encode_q112(env, reserve_0, reserve_1)
                .ok_or(ContractError::MathOverflow)?;

            let cumulative_0 =
                Self::price_0_cumulative_last(env.clone()).add(&price_0.mul(&elapsed));
            let cumulative_1 =
                Self::price_1_cumulative_last(env.clone()).add(&price_1.mul(&elapsed));
            env.storage().instance().set(&CUMULATIVE_0, &cumulative_0);
            env.storage().instance().set(&CUMULATIVE_1, &cumulative_1);
        }

        env.storage().instance().set(&RESERVE_0, &new_reserve_0);
        env.storage().instance().set(&RESERVE_1, &new_reserve_1);
        env.storage().instance().set(&TIMESTAMP_LAST, &now);
        common::extend_instance_ttl(env);

        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test;
