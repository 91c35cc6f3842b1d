#![no_std]

//! Yield-targeting liquidity staking.
//!
//! Stakers lock pair share tokens and earn the reward token per ledger. The
//! per-block emission of each pool is re-derived from the USD value staked in
//! it whenever the pool is updated, so the realized yield tracks
//! `target_yield_bps` however much is staked. Accrual is capped by the part of
//! the reward reserve not already owed to stakers.
//!
//! Staked value is priced from each pair's own accumulator averaged since the
//! pool's previous update, never from the reserves of the current ledger.

pub mod events;
pub mod pools;
pub mod rewards;
pub mod valuation;

use common::{math, AccumulatorPoolClient, PriceSourceClient};
use soroban_sdk::{
    contract, contractimpl, contracttype, symbol_short, token, Address, Env, Symbol, U256,
};

pub use pools::{StakePool, UserPosition};

// ── Storage key constants ────────────────────────────────────────────────────

const ADMIN: Symbol = symbol_short!("ADMIN");
const REWARD_TOKEN: Symbol = symbol_short!("RWD_TOK");
const REWARD_DECIMALS: Symbol = symbol_short!("RWD_DEC");
const USD_ORACLE: Symbol = symbol_short!("USD_ORCL");
const EMISSION: Symbol = symbol_short!("EMISSION");
const START_BLOCK: Symbol = symbol_short!("START_BLK");
const TOTAL_OWED: Symbol = symbol_short!("TOT_OWED");

// ── Contract errors ──────────────────────────────────────────────────────────

#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ContractError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    InvalidInput = 4,
    InsufficientBalance = 5,
    PoolNotFound = 6,
    PoolAlreadyRegistered = 7,
    TokensIdentical = 8,
    InvalidPool = 9,
    InsufficientReserves = 10,
    MathOverflow = 11,
    PriceUnavailable = 12,
}

// ── Public-facing types ──────────────────────────────────────────────────────

/// How emission is derived from the value staked.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EmissionConfig {
    /// Annual yield aimed for, in basis points of the USD value staked.
    pub target_yield_bps: u32,
    /// Ledgers closed per year; converts the annual budget to a block rate.
    pub blocks_per_year: u32,
    /// Emission per block for a pool whose stake is valued at zero USD.
    pub floor_rate: i128,
}

// ── Contract ─────────────────────────────────────────────────────────────────

#[contract]
pub struct StakingContract;

#[contractimpl]
impl StakingContract {
    // ── Initialisation ──────────────────────────────────────────────────────

    /// Bootstrap the engine.
    ///
    /// * `reward_token` – token paid out; its decimals are read once here.
    /// * `usd_oracle`   – [`common::PriceSource`] pricing the reward token in USD.
    /// * `start_block`  – no pool accrues before this ledger sequence.
    /// * `initial_pair` – optionally list a first pool straight away.
    pub fn initialize(
        env: Env,
        admin: Address,
        reward_token: Address,
        usd_oracle: Address,
        config: EmissionConfig,
        start_block: u32,
        initial_pair: Option<Address>,
    ) -> Result<(), ContractError> {
        if env.storage().instance().has(&ADMIN) {
            return Err(ContractError::AlreadyInitialized);
        }
        Self::validate_config(&config)?;

        let reward_decimals = token::Client::new(&env, &reward_token).decimals();

        env.storage().instance().set(&ADMIN, &admin);
        env.storage().instance().set(&REWARD_TOKEN, &reward_token);
        env.storage().instance().set(&REWARD_DECIMALS, &reward_decimals);
        env.storage().instance().set(&USD_ORACLE, &usd_oracle);
        env.storage().instance().set(&EMISSION, &config);
        env.storage().instance().set(&START_BLOCK, &start_block);
        common::extend_instance_ttl(&env);

        events::publish_initialized(&env, admin, reward_token, usd_oracle, config, start_block);

        if let Some(pair) = initial_pair {
            Self::register_pool(&env, pair)?;
        }

        Ok(())
    }

    // ── Pool administration ──────────────────────────────────────────────────

    /// List `pair` for staking and return the new pool id.
    ///
    /// Existing pools are brought up to date first so the new pool's value
    /// does not change what they already earned.
    pub fn add_pool(env: Env, admin: Address, pair: Address) -> Result<u32, ContractError> {
        admin.require_auth();
        Self::require_admin(&env, &admin)?;

        Self::mass_update(&env)?;
        Self::register_pool(&env, pair)
    }

    /// Book the rewards `pool_id` has accrued since its last update.
    pub fn update_pool(env: Env, pool_id: u32) -> Result<StakePool, ContractError> {
        Self::require_initialized(&env)?;
        Self::update_pool_state(&env, pool_id, &mut None)
    }

    pub fn mass_update_pools(env: Env) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        Self::mass_update(&env)
    }

    // ── Staking ─────────────────────────────────────────────────────────────

    /// Stake `amount` share tokens in `pool_id`, paying out anything pending.
    ///
    /// A zero amount only harvests.
    pub fn deposit(
        env: Env,
        staker: Address,
        pool_id: u32,
        amount: i128,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        staker.require_auth();
        if amount < 0 {
            return Err(ContractError::InvalidInput);
        }

        let (_, pool) = Self::settle(&env, &staker, pool_id, amount)?;
        events::publish_deposited(&env, pool_id, staker, amount, pool.total_deposited);

        Ok(())
    }

    /// Unstake `amount` share tokens from `pool_id`, paying out anything
    /// pending.
    pub fn withdraw(
        env: Env,
        staker: Address,
        pool_id: u32,
        amount: i128,
    ) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        staker.require_auth();
        if amount < 0 {
            return Err(ContractError::InvalidInput);
        }
        if amount > pools::get_position(&env, pool_id, &staker).deposited {
            return Err(ContractError::InsufficientBalance);
        }

        let (_, pool) = Self::settle(&env, &staker, pool_id, -amount)?;
        events::publish_withdrawn(&env, pool_id, staker, amount, pool.total_deposited);

        Ok(())
    }

    /// Pay out pending rewards and return the amount paid.
    pub fn harvest(env: Env, staker: Address, pool_id: u32) -> Result<i128, ContractError> {
        Self::require_initialized(&env)?;
        staker.require_auth();

        let (paid, _) = Self::settle(&env, &staker, pool_id, 0)?;
        Ok(paid)
    }

    /// Return the whole stake without rewards.
    ///
    /// Does not touch the price oracle, so it keeps working when pricing is
    /// unavailable. The forfeited pending amount goes back to the free reserve.
    pub fn emergency_withdraw(
        env: Env,
        staker: Address,
        pool_id: u32,
    ) -> Result<i128, ContractError> {
        Self::require_initialized(&env)?;
        staker.require_auth();

        let mut pool = pools::get_pool(&env, pool_id).ok_or(ContractError::PoolNotFound)?;
        let position = pools::get_position(&env, pool_id, &staker);
        let amount = position.deposited;
        if amount == 0 {
            return Ok(0);
        }

        let forfeited = rewards::pending(
            &env,
            position.deposited,
            pool.acc_reward_per_share,
            position.reward_debt,
        )
        .ok_or(ContractError::MathOverflow)?;
        Self::release_owed(&env, forfeited);
        pool.reward_owed = pool.reward_owed.saturating_sub(forfeited).max(0);

        pool.total_deposited = pool
            .total_deposited
            .checked_sub(amount)
            .ok_or(ContractError::MathOverflow)?;
        Self::release_dust(&env, &mut pool);
        pools::set_pool(&env, pool_id, &pool);
        pools::set_position(&env, pool_id, &staker, &UserPosition::default());

        token::Client::new(&env, &pool.share_token).transfer(
            &env.current_contract_address(),
            &staker,
            &amount,
        );

        events::publish_emergency_withdrawn(&env, pool_id, staker, amount, forfeited);

        Ok(amount)
    }

    // ── Reserves ─────────────────────────────────────────────────────────────

    /// Add reward tokens to the reserve. Open to anyone.
    pub fn fund_reserves(env: Env, from: Address, amount: i128) -> Result<(), ContractError> {
        Self::require_initialized(&env)?;
        from.require_auth();
        if amount <= 0 {
            return Err(ContractError::InvalidInput);
        }

        let reward = token::Client::new(&env, &Self::reward_token(&env)?);
        reward.transfer(&from, &env.current_contract_address(), &amount);

        let balance = reward.balance(&env.current_contract_address());
        events::publish_reserves_funded(&env, from, amount, balance);

        Ok(())
    }

    /// Send `amount` reward tokens to the admin.
    ///
    /// Pools are flushed first; the reserve may never drop below what is
    /// already owed to stakers.
    pub fn remove_reserves(env: Env, admin: Address, amount: i128) -> Result<(), ContractError> {
        admin.require_auth();
        Self::require_admin(&env, &admin)?;
        if amount <= 0 {
            return Err(ContractError::InvalidInput);
        }

        Self::mass_update(&env)?;

        let reward = token::Client::new(&env, &Self::reward_token(&env)?);
        let contract = env.current_contract_address();
        let balance = reward.balance(&contract);
        let remaining = balance
            .checked_sub(amount)
            .ok_or(ContractError::MathOverflow)?;
        if remaining < Self::total_owed(&env) {
            return Err(ContractError::InsufficientReserves);
        }

        reward.transfer(&contract, &admin, &amount);

        events::publish_reserves_removed(&env, admin, amount, remaining);

        Ok(())
    }

    // ── Admin functions ──────────────────────────────────────────────────────

    /// Replace the emission parameters.
    ///
    /// Every pool is flushed at the old parameters before they change.
    pub fn set_emission_config(
        env: Env,
        admin: Address,
        config: EmissionConfig,
    ) -> Result<(), ContractError> {
        admin.require_auth();
        Self::require_admin(&env, &admin)?;
        Self::validate_config(&config)?;

        Self::mass_update(&env)?;
        env.storage().instance().set(&EMISSION, &config);
        common::extend_instance_ttl(&env);

        events::publish_emission_config_set(&env, config);

        Ok(())
    }

    // ── View functions ───────────────────────────────────────────────────────

    pub fn pool_length(env: Env) -> u32 {
        pools::pool_count(&env)
    }

    pub fn get_pool(env: Env, pool_id: u32) -> Result<StakePool, ContractError> {
        pools::get_pool(&env, pool_id).ok_or(ContractError::PoolNotFound)
    }

    pub fn get_user_position(env: Env, pool_id: u32, staker: Address) -> UserPosition {
        pools::get_position(&env, pool_id, &staker)
    }

    /// Rewards `staker` would receive from `pool_id` if they harvested now.
    pub fn get_pending_reward(
        env: Env,
        pool_id: u32,
        staker: Address,
    ) -> Result<i128, ContractError> {
        let pool = pools::get_pool(&env, pool_id).ok_or(ContractError::PoolNotFound)?;
        let position = pools::get_position(&env, pool_id, &staker);

        let mut acc = pool.acc_reward_per_share;
        let block = env.ledger().sequence();
        if block > pool.last_reward_block && pool.total_deposited > 0 {
            let price = Self::reward_usd_price(&env)?;
            let window =
                valuation::price_window(&env, &pool).ok_or(ContractError::PriceUnavailable)?;
            let accrued = Self::accrual(&env, &pool, block, price, &window.average)?;
            let increment = rewards::acc_increment(&env, accrued, pool.total_deposited)
                .ok_or(ContractError::MathOverflow)?;
            acc = acc.checked_add(increment).ok_or(ContractError::MathOverflow)?;
        }

        rewards::pending(&env, position.deposited, acc, position.reward_debt)
            .ok_or(ContractError::MathOverflow)
    }

    /// USD value (8 decimals) staked across every pool.
    pub fn get_usd_deposited(env: Env) -> Result<i128, ContractError> {
        Self::require_initialized(&env)?;
        Self::usd_deposited(&env, &mut None)
    }

    /// Emission per block the current stake calls for, summed over pools.
    pub fn get_optimal_emission_rate(env: Env) -> Result<i128, ContractError> {
        let config = Self::emission_config(&env)?;
        let mut price = None;
        let usd = Self::usd_deposited(&env, &mut price)?;
        if usd == 0 {
            return Ok(config.floor_rate);
        }
        let price = Self::cached_price(&env, &mut price)?;
        rewards::emission_rate(
            &env,
            usd,
            config.target_yield_bps,
            config.blocks_per_year,
            Self::reward_decimals(&env),
            price,
        )
        .ok_or(ContractError::MathOverflow)
    }

    pub fn get_emission_config(env: Env) -> Result<EmissionConfig, ContractError> {
        Self::emission_config(&env)
    }

    /// Reward tokens held by the engine, owed or not.
    pub fn get_reserve_balance(env: Env) -> Result<i128, ContractError> {
        Self::reserve_balance(&env)
    }

    /// Rewards booked to pools and not yet paid out.
    pub fn get_total_owed(env: Env) -> i128 {
        Self::total_owed(&env)
    }

    pub fn get_admin(env: Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&ADMIN)
            .ok_or(ContractError::NotInitialized)
    }

    pub fn get_reward_token(env: Env) -> Result<Address, ContractError> {
        Self::reward_token(&env)
    }

    pub fn get_usd_oracle(env: Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&USD_ORACLE)
            .ok_or(ContractError::NotInitialized)
    }

    pub fn get_start_block(env: Env) -> u32 {
        env.storage().instance().get(&START_BLOCK).unwrap_or(0)
    }

    pub fn is_initialized(env: Env) -> bool {
        env.storage().instance().has(&ADMIN)
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn require_initialized(env: &Env) -> Result<(), ContractError> {
        if !env.storage().instance().has(&ADMIN) {
            return Err(ContractError::NotInitialized);
        }
        Ok(())
    }

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

    fn validate_config(config: &EmissionConfig) -> Result<(), ContractError> {
        if config.blocks_per_year == 0 || config.floor_rate < 0 {
            return Err(ContractError::InvalidInput);
        }
        Ok(())
    }

    fn emission_config(env: &Env) -> Result<EmissionConfig, ContractError> {
        env.storage()
            .instance()
            .get(&EMISSION)
            .ok_or(ContractError::NotInitialized)
    }

    fn reward_token(env: &Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&REWARD_TOKEN)
            .ok_or(ContractError::NotInitialized)
    }

    fn reward_decimals(env: &Env) -> u32 {
        env.storage().instance().get(&REWARD_DECIMALS).unwrap_or(0)
    }

    fn total_owed(env: &Env) -> i128 {
        env.storage().instance().get(&TOTAL_OWED).unwrap_or(0)
    }

    fn reserve_balance(env: &Env) -> Result<i128, ContractError> {
        let reward = token::Client::new(env, &Self::reward_token(env)?);
        Ok(reward.balance(&env.current_contract_address()))
    }

    /// Take `amount` off the owed total, never below zero.
    fn release_owed(env: &Env, amount: i128) {
        let owed = Self::total_owed(env).saturating_sub(amount).max(0);
        env.storage().instance().set(&TOTAL_OWED, &owed);
    }

    /// With nothing staked no position can claim what `pool` still has
    /// booked, so per-share rounding left over goes back to the free reserve.
    fn release_dust(env: &Env, pool: &mut StakePool) {
        if pool.total_deposited == 0 && pool.reward_owed > 0 {
            Self::release_owed(env, pool.reward_owed);
            pool.reward_owed = 0;
        }
    }

    /// Reward token price in USD from the configured oracle.
    fn reward_usd_price(env: &Env) -> Result<i128, ContractError> {
        let oracle: Address = env
            .storage()
            .instance()
            .get(&USD_ORACLE)
            .ok_or(ContractError::NotInitialized)?;
        match PriceSourceClient::new(env, &oracle).try_get_price() {
            Ok(Ok(price)) if price > 0 => Ok(price),
            _ => Err(ContractError::PriceUnavailable),
        }
    }

    /// Query the oracle at most once per invocation.
    fn cached_price(env: &Env, slot: &mut Option<i128>) -> Result<i128, ContractError> {
        if let Some(price) = *slot {
            return Ok(price);
        }
        let price = Self::reward_usd_price(env)?;
        *slot = Some(price);
        Ok(price)
    }

    fn usd_deposited(env: &Env, price: &mut Option<i128>) -> Result<i128, ContractError> {
        let decimals = Self::reward_decimals(env);
        let mut total: i128 = 0;
        for pool_id in 0..pools::pool_count(env) {
            let pool = pools::get_pool(env, pool_id).ok_or(ContractError::PoolNotFound)?;
            if pool.total_deposited == 0 {
                continue;
            }
            let reward_price = Self::cached_price(env, price)?;
            let window =
                valuation::price_window(env, &pool).ok_or(ContractError::PriceUnavailable)?;
            let value =
                valuation::pool_usd_value(env, &pool, &window.average, decimals, reward_price)
                    .ok_or(ContractError::MathOverflow)?;
            total = total.checked_add(value).ok_or(ContractError::MathOverflow)?;
        }
        Ok(total)
    }

    /// Rewards `pool` earns between its last update and `block` with the pair
    /// priced at `average`, capped by the unowed reserve.
    fn accrual(
        env: &Env,
        pool: &StakePool,
        block: u32,
        reward_price: i128,
        average: &U256,
    ) -> Result<i128, ContractError> {
        let config = Self::emission_config(env)?;
        let decimals = Self::reward_decimals(env);

        let usd = valuation::pool_usd_value(env, pool, average, decimals, reward_price)
            .ok_or(ContractError::MathOverflow)?;
        let rate = if usd == 0 {
            config.floor_rate
        } else {
            rewards::emission_rate(
                env,
                usd,
                config.target_yield_bps,
                config.blocks_per_year,
                decimals,
                reward_price,
            )
            .ok_or(ContractError::MathOverflow)?
        };

        let available = Self::reserve_balance(env)?
            .checked_sub(Self::total_owed(env))
            .ok_or(ContractError::MathOverflow)?;
        rewards::blocks_reward(block - pool.last_reward_block, rate, available)
            .ok_or(ContractError::MathOverflow)
    }

    fn update_pool_state(
        env: &Env,
        pool_id: u32,
        price: &mut Option<i128>,
    ) -> Result<StakePool, ContractError> {
        let mut pool = pools::get_pool(env, pool_id).ok_or(ContractError::PoolNotFound)?;
        let block = env.ledger().sequence();
        if block <= pool.last_reward_block {
            return Ok(pool);
        }

        let window = valuation::price_window(env, &pool).ok_or(ContractError::PriceUnavailable)?;
        if pool.total_deposited > 0 {
            let reward_price = Self::cached_price(env, price)?;
            let accrued = Self::accrual(env, &pool, block, reward_price, &window.average)?;
            let increment = rewards::acc_increment(env, accrued, pool.total_deposited)
                .ok_or(ContractError::MathOverflow)?;
            pool.acc_reward_per_share = pool
                .acc_reward_per_share
                .checked_add(increment)
                .ok_or(ContractError::MathOverflow)?;
            pool.reward_owed = pool
                .reward_owed
                .checked_add(accrued)
                .ok_or(ContractError::MathOverflow)?;

            let owed = Self::total_owed(env)
                .checked_add(accrued)
                .ok_or(ContractError::MathOverflow)?;
            env.storage().instance().set(&TOTAL_OWED, &owed);

            events::publish_pool_updated(env, pool_id, accrued, pool.acc_reward_per_share, block);
        }

        pool.price_cumulative = window.cumulative;
        pool.price_timestamp = window.timestamp;
        pool.price_average = window.average;
        pool.last_reward_block = block;
        pools::set_pool(env, pool_id, &pool);
        common::extend_instance_ttl(env);

        Ok(pool)
    }

    fn mass_update(env: &Env) -> Result<(), ContractError> {
        let mut price = None;
        for pool_id in 0..pools::pool_count(env) {
            Self::update_pool_state(env, pool_id, &mut price)?;
        }
        Ok(())
    }

    fn register_pool(env: &Env, pair: Address) -> Result<u32, ContractError> {
        if pools::is_registered(env, &pair) {
            return Err(ContractError::PoolAlreadyRegistered);
        }

        let reward_token = Self::reward_token(env)?;
        let pair_client = AccumulatorPoolClient::new(env, &pair);
        let share_token = pair_client.share_token();
        if share_token == reward_token {
            return Err(ContractError::TokensIdentical);
        }
        let reward_is_token_0 = if pair_client.token_0() == reward_token {
            true
        } else if pair_client.token_1() == reward_token {
            false
        } else {
            return Err(ContractError::InvalidPool);
        };

        // The first window is seeded with the spot price.
        let (reserve_0, reserve_1, _) = pair_client.get_reserves();
        let (reward_reserve, other_reserve) = if reward_is_token_0 {
            (reserve_0, reserve_1)
        } else {
            (reserve_1, reserve_0)
        };
        let price_average = if reward_reserve > 0 {
            math::encode_q112(env, other_reserve, reward_reserve)
                .ok_or(ContractError::MathOverflow)?
        } else {
            U256::from_u32(env, 0)
        };
        let price_cumulative = common::current_cumulative(env, &pair, reward_is_token_0)
            .ok_or(ContractError::MathOverflow)?;

        let start_block: u32 = env.storage().instance().get(&START_BLOCK).unwrap_or(0);
        let pool = StakePool {
            pair: pair.clone(),
            share_token: share_token.clone(),
            acc_reward_per_share: 0,
            last_reward_block: env.ledger().sequence().max(start_block),
            total_deposited: 0,
            reward_is_token_0,
            reward_owed: 0,
            price_cumulative,
            price_timestamp: env.ledger().timestamp(),
            price_average,
        };
        let pool_id = pools::push_pool(env, &pool);

        events::publish_pool_added(env, pool_id, pair, share_token);

        Ok(pool_id)
    }

    /// Bring `pool_id` up to date, pay `staker` what is pending and move
    /// `stake_delta` share tokens in (positive) or out (negative).
    ///
    /// Returns the amount paid and the updated pool.
    fn settle(
        env: &Env,
        staker: &Address,
        pool_id: u32,
        stake_delta: i128,
    ) -> Result<(i128, StakePool), ContractError> {
        let mut pool = Self::update_pool_state(env, pool_id, &mut None)?;
        let mut position = pools::get_position(env, pool_id, staker);

        let paid = rewards::pending(
            env,
            position.deposited,
            pool.acc_reward_per_share,
            position.reward_debt,
        )
        .ok_or(ContractError::MathOverflow)?;
        if paid > 0 {
            Self::release_owed(env, paid);
            pool.reward_owed = pool.reward_owed.saturating_sub(paid).max(0);
            token::Client::new(env, &Self::reward_token(env)?).transfer(
                &env.current_contract_address(),
                staker,
                &paid,
            );
            events::publish_harvested(env, pool_id, staker.clone(), paid);
        }

        if stake_delta != 0 {
            position.deposited = position
                .deposited
                .checked_add(stake_delta)
                .ok_or(ContractError::MathOverflow)?;
            if position.deposited < 0 {
                return Err(ContractError::InsufficientBalance);
            }
            pool.total_deposited = pool
                .total_deposited
                .checked_add(stake_delta)
                .ok_or(ContractError::MathOverflow)?;

            let share = token::Client::new(env, &pool.share_token);
            let contract = env.current_contract_address();
            if stake_delta > 0 {
                share.transfer(staker, &contract, &stake_delta);
            } else {
                share.transfer(&contract, staker, &-stake_delta);
            }
            Self::release_dust(env, &mut pool);
        }
        pools::set_pool(env, pool_id, &pool);

        position.reward_debt =
            rewards::accumulated(env, position.deposited, pool.acc_reward_per_share)
                .ok_or(ContractError::MathOverflow)?;
        pools::set_position(env, pool_id, staker, &position);

        Ok((paid, pool))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
