//! USD value of staked pair shares.
//!
//! A share of a constant-product pair is worth twice its slice of the
//! reward-token reserve. That reserve is not read off the pair as is: it is
//! rebuilt from the pair's invariant and the mean price since the pool was
//! last updated, so skewing the reserves with a trade right before an update
//! does not inflate the value.

use common::math;
use common::AccumulatorPoolClient;
use soroban_sdk::{Env, U256};

use crate::pools::StakePool;

/// Accumulator snapshot closing the window opened by the pool's stored one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriceWindow {
    pub cumulative: U256,
    pub timestamp: u64,
    /// UQ112.112 other asset per reward token, averaged over the window.
    pub average: U256,
}

/// Close the pool's price window at the current ledger timestamp.
///
/// Inside the second the window was last closed, the stored average is reused.
/// `None` when the pair's accumulator went backwards or overflowed.
pub fn price_window(env: &Env, pool: &StakePool) -> Option<PriceWindow> {
    let now = env.ledger().timestamp();
    if now <= pool.price_timestamp {
        return Some(PriceWindow {
            cumulative: pool.price_cumulative.clone(),
            timestamp: pool.price_timestamp,
            average: pool.price_average.clone(),
        });
    }

    let cumulative = common::current_cumulative(env, &pool.pair, pool.reward_is_token_0)?;
    let average = math::average_q112(
        env,
        &pool.price_cumulative,
        &cumulative,
        now - pool.price_timestamp,
    )?;
    Some(PriceWindow {
        cumulative,
        timestamp: now,
        average,
    })
}

/// USD value (8 decimals) of everything staked in `pool`, with the pair
/// priced at `average`.
///
/// Empty pools are worth zero without touching the pair.
pub fn pool_usd_value(
    env: &Env,
    pool: &StakePool,
    average: &U256,
    reward_decimals: u32,
    reward_price: i128,
) -> Option<i128> {
    if pool.total_deposited == 0 {
        return Some(0);
    }
    let pair = AccumulatorPoolClient::new(env, &pool.pair);
    let total_shares = pair.total_shares();
    if total_shares <= 0 {
        return Some(0);
    }

    let (reserve_0, reserve_1, _) = pair.get_reserves();
    let (reward_reserve, other_reserve) = if pool.reward_is_token_0 {
        (reserve_0, reserve_1)
    } else {
        (reserve_1, reserve_0)
    };
    let fair_reward_reserve = math::fair_reserve(env, reward_reserve, other_reserve, average)?;

    let reward_side = math::mul_div(env, pool.total_deposited, fair_reward_reserve, total_shares)?;
    let one_token = 10i128.checked_pow(reward_decimals)?;
    math::mul_div(env, reward_side.checked_mul(2)?, reward_price, one_token)
}
