//! Reward-per-share bookkeeping and the yield-targeting emission formula.
//!
//! Everything here is arithmetic on plain integers; storage and token
//! movements stay in the contract. Helpers return `None` on overflow or an
//! unusable denominator and the contract maps that to `MathOverflow`.

use common::math;
use soroban_sdk::Env;

/// Fixed-point scale of `acc_reward_per_share`.
pub const ACC_PRECISION: i128 = 1_000_000_000_000_000_000;

pub const BPS_DENOMINATOR: i128 = 10_000;

/// Reward tokens per block that pay `target_yield_bps` a year on
/// `usd_value` worth of stake.
///
/// `rate = usd_value · bps · 10^reward_decimals / (10_000 · blocks_per_year · reward_price)`
///
/// `usd_value` and `reward_price` both carry [`common::PRICE_DECIMALS`], so
/// the result is in raw reward-token units.
pub fn emission_rate(
    env: &Env,
    usd_value: i128,
    target_yield_bps: u32,
    blocks_per_year: u32,
    reward_decimals: u32,
    reward_price: i128,
) -> Option<i128> {
    if reward_price <= 0 || blocks_per_year == 0 {
        return None;
    }
    let scale = 10i128
        .checked_pow(reward_decimals)?
        .checked_mul(target_yield_bps as i128)?;
    let denominator = BPS_DENOMINATOR
        .checked_mul(blocks_per_year as i128)?
        .checked_mul(reward_price)?;
    math::mul_div(env, usd_value, scale, denominator)
}

/// Rewards for `blocks` at `rate`, never more than `available`.
pub fn blocks_reward(blocks: u32, rate: i128, available: i128) -> Option<i128> {
    if rate < 0 {
        return None;
    }
    let full = (blocks as i128).checked_mul(rate)?;
    Some(full.min(available.max(0)))
}

/// Increase of `acc_reward_per_share` when `accrued` is spread over
/// `total_deposited`.
pub fn acc_increment(env: &Env, accrued: i128, total_deposited: i128) -> Option<i128> {
    math::mul_div(env, accrued, ACC_PRECISION, total_deposited)
}

/// Rewards earned by `deposited` since the accumulator was zero. Stored as
/// the position's `reward_debt` after every settlement.
pub fn accumulated(env: &Env, deposited: i128, acc_reward_per_share: i128) -> Option<i128> {
    math::mul_div(env, deposited, acc_reward_per_share, ACC_PRECISION)
}

/// Unpaid rewards of a position.
pub fn pending(
    env: &Env,
    deposited: i128,
    acc_reward_per_share: i128,
    reward_debt: i128,
) -> Option<i128> {
    let total = accumulated(env, deposited, acc_reward_per_share)?;
    Some(total.checked_sub(reward_debt)?.max(0))
}
