//! Fixed-point helpers.
//!
//! Intermediate products are taken in `U256` so that `i128` token amounts can
//! be multiplied together before dividing. Every helper returns `None` instead
//! of truncating or trapping when a result does not fit, or when a
//! denominator is zero; callers map that to their own overflow error.

use soroban_sdk::{Env, U256};

use crate::PRICE_DECIMALS;

/// Fractional bits of the UQ112.112 prices stored in pool accumulators.
pub const Q112_BITS: u32 = 112;

/// Widen a non-negative `i128`.
pub fn to_u256(env: &Env, value: i128) -> Option<U256> {
    if value < 0 {
        return None;
    }
    Some(U256::from_u128(env, value as u128))
}

/// Narrow back to `i128`, failing on anything above `i128::MAX`.
pub fn to_i128(value: &U256) -> Option<i128> {
    value.to_u128().and_then(|v| i128::try_from(v).ok())
}

pub fn pow10(env: &Env, exp: u32) -> U256 {
    U256::from_u32(env, 10).pow(exp)
}

fn is_zero(env: &Env, value: &U256) -> bool {
    *value == U256::from_u32(env, 0)
}

/// `numerator / denominator`, rounding half up.
pub fn div_round(env: &Env, numerator: &U256, denominator: &U256) -> Option<U256> {
    if is_zero(env, denominator) {
        return None;
    }
    let half = denominator.shr(1);
    Some(numerator.add(&half).div(denominator))
}

/// `a * b / c` with a 256-bit intermediate, rounding down.
pub fn mul_div(env: &Env, a: i128, b: i128, c: i128) -> Option<i128> {
    if c <= 0 {
        return None;
    }
    let product = to_u256(env, a)?.mul(&to_u256(env, b)?);
    to_i128(&product.div(&to_u256(env, c)?))
}

/// `numerator / denominator` as a UQ112.112 value.
pub fn encode_q112(env: &Env, numerator: i128, denominator: i128) -> Option<U256> {
    if denominator <= 0 {
        return None;
    }
    let shifted = to_u256(env, numerator)?.shl(Q112_BITS);
    Some(shifted.div(&to_u256(env, denominator)?))
}

/// Quote per one whole base token implied by the reserves, scaled to
/// [`PRICE_DECIMALS`]. An empty side yields zero.
pub fn spot_price(
    env: &Env,
    reserve_base: i128,
    reserve_quote: i128,
    base_decimals: u32,
    quote_decimals: u32,
) -> Option<i128> {
    if reserve_base == 0 || reserve_quote == 0 {
        return Some(0);
    }
    let numerator = to_u256(env, reserve_quote)?.mul(&pow10(env, PRICE_DECIMALS + base_decimals));
    let denominator = to_u256(env, reserve_base)?.mul(&pow10(env, quote_decimals));
    to_i128(&div_round(env, &numerator, &denominator)?)
}

/// `a * b`, or `None` when the product does not fit in 256 bits.
pub fn checked_mul(env: &Env, a: &U256, b: &U256) -> Option<U256> {
    if is_zero(env, b) {
        return Some(U256::from_u32(env, 0));
    }
    let max = U256::from_parts(env, u64::MAX, u64::MAX, u64::MAX, u64::MAX);
    if *a > max.div(b) {
        return None;
    }
    Some(a.mul(b))
}

/// Time-weighted average over `elapsed` seconds of an accumulator delta,
/// converted from UQ112.112 raw units to [`PRICE_DECIMALS`] whole-token units.
///
/// Deltas too large to rescale directly are averaged per second first.
pub fn average_price(
    env: &Env,
    delta: &U256,
    elapsed: u64,
    base_decimals: u32,
    quote_decimals: u32,
) -> Option<i128> {
    if elapsed == 0 {
        return None;
    }
    let scale = pow10(env, PRICE_DECIMALS + base_decimals);
    let quote_unit = pow10(env, quote_decimals).shl(Q112_BITS);
    let elapsed = U256::from_u128(env, elapsed as u128);

    let average = match checked_mul(env, delta, &scale) {
        Some(numerator) => div_round(env, &numerator, &quote_unit.mul(&elapsed))?,
        None => {
            let per_second = delta.div(&elapsed);
            div_round(env, &checked_mul(env, &per_second, &scale)?, &quote_unit)?
        }
    };
    to_i128(&average)
}

/// UQ112.112 mean of an accumulator between two snapshots.
pub fn average_q112(env: &Env, from: &U256, to: &U256, elapsed: u64) -> Option<U256> {
    if elapsed == 0 || to < from {
        return None;
    }
    Some(to.sub(from).div(&U256::from_u128(env, elapsed as u128)))
}

/// Reward-side reserve a constant-product pair would hold if it traded at
/// `price`, the UQ112.112 amount of the other asset per reward token.
///
/// Derived from the invariant `k = reward * other` alone, so moving the
/// reserves along the curve leaves it unchanged. Zero when the pair or the
/// price is empty.
pub fn fair_reserve(
    env: &Env,
    reserve_reward: i128,
    reserve_other: i128,
    price: &U256,
) -> Option<i128> {
    if reserve_reward <= 0 || reserve_other <= 0 || is_zero(env, price) {
        return Some(0);
    }
    let other_in_reward = to_u256(env, reserve_other)?.shl(Q112_BITS).div(price);
    let product = checked_mul(env, &to_u256(env, reserve_reward)?, &other_in_reward)?;
    to_i128(&isqrt_u256(env, &product))
}

/// Integer square root of a `U256`, rounded down.
pub fn isqrt_u256(env: &Env, value: &U256) -> U256 {
    let one = U256::from_u32(env, 1);
    if *value <= one {
        return value.clone();
    }
    if *value < U256::from_u32(env, 4) {
        return one;
    }
    let mut x = value.clone();
    let mut y = value.shr(1).add(&one);
    while y < x {
        x = y;
        y = x.add(&value.div(&x)).shr(1);
    }
    x
}

/// Integer square root, rounded down.
pub fn isqrt(value: u128) -> u128 {
    if value == 0 {
        return 0;
    }
    if value < 4 {
        return 1;
    }
    let mut x = value;
    let mut y = value / 2 + 1;
    while y < x {
        x = y;
        y = (x + value / x) / 2;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_survives_i128_overflowing_products() {
        let env = Env::default();
        // 2.5e20 * 5.6e18 overflows i128 on its own.
        let reserve = 250_000_000_000_000_000_000i128;
        let shares = 5_600_000_000_000_000_000i128;
        let total = 11_200_000_000_000_000_000i128;
        assert_eq!(mul_div(&env, reserve, shares, total), Some(reserve / 2));
    }

    #[test]
    fn mul_div_rejects_bad_operands() {
        let env = Env::default();
        assert_eq!(mul_div(&env, 1, 1, 0), None);
        assert_eq!(mul_div(&env, -1, 1, 1), None);
        assert_eq!(mul_div(&env, i128::MAX, 4, 2), None);
    }

    #[test]
    fn spot_price_rescales_decimals() {
        let env = Env::default();
        // 0.0001 WETH (18 dec) against 0.2 USDC (6 dec) = 2000 USDC per WETH.
        let price = spot_price(&env, 100_000_000_000_000, 200_000, 18, 6);
        assert_eq!(price, Some(2_000 * 100_000_000));

        // 250 AVA against 0.5 WETH = 0.002 WETH per AVA.
        let price = spot_price(
            &env,
            250_000_000_000_000_000_000,
            500_000_000_000_000_000,
            18,
            18,
        );
        assert_eq!(price, Some(200_000));
    }

    #[test]
    fn spot_price_of_empty_pool_is_zero() {
        let env = Env::default();
        assert_eq!(spot_price(&env, 0, 1_000, 7, 7), Some(0));
    }

    #[test]
    fn average_of_constant_price_equals_spot() {
        let env = Env::default();
        let q = encode_q112(&env, 5_000_000, 2_500_000_000).unwrap();
        let elapsed = 3_600u64;
        let delta = q.mul(&U256::from_u32(&env, elapsed as u32));
        assert_eq!(average_price(&env, &delta, elapsed, 7, 7), Some(200_000));
    }

    #[test]
    fn average_price_needs_elapsed_time() {
        let env = Env::default();
        let delta = U256::from_u32(&env, 1);
        assert_eq!(average_price(&env, &delta, 0, 7, 7), None);
    }

    #[test]
    fn average_price_of_huge_delta_does_not_trap() {
        let env = Env::default();
        // 2^28 WETH per AVA held for u64::MAX seconds: rescaling the raw
        // delta by 10^26 would overflow 256 bits.
        let elapsed = u64::MAX;
        let price = U256::from_u32(&env, 1).shl(140);
        let delta = price.mul(&U256::from_u128(&env, elapsed as u128));
        assert_eq!(
            average_price(&env, &delta, elapsed, 18, 18),
            Some(26_843_545_600_000_000)
        );

        // Too large even per second.
        let delta = U256::from_u32(&env, 1).shl(250);
        assert_eq!(average_price(&env, &delta, 1, 18, 18), None);
    }

    #[test]
    fn checked_mul_detects_overflow() {
        let env = Env::default();
        let big = U256::from_u32(&env, 1).shl(200);
        let zero = U256::from_u32(&env, 0);
        assert_eq!(checked_mul(&env, &big, &zero), Some(zero.clone()));
        assert_eq!(
            checked_mul(&env, &big, &U256::from_u32(&env, 8)),
            Some(U256::from_u32(&env, 1).shl(203))
        );
        assert_eq!(checked_mul(&env, &big, &big), None);
    }

    #[test]
    fn fair_reserve_ignores_moves_along_the_curve() {
        let env = Env::default();
        // 0.002 WETH per AVA.
        let price = encode_q112(&env, 5_000_000_000, 2_500_000_000_000).unwrap();
        assert_eq!(
            fair_reserve(&env, 2_500_000_000_000, 5_000_000_000, &price),
            Some(2_500_000_000_000)
        );

        // Same k, AVA side quadrupled by a trade: fair value is unchanged.
        assert_eq!(
            fair_reserve(&env, 10_000_000_000_000, 1_250_000_000, &price),
            Some(2_500_000_000_000)
        );

        assert_eq!(fair_reserve(&env, 0, 5_000_000_000, &price), Some(0));
        let zero = U256::from_u32(&env, 0);
        assert_eq!(fair_reserve(&env, 1_000, 1_000, &zero), Some(0));
    }

    #[test]
    fn average_q112_rejects_regressions() {
        let env = Env::default();
        let low = U256::from_u32(&env, 100);
        let high = U256::from_u32(&env, 1_100);
        assert_eq!(average_q112(&env, &low, &high, 10), Some(U256::from_u32(&env, 100)));
        assert_eq!(average_q112(&env, &high, &low, 10), None);
        assert_eq!(average_q112(&env, &low, &high, 0), None);
    }

    #[test]
    fn isqrt_u256_matches_narrow_isqrt() {
        let env = Env::default();
        for value in [0u128, 1, 2, 3, 4, 8, 9, 12_500_000_000_000_000_000_000] {
            let wide = isqrt_u256(&env, &U256::from_u128(&env, value));
            assert_eq!(wide, U256::from_u128(&env, isqrt(value)));
        }
        // (2^100)^2
        let square = U256::from_u32(&env, 1).shl(200);
        assert_eq!(isqrt_u256(&env, &square), U256::from_u32(&env, 1).shl(100));
    }

    #[test]
    fn isqrt_rounds_down() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(3), 1);
        assert_eq!(isqrt(8), 2);
        assert_eq!(isqrt(9), 3);
        assert_eq!(isqrt(12_500_000_000_000_000_000_000), 111_803_398_874);
    }
}
