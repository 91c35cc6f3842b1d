use soroban_sdk::{contractclient, Address, Env, U256};

use crate::math;

/// Anything that can quote a price with [`PRICE_DECIMALS`](crate::PRICE_DECIMALS)
/// decimals.
///
/// Implemented by the TWAP oracle, the chained USD oracle and the pushed
/// reference feed, so consumers can swap one for another at construction.
/// A source that cannot produce a price must fail the invocation; callers use
/// `try_get_price` to map that into their own error.
#[contractclient(name = "PriceSourceClient")]
pub trait PriceSource {
    fn get_price(env: Env) -> i128;
}

/// Read surface of a two-asset pool that keeps cumulative-price accumulators.
///
/// Accumulators are UQ112.112 prices multiplied by elapsed seconds and never
/// decrease. `price_0_cumulative_last` tracks token_1 per token_0.
#[contractclient(name = "AccumulatorPoolClient")]
pub trait AccumulatorPool {
    fn token_0(env: Env) -> Address;
    fn token_1(env: Env) -> Address;
    fn share_token(env: Env) -> Address;
    fn total_shares(env: Env) -> i128;
    fn get_reserves(env: Env) -> (i128, i128, u64);
    fn price_0_cumulative_last(env: Env) -> U256;
    fn price_1_cumulative_last(env: Env) -> U256;
}

/// `pool`'s accumulator for one side, extrapolated to the current ledger
/// timestamp with the current reserves when the pool has not been touched yet
/// this second.
///
/// With `base_is_token_0` the result tracks token_1 per token_0. A trade
/// earlier in the same second has already folded the previous reserves in,
/// so it does not move the value returned.
pub fn current_cumulative(env: &Env, pool: &Address, base_is_token_0: bool) -> Option<U256> {
    let pool = AccumulatorPoolClient::new(env, pool);
    let (reserve_0, reserve_1, last) = pool.get_reserves();
    let cumulative = if base_is_token_0 {
        pool.price_0_cumulative_last()
    } else {
        pool.price_1_cumulative_last()
    };

    let now = env.ledger().timestamp();
    if last >= now || reserve_0 == 0 || reserve_1 == 0 {
        return Some(cumulative);
    }

    let spot = if base_is_token_0 {
        math::encode_q112(env, reserve_1, reserve_0)
    } else {
        math::encode_q112(env, reserve_0, reserve_1)
    }?;
    let elapsed = U256::from_u128(env, (now - last) as u128);

    Some(cumulative.add(&math::checked_mul(env, &spot, &elapsed)?))
}
