extern crate std;

use common::math;
use soroban_sdk::testutils::{ContractEvents, Events};
use soroban_sdk::{xdr, TryFromVal, Val, Vec};
use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Ledger as _},
    token::{Client as TokenClient, StellarAssetClient},
    Address, Env, IntoVal, U256,
};

use crate::events::{DepositedEvent, SwappedEvent, WithdrawnEvent};
use crate::{ContractError, LiquidityPoolContract, LiquidityPoolContractClient, MINIMUM_LIQUIDITY};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Two SAC tokens, a pool, and a share token administered by the pool.
fn setup() -> (
    Env,
    LiquidityPoolContractClient<'static>,
    Address, // token_0
    Address, // token_1
    Address, // share token
) {
    let env = Env::default();
    env.mock_all_auths();

    let token_0 = env
        .register_stellar_asset_contract_v2(Address::generate(&env))
        .address();
    let token_1 = env
        .register_stellar_asset_contract_v2(Address::generate(&env))
        .address();

    let pool_id = env.register(LiquidityPoolContract, ());
    let share_token = env
        .register_stellar_asset_contract_v2(pool_id.clone())
        .address();

    let client = LiquidityPoolContractClient::new(&env, &pool_id);
    client.initialize(&token_0, &token_1, &share_token);

    (env, client, token_0, token_1, share_token)
}

fn funded_provider(env: &Env, token_0: &Address, token_1: &Address) -> Address {
    let provider = Address::generate(env);
    StellarAssetClient::new(env, token_0).mint(&provider, &100_000_000_000);
    StellarAssetClient::new(env, token_1).mint(&provider, &100_000_000_000_000);
    provider
}

// ── Initialisation ────────────────────────────────────────────────────────────

#[test]
fn test_initialize_twice_fails() {
    let (_env, client, token_0, token_1, share) = setup();

    let result = client.try_initialize(&token_0, &token_1, &share);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::AlreadyInitialized),
        _ => unreachable!("Expected AlreadyInitialized error"),
    }
}

#[test]
fn test_identical_tokens_rejected() {
    let env = Env::default();
    let token = Address::generate(&env);
    let share = Address::generate(&env);
    let client =
        LiquidityPoolContractClient::new(&env, &env.register(LiquidityPoolContract, ()));

    let result = client.try_initialize(&token, &token, &share);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::TokensIdentical),
        _ => unreachable!("Expected TokensIdentical error"),
    }
}

// ── Liquidity ─────────────────────────────────────────────────────────────────

#[test]
fn test_first_deposit_locks_minimum_liquidity() {
    let (env, client, token_0, token_1, share) = setup();
    let provider = funded_provider(&env, &token_0, &token_1);

    // sqrt(5_000_000 × 2_500_000_000) = 111_803_398
    let shares = client.deposit(&provider, &5_000_000, &2_500_000_000);

    assert_eq!(shares, 111_803_398 - MINIMUM_LIQUIDITY);
    assert_eq!(client.total_shares(), 111_803_398);
    assert_eq!(TokenClient::new(&env, &share).balance(&provider), shares);

    let (reserve_0, reserve_1, _) = client.get_reserves();
    assert_eq!(reserve_0, 5_000_000);
    assert_eq!(reserve_1, 2_500_000_000);
}

#[test]
fn test_withdraw_returns_pro_rata_reserves() {
    let (env, client, token_0, token_1, share) = setup();
    let provider = funded_provider(&env, &token_0, &token_1);
    let shares = client.deposit(&provider, &5_000_000, &2_500_000_000);

    let (out_0, out_1) = client.withdraw(&provider, &(shares / 2));

    assert_eq!(out_0, 2_499_977);
    assert_eq!(out_1, 1_249_988_819);
    assert_eq!(
        TokenClient::new(&env, &share).balance(&provider),
        shares - shares / 2
    );
}

#[test]
fn test_zero_deposit_rejected() {
    let (env, client, token_0, token_1, _) = setup();
    let provider = funded_provider(&env, &token_0, &token_1);

    let result = client.try_deposit(&provider, &0, &1_000);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::InvalidInput),
        _ => unreachable!("Expected InvalidInput error"),
    }
}

// ── Swaps ─────────────────────────────────────────────────────────────────────

#[test]
fn test_swap_applies_fee_and_moves_reserves() {
    let (env, client, token_0, token_1, _) = setup();
    let provider = funded_provider(&env, &token_0, &token_1);
    client.deposit(&provider, &5_000_000, &2_500_000_000);

    let out = client.swap(&provider, &token_0, &1_000_000, &0);

    // 1_000_000 × 0.997 × 2.5e9 / (5e6 + 997_000)
    assert_eq!(out, 415_624_478);
    let (reserve_0, reserve_1, _) = client.get_reserves();
    assert_eq!(reserve_0, 6_000_000);
    assert_eq!(reserve_1, 2_500_000_000 - out);
}

#[test]
fn test_liquidity_and_swap_events() {
    let (env, client, token_0, token_1, _) = setup();
    let provider = funded_provider(&env, &token_0, &token_1);
    env.ledger().set_timestamp(500);

    let shares = client.deposit(&provider, &5_000_000, &2_500_000_000);
    let events = env.events().all();
    let event = last_event(&env, &events);
    assert_eq!(
        event.1,
        (symbol_short!("LP_DEP"), provider.clone()).into_val(&env)
    );
    let payload: DepositedEvent = event.2.into_val(&env);
    assert_eq!(
        payload,
        DepositedEvent {
            provider: provider.clone(),
            amount_0: 5_000_000,
            amount_1: 2_500_000_000,
            shares,
            timestamp: 500,
        }
    );

    let out = client.swap(&provider, &token_0, &1_000_000, &0);
    let events = env.events().all();
    let event = last_event(&env, &events);
    assert_eq!(
        event.1,
        (symbol_short!("SWAP"), provider.clone()).into_val(&env)
    );
    let payload: SwappedEvent = event.2.into_val(&env);
    assert_eq!(payload.token_in, token_0);
    assert_eq!(payload.amount_in, 1_000_000);
    assert_eq!(payload.amount_out, out);
    assert_eq!(payload.timestamp, 500);

    let (out_0, out_1) = client.withdraw(&provider, &shares);
    let events = env.events().all();
    let event = last_event(&env, &events);
    assert_eq!(
        event.1,
        (symbol_short!("LP_WD"), provider.clone()).into_val(&env)
    );
    let payload: WithdrawnEvent = event.2.into_val(&env);
    assert_eq!(
        payload,
        WithdrawnEvent {
            provider,
            amount_0: out_0,
            amount_1: out_1,
            shares,
            timestamp: 500,
        }
    );
}

#[test]
fn test_swap_slippage_guard() {
    let (env, client, token_0, token_1, _) = setup();
    let provider = funded_provider(&env, &token_0, &token_1);
    client.deposit(&provider, &5_000_000, &2_500_000_000);

    let result = client.try_swap(&provider, &token_0, &1_000_000, &500_000_000);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::SlippageExceeded),
        _ => unreachable!("Expected SlippageExceeded error"),
    }
}

#[test]
fn test_swap_unknown_token_rejected() {
    let (env, client, token_0, token_1, _) = setup();
    let provider = funded_provider(&env, &token_0, &token_1);
    client.deposit(&provider, &5_000_000, &2_500_000_000);

    let stranger = Address::generate(&env);
    let result = client.try_swap(&provider, &stranger, &1_000, &0);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::InvalidInput),
        _ => unreachable!("Expected InvalidInput error"),
    }
}

// ── Accumulators ──────────────────────────────────────────────────────────────

#[test]
fn test_accumulators_advance_with_elapsed_time() {
    let (env, client, token_0, token_1, _) = setup();
    let provider = funded_provider(&env, &token_0, &token_1);

    env.ledger().set_timestamp(1_000);
    client.deposit(&provider, &5_000_000, &2_500_000_000);
    assert_eq!(client.price_0_cumulative_last(), U256::from_u32(&env, 0));

    // The next reserve change folds in 100 s at the deposit-time price.
    env.ledger().set_timestamp(1_100);
    client.swap(&provider, &token_0, &1_000, &0);

    let hundred = U256::from_u32(&env, 100);
    let expected_0 = math::encode_q112(&env, 2_500_000_000, 5_000_000)
        .unwrap()
        .mul(&hundred);
    let expected_1 = math::encode_q112(&env, 5_000_000, 2_500_000_000)
        .unwrap()
        .mul(&hundred);
    assert_eq!(client.price_0_cumulative_last(), expected_0);
    assert_eq!(client.price_1_cumulative_last(), expected_1);
    assert_eq!(client.get_reserves().2, 1_100);
}

#[test]
fn test_same_timestamp_changes_do_not_accumulate() {
    let (env, client, token_0, token_1, _) = setup();
    let provider = funded_provider(&env, &token_0, &token_1);

    env.ledger().set_timestamp(500);
    client.deposit(&provider, &5_000_000, &2_500_000_000);
    client.swap(&provider, &token_0, &1_000_000, &0);
    client.swap(&provider, &token_1, &1_000_000, &0);

    assert_eq!(client.price_0_cumulative_last(), U256::from_u32(&env, 0));
    assert_eq!(client.price_1_cumulative_last(), U256::from_u32(&env, 0));
}

/// Returns the most recent contract event as a `(contract, topics, data)`
/// tuple, adapting the SDK's XDR-based `ContractEvents`.
fn last_event(env: &Env, events: &ContractEvents) -> (Address, Vec<Val>, Val) {
    let event = events.events().last().unwrap();
    let xdr::ContractEventBody::V0(body) = &event.body;
    let contract = Address::try_from_val(
        env,
        &xdr::ScAddress::Contract(event.contract_id.clone().unwrap()),
    )
    .unwrap();
    let mut topics = Vec::new(env);
    for topic in body.topics.iter() {
        topics.push_back(Val::try_from_val(env, topic).unwrap());
    }
    let data = Val::try_from_val(env, &body.data).unwrap();
    (contract, topics, data)
}
