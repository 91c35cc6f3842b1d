extern crate std;

use soroban_sdk::testutils::{ContractEvents, Events};
use soroban_sdk::{xdr, TryFromVal, Val, Vec};
use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Ledger as _},
    Address, Env, IntoVal,
};

use crate::events::PriceSetEvent;
use crate::{ContractError, ReferenceFeedContract, ReferenceFeedContractClient};

fn setup(max_age: u64) -> (Env, ReferenceFeedContractClient<'static>, Address) {
    let env = Env::default();
    env.mock_all_auths();

    let contract_id = env.register(ReferenceFeedContract, ());
    let client = ReferenceFeedContractClient::new(&env, &contract_id);

    let admin = Address::generate(&env);
    client.initialize(&admin, &max_age);

    (env, client, admin)
}

#[test]
fn test_price_unavailable_before_first_push() {
    let (_env, client, _admin) = setup(0);

    let result = client.try_get_price();
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::PriceUnavailable),
        _ => unreachable!("Expected PriceUnavailable error"),
    }
}

#[test]
fn test_admin_push_is_readable() {
    let (env, client, admin) = setup(0);

    env.ledger().set_timestamp(42);
    client.set_price(&admin, &200_000_000_000);

    assert_eq!(client.get_price(), 200_000_000_000);
    let record = client.get_record().unwrap();
    assert_eq!(record.updated_at, 42);
}

#[test]
fn test_push_emits_price_set_event() {
    let (env, client, admin) = setup(0);

    env.ledger().set_timestamp(42);
    client.set_price(&admin, &200_000_000_000);

    let events = env.events().all();
    let event = last_event(&env, &events);
    assert_eq!(
        event.1,
        (symbol_short!("FEED_SET"), admin.clone()).into_val(&env)
    );
    let payload: PriceSetEvent = event.2.into_val(&env);
    assert_eq!(
        payload,
        PriceSetEvent {
            admin,
            price: 200_000_000_000,
            timestamp: 42,
        }
    );
}

#[test]
fn test_non_admin_push_fails() {
    let (env, client, _admin) = setup(0);

    let intruder = Address::generate(&env);
    let result = client.try_set_price(&intruder, &1);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::Unauthorized),
        _ => unreachable!("Expected Unauthorized error"),
    }
}

#[test]
fn test_non_positive_price_rejected() {
    let (_env, client, admin) = setup(0);

    let result = client.try_set_price(&admin, &0);
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::InvalidInput),
        _ => unreachable!("Expected InvalidInput error"),
    }
}

#[test]
fn test_stale_price_fails_loudly() {
    let (env, client, admin) = setup(3_600);

    env.ledger().set_timestamp(1_000);
    client.set_price(&admin, &100_000_000);

    env.ledger().set_timestamp(4_600);
    assert_eq!(client.get_price(), 100_000_000);

    env.ledger().set_timestamp(4_601);
    let result = client.try_get_price();
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::StalePrice),
        _ => unreachable!("Expected StalePrice error"),
    }

    // Lifting the bound makes it readable again.
    client.set_max_age(&admin, &0);
    assert_eq!(client.get_price(), 100_000_000);
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
