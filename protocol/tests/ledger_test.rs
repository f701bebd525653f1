//! Integration tests for the Strongbox ledger.
//!
//! These drive `MemoryLedger` only through its public surface: the `Ledger`
//! trait, the capability types it hands out, and the state root. Each test
//! builds its own ledger.

use proptest::prelude::*;

use strongbox_protocol::coin::{CoinCapabilities, CoinType};
use strongbox_protocol::config::LedgerConfig;
use strongbox_protocol::identity::AccountAddress;
use strongbox_protocol::ledger::{Ledger, LedgerError, MemoryLedger};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const USERS: [&str; 3] = ["alice", "bob", "carol"];

fn addr(name: &str) -> AccountAddress {
    AccountAddress::from_name(name)
}

/// A ledger with three registered users and one supply-monitored coin.
fn setup() -> (MemoryLedger, CoinType, CoinCapabilities) {
    let mut ledger = MemoryLedger::new();
    let issuer = addr("issuer");
    ledger.create_account(issuer).unwrap();
    let coin = CoinType::new(issuer, "test_coin", "TestCoin");
    let caps = ledger
        .initialize_coin(&issuer, coin.clone(), "Test Coin", "TST", 8, true)
        .unwrap();
    for name in USERS {
        ledger.create_account(addr(name)).unwrap();
        ledger.register(&addr(name), &coin).unwrap();
    }
    (ledger, coin, caps)
}

fn total_held(ledger: &MemoryLedger, coin: &CoinType) -> u128 {
    ledger
        .state()
        .holdings()
        .filter(|(_, c, _)| *c == coin)
        .map(|(_, _, store)| u128::from(store.balance))
        .sum()
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn coin_lifecycle_mint_transfer_freeze_burn() {
    let (mut ledger, coin, caps) = setup();
    let (alice, bob) = (addr("alice"), addr("bob"));

    ledger.mint(&caps.mint, &alice, 10_000).unwrap();
    ledger.transfer(&coin, &alice, &bob, 2_500).unwrap();
    ledger.set_frozen(&caps.freeze, &bob, true).unwrap();

    let err = ledger.transfer(&coin, &bob, &alice, 1).unwrap_err();
    assert!(matches!(err, LedgerError::AccountFrozen { .. }));

    ledger.burn_from(&caps.burn, &bob, 2_500).unwrap();
    assert_eq!(ledger.balance_of(&bob, &coin).unwrap(), 0);
    assert_eq!(ledger.supply(&coin).unwrap(), Some(7_500));
    assert_eq!(total_held(&ledger, &coin), 7_500);
}

#[test]
fn coin_info_reports_metadata() {
    let (ledger, coin, _caps) = setup();
    let info = ledger.coin_info(&coin).unwrap();
    assert_eq!(info.symbol, "TST");
    assert_eq!(info.decimals, 8);
    assert!(info.monitors_supply());
    assert_eq!(info.coin_type.to_string(), format!("{}::test_coin::TestCoin", addr("issuer")));
}

#[test]
fn custom_limits_apply() {
    let config = LedgerConfig {
        max_coin_decimals: 4,
        ..LedgerConfig::default()
    };
    let mut ledger = MemoryLedger::with_config(config);
    let issuer = addr("issuer");
    ledger.create_account(issuer).unwrap();
    let coin = CoinType::new(issuer, "m", "C");
    let err = ledger
        .initialize_coin(&issuer, coin, "Coin", "C", 6, false)
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidCoinMetadata(_)));
}

#[test]
fn resource_account_withdrawals_bump_sequence() {
    let (mut ledger, coin, caps) = setup();
    let alice = addr("alice");
    let signer = ledger.create_resource_account(&alice, b"pot").unwrap();
    let pot = *signer.address();
    assert!(ledger.is_resource_account(&pot));
    assert!(!ledger.is_resource_account(&alice));

    ledger.register(&pot, &coin).unwrap();
    ledger.mint(&caps.mint, &alice, 100).unwrap();
    ledger.transfer(&coin, &alice, &pot, 100).unwrap();

    for _ in 0..3 {
        ledger
            .transfer_with_capability(&signer, &coin, &alice, 10)
            .unwrap();
    }
    assert_eq!(ledger.state().account(&pot).unwrap().sequence_number, 3);
    assert_eq!(ledger.balance_of(&pot, &coin).unwrap(), 70);
}

#[test]
fn capability_for_unknown_account_rejected() {
    let (mut ledger, coin, caps) = setup();
    let alice = addr("alice");
    // Issued by a different ledger; the address does not exist here.
    let mut other = MemoryLedger::new();
    other.create_account(alice).unwrap();
    let stray = other.create_resource_account(&alice, b"x").unwrap();

    ledger.mint(&caps.mint, &alice, 10).unwrap();
    let err = ledger
        .transfer_with_capability(&stray, &coin, &alice, 1)
        .unwrap_err();
    assert_eq!(err, LedgerError::AccountNotFound(*stray.address()));
}

// ---------------------------------------------------------------------------
// Atomicity
// ---------------------------------------------------------------------------

#[test]
fn rollback_restores_events_and_root() {
    let (mut ledger, coin, caps) = setup();
    let alice = addr("alice");
    let signer = ledger.create_resource_account(&alice, b"log").unwrap();
    let guid = ledger.new_event_handle(&signer).unwrap();
    ledger.mint(&caps.mint, &alice, 50).unwrap();
    let root = ledger.state_root();

    let result: Result<(), LedgerError> = ledger.atomic(|l| {
        l.emit_event(&signer, &guid, "Attempt", serde_json::json!({ "n": 1 }))?;
        l.transfer(&coin, &alice, &addr("bob"), 51)
    });

    assert!(result.is_err());
    assert!(ledger.events(&guid).unwrap().is_empty());
    assert_eq!(root, ledger.state_root());

    // Sequence numbers restart from the rolled-back counter.
    let seq = ledger
        .emit_event(&signer, &guid, "Attempt", serde_json::json!({ "n": 2 }))
        .unwrap();
    assert_eq!(seq, 0);
}

// ---------------------------------------------------------------------------
// Property-Based Tests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Op {
    Mint(usize, u64),
    Burn(usize, u64),
    Transfer(usize, usize, u64),
    Freeze(usize, bool),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let who = 0..USERS.len();
    prop_oneof![
        (who.clone(), 0u64..5_000).prop_map(|(a, n)| Op::Mint(a, n)),
        (who.clone(), 0u64..5_000).prop_map(|(a, n)| Op::Burn(a, n)),
        (who.clone(), who.clone(), 0u64..5_000).prop_map(|(a, b, n)| Op::Transfer(a, b, n)),
        (who, any::<bool>()).prop_map(|(a, f)| Op::Freeze(a, f)),
    ]
}

proptest! {
    #[test]
    fn prop_supply_equals_sum_of_holdings(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let (mut ledger, coin, caps) = setup();

        for op in ops {
            let before = ledger.state_root();
            let result = match op {
                Op::Mint(a, n) => ledger.mint(&caps.mint, &addr(USERS[a]), n),
                Op::Burn(a, n) => ledger.burn_from(&caps.burn, &addr(USERS[a]), n),
                Op::Transfer(a, b, n) => {
                    ledger.transfer(&coin, &addr(USERS[a]), &addr(USERS[b]), n)
                }
                Op::Freeze(a, f) => ledger.set_frozen(&caps.freeze, &addr(USERS[a]), f),
            };
            if result.is_err() {
                prop_assert_eq!(before, ledger.state_root(), "failed op must not mutate state");
            }
            prop_assert_eq!(ledger.supply(&coin).unwrap(), Some(total_held(&ledger, &coin)));
        }
    }

    #[test]
    fn prop_transfer_conserves_pairwise_total(
        start in 0u64..1_000_000,
        amount in 0u64..2_000_000,
    ) {
        let (mut ledger, coin, caps) = setup();
        let (alice, bob) = (addr("alice"), addr("bob"));
        ledger.mint(&caps.mint, &alice, start).unwrap();

        let result = ledger.transfer(&coin, &alice, &bob, amount);
        prop_assert_eq!(result.is_ok(), amount <= start);
        let a = ledger.balance_of(&alice, &coin).unwrap();
        let b = ledger.balance_of(&bob, &coin).unwrap();
        prop_assert_eq!(a + b, start);
    }
}
