//! Integration tests for the escrow vault.
//!
//! These run the vault against a real `MemoryLedger`: deposits, refunds,
//! exchanges, rejected calls, and the balance accounting across many vaults.

use proptest::prelude::*;

use strongbox_contracts::escrow_vault::{EscrowError, EscrowVault, VaultStatus};
use strongbox_contracts::events::EscrowEvent;
use strongbox_protocol::coin::CoinType;
use strongbox_protocol::identity::AccountAddress;
use strongbox_protocol::ledger::{Ledger, LedgerError, MemoryLedger, SharedLedger};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn addr(name: &str) -> AccountAddress {
    AccountAddress::from_name(name)
}

/// Owner holds `owner_a` of CoinA, taker holds `taker_b` of CoinB; both are
/// registered for both coins.
fn market(owner_a: u64, taker_b: u64) -> (MemoryLedger, CoinType, CoinType) {
    let mut ledger = MemoryLedger::new();
    let issuer = addr("issuer");
    for a in [issuer, addr("owner"), addr("taker")] {
        ledger.create_account(a).unwrap();
    }
    let coin_a = CoinType::new(issuer, "coins", "CoinA");
    let coin_b = CoinType::new(issuer, "coins", "CoinB");
    let caps_a = ledger
        .initialize_coin(&issuer, coin_a.clone(), "Coin A", "CA", 6, true)
        .unwrap();
    let caps_b = ledger
        .initialize_coin(&issuer, coin_b.clone(), "Coin B", "CB", 6, true)
        .unwrap();
    for who in ["owner", "taker"] {
        ledger.register(&addr(who), &coin_a).unwrap();
        ledger.register(&addr(who), &coin_b).unwrap();
    }
    ledger.mint(&caps_a.mint, &addr("owner"), owner_a).unwrap();
    ledger.mint(&caps_b.mint, &addr("taker"), taker_b).unwrap();
    (ledger, coin_a, coin_b)
}

// ---------------------------------------------------------------------------
// End-to-End
// ---------------------------------------------------------------------------

#[test]
fn end_to_end_exchange_of_100_units() {
    let (mut ledger, coin_a, coin_b) = market(100, 100);
    let (owner, taker) = (addr("owner"), addr("taker"));
    let mut escrow = EscrowVault::new();

    let vault = escrow
        .initialize(&mut ledger, &owner, 100, b"deal-1", &coin_a)
        .unwrap();
    escrow
        .exchange(&mut ledger, &taker, &vault, &owner, &coin_a, &coin_b)
        .unwrap();

    assert_eq!(escrow.vault_balance(&ledger, &vault).unwrap(), 0);
    assert_eq!(ledger.balance_of(&taker, &coin_a).unwrap(), 100);
    assert_eq!(ledger.balance_of(&owner, &coin_b).unwrap(), 100);
    assert_eq!(ledger.balance_of(&taker, &coin_b).unwrap(), 0);
    assert_eq!(ledger.balance_of(&owner, &coin_a).unwrap(), 0);

    let events = escrow.events(&ledger, &vault).unwrap();
    assert!(matches!(events[0], EscrowEvent::VaultCreated(ref e) if e.amount == 100));
    assert!(matches!(events[1], EscrowEvent::VaultExchanged(ref e) if e.taker == taker));
}

#[test]
fn exchange_requires_taker_registered_for_vault_coin() {
    let (mut ledger, coin_a, coin_b) = market(100, 100);
    let owner = addr("owner");
    let outsider = addr("outsider");
    ledger.create_account(outsider).unwrap();
    ledger.register(&outsider, &coin_b).unwrap();
    ledger.transfer(&coin_b, &addr("taker"), &outsider, 100).unwrap();

    let mut escrow = EscrowVault::new();
    let vault = escrow
        .initialize(&mut ledger, &owner, 100, b"deal-1", &coin_a)
        .unwrap();
    let root = ledger.state_root();

    let err = escrow
        .exchange(&mut ledger, &outsider, &vault, &owner, &coin_a, &coin_b)
        .unwrap_err();
    assert_eq!(
        err,
        EscrowError::AccountNotRegistered {
            account: outsider,
            coin_type: coin_a.clone()
        }
    );
    assert_eq!(root, ledger.state_root());
}

#[test]
fn exchange_with_underfunded_taker_leaves_vault_intact() {
    let (mut ledger, coin_a, coin_b) = market(100, 40);
    let (owner, taker) = (addr("owner"), addr("taker"));
    let mut escrow = EscrowVault::new();
    let vault = escrow
        .initialize(&mut ledger, &owner, 100, b"deal-1", &coin_a)
        .unwrap();

    let err = escrow
        .exchange(&mut ledger, &taker, &vault, &owner, &coin_a, &coin_b)
        .unwrap_err();
    assert!(matches!(err, EscrowError::InsufficientBalance { available: 40, requested: 100, .. }));
    assert_eq!(escrow.vault_balance(&ledger, &vault).unwrap(), 100);
    assert_eq!(escrow.vault(&ledger, &vault).unwrap().status, VaultStatus::Funded);

    // The owner can still take the deposit back.
    assert_eq!(escrow.cancel(&mut ledger, &owner, &vault, &coin_a).unwrap(), 100);
}

#[test]
fn enclosing_rollback_keeps_vault_open() {
    let (ledger, coin_a, coin_b) = market(100, 100);
    let (owner, taker) = (addr("owner"), addr("taker"));
    let shared = SharedLedger::new(ledger);
    let mut escrow = EscrowVault::new();
    let vault = shared
        .transact(|l| escrow.initialize(l, &owner, 100, b"deal-1", &coin_a))
        .unwrap();
    let root = shared.read(|l| l.state_root()).unwrap();

    // A caller batches a close with work of its own that then fails.
    let abort = || EscrowError::Ledger(LedgerError::Serialization("batch aborted".into()));
    let cancelled: Result<u64, EscrowError> = shared.transact(|l| {
        escrow.cancel(l, &owner, &vault, &coin_a)?;
        Err(abort())
    });
    assert!(cancelled.is_err());
    let exchanged: Result<u64, EscrowError> = shared.transact(|l| {
        escrow.exchange(l, &taker, &vault, &owner, &coin_a, &coin_b)?;
        Err(abort())
    });
    assert!(exchanged.is_err());

    shared.read(|l| {
        assert_eq!(l.state_root().unwrap(), root);
        assert_eq!(escrow.vault(l, &vault).unwrap().status, VaultStatus::Funded);
        assert_eq!(escrow.vault_balance(l, &vault).unwrap(), 100);
        assert_eq!(l.balance_of(&owner, &coin_a).unwrap(), 0);
        assert_eq!(escrow.events(l, &vault).unwrap().len(), 1);
    });

    let moved = shared
        .transact(|l| escrow.cancel(l, &owner, &vault, &coin_a))
        .unwrap();
    assert_eq!(moved, 100);
    shared.read(|l| {
        assert_eq!(l.balance_of(&owner, &coin_a).unwrap(), 100);
        assert_eq!(escrow.vault(l, &vault).unwrap().status, VaultStatus::Cancelled);
    });
}

#[test]
fn closed_vault_rejects_every_further_close() {
    let (mut ledger, coin_a, coin_b) = market(100, 100);
    let (owner, taker) = (addr("owner"), addr("taker"));
    let mut escrow = EscrowVault::new();
    let vault = escrow
        .initialize(&mut ledger, &owner, 100, b"deal-1", &coin_a)
        .unwrap();
    escrow
        .exchange(&mut ledger, &taker, &vault, &owner, &coin_a, &coin_b)
        .unwrap();

    let root = ledger.state_root();
    assert!(matches!(
        escrow.cancel(&mut ledger, &owner, &vault, &coin_a),
        Err(EscrowError::VaultClosed { status: VaultStatus::Exchanged, .. })
    ));
    assert!(matches!(
        escrow.exchange(&mut ledger, &taker, &vault, &owner, &coin_a, &coin_b),
        Err(EscrowError::VaultClosed { .. })
    ));
    assert_eq!(root, ledger.state_root());
    assert_eq!(escrow.events(&ledger, &vault).unwrap().len(), 2);
}

#[test]
fn vault_funds_cannot_leave_through_plain_transfer() {
    let (mut ledger, coin_a, _coin_b) = market(100, 0);
    let owner = addr("owner");
    let mut escrow = EscrowVault::new();
    let vault = escrow
        .initialize(&mut ledger, &owner, 100, b"deal-1", &coin_a)
        .unwrap();

    assert!(ledger.transfer(&coin_a, &vault, &owner, 100).is_err());
    assert_eq!(escrow.vault_balance(&ledger, &vault).unwrap(), 100);
}

// ---------------------------------------------------------------------------
// Property-Based Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Vault balance equals the deposit minus whatever one close disbursed,
    /// and a second close never moves funds.
    #[test]
    fn prop_vault_disburses_at_most_once(
        deposit in 0u64..10_000,
        cancel_first in any::<bool>(),
        retry_cancel in any::<bool>(),
    ) {
        let (mut ledger, coin_a, coin_b) = market(10_000, 10_000);
        let (owner, taker) = (addr("owner"), addr("taker"));
        let mut escrow = EscrowVault::new();
        let vault = escrow
            .initialize(&mut ledger, &owner, deposit, b"p", &coin_a)
            .unwrap();
        prop_assert_eq!(escrow.vault_balance(&ledger, &vault).unwrap(), deposit);

        let disbursed = if cancel_first {
            escrow.cancel(&mut ledger, &owner, &vault, &coin_a).unwrap()
        } else {
            escrow.exchange(&mut ledger, &taker, &vault, &owner, &coin_a, &coin_b).unwrap()
        };
        prop_assert_eq!(disbursed, deposit);
        prop_assert_eq!(escrow.vault_balance(&ledger, &vault).unwrap(), deposit - disbursed);

        let root = ledger.state_root();
        let retry = if retry_cancel {
            escrow.cancel(&mut ledger, &owner, &vault, &coin_a)
        } else {
            escrow.exchange(&mut ledger, &taker, &vault, &owner, &coin_a, &coin_b)
        };
        let is_closed = matches!(retry, Err(EscrowError::VaultClosed { .. }));
        prop_assert!(is_closed);
        prop_assert_eq!(root, ledger.state_root());
    }

    /// Non-owners never cancel, and a rejected cancel changes nothing.
    #[test]
    fn prop_non_owner_cancel_is_unauthorized(deposit in 1u64..10_000, caller in "[a-z]{1,8}") {
        prop_assume!(caller != "owner");
        let (mut ledger, coin_a, _coin_b) = market(10_000, 0);
        let owner = addr("owner");
        let mut escrow = EscrowVault::new();
        let vault = escrow
            .initialize(&mut ledger, &owner, deposit, b"p", &coin_a)
            .unwrap();

        let err = escrow.cancel(&mut ledger, &addr(&caller), &vault, &coin_a).unwrap_err();
        let is_unauthorized = matches!(err, EscrowError::Unauthorized { .. });
        prop_assert!(is_unauthorized);
        prop_assert_eq!(escrow.vault_balance(&ledger, &vault).unwrap(), deposit);
    }

    /// An exchange moves `B` both ways or nothing at all.
    #[test]
    fn prop_exchange_is_all_or_nothing(deposit in 0u64..1_000, taker_b in 0u64..1_000) {
        let (mut ledger, coin_a, coin_b) = market(1_000, taker_b);
        let (owner, taker) = (addr("owner"), addr("taker"));
        let mut escrow = EscrowVault::new();
        let vault = escrow
            .initialize(&mut ledger, &owner, deposit, b"p", &coin_a)
            .unwrap();

        let result = escrow.exchange(&mut ledger, &taker, &vault, &owner, &coin_a, &coin_b);
        let owner_b = ledger.balance_of(&owner, &coin_b).unwrap();
        let taker_a = ledger.balance_of(&taker, &coin_a).unwrap();
        if result.is_ok() {
            prop_assert_eq!((owner_b, taker_a), (deposit, deposit));
        } else {
            prop_assert!(taker_b < deposit);
            prop_assert_eq!((owner_b, taker_a), (0, 0));
            prop_assert_eq!(escrow.vault_balance(&ledger, &vault).unwrap(), deposit);
        }
    }
}
