//! # Escrow Vault Contract
//!
//! Locks a depositor's coins in a dedicated resource account until one of
//! two things happens:
//!
//! 1. **Cancel**: the owner takes the full balance back.
//! 2. **Exchange**: a taker pays the owner an equal number of base units of
//!    a second coin and receives the vault balance in return.
//!
//! ```text
//!            initialize
//!                │
//!                ▼
//!            ┌────────┐   cancel    ┌───────────┐
//!            │ Funded │ ──────────▶ │ Cancelled │
//!            └────────┘             └───────────┘
//!                │ exchange
//!                ▼
//!           ┌───────────┐
//!           │ Exchanged │
//!           └───────────┘
//! ```
//!
//! Both terminal states are final: any later cancel or exchange fails with
//! [`EscrowError::VaultClosed`].
//!
//! ## Custody
//!
//! The vault address is derived from `(depositor, seed)`. Its
//! [`SignerCapability`] stays in [`EscrowVault`] and is never handed out,
//! so only this contract can move coins out of the vault.
//!
//! ## Atomicity
//!
//! Every entry point runs inside [`Ledger::atomic`]. The [`Vault`] record,
//! status included, is a ledger resource published under the vault account,
//! so it commits and rolls back with the coin movements, also when the call
//! is nested in a caller's own atomic section.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

use strongbox_protocol::coin::{CoinType, SignerCapability};
use strongbox_protocol::events::{EventGuid, EventRecord};
use strongbox_protocol::identity::AccountAddress;
use strongbox_protocol::ledger::{Ledger, LedgerError};

use crate::events::{EscrowEvent, VaultCancelled, VaultCreated, VaultExchanged};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during escrow operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscrowError {
    /// No vault lives at this address.
    #[error("vault not found: {0}")]
    NotFound(AccountAddress),

    /// The caller is not the vault owner.
    #[error("unauthorized: {caller} is not the owner of vault {vault}")]
    Unauthorized {
        caller: AccountAddress,
        vault: AccountAddress,
    },

    /// The `(depositor, seed)` pair was already used.
    #[error("vault already exists: {0}")]
    AlreadyExists(AccountAddress),

    /// A party has no holding for the coin it is about to receive.
    #[error("account {account} is not registered for {coin_type}")]
    AccountNotRegistered {
        account: AccountAddress,
        coin_type: CoinType,
    },

    #[error("insufficient balance in {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        account: AccountAddress,
        available: u64,
        requested: u64,
    },

    /// The vault was already cancelled or exchanged.
    #[error("vault {vault} is closed ({status})")]
    VaultClosed {
        vault: AccountAddress,
        status: VaultStatus,
    },

    /// The coin type passed does not match the vault's.
    #[error("coin mismatch: vault holds {expected}, got {actual}")]
    CoinMismatch { expected: CoinType, actual: CoinType },

    /// A 1:1 raw-unit swap between coins of different precision is refused.
    #[error("precision mismatch: {first} has {first_decimals} decimals, {second} has {second_decimals}")]
    PrecisionMismatch {
        first: CoinType,
        first_decimals: u8,
        second: CoinType,
        second_decimals: u8,
    },

    /// Any other ledger failure.
    #[error("ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for EscrowError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AccountAlreadyExists(address) => EscrowError::AlreadyExists(address),
            LedgerError::AccountNotRegistered { account, coin_type } => {
                EscrowError::AccountNotRegistered { account, coin_type }
            }
            LedgerError::InsufficientBalance {
                account,
                available,
                requested,
                ..
            } => EscrowError::InsufficientBalance {
                account,
                available,
                requested,
            },
            other => EscrowError::Ledger(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lifecycle of a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultStatus {
    /// Holds the deposit.
    Funded,
    /// Balance returned to the owner.
    Cancelled,
    /// Balance swapped with a taker.
    Exchanged,
}

impl std::fmt::Display for VaultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VaultStatus::Funded => write!(f, "Funded"),
            VaultStatus::Cancelled => write!(f, "Cancelled"),
            VaultStatus::Exchanged => write!(f, "Exchanged"),
        }
    }
}

/// Tag of the record published under each vault account.
pub const VAULT_RECORD_TAG: &str = "escrow_vault::Vault";

/// One escrow deposit, as stored on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    /// The vault's resource-account address; also its id.
    pub address: AccountAddress,
    /// Depositor. Immutable.
    pub owner: AccountAddress,
    /// The escrowed coin. Immutable.
    pub coin_type: CoinType,
    /// Amount deposited at creation.
    pub initial_amount: u64,
    pub status: VaultStatus,
    /// Handle carrying this vault's events.
    pub events: EventGuid,
}

/// The escrow contract. Holds the signer of every vault it opened; the
/// vault records themselves live on the ledger.
#[derive(Debug, Default)]
pub struct EscrowVault {
    signers: BTreeMap<AccountAddress, SignerCapability>,
}

impl EscrowVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a vault for `depositor` and moves `amount` of `coin_type` into it.
    ///
    /// Returns the vault address.
    ///
    /// # Errors
    ///
    /// - [`EscrowError::AlreadyExists`] if `seed` was already used by `depositor`.
    /// - [`EscrowError::InsufficientBalance`] if the depositor holds less than `amount`.
    /// - [`EscrowError::AccountNotRegistered`] if the depositor has no holding.
    pub fn initialize<L: Ledger>(
        &mut self,
        ledger: &mut L,
        depositor: &AccountAddress,
        amount: u64,
        seed: &[u8],
        coin_type: &CoinType,
    ) -> Result<AccountAddress, EscrowError> {
        let signer = ledger.atomic(|l| -> Result<_, EscrowError> {
            let signer = l.create_resource_account(depositor, seed)?;
            let address = *signer.address();
            l.register(&address, coin_type)?;
            l.transfer(coin_type, depositor, &address, amount)?;

            let vault = Vault {
                address,
                owner: *depositor,
                coin_type: coin_type.clone(),
                initial_amount: amount,
                status: VaultStatus::Funded,
                events: l.new_event_handle(&signer)?,
            };
            l.publish(&signer, VAULT_RECORD_TAG, &vault)?;
            EscrowEvent::VaultCreated(VaultCreated {
                vault: address,
                owner: *depositor,
                coin_type: coin_type.clone(),
                amount,
            })
            .emit(l, &signer, &vault.events)?;
            Ok(signer)
        })?;

        let address = *signer.address();
        info!(
            vault = %address.short(),
            owner = %depositor.short(),
            coin = %coin_type,
            amount,
            "vault initialized"
        );
        // A signer left behind by a rolled-back section is simply replaced.
        self.signers.insert(address, signer);
        Ok(address)
    }

    /// Returns the full vault balance to its owner. Returns the amount moved.
    pub fn cancel<L: Ledger>(
        &self,
        ledger: &mut L,
        caller: &AccountAddress,
        vault_id: &AccountAddress,
        coin_type: &CoinType,
    ) -> Result<u64, EscrowError> {
        let (mut vault, signer) = self.open_vault(ledger, vault_id, caller, coin_type)?;

        let amount = ledger.atomic(|l| -> Result<u64, EscrowError> {
            let amount = l.balance_of(&vault.address, coin_type)?;
            l.transfer_with_capability(signer, coin_type, caller, amount)?;
            vault.status = VaultStatus::Cancelled;
            l.publish(signer, VAULT_RECORD_TAG, &vault)?;
            EscrowEvent::VaultCancelled(VaultCancelled {
                vault: vault.address,
                owner: vault.owner,
                amount,
            })
            .emit(l, signer, &vault.events)?;
            Ok(amount)
        })?;

        info!(vault = %vault_id.short(), amount, "vault cancelled");
        Ok(amount)
    }

    /// Swaps the vault balance `B` of `first` for `B` of `second`.
    ///
    /// The taker pays `B` of `second` to `owner`, then the vault pays `B` of
    /// `first` to the taker. Both legs commit or neither does. Returns `B`.
    pub fn exchange<L: Ledger>(
        &self,
        ledger: &mut L,
        taker: &AccountAddress,
        vault_id: &AccountAddress,
        owner: &AccountAddress,
        first: &CoinType,
        second: &CoinType,
    ) -> Result<u64, EscrowError> {
        let (mut vault, signer) = self.open_vault(ledger, vault_id, owner, first)?;

        let first_info = ledger
            .coin_info(first)
            .ok_or_else(|| LedgerError::CoinNotInitialized(first.clone()))?;
        let second_info = ledger
            .coin_info(second)
            .ok_or_else(|| LedgerError::CoinNotInitialized(second.clone()))?;
        if first_info.decimals != second_info.decimals {
            return Err(EscrowError::PrecisionMismatch {
                first: first.clone(),
                first_decimals: first_info.decimals,
                second: second.clone(),
                second_decimals: second_info.decimals,
            });
        }

        for (account, coin_type) in [(taker, first), (owner, second)] {
            if !ledger.is_registered(account, coin_type) {
                return Err(EscrowError::AccountNotRegistered {
                    account: *account,
                    coin_type: coin_type.clone(),
                });
            }
        }

        let amount = ledger.atomic(|l| -> Result<u64, EscrowError> {
            let amount = l.balance_of(&vault.address, first)?;
            l.transfer(second, taker, owner, amount)?;
            l.transfer_with_capability(signer, first, taker, amount)?;
            vault.status = VaultStatus::Exchanged;
            l.publish(signer, VAULT_RECORD_TAG, &vault)?;
            EscrowEvent::VaultExchanged(VaultExchanged {
                vault: vault.address,
                owner: *owner,
                taker: *taker,
                first_coin: first.clone(),
                second_coin: second.clone(),
                amount,
            })
            .emit(l, signer, &vault.events)?;
            Ok(amount)
        })?;

        info!(
            vault = %vault_id.short(),
            taker = %taker.short(),
            amount,
            "vault exchanged"
        );
        Ok(amount)
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// The vault record as the ledger currently holds it.
    pub fn vault<L: Ledger>(
        &self,
        ledger: &L,
        vault_id: &AccountAddress,
    ) -> Result<Vault, EscrowError> {
        ledger
            .borrow_resource::<Vault>(vault_id, VAULT_RECORD_TAG)?
            .ok_or(EscrowError::NotFound(*vault_id))
    }

    /// Current on-ledger balance of the vault.
    pub fn vault_balance<L: Ledger>(
        &self,
        ledger: &L,
        vault_id: &AccountAddress,
    ) -> Result<u64, EscrowError> {
        let vault = self.vault(ledger, vault_id)?;
        Ok(ledger.balance_of(&vault.address, &vault.coin_type)?)
    }

    /// Vaults opened by `owner` through this contract, in address order.
    pub fn vaults_of<L: Ledger>(
        &self,
        ledger: &L,
        owner: &AccountAddress,
    ) -> Result<Vec<Vault>, EscrowError> {
        let mut vaults = Vec::new();
        for address in self.signers.keys() {
            if let Some(vault) = ledger.borrow_resource::<Vault>(address, VAULT_RECORD_TAG)? {
                if &vault.owner == owner {
                    vaults.push(vault);
                }
            }
        }
        Ok(vaults)
    }

    /// Decoded events of one vault, in emission order.
    pub fn events<L: Ledger>(
        &self,
        ledger: &L,
        vault_id: &AccountAddress,
    ) -> Result<Vec<EscrowEvent>, EscrowError> {
        let vault = self.vault(ledger, vault_id)?;
        let records: Vec<EventRecord> = ledger.events(&vault.events)?;
        Ok(records.iter().filter_map(EscrowEvent::from_record).collect())
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Looks up a vault that `owner` may close with `coin_type`.
    fn open_vault<L: Ledger>(
        &self,
        ledger: &L,
        vault_id: &AccountAddress,
        owner: &AccountAddress,
        coin_type: &CoinType,
    ) -> Result<(Vault, &SignerCapability), EscrowError> {
        let vault = self.vault(ledger, vault_id)?;
        let signer = self
            .signers
            .get(vault_id)
            .ok_or(EscrowError::NotFound(*vault_id))?;
        if &vault.owner != owner {
            warn!(
                vault = %vault_id.short(),
                claimed = %owner.short(),
                "rejected: not the vault owner"
            );
            return Err(EscrowError::Unauthorized {
                caller: *owner,
                vault: *vault_id,
            });
        }
        if vault.status != VaultStatus::Funded {
            return Err(EscrowError::VaultClosed {
                vault: *vault_id,
                status: vault.status,
            });
        }
        if &vault.coin_type != coin_type {
            return Err(EscrowError::CoinMismatch {
                expected: vault.coin_type.clone(),
                actual: coin_type.clone(),
            });
        }
        Ok((vault, signer))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use strongbox_protocol::coin::CoinCapabilities;
    use strongbox_protocol::ledger::{MemoryLedger, SharedLedger};

    struct World {
        ledger: MemoryLedger,
        escrow: EscrowVault,
        coin_a: CoinType,
        coin_b: CoinType,
        caps_a: CoinCapabilities,
        owner: AccountAddress,
        taker: AccountAddress,
    }

    fn addr(name: &str) -> AccountAddress {
        AccountAddress::from_name(name)
    }

    fn world() -> World {
        let mut ledger = MemoryLedger::new();
        let issuer = addr("issuer");
        let owner = addr("owner");
        let taker = addr("taker");
        for a in [issuer, owner, taker] {
            ledger.create_account(a).unwrap();
        }
        let coin_a = CoinType::new(issuer, "coins", "CoinA");
        let coin_b = CoinType::new(issuer, "coins", "CoinB");
        let caps_a = ledger
            .initialize_coin(&issuer, coin_a.clone(), "Coin A", "A", 6, true)
            .unwrap();
        let caps_b = ledger
            .initialize_coin(&issuer, coin_b.clone(), "Coin B", "B", 6, true)
            .unwrap();
        for a in [owner, taker] {
            ledger.register(&a, &coin_a).unwrap();
            ledger.register(&a, &coin_b).unwrap();
        }
        ledger.mint(&caps_a.mint, &owner, 100).unwrap();
        ledger.mint(&caps_b.mint, &taker, 100).unwrap();
        World {
            ledger,
            escrow: EscrowVault::new(),
            coin_a,
            coin_b,
            caps_a,
            owner,
            taker,
        }
    }

    #[test]
    fn initialize_moves_deposit() {
        let mut w = world();
        let vault = w
            .escrow
            .initialize(&mut w.ledger, &w.owner, 60, b"v1", &w.coin_a)
            .unwrap();
        assert_eq!(vault, AccountAddress::derive_resource(&w.owner, b"v1"));
        assert_eq!(w.escrow.vault_balance(&w.ledger, &vault).unwrap(), 60);
        assert_eq!(w.ledger.balance_of(&w.owner, &w.coin_a).unwrap(), 40);
        assert_eq!(w.escrow.vault(&w.ledger, &vault).unwrap().status, VaultStatus::Funded);
    }

    #[test]
    fn seed_reuse_rejected() {
        let mut w = world();
        w.escrow
            .initialize(&mut w.ledger, &w.owner, 10, b"v1", &w.coin_a)
            .unwrap();
        let err = w
            .escrow
            .initialize(&mut w.ledger, &w.owner, 10, b"v1", &w.coin_a)
            .unwrap_err();
        assert!(matches!(err, EscrowError::AlreadyExists(_)));
        assert_eq!(w.ledger.balance_of(&w.owner, &w.coin_a).unwrap(), 90);
    }

    #[test]
    fn initialize_insufficient_balance_creates_nothing() {
        let mut w = world();
        let err = w
            .escrow
            .initialize(&mut w.ledger, &w.owner, 101, b"v1", &w.coin_a)
            .unwrap_err();
        assert!(matches!(
            err,
            EscrowError::InsufficientBalance {
                available: 100,
                requested: 101,
                ..
            }
        ));
        let vault = AccountAddress::derive_resource(&w.owner, b"v1");
        assert!(!w.ledger.account_exists(&vault));
        assert_eq!(w.escrow.vault(&w.ledger, &vault), Err(EscrowError::NotFound(vault)));
    }

    #[test]
    fn cancel_by_non_owner_rejected() {
        let mut w = world();
        let vault = w
            .escrow
            .initialize(&mut w.ledger, &w.owner, 50, b"v1", &w.coin_a)
            .unwrap();
        let err = w
            .escrow
            .cancel(&mut w.ledger, &w.taker, &vault, &w.coin_a)
            .unwrap_err();
        assert!(matches!(err, EscrowError::Unauthorized { .. }));
        assert_eq!(w.escrow.vault_balance(&w.ledger, &vault).unwrap(), 50);
    }

    #[test]
    fn cancel_refunds_and_closes() {
        let mut w = world();
        let vault = w
            .escrow
            .initialize(&mut w.ledger, &w.owner, 50, b"v1", &w.coin_a)
            .unwrap();
        let moved = w
            .escrow
            .cancel(&mut w.ledger, &w.owner, &vault, &w.coin_a)
            .unwrap();
        assert_eq!(moved, 50);
        assert_eq!(w.ledger.balance_of(&w.owner, &w.coin_a).unwrap(), 100);

        let err = w
            .escrow
            .cancel(&mut w.ledger, &w.owner, &vault, &w.coin_a)
            .unwrap_err();
        assert_eq!(
            err,
            EscrowError::VaultClosed {
                vault,
                status: VaultStatus::Cancelled
            }
        );
    }

    #[test]
    fn cancel_undone_by_enclosing_rollback() {
        let mut w = world();
        let vault = w
            .escrow
            .initialize(&mut w.ledger, &w.owner, 100, b"v1", &w.coin_a)
            .unwrap();
        let (owner, coin_a) = (w.owner, w.coin_a.clone());
        let escrow = w.escrow;
        let shared = SharedLedger::new(w.ledger);

        let result: Result<u64, EscrowError> = shared.transact(|l| {
            escrow.cancel(l, &owner, &vault, &coin_a)?;
            Err(EscrowError::Ledger(LedgerError::Serialization("abort".into())))
        });
        assert!(result.is_err());
        shared.read(|l| {
            assert_eq!(escrow.vault_balance(l, &vault).unwrap(), 100);
            assert_eq!(l.balance_of(&owner, &coin_a).unwrap(), 0);
            assert_eq!(escrow.vault(l, &vault).unwrap().status, VaultStatus::Funded);
        });

        let moved = shared
            .transact(|l| escrow.cancel(l, &owner, &vault, &coin_a))
            .unwrap();
        assert_eq!(moved, 100);
        shared.read(|l| {
            assert_eq!(l.balance_of(&owner, &coin_a).unwrap(), 100);
            assert_eq!(escrow.vault(l, &vault).unwrap().status, VaultStatus::Cancelled);
            assert_eq!(escrow.events(l, &vault).unwrap().len(), 2);
        });
    }

    #[test]
    fn initialize_undone_by_enclosing_rollback() {
        let w = world();
        let (owner, coin_a) = (w.owner, w.coin_a.clone());
        let mut escrow = w.escrow;
        let shared = SharedLedger::new(w.ledger);

        let result: Result<AccountAddress, EscrowError> = shared.transact(|l| {
            escrow.initialize(l, &owner, 40, b"v1", &coin_a)?;
            Err(EscrowError::Ledger(LedgerError::Serialization("abort".into())))
        });
        assert!(result.is_err());
        let vault = AccountAddress::derive_resource(&owner, b"v1");
        shared.read(|l| {
            assert_eq!(escrow.vault(l, &vault), Err(EscrowError::NotFound(vault)));
            assert!(escrow.vaults_of(l, &owner).unwrap().is_empty());
            assert_eq!(l.balance_of(&owner, &coin_a).unwrap(), 100);
        });

        let again = shared
            .transact(|l| escrow.initialize(l, &owner, 40, b"v1", &coin_a))
            .unwrap();
        assert_eq!(again, vault);
        shared.read(|l| assert_eq!(escrow.vault_balance(l, &vault).unwrap(), 40));
    }

    #[test]
    fn cancel_with_wrong_coin_rejected() {
        let mut w = world();
        let vault = w
            .escrow
            .initialize(&mut w.ledger, &w.owner, 50, b"v1", &w.coin_a)
            .unwrap();
        let err = w
            .escrow
            .cancel(&mut w.ledger, &w.owner, &vault, &w.coin_b)
            .unwrap_err();
        assert!(matches!(err, EscrowError::CoinMismatch { .. }));
    }

    #[test]
    fn unknown_vault_not_found() {
        let mut w = world();
        let ghost = addr("ghost");
        let err = w
            .escrow
            .cancel(&mut w.ledger, &w.owner, &ghost, &w.coin_a)
            .unwrap_err();
        assert_eq!(err, EscrowError::NotFound(ghost));
    }

    #[test]
    fn exchange_swaps_both_legs() {
        let mut w = world();
        let vault = w
            .escrow
            .initialize(&mut w.ledger, &w.owner, 100, b"v1", &w.coin_a)
            .unwrap();
        let amount = w
            .escrow
            .exchange(&mut w.ledger, &w.taker, &vault, &w.owner, &w.coin_a, &w.coin_b)
            .unwrap();

        assert_eq!(amount, 100);
        assert_eq!(w.escrow.vault_balance(&w.ledger, &vault).unwrap(), 0);
        assert_eq!(w.ledger.balance_of(&w.taker, &w.coin_a).unwrap(), 100);
        assert_eq!(w.ledger.balance_of(&w.owner, &w.coin_b).unwrap(), 100);
        assert_eq!(w.escrow.vault(&w.ledger, &vault).unwrap().status, VaultStatus::Exchanged);

        let events = w.escrow.events(&w.ledger, &vault).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].type_tag(), "VaultExchanged");
    }

    #[test]
    fn exchange_second_leg_failure_rolls_back_first() {
        let mut w = world();
        let vault = w
            .escrow
            .initialize(&mut w.ledger, &w.owner, 100, b"v1", &w.coin_a)
            .unwrap();
        // Taker cannot receive CoinA: the vault-to-taker leg fails after the
        // taker-to-owner leg has already applied inside the section.
        w.ledger
            .set_frozen(&w.caps_a.freeze, &w.taker, true)
            .unwrap();

        let err = w
            .escrow
            .exchange(&mut w.ledger, &w.taker, &vault, &w.owner, &w.coin_a, &w.coin_b)
            .unwrap_err();
        assert!(matches!(err, EscrowError::Ledger(LedgerError::AccountFrozen { .. })));

        assert_eq!(w.ledger.balance_of(&w.taker, &w.coin_b).unwrap(), 100);
        assert_eq!(w.ledger.balance_of(&w.owner, &w.coin_b).unwrap(), 0);
        assert_eq!(w.escrow.vault_balance(&w.ledger, &vault).unwrap(), 100);
        assert_eq!(w.escrow.vault(&w.ledger, &vault).unwrap().status, VaultStatus::Funded);
    }

    #[test]
    fn exchange_with_wrong_owner_rejected() {
        let mut w = world();
        let vault = w
            .escrow
            .initialize(&mut w.ledger, &w.owner, 100, b"v1", &w.coin_a)
            .unwrap();
        let err = w
            .escrow
            .exchange(&mut w.ledger, &w.taker, &vault, &w.taker, &w.coin_a, &w.coin_b)
            .unwrap_err();
        assert!(matches!(err, EscrowError::Unauthorized { .. }));
    }

    #[test]
    fn exchange_precision_mismatch_rejected() {
        let mut w = world();
        let issuer = addr("issuer");
        let coin_c = CoinType::new(issuer, "coins", "CoinC");
        w.ledger
            .initialize_coin(&issuer, coin_c.clone(), "Coin C", "C", 8, false)
            .unwrap();
        w.ledger.register(&w.owner, &coin_c).unwrap();
        let vault = w
            .escrow
            .initialize(&mut w.ledger, &w.owner, 100, b"v1", &w.coin_a)
            .unwrap();
        let err = w
            .escrow
            .exchange(&mut w.ledger, &w.taker, &vault, &w.owner, &w.coin_a, &coin_c)
            .unwrap_err();
        assert!(matches!(
            err,
            EscrowError::PrecisionMismatch {
                first_decimals: 6,
                second_decimals: 8,
                ..
            }
        ));
    }

    #[test]
    fn vaults_of_filters_by_owner() {
        let mut w = world();
        w.escrow
            .initialize(&mut w.ledger, &w.owner, 10, b"a", &w.coin_a)
            .unwrap();
        w.escrow
            .initialize(&mut w.ledger, &w.owner, 10, b"b", &w.coin_a)
            .unwrap();
        w.escrow
            .initialize(&mut w.ledger, &w.taker, 10, b"a", &w.coin_b)
            .unwrap();
        let owned = w.escrow.vaults_of(&w.ledger, &w.owner).unwrap();
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|v| v.coin_type == w.coin_a));
        assert_eq!(w.escrow.vaults_of(&w.ledger, &w.taker).unwrap().len(), 1);
    }
}
