//! # Ledger: the account/coin/event substrate
//!
//! Everything the escrow and token components touch goes through the
//! [`Ledger`] trait: accounts, coin stores, capabilities, event handles and
//! resources published under resource accounts. The components hold no
//! balances of their own, and any record whose state must roll back with
//! the ledger (a vault's status, a token's deployment) is a resource.
//!
//! ```text
//! mod.rs    : Ledger trait, LedgerError, withdrawal authorization payload
//! state.rs  : LedgerState: accounts, coins, stores, handles, event log
//! memory.rs : MemoryLedger, the in-process implementation
//! shared.rs : SharedLedger, a mutex-guarded handle for multi-threaded hosts
//! ```
//!
//! ## Atomicity
//!
//! Every public component operation runs inside [`Ledger::atomic`]. If the
//! closure returns `Err`, the ledger is restored to the checkpoint taken on
//! entry, including any events emitted and resources published along the
//! way. No partial effects, even when the section is nested inside a
//! caller's own `atomic` or [`SharedLedger::transact`].

pub mod memory;
pub mod shared;
pub mod state;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coin::{
    BurnCapability, CoinCapabilities, CoinInfo, CoinType, FreezeCapability, MintCapability,
    SignerCapability,
};
use crate::events::{EventGuid, EventRecord};
use crate::identity::AccountAddress;

pub use memory::MemoryLedger;
pub use shared::SharedLedger;
pub use state::{AccountState, LedgerState};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by ledger operations. None are retriable as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("account not found: {0}")]
    AccountNotFound(AccountAddress),

    #[error("account already exists: {0}")]
    AccountAlreadyExists(AccountAddress),

    #[error("coin not initialized: {0}")]
    CoinNotInitialized(CoinType),

    #[error("coin already initialized: {0}")]
    CoinAlreadyInitialized(CoinType),

    /// Only the account named in the coin type may initialize it.
    #[error("coin {coin_type} cannot be initialized by {issuer}")]
    CoinAddressMismatch {
        coin_type: CoinType,
        issuer: AccountAddress,
    },

    #[error("invalid coin metadata: {0}")]
    InvalidCoinMetadata(String),

    #[error("account {account} is not registered for {coin_type}")]
    AccountNotRegistered {
        account: AccountAddress,
        coin_type: CoinType,
    },

    #[error("insufficient balance in {account} for {coin_type}: available {available}, requested {requested}")]
    InsufficientBalance {
        account: AccountAddress,
        coin_type: CoinType,
        available: u64,
        requested: u64,
    },

    #[error("holding of {coin_type} by {account} is frozen")]
    AccountFrozen {
        account: AccountAddress,
        coin_type: CoinType,
    },

    #[error("arithmetic overflow on {coin_type}")]
    Overflow { coin_type: CoinType },

    /// Resource accounts can only be debited through their signer capability.
    #[error("account {0} is a resource account; a signer capability is required")]
    CapabilityRequired(AccountAddress),

    #[error("capability mismatch: expected {expected}, got {actual}")]
    CapabilityMismatch { expected: String, actual: String },

    #[error("authorization signature rejected for {0}")]
    InvalidAuthorization(AccountAddress),

    #[error("event handle not found: {0}")]
    EventHandleNotFound(EventGuid),

    #[error("event payload of {size} bytes exceeds limit of {limit}")]
    EventTooLarge { size: usize, limit: usize },

    #[error("serialization error: {0}")]
    Serialization(String),
}

// ---------------------------------------------------------------------------
// Withdrawal authorization
// ---------------------------------------------------------------------------

/// The message a signer capability signs to move coins out of its account.
///
/// Encoded with bincode and hashed under
/// [`WITHDRAW_AUTH_CONTEXT`](crate::config::WITHDRAW_AUTH_CONTEXT). The
/// `sequence` is the resource account's sequence number, which the ledger
/// bumps on every authorized withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawAuthorization {
    pub coin_type: CoinType,
    pub from: AccountAddress,
    pub to: AccountAddress,
    pub amount: u64,
    pub sequence: u64,
}

impl WithdrawAuthorization {
    /// Canonical digest to be signed.
    pub fn signing_digest(&self) -> Result<[u8; 32], LedgerError> {
        let bytes =
            bincode::serialize(self).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        Ok(crate::crypto::domain_separated_hash(
            crate::config::WITHDRAW_AUTH_CONTEXT,
            &bytes,
        ))
    }
}

// ---------------------------------------------------------------------------
// Ledger trait
// ---------------------------------------------------------------------------

/// The account, coin and event substrate.
pub trait Ledger {
    /// Opaque snapshot used to roll back a failed operation.
    type Checkpoint;

    /// Captures the current state.
    fn checkpoint(&self) -> Self::Checkpoint;

    /// Rewinds to a previously captured state.
    fn restore(&mut self, checkpoint: Self::Checkpoint);

    /// Runs `f` as one all-or-nothing unit.
    fn atomic<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        let checkpoint = self.checkpoint();
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.restore(checkpoint);
                Err(err)
            }
        }
    }

    // --- accounts ---

    /// Opens a user account.
    fn create_account(&mut self, address: AccountAddress) -> Result<(), LedgerError>;

    /// Whether any account (user or resource) lives at `address`.
    fn account_exists(&self, address: &AccountAddress) -> bool;

    /// Creates the resource account derived from `(creator, seed)` and
    /// returns the only capability able to act as it.
    fn create_resource_account(
        &mut self,
        creator: &AccountAddress,
        seed: &[u8],
    ) -> Result<SignerCapability, LedgerError>;

    /// Whether `address` is a resource account.
    fn is_resource_account(&self, address: &AccountAddress) -> bool;

    // --- coins ---

    /// Publishes a new coin type and returns its capabilities.
    fn initialize_coin(
        &mut self,
        issuer: &AccountAddress,
        coin_type: CoinType,
        name: &str,
        symbol: &str,
        decimals: u8,
        monitor_supply: bool,
    ) -> Result<CoinCapabilities, LedgerError>;

    /// Metadata of an initialized coin.
    fn coin_info(&self, coin_type: &CoinType) -> Option<CoinInfo>;

    /// Total supply, `None` when the coin does not monitor supply.
    fn supply(&self, coin_type: &CoinType) -> Result<Option<u128>, LedgerError>;

    /// Opens an empty holding. Returns `false` if one already existed.
    fn register(
        &mut self,
        account: &AccountAddress,
        coin_type: &CoinType,
    ) -> Result<bool, LedgerError>;

    /// Whether `account` holds a store for `coin_type`.
    fn is_registered(&self, account: &AccountAddress, coin_type: &CoinType) -> bool;

    /// Balance of a registered holding.
    fn balance_of(&self, account: &AccountAddress, coin_type: &CoinType)
        -> Result<u64, LedgerError>;

    /// Frozen flag of a registered holding.
    fn is_frozen(&self, account: &AccountAddress, coin_type: &CoinType)
        -> Result<bool, LedgerError>;

    /// Moves coins between user accounts (or from a user into a resource account).
    fn transfer(
        &mut self,
        coin_type: &CoinType,
        from: &AccountAddress,
        to: &AccountAddress,
        amount: u64,
    ) -> Result<(), LedgerError>;

    /// Moves coins out of a resource account, authorized by its capability.
    fn transfer_with_capability(
        &mut self,
        signer: &SignerCapability,
        coin_type: &CoinType,
        to: &AccountAddress,
        amount: u64,
    ) -> Result<(), LedgerError>;

    /// Mints `amount` directly into `to`'s holding.
    fn mint(
        &mut self,
        cap: &MintCapability,
        to: &AccountAddress,
        amount: u64,
    ) -> Result<(), LedgerError>;

    /// Burns `amount` from `account`'s holding. Ignores the frozen flag.
    fn burn_from(
        &mut self,
        cap: &BurnCapability,
        account: &AccountAddress,
        amount: u64,
    ) -> Result<(), LedgerError>;

    /// Sets or clears the frozen flag on `account`'s holding.
    fn set_frozen(
        &mut self,
        cap: &FreezeCapability,
        account: &AccountAddress,
        frozen: bool,
    ) -> Result<(), LedgerError>;

    // --- resources ---

    /// Stores `value` under the signer's account as `tag`, replacing any
    /// previous value.
    fn publish_resource(
        &mut self,
        signer: &SignerCapability,
        tag: &str,
        value: serde_json::Value,
    ) -> Result<(), LedgerError>;

    /// The raw resource published under `address` as `tag`.
    fn resource(&self, address: &AccountAddress, tag: &str) -> Option<serde_json::Value>;

    /// Serializes and publishes a typed resource.
    fn publish<T: Serialize>(
        &mut self,
        signer: &SignerCapability,
        tag: &str,
        value: &T,
    ) -> Result<(), LedgerError>
    where
        Self: Sized,
    {
        let value =
            serde_json::to_value(value).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        self.publish_resource(signer, tag, value)
    }

    /// Reads and decodes a typed resource. `Ok(None)` if nothing is published.
    fn borrow_resource<T: DeserializeOwned>(
        &self,
        address: &AccountAddress,
        tag: &str,
    ) -> Result<Option<T>, LedgerError>
    where
        Self: Sized,
    {
        self.resource(address, tag)
            .map(|value| {
                serde_json::from_value(value).map_err(|e| LedgerError::Serialization(e.to_string()))
            })
            .transpose()
    }

    // --- events ---

    /// Creates a new event handle owned by the signer's resource account.
    fn new_event_handle(&mut self, signer: &SignerCapability) -> Result<EventGuid, LedgerError>;

    /// Appends an event to a handle owned by the signer. Returns its sequence number.
    fn emit_event(
        &mut self,
        signer: &SignerCapability,
        guid: &EventGuid,
        type_tag: &str,
        data: serde_json::Value,
    ) -> Result<u64, LedgerError>;

    /// Events of one handle, in emission order.
    fn events(&self, guid: &EventGuid) -> Result<Vec<EventRecord>, LedgerError>;

    /// Every event, in global emission order.
    fn event_log(&self) -> Vec<EventRecord>;
}
