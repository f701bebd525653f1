//! # Managed Share Token
//!
//! A single fungible token per admin, administered through the mint, burn
//! and freeze capabilities the ledger hands out at initialization. Those
//! capabilities and the token's resource-account signer stay private to
//! this struct; callers only ever reach them through the admin-gated entry
//! points below. The event handles are published as a ledger resource under
//! the resource account, so a token exists exactly when that record does and
//! an enclosing rollback undoes `initialize` completely.
//!
//! ## Permissions
//!
//! | Entry point          | Who            |
//! |----------------------|----------------|
//! | `initialize`         | admin          |
//! | `register`           | anyone         |
//! | `mint`               | admin          |
//! | `transfer`           | holder         |
//! | `set_frozen`         | admin          |
//! | `burn`, `burn_from`  | admin          |
//!
//! Note that `burn` burns from the admin's own holding; there is no
//! self-service burn for ordinary holders.
//!
//! ## Events
//!
//! One handle per event kind, all owned by the token's resource account.
//! Every successful entry point emits exactly one event, except
//! `initialize` (which emits `Registered` for the admin's holding and then
//! `Initialized`) and a repeated `register` (which emits nothing).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use strongbox_protocol::coin::{CoinCapabilities, CoinType, SignerCapability};
use strongbox_protocol::events::EventGuid;
use strongbox_protocol::identity::AccountAddress;
use strongbox_protocol::ledger::{Ledger, LedgerError};

use crate::events::{
    Burned, FrozenStateChanged, Initialized, Minted, Registered, TokenEvent, Transferred,
};

/// Seed for the token's resource account.
pub const MANAGED_TOKEN_SEED: &[u8] = b"managed_token";

/// Module component of the share token's coin type.
pub const MANAGED_TOKEN_MODULE: &str = "managed_token";

/// Name component of the share token's coin type.
pub const SHARE_TOKEN_NAME: &str = "ShareToken";

/// Tag of the token record published under the resource account.
pub const TOKEN_RECORD_TAG: &str = "managed_token::ShareToken";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// `initialize` has not run yet.
    #[error("token not initialized")]
    NotInitialized,

    /// The caller is not the admin.
    #[error("permission denied: {0} is not the token admin")]
    PermissionDenied(AccountAddress),

    #[error("token already initialized")]
    AlreadyExists,

    #[error("account {0} is not registered for the share token")]
    AccountNotRegistered(AccountAddress),

    #[error("insufficient balance in {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        account: AccountAddress,
        available: u64,
        requested: u64,
    },

    #[error("holding of {0} is frozen")]
    AccountFrozen(AccountAddress),

    #[error("ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for TokenError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AccountAlreadyExists(_) | LedgerError::CoinAlreadyInitialized(_) => {
                TokenError::AlreadyExists
            }
            LedgerError::AccountNotRegistered { account, .. } => {
                TokenError::AccountNotRegistered(account)
            }
            LedgerError::InsufficientBalance {
                account,
                available,
                requested,
                ..
            } => TokenError::InsufficientBalance {
                account,
                available,
                requested,
            },
            LedgerError::AccountFrozen { account, .. } => TokenError::AccountFrozen(account),
            other => TokenError::Ledger(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Handles {
    registered: EventGuid,
    initialized: EventGuid,
    minted: EventGuid,
    transferred: EventGuid,
    frozen_state_changed: EventGuid,
    burned: EventGuid,
}

impl Handles {
    fn create<L: Ledger>(ledger: &mut L, signer: &SignerCapability) -> Result<Self, LedgerError> {
        Ok(Self {
            registered: ledger.new_event_handle(signer)?,
            initialized: ledger.new_event_handle(signer)?,
            minted: ledger.new_event_handle(signer)?,
            transferred: ledger.new_event_handle(signer)?,
            frozen_state_changed: ledger.new_event_handle(signer)?,
            burned: ledger.new_event_handle(signer)?,
        })
    }

    fn for_event(&self, event: &TokenEvent) -> &EventGuid {
        match event {
            TokenEvent::Registered(_) => &self.registered,
            TokenEvent::Initialized(_) => &self.initialized,
            TokenEvent::Minted(_) => &self.minted,
            TokenEvent::Transferred(_) => &self.transferred,
            TokenEvent::FrozenStateChanged(_) => &self.frozen_state_changed,
            TokenEvent::Burned(_) => &self.burned,
        }
    }
}

/// Capabilities handed out by `initialize`. Not serializable, so they stay
/// here while the handles live on the ledger.
#[derive(Debug)]
struct Deployment {
    signer: SignerCapability,
    caps: CoinCapabilities,
}

/// A deployment paired with the record currently on the ledger.
struct Live<'a> {
    signer: &'a SignerCapability,
    caps: &'a CoinCapabilities,
    handles: Handles,
}

impl Live<'_> {
    fn emit<L: Ledger>(&self, ledger: &mut L, event: TokenEvent) -> Result<(), LedgerError> {
        event.emit(ledger, self.signer, self.handles.for_event(&event))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ManagedToken
// ---------------------------------------------------------------------------

/// The share token of one admin.
#[derive(Debug)]
pub struct ManagedToken {
    admin: AccountAddress,
    coin_type: CoinType,
    deployment: Option<Deployment>,
}

impl ManagedToken {
    /// Binds a token to `admin`. Nothing touches the ledger until
    /// [`initialize`](Self::initialize).
    pub fn new(admin: AccountAddress) -> Self {
        Self {
            admin,
            coin_type: CoinType::new(admin, MANAGED_TOKEN_MODULE, SHARE_TOKEN_NAME),
            deployment: None,
        }
    }

    /// Creates the resource account, the coin, its capabilities and the
    /// event handles, and registers the admin's holding.
    ///
    /// # Errors
    ///
    /// - [`TokenError::PermissionDenied`] if `caller` is not the admin.
    /// - [`TokenError::AlreadyExists`] if the token record is already on
    ///   the ledger.
    pub fn initialize<L: Ledger>(
        &mut self,
        ledger: &mut L,
        caller: &AccountAddress,
        name: &str,
        symbol: &str,
        decimals: u8,
        monitor_supply: bool,
    ) -> Result<(), TokenError> {
        self.require_admin(caller, "initialize")?;
        if ledger
            .resource(&self.resource_address(), TOKEN_RECORD_TAG)
            .is_some()
        {
            return Err(TokenError::AlreadyExists);
        }

        let admin = self.admin;
        let coin_type = self.coin_type.clone();
        let deployment = ledger.atomic(|l| -> Result<Deployment, TokenError> {
            let signer = l.create_resource_account(&admin, MANAGED_TOKEN_SEED)?;
            let caps = l.initialize_coin(
                &admin,
                coin_type.clone(),
                name,
                symbol,
                decimals,
                monitor_supply,
            )?;
            let handles = Handles::create(l, &signer)?;
            l.publish(&signer, TOKEN_RECORD_TAG, &handles)?;
            let live = Live {
                signer: &signer,
                caps: &caps,
                handles,
            };

            if l.register(&admin, &coin_type)? {
                live.emit(l, TokenEvent::Registered(Registered { account: admin }))?;
            }
            live.emit(
                l,
                TokenEvent::Initialized(Initialized {
                    admin,
                    name: name.to_string(),
                    symbol: symbol.to_string(),
                    decimals,
                    monitor_supply,
                }),
            )?;
            Ok(Deployment { signer, caps })
        })?;

        info!(coin = %self.coin_type, symbol, decimals, monitor_supply, "share token initialized");
        self.deployment = Some(deployment);
        Ok(())
    }

    /// Opens a zero-balance holding for `account`. Returns `false` if one
    /// already existed.
    pub fn register<L: Ledger>(
        &self,
        ledger: &mut L,
        account: &AccountAddress,
    ) -> Result<bool, TokenError> {
        let live = self.live(ledger)?;
        let opened = ledger.atomic(|l| -> Result<bool, TokenError> {
            let opened = l.register(account, &self.coin_type)?;
            if opened {
                live.emit(l, TokenEvent::Registered(Registered { account: *account }))?;
            }
            Ok(opened)
        })?;
        if opened {
            info!(account = %account.short(), "share token holding registered");
        }
        Ok(opened)
    }

    /// Admin-only: creates `amount` new tokens in `recipient`'s holding.
    pub fn mint<L: Ledger>(
        &self,
        ledger: &mut L,
        caller: &AccountAddress,
        recipient: &AccountAddress,
        amount: u64,
    ) -> Result<(), TokenError> {
        self.require_admin(caller, "mint")?;
        let live = self.live(ledger)?;
        ledger.atomic(|l| -> Result<(), TokenError> {
            l.mint(&live.caps.mint, recipient, amount)?;
            live.emit(
                l,
                TokenEvent::Minted(Minted {
                    recipient: *recipient,
                    amount,
                }),
            )?;
            Ok(())
        })?;
        info!(recipient = %recipient.short(), amount, "share tokens minted");
        Ok(())
    }

    /// Moves `amount` from `sender` to `recipient`.
    pub fn transfer<L: Ledger>(
        &self,
        ledger: &mut L,
        sender: &AccountAddress,
        recipient: &AccountAddress,
        amount: u64,
    ) -> Result<(), TokenError> {
        let live = self.live(ledger)?;
        ledger.atomic(|l| -> Result<(), TokenError> {
            l.transfer(&self.coin_type, sender, recipient, amount)?;
            live.emit(
                l,
                TokenEvent::Transferred(Transferred {
                    sender: *sender,
                    recipient: *recipient,
                    amount,
                }),
            )?;
            Ok(())
        })?;
        info!(
            sender = %sender.short(),
            recipient = %recipient.short(),
            amount,
            "share tokens transferred"
        );
        Ok(())
    }

    /// Admin-only: sets or clears the frozen flag on `target`'s holding.
    pub fn set_frozen<L: Ledger>(
        &self,
        ledger: &mut L,
        caller: &AccountAddress,
        target: &AccountAddress,
        frozen: bool,
    ) -> Result<(), TokenError> {
        self.require_admin(caller, "set_frozen")?;
        let live = self.live(ledger)?;
        ledger.atomic(|l| -> Result<(), TokenError> {
            l.set_frozen(&live.caps.freeze, target, frozen)?;
            live.emit(
                l,
                TokenEvent::FrozenStateChanged(FrozenStateChanged {
                    target: *target,
                    frozen,
                }),
            )?;
            Ok(())
        })?;
        info!(target = %target.short(), frozen, "share token holding frozen state changed");
        Ok(())
    }

    pub fn freeze<L: Ledger>(
        &self,
        ledger: &mut L,
        caller: &AccountAddress,
        target: &AccountAddress,
    ) -> Result<(), TokenError> {
        self.set_frozen(ledger, caller, target, true)
    }

    pub fn unfreeze<L: Ledger>(
        &self,
        ledger: &mut L,
        caller: &AccountAddress,
        target: &AccountAddress,
    ) -> Result<(), TokenError> {
        self.set_frozen(ledger, caller, target, false)
    }

    /// Admin-only: burns `amount` from the admin's own holding.
    pub fn burn<L: Ledger>(
        &self,
        ledger: &mut L,
        caller: &AccountAddress,
        amount: u64,
    ) -> Result<(), TokenError> {
        self.require_admin(caller, "burn")?;
        self.burn_inner(ledger, caller, amount)
    }

    /// Admin-only: burns `amount` from `target` without its consent.
    /// Works on frozen holdings.
    pub fn burn_from<L: Ledger>(
        &self,
        ledger: &mut L,
        caller: &AccountAddress,
        target: &AccountAddress,
        amount: u64,
    ) -> Result<(), TokenError> {
        self.require_admin(caller, "burn_from")?;
        self.burn_inner(ledger, target, amount)
    }

    fn burn_inner<L: Ledger>(
        &self,
        ledger: &mut L,
        target: &AccountAddress,
        amount: u64,
    ) -> Result<(), TokenError> {
        let live = self.live(ledger)?;
        ledger.atomic(|l| -> Result<(), TokenError> {
            l.burn_from(&live.caps.burn, target, amount)?;
            live.emit(
                l,
                TokenEvent::Burned(Burned {
                    burner: self.admin,
                    target: *target,
                    amount,
                }),
            )?;
            Ok(())
        })?;
        info!(target = %target.short(), amount, "share tokens burned");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn admin(&self) -> &AccountAddress {
        &self.admin
    }

    pub fn coin_type(&self) -> &CoinType {
        &self.coin_type
    }

    /// `true` while this instance holds the capabilities and the token
    /// record is on `ledger`.
    pub fn is_initialized<L: Ledger>(&self, ledger: &L) -> bool {
        self.live(ledger).is_ok()
    }

    /// Address of the token's resource account. Deterministic, so it is
    /// known before initialization.
    pub fn resource_address(&self) -> AccountAddress {
        AccountAddress::derive_resource(&self.admin, MANAGED_TOKEN_SEED)
    }

    pub fn balance<L: Ledger>(&self, ledger: &L, account: &AccountAddress) -> Result<u64, TokenError> {
        self.live(ledger)?;
        Ok(ledger.balance_of(account, &self.coin_type)?)
    }

    pub fn is_frozen<L: Ledger>(
        &self,
        ledger: &L,
        account: &AccountAddress,
    ) -> Result<bool, TokenError> {
        self.live(ledger)?;
        Ok(ledger.is_frozen(account, &self.coin_type)?)
    }

    pub fn name<L: Ledger>(&self, ledger: &L) -> Result<String, TokenError> {
        Ok(self.info(ledger)?.name)
    }

    pub fn symbol<L: Ledger>(&self, ledger: &L) -> Result<String, TokenError> {
        Ok(self.info(ledger)?.symbol)
    }

    pub fn decimals<L: Ledger>(&self, ledger: &L) -> Result<u8, TokenError> {
        Ok(self.info(ledger)?.decimals)
    }

    /// `None` when supply is not monitored.
    pub fn total_supply<L: Ledger>(&self, ledger: &L) -> Result<Option<u128>, TokenError> {
        self.live(ledger)?;
        Ok(ledger.supply(&self.coin_type)?)
    }

    /// Every event the token has emitted, decoded, in emission order.
    pub fn events<L: Ledger>(&self, ledger: &L) -> Vec<TokenEvent> {
        let resource = self.resource_address();
        ledger
            .event_log()
            .iter()
            .filter(|record| record.guid.address == resource)
            .filter_map(TokenEvent::from_record)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn require_admin(&self, caller: &AccountAddress, action: &str) -> Result<(), TokenError> {
        if caller != &self.admin {
            warn!(caller = %caller.short(), action, "rejected: caller is not the token admin");
            return Err(TokenError::PermissionDenied(*caller));
        }
        Ok(())
    }

    fn live<L: Ledger>(&self, ledger: &L) -> Result<Live<'_>, TokenError> {
        let deployment = self.deployment.as_ref().ok_or(TokenError::NotInitialized)?;
        let handles = ledger
            .borrow_resource::<Handles>(&self.resource_address(), TOKEN_RECORD_TAG)?
            .ok_or(TokenError::NotInitialized)?;
        Ok(Live {
            signer: &deployment.signer,
            caps: &deployment.caps,
            handles,
        })
    }

    fn info<L: Ledger>(&self, ledger: &L) -> Result<strongbox_protocol::coin::CoinInfo, TokenError> {
        self.live(ledger)?;
        ledger
            .coin_info(&self.coin_type)
            .ok_or(TokenError::NotInitialized)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
