//! # In-Memory Ledger
//!
//! [`MemoryLedger`] implements [`Ledger`] over a single [`LedgerState`].
//! Checkpoints are whole-state clones, which keeps rollback trivially
//! correct at the cost of O(state) per operation.
//!
//! ## Transfer rules
//!
//! For `transfer(coin, from, to, amount)`:
//!
//! 1. `coin` must be initialized.
//! 2. `from` must exist and must not be a resource account.
//! 3. Both sides must be registered for `coin`.
//! 4. Neither side may be frozen.
//! 5. `from` must hold at least `amount`, and `to` must not overflow.
//!
//! All checks run before any store is touched.

use chrono::Utc;
use tracing::debug;

use super::state::{AccountState, LedgerState};
use super::{Ledger, LedgerError, WithdrawAuthorization};
use crate::coin::{
    BalanceError, BurnCapability, CoinCapabilities, CoinInfo, CoinStore, CoinType,
    FreezeCapability, MintCapability, SignerCapability,
};
use crate::config::LedgerConfig;
use crate::events::{EventGuid, EventHandle, EventRecord};
use crate::identity::AccountAddress;

/// The in-process ledger.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    config: LedgerConfig,
    state: LedgerState,
}

impl MemoryLedger {
    /// An empty ledger with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty ledger with the given limits.
    pub fn with_config(config: LedgerConfig) -> Self {
        Self {
            config,
            state: LedgerState::new(),
        }
    }

    /// The active limits.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Read access to the raw state.
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// Merkle root of the current state.
    pub fn state_root(&self) -> Result<[u8; 32], LedgerError> {
        self.state.root_hash()
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn require_coin(&self, coin_type: &CoinType) -> Result<&CoinInfo, LedgerError> {
        self.state
            .coins
            .get(coin_type)
            .ok_or_else(|| LedgerError::CoinNotInitialized(coin_type.clone()))
    }

    fn require_account(&self, address: &AccountAddress) -> Result<&AccountState, LedgerError> {
        self.state
            .accounts
            .get(address)
            .ok_or(LedgerError::AccountNotFound(*address))
    }

    fn require_store(
        &self,
        address: &AccountAddress,
        coin_type: &CoinType,
    ) -> Result<&CoinStore, LedgerError> {
        self.require_account(address)?
            .coin_stores
            .get(coin_type)
            .ok_or_else(|| LedgerError::AccountNotRegistered {
                account: *address,
                coin_type: coin_type.clone(),
            })
    }

    fn store_mut(
        &mut self,
        address: &AccountAddress,
        coin_type: &CoinType,
    ) -> Result<&mut CoinStore, LedgerError> {
        self.state
            .accounts
            .get_mut(address)
            .ok_or(LedgerError::AccountNotFound(*address))?
            .coin_stores
            .get_mut(coin_type)
            .ok_or_else(|| LedgerError::AccountNotRegistered {
                account: *address,
                coin_type: coin_type.clone(),
            })
    }

    fn require_unfrozen(
        &self,
        address: &AccountAddress,
        coin_type: &CoinType,
    ) -> Result<&CoinStore, LedgerError> {
        let store = self.require_store(address, coin_type)?;
        if store.frozen {
            return Err(LedgerError::AccountFrozen {
                account: *address,
                coin_type: coin_type.clone(),
            });
        }
        Ok(store)
    }

    /// Verifies that `signer` holds the key registered for its account by
    /// having it sign `digest`.
    fn authenticate(&self, signer: &SignerCapability, digest: &[u8]) -> Result<(), LedgerError> {
        let address = signer.address();
        let account = self.require_account(address)?;
        let authority = account
            .authority
            .as_ref()
            .ok_or_else(|| LedgerError::CapabilityMismatch {
                expected: "resource account".into(),
                actual: address.to_string(),
            })?;
        if !authority.verify(digest, &signer.sign(digest)) {
            return Err(LedgerError::InvalidAuthorization(*address));
        }
        Ok(())
    }

    fn balance_error(
        err: BalanceError,
        account: &AccountAddress,
        coin_type: &CoinType,
    ) -> LedgerError {
        match err {
            BalanceError::InsufficientBalance {
                available,
                requested,
            } => LedgerError::InsufficientBalance {
                account: *account,
                coin_type: coin_type.clone(),
                available,
                requested,
            },
            BalanceError::Overflow { .. } => LedgerError::Overflow {
                coin_type: coin_type.clone(),
            },
        }
    }

    /// Validates and applies a move between two registered holdings.
    fn move_coins(
        &mut self,
        coin_type: &CoinType,
        from: &AccountAddress,
        to: &AccountAddress,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let from_store = self.require_unfrozen(from, coin_type)?;
        let available = from_store.balance;
        let to_store = self.require_unfrozen(to, coin_type)?;

        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: *from,
                coin_type: coin_type.clone(),
                available,
                requested: amount,
            });
        }
        if from != to && to_store.balance.checked_add(amount).is_none() {
            return Err(LedgerError::Overflow {
                coin_type: coin_type.clone(),
            });
        }

        self.store_mut(from, coin_type)?
            .debit(amount)
            .map_err(|e| Self::balance_error(e, from, coin_type))?;
        self.store_mut(to, coin_type)?
            .credit(amount)
            .map_err(|e| Self::balance_error(e, to, coin_type))?;

        debug!(
            coin = %coin_type,
            from = %from.short(),
            to = %to.short(),
            amount,
            "coins moved"
        );
        Ok(())
    }

    fn validate_metadata(&self, name: &str, symbol: &str, decimals: u8) -> Result<(), LedgerError> {
        if name.is_empty() || name.len() > self.config.max_coin_name_length {
            return Err(LedgerError::InvalidCoinMetadata(format!(
                "name must be 1..={} bytes, got {}",
                self.config.max_coin_name_length,
                name.len()
            )));
        }
        if symbol.is_empty() || symbol.len() > self.config.max_coin_symbol_length {
            return Err(LedgerError::InvalidCoinMetadata(format!(
                "symbol must be 1..={} bytes, got {}",
                self.config.max_coin_symbol_length,
                symbol.len()
            )));
        }
        if decimals > self.config.max_coin_decimals {
            return Err(LedgerError::InvalidCoinMetadata(format!(
                "decimals must be <= {}, got {}",
                self.config.max_coin_decimals, decimals
            )));
        }
        Ok(())
    }

    fn handle_auth_digest(guid: &EventGuid, counter: u64) -> [u8; 32] {
        crate::crypto::blake3_hash(
            format!("strongbox/event/{}/{}", guid, counter).as_bytes(),
        )
    }

    fn resource_auth_digest(address: &AccountAddress, tag: &str, sequence: u64) -> [u8; 32] {
        crate::crypto::blake3_hash(
            format!("strongbox/resource/{}/{}/{}", address, tag, sequence).as_bytes(),
        )
    }
}

impl Ledger for MemoryLedger {
    type Checkpoint = LedgerState;

    fn checkpoint(&self) -> LedgerState {
        self.state.clone()
    }

    fn restore(&mut self, checkpoint: LedgerState) {
        debug!("ledger rolled back to checkpoint");
        self.state = checkpoint;
    }

    // --- accounts ---

    fn create_account(&mut self, address: AccountAddress) -> Result<(), LedgerError> {
        if self.state.accounts.contains_key(&address) {
            return Err(LedgerError::AccountAlreadyExists(address));
        }
        self.state.accounts.insert(address, AccountState::user());
        debug!(account = %address.short(), "account created");
        Ok(())
    }

    fn account_exists(&self, address: &AccountAddress) -> bool {
        self.state.accounts.contains_key(address)
    }

    fn create_resource_account(
        &mut self,
        creator: &AccountAddress,
        seed: &[u8],
    ) -> Result<SignerCapability, LedgerError> {
        let address = AccountAddress::derive_resource(creator, seed);
        if self.state.accounts.contains_key(&address) {
            return Err(LedgerError::AccountAlreadyExists(address));
        }
        let (capability, authority) = SignerCapability::issue(address);
        self.state
            .accounts
            .insert(address, AccountState::resource(authority));
        debug!(
            account = %address.short(),
            creator = %creator.short(),
            "resource account created"
        );
        Ok(capability)
    }

    fn is_resource_account(&self, address: &AccountAddress) -> bool {
        self.state
            .accounts
            .get(address)
            .map(AccountState::is_resource)
            .unwrap_or(false)
    }

    // --- coins ---

    fn initialize_coin(
        &mut self,
        issuer: &AccountAddress,
        coin_type: CoinType,
        name: &str,
        symbol: &str,
        decimals: u8,
        monitor_supply: bool,
    ) -> Result<CoinCapabilities, LedgerError> {
        if coin_type.address() != issuer {
            return Err(LedgerError::CoinAddressMismatch {
                coin_type,
                issuer: *issuer,
            });
        }
        self.require_account(issuer)?;
        if self.state.coins.contains_key(&coin_type) {
            return Err(LedgerError::CoinAlreadyInitialized(coin_type));
        }
        self.validate_metadata(name, symbol, decimals)?;

        let info = CoinInfo {
            coin_type: coin_type.clone(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
            supply: monitor_supply.then_some(0),
        };
        self.state.coins.insert(coin_type.clone(), info);
        debug!(coin = %coin_type, symbol, decimals, monitor_supply, "coin initialized");
        Ok(CoinCapabilities::issue(&coin_type))
    }

    fn coin_info(&self, coin_type: &CoinType) -> Option<CoinInfo> {
        self.state.coins.get(coin_type).cloned()
    }

    fn supply(&self, coin_type: &CoinType) -> Result<Option<u128>, LedgerError> {
        Ok(self.require_coin(coin_type)?.supply)
    }

    fn register(
        &mut self,
        account: &AccountAddress,
        coin_type: &CoinType,
    ) -> Result<bool, LedgerError> {
        self.require_coin(coin_type)?;
        let state = self
            .state
            .accounts
            .get_mut(account)
            .ok_or(LedgerError::AccountNotFound(*account))?;
        if state.coin_stores.contains_key(coin_type) {
            return Ok(false);
        }
        state.coin_stores.insert(coin_type.clone(), CoinStore::new());
        debug!(account = %account.short(), coin = %coin_type, "holding registered");
        Ok(true)
    }

    fn is_registered(&self, account: &AccountAddress, coin_type: &CoinType) -> bool {
        self.state.store(account, coin_type).is_some()
    }

    fn balance_of(
        &self,
        account: &AccountAddress,
        coin_type: &CoinType,
    ) -> Result<u64, LedgerError> {
        Ok(self.require_store(account, coin_type)?.balance)
    }

    fn is_frozen(
        &self,
        account: &AccountAddress,
        coin_type: &CoinType,
    ) -> Result<bool, LedgerError> {
        Ok(self.require_store(account, coin_type)?.frozen)
    }

    fn transfer(
        &mut self,
        coin_type: &CoinType,
        from: &AccountAddress,
        to: &AccountAddress,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.require_coin(coin_type)?;
        if self.require_account(from)?.is_resource() {
            return Err(LedgerError::CapabilityRequired(*from));
        }
        self.move_coins(coin_type, from, to, amount)
    }

    fn transfer_with_capability(
        &mut self,
        signer: &SignerCapability,
        coin_type: &CoinType,
        to: &AccountAddress,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.require_coin(coin_type)?;
        let from = *signer.address();
        let sequence = self.require_account(&from)?.sequence_number;

        let authorization = WithdrawAuthorization {
            coin_type: coin_type.clone(),
            from,
            to: *to,
            amount,
            sequence,
        };
        self.authenticate(signer, &authorization.signing_digest()?)?;

        self.move_coins(coin_type, &from, to, amount)?;

        if let Some(account) = self.state.accounts.get_mut(&from) {
            account.sequence_number += 1;
        }
        Ok(())
    }

    fn mint(
        &mut self,
        cap: &MintCapability,
        to: &AccountAddress,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let coin_type = cap.coin_type();
        let info = self.require_coin(coin_type)?;
        let new_supply = match info.supply {
            Some(supply) => Some(supply.checked_add(u128::from(amount)).ok_or_else(|| {
                LedgerError::Overflow {
                    coin_type: coin_type.clone(),
                }
            })?),
            None => None,
        };
        let store = self.require_unfrozen(to, coin_type)?;
        if store.balance.checked_add(amount).is_none() {
            return Err(LedgerError::Overflow {
                coin_type: coin_type.clone(),
            });
        }

        self.store_mut(to, coin_type)?
            .credit(amount)
            .map_err(|e| Self::balance_error(e, to, coin_type))?;
        if let Some(info) = self.state.coins.get_mut(coin_type) {
            info.supply = new_supply;
        }
        debug!(coin = %coin_type, to = %to.short(), amount, "minted");
        Ok(())
    }

    fn burn_from(
        &mut self,
        cap: &BurnCapability,
        account: &AccountAddress,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let coin_type = cap.coin_type();
        let info = self.require_coin(coin_type)?;
        let new_supply = match info.supply {
            Some(supply) => Some(supply.checked_sub(u128::from(amount)).ok_or_else(|| {
                LedgerError::Overflow {
                    coin_type: coin_type.clone(),
                }
            })?),
            None => None,
        };

        self.store_mut(account, coin_type)?
            .debit(amount)
            .map_err(|e| Self::balance_error(e, account, coin_type))?;
        if let Some(info) = self.state.coins.get_mut(coin_type) {
            info.supply = new_supply;
        }
        debug!(coin = %coin_type, account = %account.short(), amount, "burned");
        Ok(())
    }

    fn set_frozen(
        &mut self,
        cap: &FreezeCapability,
        account: &AccountAddress,
        frozen: bool,
    ) -> Result<(), LedgerError> {
        let coin_type = cap.coin_type();
        self.require_coin(coin_type)?;
        self.store_mut(account, coin_type)?.frozen = frozen;
        debug!(coin = %coin_type, account = %account.short(), frozen, "frozen flag set");
        Ok(())
    }

    // --- resources ---

    fn publish_resource(
        &mut self,
        signer: &SignerCapability,
        tag: &str,
        value: serde_json::Value,
    ) -> Result<(), LedgerError> {
        let address = *signer.address();
        let sequence = self.require_account(&address)?.sequence_number;
        self.authenticate(signer, &Self::resource_auth_digest(&address, tag, sequence))?;

        if let Some(account) = self.state.accounts.get_mut(&address) {
            account.resources.insert(tag.to_string(), value);
        }
        debug!(account = %address.short(), tag, "resource published");
        Ok(())
    }

    fn resource(&self, address: &AccountAddress, tag: &str) -> Option<serde_json::Value> {
        self.state.resource(address, tag).cloned()
    }

    // --- events ---

    fn new_event_handle(&mut self, signer: &SignerCapability) -> Result<EventGuid, LedgerError> {
        let address = *signer.address();
        let creation_number = self.require_account(&address)?.guid_creation_number;
        let guid = EventGuid {
            address,
            creation_number,
        };
        self.authenticate(signer, &Self::handle_auth_digest(&guid, 0))?;

        if let Some(account) = self.state.accounts.get_mut(&address) {
            account.guid_creation_number += 1;
        }
        self.state.handles.insert(guid, EventHandle::new(guid));
        debug!(guid = %guid, "event handle created");
        Ok(guid)
    }

    fn emit_event(
        &mut self,
        signer: &SignerCapability,
        guid: &EventGuid,
        type_tag: &str,
        data: serde_json::Value,
    ) -> Result<u64, LedgerError> {
        if signer.address() != &guid.address {
            return Err(LedgerError::CapabilityMismatch {
                expected: guid.address.to_string(),
                actual: signer.address().to_string(),
            });
        }
        let counter = self
            .state
            .handles
            .get(guid)
            .ok_or(LedgerError::EventHandleNotFound(*guid))?
            .counter;
        self.authenticate(signer, &Self::handle_auth_digest(guid, counter + 1))?;

        let size = serde_json::to_vec(&data)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?
            .len();
        if size > self.config.max_event_data_bytes {
            return Err(LedgerError::EventTooLarge {
                size,
                limit: self.config.max_event_data_bytes,
            });
        }

        if let Some(handle) = self.state.handles.get_mut(guid) {
            handle.counter += 1;
        }
        self.state.events.push(EventRecord {
            guid: *guid,
            sequence_number: counter,
            type_tag: type_tag.to_string(),
            data,
            emitted_at: Utc::now(),
        });
        debug!(guid = %guid, type_tag, sequence = counter, "event emitted");
        Ok(counter)
    }

    fn events(&self, guid: &EventGuid) -> Result<Vec<EventRecord>, LedgerError> {
        if !self.state.handles.contains_key(guid) {
            return Err(LedgerError::EventHandleNotFound(*guid));
        }
        Ok(self
            .state
            .events
            .iter()
            .filter(|record| &record.guid == guid)
            .cloned()
            .collect())
    }

    fn event_log(&self) -> Vec<EventRecord> {
        self.state.events.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
