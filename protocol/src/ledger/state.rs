//! # Ledger State
//!
//! The whole ledger lives in one [`LedgerState`] value: accounts with their
//! coin stores and published resources, coin metadata, event handles and the
//! global event log.
//! Ordered maps keep iteration (and therefore the state root) independent
//! of insertion order.
//!
//! ## State root
//!
//! ```text
//! leaves = [ H(ctx, "acct" || addr || bincode(leaf))    for accounts ]
//!       ++ [ H(ctx, "coin" || bincode(info))            for coins ]
//!       ++ [ H(ctx, "evh"  || bincode(handle))          for handles ]
//! root   = merkle_root(leaves)
//! ```
//!
//! Event bodies are not hashed; handle counters are, so any emission still
//! moves the root. An account leaf carries whether the account is a resource
//! account but not its authority key, which is freshly random per ledger.
//! Resources are hashed as their JSON text.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::coin::{CoinInfo, CoinStore, CoinType};
use crate::config::STATE_ROOT_CONTEXT;
use crate::crypto::hash::{domain_separated_hash, merkle_root};
use crate::crypto::keys::AuthorityPublicKey;
use crate::events::{EventGuid, EventHandle, EventRecord};
use crate::identity::AccountAddress;
use crate::ledger::LedgerError;

// ---------------------------------------------------------------------------
// AccountState
// ---------------------------------------------------------------------------

/// The state of a single account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Number of authorized withdrawals performed by this account's signer.
    pub sequence_number: u64,
    /// Next event-handle creation number.
    pub guid_creation_number: u64,
    /// Present for resource accounts: the public half of the signer key.
    pub authority: Option<AuthorityPublicKey>,
    /// Holdings, one per registered coin type.
    pub coin_stores: BTreeMap<CoinType, CoinStore>,
    /// Records published under this account, keyed by type tag.
    pub resources: BTreeMap<String, serde_json::Value>,
}

impl AccountState {
    /// A plain user account.
    pub fn user() -> Self {
        Self::default()
    }

    /// A resource account controlled by `authority`.
    pub fn resource(authority: AuthorityPublicKey) -> Self {
        Self {
            authority: Some(authority),
            ..Default::default()
        }
    }

    /// Whether this is a resource account.
    pub fn is_resource(&self) -> bool {
        self.authority.is_some()
    }

    fn leaf_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        let resources = self
            .resources
            .iter()
            .map(|(tag, value)| {
                serde_json::to_string(value)
                    .map(|json| (tag.as_str(), json))
                    .map_err(|e| LedgerError::Serialization(e.to_string()))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        let leaf = AccountLeaf {
            sequence_number: self.sequence_number,
            guid_creation_number: self.guid_creation_number,
            is_resource: self.is_resource(),
            coin_stores: &self.coin_stores,
            resources,
        };
        bincode::serialize(&leaf).map_err(|e| LedgerError::Serialization(e.to_string()))
    }
}

/// What an account contributes to the state root.
#[derive(Serialize)]
struct AccountLeaf<'a> {
    sequence_number: u64,
    guid_creation_number: u64,
    is_resource: bool,
    coin_stores: &'a BTreeMap<CoinType, CoinStore>,
    resources: BTreeMap<&'a str, String>,
}

// ---------------------------------------------------------------------------
// LedgerState
// ---------------------------------------------------------------------------

/// Everything the ledger knows. Cloned wholesale to checkpoint.
#[derive(Clone, Debug, Default)]
pub struct LedgerState {
    pub(crate) accounts: BTreeMap<AccountAddress, AccountState>,
    pub(crate) coins: BTreeMap<CoinType, CoinInfo>,
    pub(crate) handles: BTreeMap<EventGuid, EventHandle>,
    pub(crate) events: Vec<EventRecord>,
}

impl LedgerState {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve an account.
    pub fn account(&self, address: &AccountAddress) -> Option<&AccountState> {
        self.accounts.get(address)
    }

    /// Retrieve a holding.
    pub fn store(&self, address: &AccountAddress, coin_type: &CoinType) -> Option<&CoinStore> {
        self.accounts
            .get(address)
            .and_then(|account| account.coin_stores.get(coin_type))
    }

    /// Number of events recorded so far.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Iterates every (account, coin, store) triple in address order.
    pub fn holdings(&self) -> impl Iterator<Item = (&AccountAddress, &CoinType, &CoinStore)> {
        self.accounts.iter().flat_map(|(address, account)| {
            account
                .coin_stores
                .iter()
                .map(move |(coin_type, store)| (address, coin_type, store))
        })
    }

    /// A published resource, if any.
    pub fn resource(&self, address: &AccountAddress, tag: &str) -> Option<&serde_json::Value> {
        self.accounts
            .get(address)
            .and_then(|account| account.resources.get(tag))
    }

    /// Compute the Merkle root over the whole state.
    ///
    /// An empty ledger returns `[0u8; 32]`. Two ledgers that ran the same
    /// operations have the same root.
    pub fn root_hash(&self) -> Result<[u8; 32], LedgerError> {
        let mut leaves: Vec<[u8; 32]> =
            Vec::with_capacity(self.accounts.len() + self.coins.len() + self.handles.len());

        for (address, account) in &self.accounts {
            let mut preimage = b"acct".to_vec();
            preimage.extend_from_slice(address.as_bytes());
            preimage.extend_from_slice(&account.leaf_bytes()?);
            leaves.push(domain_separated_hash(STATE_ROOT_CONTEXT, &preimage));
        }

        for info in self.coins.values() {
            let mut preimage = b"coin".to_vec();
            preimage.extend_from_slice(&encode(info)?);
            leaves.push(domain_separated_hash(STATE_ROOT_CONTEXT, &preimage));
        }

        for handle in self.handles.values() {
            let mut preimage = b"evh".to_vec();
            preimage.extend_from_slice(&encode(handle)?);
            leaves.push(domain_separated_hash(STATE_ROOT_CONTEXT, &preimage));
        }

        Ok(merkle_root(&leaves))
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, LedgerError> {
    bincode::serialize(value).map_err(|e| LedgerError::Serialization(e.to_string()))
}
