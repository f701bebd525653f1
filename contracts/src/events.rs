//! # Contract Events
//!
//! Typed payloads for everything the escrow vault and the managed token
//! emit. On the ledger an event is a `(type_tag, serde_json::Value)` pair;
//! [`TokenEvent`] and [`EscrowEvent`] convert between that and the structs
//! below.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use strongbox_protocol::coin::{CoinType, SignerCapability};
use strongbox_protocol::events::{EventGuid, EventRecord};
use strongbox_protocol::identity::AccountAddress;
use strongbox_protocol::ledger::{Ledger, LedgerError};

// ---------------------------------------------------------------------------
// Managed token payloads
// ---------------------------------------------------------------------------

/// A holding of the share token was opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registered {
    pub account: AccountAddress,
}

/// The share token was initialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initialized {
    pub admin: AccountAddress,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub monitor_supply: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minted {
    pub recipient: AccountAddress,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transferred {
    pub sender: AccountAddress,
    pub recipient: AccountAddress,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrozenStateChanged {
    pub target: AccountAddress,
    pub frozen: bool,
}

/// `burner == target` for a self-burn by the admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Burned {
    pub burner: AccountAddress,
    pub target: AccountAddress,
    pub amount: u64,
}

// ---------------------------------------------------------------------------
// Escrow vault payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultCreated {
    pub vault: AccountAddress,
    pub owner: AccountAddress,
    pub coin_type: CoinType,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultCancelled {
    pub vault: AccountAddress,
    pub owner: AccountAddress,
    pub amount: u64,
}

/// Both legs of an exchange: `amount` of `first_coin` to the taker and
/// `amount` of `second_coin` to the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultExchanged {
    pub vault: AccountAddress,
    pub owner: AccountAddress,
    pub taker: AccountAddress,
    pub first_coin: CoinType,
    pub second_coin: CoinType,
    pub amount: u64,
}

// ---------------------------------------------------------------------------
// Enum wrappers
// ---------------------------------------------------------------------------

fn decode<T: DeserializeOwned>(record: &EventRecord) -> Option<T> {
    serde_json::from_value(record.data.clone()).ok()
}

macro_rules! event_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant($variant),)+
        }

        impl $name {
            /// Tag stored next to the payload on the ledger.
            pub fn type_tag(&self) -> &'static str {
                match self {
                    $($name::$variant(_) => stringify!($variant),)+
                }
            }

            /// The payload as the ledger stores it.
            pub fn payload(&self) -> Result<serde_json::Value, LedgerError> {
                let value = match self {
                    $($name::$variant(inner) => serde_json::to_value(inner),)+
                };
                value.map_err(|e| LedgerError::Serialization(e.to_string()))
            }

            /// Appends this event to `guid`. Returns its sequence number.
            pub fn emit<L: Ledger>(
                &self,
                ledger: &mut L,
                signer: &SignerCapability,
                guid: &EventGuid,
            ) -> Result<u64, LedgerError> {
                ledger.emit_event(signer, guid, self.type_tag(), self.payload()?)
            }

            /// Decodes a ledger record. Unknown tags and malformed bodies yield `None`.
            pub fn from_record(record: &EventRecord) -> Option<Self> {
                match record.type_tag.as_str() {
                    $(stringify!($variant) => decode(record).map($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

event_enum! {
    /// Everything the managed token emits.
    TokenEvent {
        Registered,
        Initialized,
        Minted,
        Transferred,
        FrozenStateChanged,
        Burned,
    }
}

event_enum! {
    /// Everything an escrow vault emits.
    EscrowEvent {
        VaultCreated,
        VaultCancelled,
        VaultExchanged,
    }
}
