//! # Coin Types & Metadata
//!
//! A [`CoinType`] names an asset the way a module-qualified type would:
//! `0x<issuer>::<module>::<Name>`. Only the account at `<issuer>` may
//! initialize it, which ties every coin to exactly one publisher.
//!
//! [`CoinInfo`] is the metadata recorded at initialization. Supply is only
//! tracked when the issuer asked for it (`monitor_supply`).

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::identity::{AccountAddress, AddressError};

// ---------------------------------------------------------------------------
// CoinType
// ---------------------------------------------------------------------------

/// Errors from parsing a coin type tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoinTypeError {
    #[error("malformed coin type '{0}': expected <address>::<module>::<name>")]
    Malformed(String),

    #[error("invalid coin type address: {0}")]
    Address(#[from] AddressError),
}

/// A fully qualified coin type tag.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoinType {
    address: AccountAddress,
    module: String,
    name: String,
}

impl CoinType {
    /// Builds a coin type published at `address`.
    pub fn new(address: AccountAddress, module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address,
            module: module.into(),
            name: name.into(),
        }
    }

    /// The publishing account. Only this account may initialize the coin.
    pub fn address(&self) -> &AccountAddress {
        &self.address
    }

    /// The module segment.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The type name segment.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.address, self.module, self.name)
    }
}

impl fmt::Debug for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CoinType({}::{}::{})", self.address.short(), self.module, self.name)
    }
}

impl FromStr for CoinType {
    type Err = CoinTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split("::").collect();
        let [address, module, name] = parts.as_slice() else {
            return Err(CoinTypeError::Malformed(s.to_string()));
        };
        if module.is_empty() || name.is_empty() {
            return Err(CoinTypeError::Malformed(s.to_string()));
        }
        Ok(Self::new(address.parse()?, *module, *name))
    }
}

impl Serialize for CoinType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CoinType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// CoinInfo
// ---------------------------------------------------------------------------

/// Metadata for an initialized coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinInfo {
    /// The coin's type tag.
    pub coin_type: CoinType,
    /// Human-readable name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Decimal places for display. The ledger itself never divides.
    pub decimals: u8,
    /// Total supply in base units, present only when monitored.
    pub supply: Option<u128>,
}

impl CoinInfo {
    /// Whether supply is being tracked for this coin.
    pub fn monitors_supply(&self) -> bool {
        self.supply.is_some()
    }
}
