//! # Account Addresses
//!
//! Every account on the ledger, whether a user account or a resource account
//! owned by a component, is identified by a 32-byte [`AccountAddress`].
//!
//! Two derivations:
//!
//! ```text
//! named:    SHA-256("strongbox/named" || label)
//! resource: SHA-256(creator || seed || 0xFF)
//! ```
//!
//! Resource addresses are fully determined by `(creator, seed)`: the same
//! creator reusing a seed lands on the same address, which is how duplicate
//! vaults and double token initialization are detected.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{ADDRESS_LENGTH, NAMED_ADDRESS_DOMAIN, RESOURCE_ADDRESS_SCHEME};
use crate::crypto::hash::sha256_multi;

/// Errors from parsing an address string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid address hex: {0}")]
    InvalidHex(String),

    #[error("invalid address length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// A 32-byte account address. Displayed as `0x` followed by 64 hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountAddress([u8; ADDRESS_LENGTH]);

impl AccountAddress {
    /// The all-zero address. Never derived by either scheme in practice.
    pub const ZERO: AccountAddress = AccountAddress([0u8; ADDRESS_LENGTH]);

    /// Wraps raw bytes.
    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Lowercase hex without the `0x` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses hex with or without a leading `0x`.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        if bytes.len() != ADDRESS_LENGTH {
            return Err(AddressError::InvalidLength(bytes.len()));
        }
        let mut arr = [0u8; ADDRESS_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Deterministic address for a human-readable label.
    pub fn from_name(label: &str) -> Self {
        Self(sha256_multi(&[NAMED_ADDRESS_DOMAIN.as_bytes(), label.as_bytes()]))
    }

    /// Derives the resource-account address for `(creator, seed)`.
    pub fn derive_resource(creator: &AccountAddress, seed: &[u8]) -> Self {
        Self(sha256_multi(&[
            creator.as_bytes(),
            seed,
            &[RESOURCE_ADDRESS_SCHEME],
        ]))
    }

    /// First eight hex digits, for compact log fields.
    pub fn short(&self) -> String {
        format!("0x{}", &self.to_hex()[..8])
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountAddress({}...)", &self.to_hex()[..12])
    }
}

impl FromStr for AccountAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// Hex strings on the wire so addresses work as JSON map keys.
impl Serialize for AccountAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        AccountAddress::from_hex(&s).map_err(de::Error::custom)
    }
}
