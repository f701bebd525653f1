//! # Ledger Configuration & Constants
//!
//! Every magic number in Strongbox lives here. If you're hardcoding a limit
//! somewhere else, move it here first.
//!
//! Two layers:
//!
//! - **Constants**: fixed protocol parameters (address length, derivation
//!   scheme bytes, hash contexts). Changing these changes every derived
//!   address, so they are not configurable.
//! - **[`LedgerConfig`]**: operator-tunable limits loaded from JSON by the
//!   node binary. Defaults match the constants below.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The ledger protocol version, reported by `strongbox version`.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Addressing
// ---------------------------------------------------------------------------

/// Account addresses are 32 bytes. Always.
pub const ADDRESS_LENGTH: usize = 32;

/// Scheme byte appended to the preimage of a resource-account address.
///
/// Named addresses are hashed under a different domain prefix and never end
/// their preimage with this byte, so the two address spaces are disjoint.
pub const RESOURCE_ADDRESS_SCHEME: u8 = 0xFF;

/// Domain prefix for addresses derived from human-readable labels.
pub const NAMED_ADDRESS_DOMAIN: &str = "strongbox/named";

// ---------------------------------------------------------------------------
// Hash Contexts
// ---------------------------------------------------------------------------

/// BLAKE3 `derive_key` context for state-root leaves.
pub const STATE_ROOT_CONTEXT: &str = "strongbox 2026-10 ledger state root v1";

/// BLAKE3 `derive_key` context for withdrawal-authorization digests.
pub const WITHDRAW_AUTH_CONTEXT: &str = "strongbox 2026-10 withdraw authorization v1";

// ---------------------------------------------------------------------------
// Coin Metadata Limits
// ---------------------------------------------------------------------------

/// Maximum coin name length in bytes.
pub const MAX_COIN_NAME_LENGTH: usize = 32;

/// Maximum coin symbol length in bytes. Tickers are short; ten is plenty.
pub const MAX_COIN_SYMBOL_LENGTH: usize = 10;

/// Maximum decimal precision a coin may declare.
pub const MAX_COIN_DECIMALS: u8 = 32;

/// Upper bound on the serialized size of a single event payload.
pub const MAX_EVENT_DATA_BYTES: usize = 4 * 1024;

// ---------------------------------------------------------------------------
// LedgerConfig
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating a [`LedgerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be parsed.
    #[error("invalid ledger config: {0}")]
    Parse(String),

    /// A limit is out of its allowed range.
    #[error("invalid ledger config: {field} {reason}")]
    InvalidLimit {
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Operator-tunable ledger limits.
///
/// Missing fields in a JSON config fall back to the defaults, so an empty
/// object `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Maximum coin name length accepted by `initialize_coin`.
    pub max_coin_name_length: usize,
    /// Maximum coin symbol length accepted by `initialize_coin`.
    pub max_coin_symbol_length: usize,
    /// Maximum decimals accepted by `initialize_coin`.
    pub max_coin_decimals: u8,
    /// Maximum serialized event payload size.
    pub max_event_data_bytes: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_coin_name_length: MAX_COIN_NAME_LENGTH,
            max_coin_symbol_length: MAX_COIN_SYMBOL_LENGTH,
            max_coin_decimals: MAX_COIN_DECIMALS,
            max_event_data_bytes: MAX_EVENT_DATA_BYTES,
        }
    }
}

impl LedgerConfig {
    /// Parses a config from a JSON string and validates it.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig =
            serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every limit is usable.
    ///
    /// Zero-length names or symbols would make every coin invalid, and a
    /// zero event budget would make every emission fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_coin_name_length == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "max_coin_name_length",
                reason: "must be greater than zero".into(),
            });
        }
        if self.max_coin_symbol_length == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "max_coin_symbol_length",
                reason: "must be greater than zero".into(),
            });
        }
        if self.max_coin_decimals > MAX_COIN_DECIMALS {
            return Err(ConfigError::InvalidLimit {
                field: "max_coin_decimals",
                reason: format!("must not exceed {}", MAX_COIN_DECIMALS),
            });
        }
        if self.max_event_data_bytes == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "max_event_data_bytes",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(LedgerConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_json_yields_defaults() {
        let config = LedgerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, LedgerConfig::default());
    }

    #[test]
    fn partial_json_overrides_one_field() {
        let config = LedgerConfig::from_json_str(r#"{"max_coin_symbol_length": 6}"#).unwrap();
        assert_eq!(config.max_coin_symbol_length, 6);
        assert_eq!(config.max_coin_name_length, MAX_COIN_NAME_LENGTH);
    }

    #[test]
    fn zero_name_length_rejected() {
        let result = LedgerConfig::from_json_str(r#"{"max_coin_name_length": 0}"#);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidLimit {
                field: "max_coin_name_length",
                ..
            })
        ));
    }

    #[test]
    fn decimals_above_protocol_cap_rejected() {
        let config = LedgerConfig {
            max_coin_decimals: MAX_COIN_DECIMALS + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let result = LedgerConfig::from_json_str("not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_address_constants_sanity() {
        assert_eq!(ADDRESS_LENGTH, 32);
        assert_ne!(STATE_ROOT_CONTEXT, WITHDRAW_AUTH_CONTEXT);
    }
}
