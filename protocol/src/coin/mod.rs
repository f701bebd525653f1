//! # Coin Module: Types, Holdings & Capabilities
//!
//! ```text
//! info.rs       : CoinType tags and CoinInfo metadata
//! store.rs      : per-(account, coin) balance and frozen flag
//! capability.rs : mint/burn/freeze and signer capabilities
//! ```
//!
//! All amounts are `u64` base units. `decimals` is display metadata only.

pub mod capability;
pub mod info;
pub mod store;

pub use capability::{
    BurnCapability, CoinCapabilities, FreezeCapability, MintCapability, SignerCapability,
};
pub use info::{CoinInfo, CoinType, CoinTypeError};
pub use store::{BalanceError, CoinStore};
