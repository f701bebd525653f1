// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Strongbox Protocol: Ledger Substrate
//!
//! The ledger everything else in Strongbox sits on: accounts, typed coin
//! holdings, capabilities and event handles. The escrow vault and the
//! managed share token in `strongbox-contracts` never hold a balance of
//! their own; they drive this crate through the [`ledger::Ledger`] trait.
//!
//! ## Architecture
//!
//! - **config**: Protocol constants and tunable ledger limits.
//! - **crypto**: Hashing and Ed25519 authority keys.
//! - **identity**: 32-byte account addresses, named and resource-derived.
//! - **coin**: Coin types, per-account stores, and the capabilities that
//!   gate minting, burning, freezing and resource-account withdrawals.
//! - **events**: Append-only event handles and records.
//! - **ledger**: The `Ledger` trait, its in-memory implementation and a
//!   thread-safe shared handle.
//!
//! ## Ground Rules
//!
//! 1. Coins are never created or destroyed outside mint and burn.
//! 2. A failed operation leaves no trace, events included.
//! 3. Capabilities cannot be cloned, serialized or forged. If you hold one,
//!    someone handed it to you.

pub mod coin;
pub mod config;
pub mod crypto;
pub mod events;
pub mod identity;
pub mod ledger;

pub use coin::{CoinInfo, CoinType};
pub use identity::AccountAddress;
pub use ledger::{Ledger, LedgerError, MemoryLedger};
