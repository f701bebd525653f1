// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Strongbox Contracts
//!
//! The two clients of the Strongbox ledger. Neither keeps balances of its
//! own; both are thin orchestration over [`strongbox_protocol::ledger::Ledger`]:
//!
//! - **Escrow Vault**: locks a deposit in a derived resource account until
//!   the owner cancels or a taker exchanges it 1:1 for a second coin.
//! - **Managed Token**: one fungible share token per admin, with
//!   admin-gated mint, burn and freeze, open registration and transfers.
//! - **Events**: typed payloads for everything the two emit.
//!
//! ## Design Principles
//!
//! 1. Every entry point is one [`Ledger::atomic`](strongbox_protocol::ledger::Ledger::atomic)
//!    section. Checks and mutations commit together or not at all.
//! 2. State transitions are explicit: enum variants, not boolean flags.
//! 3. Capabilities stay inside the contract that received them. Callers
//!    identify themselves by address; the contract decides.
//! 4. The two components never call each other.

pub mod escrow_vault;
pub mod events;
pub mod managed_token;

pub use escrow_vault::{EscrowError, EscrowVault, Vault, VaultStatus};
pub use events::{EscrowEvent, TokenEvent};
pub use managed_token::{ManagedToken, TokenError};
