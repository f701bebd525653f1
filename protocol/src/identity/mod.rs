//! # Identity Module
//!
//! Accounts are named by a 32-byte [`AccountAddress`]. Two schemes produce
//! them:
//!
//! 1. **Named**: `SHA-256("strongbox/named" || label)`. Used for user
//!    accounts in scenarios and tests, so `alice` is the same address
//!    everywhere.
//! 2. **Resource**: `SHA-256(creator || seed || 0xFF)`. Deterministic per
//!    `(creator, seed)` pair; the trailing scheme byte keeps the two spaces
//!    apart.

pub mod address;

pub use address::{AccountAddress, AddressError};
