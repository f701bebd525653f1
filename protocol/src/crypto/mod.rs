//! # Cryptographic Primitives for Strongbox
//!
//! Thin, type-safe wrappers around audited implementations:
//!
//! - **SHA-256** for account address derivation.
//! - **BLAKE3** for state roots and authorization digests.
//! - **Ed25519** for resource-account authority keys.

pub mod hash;
pub mod keys;

pub use hash::{blake3_hash, domain_separated_hash, merkle_root, sha256_array};
pub use keys::{AuthorityKey, AuthorityPublicKey, AuthoritySignature};
