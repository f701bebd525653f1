//! # Capabilities
//!
//! Unforgeable authorization tokens handed out by the ledger.
//!
//! - [`MintCapability`], [`BurnCapability`], [`FreezeCapability`] are issued
//!   once, when a coin is initialized, and are bound to that coin type.
//! - [`SignerCapability`] is issued when a resource account is created and
//!   carries the Ed25519 key that authorizes withdrawals from it.
//!
//! None of these types implement `Clone`, `Copy`, `Serialize` or `Default`,
//! and their constructors are crate-private: the only way to hold one is to
//! have received it from the ledger.

use std::fmt;

use super::info::CoinType;
use crate::crypto::keys::{AuthorityKey, AuthorityPublicKey, AuthoritySignature};
use crate::identity::AccountAddress;

/// Authority to mint new units of one coin type.
pub struct MintCapability {
    coin_type: CoinType,
}

/// Authority to burn units of one coin type from any holder.
pub struct BurnCapability {
    coin_type: CoinType,
}

/// Authority to freeze or unfreeze holdings of one coin type.
pub struct FreezeCapability {
    coin_type: CoinType,
}

/// The three capabilities returned by coin initialization.
#[derive(Debug)]
pub struct CoinCapabilities {
    pub mint: MintCapability,
    pub burn: BurnCapability,
    pub freeze: FreezeCapability,
}

impl CoinCapabilities {
    pub(crate) fn issue(coin_type: &CoinType) -> Self {
        Self {
            mint: MintCapability {
                coin_type: coin_type.clone(),
            },
            burn: BurnCapability {
                coin_type: coin_type.clone(),
            },
            freeze: FreezeCapability {
                coin_type: coin_type.clone(),
            },
        }
    }
}

macro_rules! coin_capability_accessors {
    ($($cap:ident),*) => {
        $(
            impl $cap {
                /// The coin type this capability is bound to.
                pub fn coin_type(&self) -> &CoinType {
                    &self.coin_type
                }
            }

            impl fmt::Debug for $cap {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}({})", stringify!($cap), self.coin_type)
                }
            }
        )*
    };
}

coin_capability_accessors!(MintCapability, BurnCapability, FreezeCapability);

/// Authority to act as a resource account.
///
/// The ledger stores only the public half of `key`; see
/// [`crate::ledger::Ledger::transfer_with_capability`].
pub struct SignerCapability {
    address: AccountAddress,
    key: AuthorityKey,
}

impl SignerCapability {
    pub(crate) fn issue(address: AccountAddress) -> (Self, AuthorityPublicKey) {
        let key = AuthorityKey::generate();
        let public = key.public_key();
        (Self { address, key }, public)
    }

    /// The resource account this capability controls.
    pub fn address(&self) -> &AccountAddress {
        &self.address
    }

    pub(crate) fn sign(&self, message: &[u8]) -> AuthoritySignature {
        self.key.sign(message)
    }
}

impl fmt::Debug for SignerCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignerCapability({})", self.address)
    }
}
