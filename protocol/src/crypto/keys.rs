//! # Authority Keys
//!
//! Ed25519 key material backing resource-account signer capabilities.
//!
//! When the ledger creates a resource account it generates an
//! [`AuthorityKey`], hands it to the caller inside a
//! [`SignerCapability`](crate::coin::SignerCapability), and keeps only the
//! [`AuthorityPublicKey`]. Withdrawals from the resource account must be
//! signed with that key, so holding the capability is the only way to move
//! funds out.
//!
//! ## Security considerations
//!
//! - Keys come from `OsRng`.
//! - `AuthorityKey` is neither `Clone` nor `Serialize`. Exporting a secret
//!   should be a deliberate act, and nothing in the ledger does it.
//! - Key bytes are never logged.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The private half of a resource account's authority.
pub struct AuthorityKey {
    signing_key: SigningKey,
}

/// The public half, stored by the ledger next to the resource account.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorityPublicKey {
    bytes: [u8; 32],
}

/// An Ed25519 signature. Always 64 bytes once constructed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoritySignature {
    bytes: Vec<u8>,
}

impl AuthorityKey {
    /// Generate a fresh key using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Returns the public key associated with this key.
    pub fn public_key(&self) -> AuthorityPublicKey {
        AuthorityPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign a message. Deterministic for a given (key, message) pair.
    pub fn sign(&self, message: &[u8]) -> AuthoritySignature {
        AuthoritySignature {
            bytes: self.signing_key.sign(message).to_bytes().to_vec(),
        }
    }
}

impl fmt::Debug for AuthorityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthorityKey(pub={})", self.public_key().to_hex())
    }
}

impl AuthorityPublicKey {
    /// Hex encoding, for display.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Verify a signature over `message`.
    ///
    /// Returns `false` for malformed keys or signatures as well as for
    /// genuine mismatches. Uses strict verification.
    pub fn verify(&self, message: &[u8], signature: &AuthoritySignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; 64]>::try_from(signature.bytes.as_slice()) else {
            return false;
        };
        let sig = DalekSignature::from_bytes(&sig_bytes);
        verifying_key.verify_strict(message, &sig).is_ok()
    }
}

impl fmt::Debug for AuthorityPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthorityPublicKey({}...)", &self.to_hex()[..12])
    }
}

impl fmt::Debug for AuthoritySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthoritySignature({}...)", &hex::encode(&self.bytes)[..16])
    }
}
