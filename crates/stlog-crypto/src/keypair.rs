//! Ed25519 key pairs.
//!
//! Deterministic nonces (no RNG needed at signing time), 32-byte seeds,
//! secret material zeroized on drop.

use ed25519_dalek::{Signer as _, SigningKey};
use stlog_types::Namespace;
use zeroize::Zeroize;

/// An Ed25519 signing key with its derived namespace identity.
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
}

impl Ed25519KeyPair {
    /// Generate a random key pair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from a 32-byte secret seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// The 32-byte verification key.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// The self-named namespace carrying this key pair's verification key.
    pub fn namespace(&self) -> Namespace {
        Namespace::new_ed25519(self.public_key())
    }

    /// Sign a message (deterministic).
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// The secret seed, for storage.
    pub fn to_seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl Drop for Ed25519KeyPair {
    fn drop(&mut self) {
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}
