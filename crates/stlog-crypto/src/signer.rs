//! The signer seam.
//!
//! The gateway signs through this trait so tests can swap in fixed or
//! failing signers, and deployments can move the key behind an HSM without
//! touching the handlers.

use stlog_types::Namespace;
use thiserror::Error;

use crate::Ed25519KeyPair;

/// Errors from a signing backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    /// The signing operation itself failed.
    #[error("signing operation failed: {0}")]
    Failed(String),
}

/// Something that signs on behalf of the log.
pub trait Signer: Send + Sync {
    /// The identity the signatures verify under. Its serialization is the
    /// log id.
    fn namespace(&self) -> Namespace;

    /// Produce a detached signature over `message`.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerError>;
}

impl Signer for Ed25519KeyPair {
    fn namespace(&self) -> Namespace {
        Ed25519KeyPair::namespace(self)
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        Ok(Ed25519KeyPair::sign(self, message).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_signs_through_the_trait() {
        let keypair = Ed25519KeyPair::from_seed([1u8; 32]);
        let signer: &dyn Signer = &keypair;
        let signature = signer.sign(b"message").unwrap();
        signer.namespace().verify(b"message", &signature).unwrap();
    }
}
