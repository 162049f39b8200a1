//! Tagged identity containers.
//!
//! A namespace is both a key carrier and a stable identifier: two
//! namespaces are the same identity iff their serializations are byte
//! equal. The only format today is `ed25519_v1`, which carries a 32-byte
//! namespace identifier and a 32-byte Ed25519 verification key (both set to
//! the verification key when self-named).

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;

use crate::codec::{Decoder, Encoder, WireError};

const NAMESPACE_FORMAT_ED25519_V1: u16 = 1;

/// Signature verification failures under a namespace key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// The carried key bytes do not form a usable public key.
    #[error("namespace does not carry a usable public key")]
    InvalidKey,

    /// The signature does not verify over the message.
    #[error("signature verification failed")]
    Rejected,
}

/// An Ed25519 namespace: identifier plus verification key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceEd25519V1 {
    pub namespace: [u8; 32],
    pub public_key: [u8; 32],
}

/// Tagged identity container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Namespace {
    Ed25519V1(NamespaceEd25519V1),
}

impl Namespace {
    /// Build a self-named Ed25519 namespace from a verification key.
    pub fn new_ed25519(vk: [u8; 32]) -> Self {
        Namespace::Ed25519V1(NamespaceEd25519V1 {
            namespace: vk,
            public_key: vk,
        })
    }

    /// Serialize the namespace. All fields are fixed width, so this cannot
    /// fail.
    pub fn marshal(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        self.encode(&mut enc);
        enc.into_bytes()
    }

    /// Strictly decode a namespace from `bytes`, rejecting trailing data.
    pub fn unmarshal(bytes: &[u8]) -> Result<Self, WireError> {
        let mut dec = Decoder::new(bytes);
        let ns = Self::decode(&mut dec)?;
        dec.finish()?;
        Ok(ns)
    }

    pub(crate) fn encode(&self, enc: &mut Encoder) {
        match self {
            Namespace::Ed25519V1(ns) => {
                enc.put_u16(NAMESPACE_FORMAT_ED25519_V1);
                enc.put_fixed(&ns.namespace);
                enc.put_fixed(&ns.public_key);
            }
        }
    }

    pub(crate) fn decode(dec: &mut Decoder<'_>) -> Result<Self, WireError> {
        match dec.u16()? {
            NAMESPACE_FORMAT_ED25519_V1 => {
                let mut namespace = [0u8; 32];
                namespace.copy_from_slice(dec.take(32)?);
                let mut public_key = [0u8; 32];
                public_key.copy_from_slice(dec.take(32)?);
                Ok(Namespace::Ed25519V1(NamespaceEd25519V1 {
                    namespace,
                    public_key,
                }))
            }
            other => Err(WireError::UnsupportedNamespace(other)),
        }
    }

    /// Verify a detached signature over `message` under the carried key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), VerifyError> {
        match self {
            Namespace::Ed25519V1(ns) => {
                let key = VerifyingKey::from_bytes(&ns.public_key)
                    .map_err(|_| VerifyError::InvalidKey)?;
                let sig = Signature::from_slice(signature).map_err(|_| VerifyError::Rejected)?;
                key.verify(message, &sig).map_err(|_| VerifyError::Rejected)
            }
        }
    }
}
