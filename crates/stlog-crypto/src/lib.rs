//! # stlog signing keys
//!
//! The log-side half of the crypto story: an Ed25519 key pair wrapper and
//! the [`Signer`] trait the gateway signs tree heads and debug statements
//! with. Verification lives with the identity carrier in
//! [`stlog_types::Namespace`]; this crate only holds secrets.

#![warn(clippy::all)]
#![deny(unsafe_code)]

mod keypair;
mod signer;

pub use keypair::Ed25519KeyPair;
pub use signer::{Signer, SignerError};
