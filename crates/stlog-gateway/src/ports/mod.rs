//! Outbound ports.

pub mod outbound;

pub use outbound::{BackendError, BackendProof, LogLeaf, MerkleBackend, QueuedLeaf, SignedLogRoot};
