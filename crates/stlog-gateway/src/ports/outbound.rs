//! The Merkle tree backend contract.
//!
//! The tree itself lives in an external service; the gateway only queues
//! leaves and fetches roots, ranges, and proofs. Implementations speak
//! whatever transport the deployment uses (gRPC in practice) and surface
//! transport-level failures as [`BackendError::Unavailable`]. Shape
//! violations in otherwise successful replies are mapped to
//! [`BackendError::Malformed`] by the adapter layer.

use async_trait::async_trait;
use thiserror::Error;

/// Failures talking to or understanding the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Transport or RPC failure, including an elapsed deadline.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered, but the reply does not parse or violates the
    /// contract.
    #[error("backend sent malformed response: {0}")]
    Malformed(String),
}

/// The backend's serialized signed log root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLogRoot {
    /// Serialized log root: version (u16), tree size (u64), u8-prefixed
    /// root hash, timestamp in nanoseconds (u64), revision (u64),
    /// u16-prefixed metadata.
    pub log_root: Vec<u8>,
}

/// One stored leaf with its opaque appendix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLeaf {
    pub leaf_index: i64,
    pub leaf_value: Vec<u8>,
    pub extra_data: Vec<u8>,
}

/// Outcome of queueing a leaf. A leaf that was already queued is not an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuedLeaf {
    Queued,
    AlreadyExists,
}

/// An inclusion proof as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendProof {
    pub leaf_index: i64,
    pub hashes: Vec<Vec<u8>>,
}

/// The five tree operations the gateway needs.
#[async_trait]
pub trait MerkleBackend: Send + Sync {
    async fn queue_leaf(
        &self,
        leaf_value: &[u8],
        extra_data: &[u8],
    ) -> Result<QueuedLeaf, BackendError>;

    async fn latest_signed_log_root(&self) -> Result<SignedLogRoot, BackendError>;

    async fn leaves_by_range(&self, start: i64, count: i64) -> Result<Vec<LogLeaf>, BackendError>;

    async fn inclusion_proof_by_hash(
        &self,
        leaf_hash: &[u8],
        tree_size: i64,
    ) -> Result<BackendProof, BackendError>;

    async fn consistency_proof(
        &self,
        first: i64,
        second: i64,
    ) -> Result<Vec<Vec<u8>>, BackendError>;
}
