//! Deadline and error mapping around the Merkle tree backend.
//!
//! Every call goes through [`BackendClient`], which enforces the configured
//! deadline and normalizes replies: already-queued leaves are success, log
//! roots are parsed into tree heads, and proof hashes are bounds-checked
//! before they can reach the wire layer. Dropping an in-flight call (e.g.
//! because the HTTP request was cancelled) cancels the backend future with
//! it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use stlog_types::item::{NODE_HASH_MAX, NODE_HASH_MIN};
use stlog_types::{Decoder, NodeHash, TreeHeadV1};

use crate::ports::{BackendError, LogLeaf, MerkleBackend, QueuedLeaf};

const LOG_ROOT_VERSION: u16 = 1;

/// The gateway's view of the backend: same five operations, with deadlines
/// and contract checks applied.
pub struct BackendClient {
    backend: Arc<dyn MerkleBackend>,
    deadline: Duration,
}

impl BackendClient {
    pub fn new(backend: Arc<dyn MerkleBackend>, deadline: Duration) -> Self {
        Self { backend, deadline }
    }

    async fn with_deadline<T>(
        &self,
        fut: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        match tokio::time::timeout(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Unavailable("deadline exceeded".into())),
        }
    }

    /// Queue a leaf for inclusion. A leaf the backend has already seen
    /// counts as queued.
    pub async fn queue_leaf(&self, leaf_value: &[u8], extra_data: &[u8]) -> Result<(), BackendError> {
        let status = self
            .with_deadline(self.backend.queue_leaf(leaf_value, extra_data))
            .await?;
        match status {
            QueuedLeaf::Queued | QueuedLeaf::AlreadyExists => Ok(()),
        }
    }

    /// Fetch and parse the latest log root into an unsigned tree head.
    pub async fn latest_tree_head(&self) -> Result<TreeHeadV1, BackendError> {
        let root = self
            .with_deadline(self.backend.latest_signed_log_root())
            .await?;
        parse_log_root(&root.log_root)
    }

    /// Fetch the leaves in `start..=end`.
    pub async fn leaves_by_range(&self, start: i64, end: i64) -> Result<Vec<LogLeaf>, BackendError> {
        let count = end - start + 1;
        let leaves = self
            .with_deadline(self.backend.leaves_by_range(start, count))
            .await?;
        if leaves.is_empty() {
            return Err(BackendError::Malformed("no leaves in range".into()));
        }
        if leaves.len() as i64 > count {
            return Err(BackendError::Malformed(format!(
                "{} leaves returned for a range of {count}",
                leaves.len()
            )));
        }
        Ok(leaves)
    }

    /// Fetch the inclusion proof for a leaf hash against a tree size.
    pub async fn inclusion_proof(
        &self,
        leaf_hash: &[u8],
        tree_size: i64,
    ) -> Result<(u64, Vec<NodeHash>), BackendError> {
        let proof = self
            .with_deadline(self.backend.inclusion_proof_by_hash(leaf_hash, tree_size))
            .await?;
        let leaf_index = u64::try_from(proof.leaf_index)
            .map_err(|_| BackendError::Malformed("negative leaf index".into()))?;
        Ok((leaf_index, node_hashes(proof.hashes)?))
    }

    /// Fetch the consistency proof between two tree sizes.
    pub async fn consistency_proof(
        &self,
        first: i64,
        second: i64,
    ) -> Result<Vec<NodeHash>, BackendError> {
        let hashes = self
            .with_deadline(self.backend.consistency_proof(first, second))
            .await?;
        node_hashes(hashes)
    }
}

fn node_hashes(hashes: Vec<Vec<u8>>) -> Result<Vec<NodeHash>, BackendError> {
    hashes
        .into_iter()
        .map(|data| {
            if data.len() < NODE_HASH_MIN || data.len() > NODE_HASH_MAX {
                return Err(BackendError::Malformed(format!(
                    "{}-byte proof hash",
                    data.len()
                )));
            }
            Ok(NodeHash::new(data))
        })
        .collect()
}

/// Parse the backend's serialized log root. Timestamps arrive in
/// nanoseconds and leave in milliseconds.
fn parse_log_root(bytes: &[u8]) -> Result<TreeHeadV1, BackendError> {
    if bytes.is_empty() {
        return Err(BackendError::Malformed("empty log root".into()));
    }
    let malformed = |e: stlog_types::WireError| BackendError::Malformed(format!("log root: {e}"));

    let mut dec = Decoder::new(bytes);
    let version = dec.u16().map_err(malformed)?;
    if version != LOG_ROOT_VERSION {
        return Err(BackendError::Malformed(format!(
            "log root version {version}"
        )));
    }
    let tree_size = dec.u64().map_err(malformed)?;
    let root_hash = dec
        .var8("root_hash", NODE_HASH_MIN, 128)
        .map_err(malformed)?
        .to_vec();
    let timestamp_nanos = dec.u64().map_err(malformed)?;
    let _revision = dec.u64().map_err(malformed)?;
    let _metadata = dec.var16("metadata", 0, 65535).map_err(malformed)?;
    dec.finish().map_err(malformed)?;

    Ok(TreeHeadV1 {
        timestamp: timestamp_nanos / 1_000_000,
        tree_size,
        root_hash: NodeHash::new(root_hash),
        extensions: Vec::new(),
    })
}
