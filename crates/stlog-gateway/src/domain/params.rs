//! Immutable per-log parameters.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as b64;
use base64::Engine;
use stlog_crypto::Signer;
use stlog_types::{AcceptPolicy, Namespace};

/// The tree hash algorithm the backend runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    Sha256,
}

impl HashKind {
    /// Digest width in bytes.
    pub fn width(self) -> usize {
        match self {
            HashKind::Sha256 => 32,
        }
    }
}

/// Everything that identifies and bounds one log instance.
///
/// Constructed once at startup and shared via `Arc`; nothing here mutates.
pub struct LogParameters {
    /// The serialized signer namespace. Doubles as the log identifier in
    /// every signed item.
    pub log_id: Vec<u8>,
    /// Backend tree identifier.
    pub tree_id: i64,
    /// URL prefix all endpoints are mounted under.
    pub prefix: String,
    /// Maximum number of entries served per `get-entries` request.
    pub max_range: i64,
    /// The log's signing key.
    pub signer: Arc<dyn Signer>,
    /// Tree hash algorithm.
    pub hash_kind: HashKind,
    /// Which submitter namespaces `add-entry` accepts.
    pub submitters: AcceptPolicy,
    /// Serialized namespaces of the accepted witnesses.
    pub witnesses: HashSet<Vec<u8>>,
    /// DER trust anchors served on `get-anchors`.
    pub anchors: Vec<Vec<u8>>,
}

impl LogParameters {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tree_id: i64,
        prefix: impl Into<String>,
        max_range: i64,
        signer: Arc<dyn Signer>,
        submitters: AcceptPolicy,
        witnesses: &[Namespace],
        anchors: Vec<Vec<u8>>,
    ) -> Self {
        let log_id = signer.namespace().marshal();
        Self {
            log_id,
            tree_id,
            prefix: prefix.into(),
            max_range,
            signer,
            hash_kind: HashKind::Sha256,
            submitters,
            witnesses: witnesses.iter().map(Namespace::marshal).collect(),
            anchors,
        }
    }

    /// Whether `namespace` is an accepted witness.
    pub fn has_witness(&self, namespace: &Namespace) -> bool {
        self.witnesses.contains(&namespace.marshal())
    }

    /// Base64 log id, used as a metrics label.
    pub fn log_id_b64(&self) -> String {
        b64.encode(&self.log_id)
    }
}

impl fmt::Debug for LogParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogParameters")
            .field("log_id", &self.log_id_b64())
            .field("tree_id", &self.tree_id)
            .field("prefix", &self.prefix)
            .field("max_range", &self.max_range)
            .field("witnesses", &self.witnesses.len())
            .field("anchors", &self.anchors.len())
            .finish()
    }
}
