//! Shared fixture: a scripted backend, fixed-signature signers, and an
//! instance builder driving the real router.

// Each test binary uses a different slice of this module.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD as b64;
use base64::Engine;
use ed25519_dalek::Signer as _;
use http_body_util::BodyExt;
use parking_lot::Mutex;
use stlog_crypto::{Signer, SignerError};
use stlog_gateway::ports::{
    BackendError, BackendProof, LogLeaf, MerkleBackend, QueuedLeaf, SignedLogRoot,
};
use stlog_gateway::rest::requests::{AddCosignatureRequest, AddEntryRequest};
use stlog_gateway::service::build_router;
use stlog_gateway::{AppState, GatewayConfig, LogParameters, LogService};
use stlog_types::{
    AcceptPolicy, Appendix, ChecksumV1, CosignedTreeHeadV1, Namespace, NodeHash, SignatureV1,
    SignedTreeHeadV1, StItem, TreeHeadV1,
};
use tower::ServiceExt;

/// The fake log signature: 32 zero bytes.
pub const TEST_SIGNATURE: [u8; 32] = [0u8; 32];

/// Standard test key seeds.
pub const SUBMITTER_SEED: [u8; 32] = [3u8; 32];
pub const WITNESS_SEED: [u8; 32] = [2u8; 32];
pub const OUTSIDER_SEED: [u8; 32] = [9u8; 32];

pub const PREFIX: &str = "st/v1";
pub const MAX_RANGE: i64 = 10;

/// A signer with a real identity but a scripted signature value.
pub struct FixedSigner {
    namespace: Namespace,
    signature: Vec<u8>,
}

impl FixedSigner {
    pub fn new(signature: Vec<u8>) -> Self {
        Self {
            namespace: Namespace::new_ed25519([1u8; 32]),
            signature,
        }
    }
}

impl Signer for FixedSigner {
    fn namespace(&self) -> Namespace {
        self.namespace.clone()
    }

    fn sign(&self, _message: &[u8]) -> Result<Vec<u8>, SignerError> {
        Ok(self.signature.clone())
    }
}

/// A signer whose key is present but whose signing operation fails.
pub struct FailingSigner;

impl Signer for FailingSigner {
    fn namespace(&self) -> Namespace {
        Namespace::new_ed25519([1u8; 32])
    }

    fn sign(&self, _message: &[u8]) -> Result<Vec<u8>, SignerError> {
        Err(SignerError::Failed("signing failed".into()))
    }
}

type Scripted<T> = Mutex<Result<T, BackendError>>;

fn unprogrammed<T>() -> Scripted<T> {
    Mutex::new(Err(BackendError::Unavailable("no response programmed".into())))
}

/// A backend whose five replies are scripted per test.
pub struct MockBackend {
    queue: Scripted<QueuedLeaf>,
    root: Scripted<SignedLogRoot>,
    leaves: Scripted<Vec<LogLeaf>>,
    inclusion: Scripted<BackendProof>,
    consistency: Scripted<Vec<Vec<u8>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            queue: unprogrammed(),
            root: unprogrammed(),
            leaves: unprogrammed(),
            inclusion: unprogrammed(),
            consistency: unprogrammed(),
        }
    }

    pub fn queue_leaf_ok(&self) {
        *self.queue.lock() = Ok(QueuedLeaf::Queued);
    }

    pub fn queue_leaf_err(&self) {
        *self.queue.lock() = Err(BackendError::Unavailable("back-end failure".into()));
    }

    pub fn set_root(&self, tree_size: u64, timestamp_nanos: u64, hash: &[u8]) {
        *self.root.lock() = Ok(SignedLogRoot {
            log_root: encode_log_root(tree_size, timestamp_nanos, hash),
        });
    }

    pub fn root_err(&self) {
        *self.root.lock() = Err(BackendError::Unavailable("back-end failure".into()));
    }

    pub fn set_leaves(&self, leaves: Vec<LogLeaf>) {
        *self.leaves.lock() = Ok(leaves);
    }

    pub fn leaves_err(&self) {
        *self.leaves.lock() = Err(BackendError::Unavailable("back-end failure".into()));
    }

    pub fn set_inclusion(&self, leaf_index: i64, hashes: Vec<Vec<u8>>) {
        *self.inclusion.lock() = Ok(BackendProof { leaf_index, hashes });
    }

    pub fn inclusion_err(&self) {
        *self.inclusion.lock() = Err(BackendError::Unavailable("back-end failure".into()));
    }

    pub fn set_consistency(&self, hashes: Vec<Vec<u8>>) {
        *self.consistency.lock() = Ok(hashes);
    }

    pub fn consistency_err(&self) {
        *self.consistency.lock() = Err(BackendError::Unavailable("back-end failure".into()));
    }
}

#[async_trait]
impl MerkleBackend for MockBackend {
    async fn queue_leaf(&self, _: &[u8], _: &[u8]) -> Result<QueuedLeaf, BackendError> {
        self.queue.lock().clone()
    }

    async fn latest_signed_log_root(&self) -> Result<SignedLogRoot, BackendError> {
        self.root.lock().clone()
    }

    async fn leaves_by_range(&self, _: i64, _: i64) -> Result<Vec<LogLeaf>, BackendError> {
        self.leaves.lock().clone()
    }

    async fn inclusion_proof_by_hash(
        &self,
        _: &[u8],
        _: i64,
    ) -> Result<BackendProof, BackendError> {
        self.inclusion.lock().clone()
    }

    async fn consistency_proof(&self, _: i64, _: i64) -> Result<Vec<Vec<u8>>, BackendError> {
        self.consistency.lock().clone()
    }
}

/// Encode a log root the way the backend serializes them.
pub fn encode_log_root(tree_size: u64, timestamp_nanos: u64, hash: &[u8]) -> Vec<u8> {
    let mut enc = stlog_types::Encoder::new();
    enc.put_u16(1);
    enc.put_u64(tree_size);
    enc.put_var8("root_hash", hash, 0, 128).unwrap();
    enc.put_u64(timestamp_nanos);
    enc.put_u64(0);
    enc.put_var16("metadata", &[], 0, 65535).unwrap();
    enc.into_bytes()
}

pub struct Instance {
    pub router: Router,
    pub state: AppState,
    pub backend: Arc<MockBackend>,
}

/// Build a gateway over a scripted backend and the given signer, with one
/// accepted witness derived from [`WITNESS_SEED`].
pub fn instance(signer: Arc<dyn Signer>) -> Instance {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let witness_key = ed25519_dalek::SigningKey::from_bytes(&WITNESS_SEED);
    let witness = Namespace::new_ed25519(witness_key.verifying_key().to_bytes());
    let params = LogParameters::new(
        1,
        PREFIX,
        MAX_RANGE,
        signer,
        AcceptPolicy::Any,
        &[witness],
        vec![vec![0x30, 0x82, 0x01, 0x0a]],
    );
    let config = GatewayConfig {
        deadline: Duration::from_millis(200),
        rotation_interval: Duration::from_secs(10),
        ..GatewayConfig::default()
    };
    let backend = Arc::new(MockBackend::new());
    let service = LogService::new(config, params, backend.clone()).unwrap();
    let state = service.state().clone();
    Instance {
        router: build_router(state.clone()),
        state,
        backend,
    }
}

pub fn instance_with_fixed_signer() -> Instance {
    instance(Arc::new(FixedSigner::new(TEST_SIGNATURE.to_vec())))
}

pub async fn get(instance: &Instance, path: &str) -> (StatusCode, Bytes) {
    let request = Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .unwrap();
    send(instance, request).await
}

pub async fn post_json(
    instance: &Instance,
    path: &str,
    body: &impl serde::Serialize,
) -> (StatusCode, Bytes) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    send(instance, request).await
}

pub async fn send(instance: &Instance, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = instance.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

/// Decode a signed response body: a JSON base64 string wrapping an item.
pub fn decode_item(body: &[u8]) -> StItem {
    let blob: String = serde_json::from_slice(body).expect("body is not a json string");
    let bytes = b64.decode(blob).expect("body is not base64");
    StItem::unmarshal(&bytes).expect("body is not an item")
}

/// A signed checksum leaf plus its add-entry request body.
pub fn signed_entry_request(package: &[u8], seed: [u8; 32]) -> AddEntryRequest {
    let key = ed25519_dalek::SigningKey::from_bytes(&seed);
    let item = StItem::ChecksumV1(ChecksumV1 {
        package: package.to_vec(),
        checksum: [0u8; 32],
        namespace: Namespace::new_ed25519(key.verifying_key().to_bytes()),
    })
    .marshal()
    .unwrap();
    let signature = key.sign(&item).to_bytes().to_vec();
    AddEntryRequest {
        item,
        signature,
        signature_scheme: 0,
        chain: None,
    }
}

/// A stored leaf for `package` with a well-formed appendix.
pub fn stored_leaf(package: &[u8], leaf_index: i64, seed: [u8; 32]) -> LogLeaf {
    let request = signed_entry_request(package, seed);
    let appendix = Appendix::new(request.signature.clone(), 0, Vec::new())
        .marshal()
        .unwrap();
    LogLeaf {
        leaf_index,
        leaf_value: request.item,
        extra_data: appendix,
    }
}

/// The signed tree head the gateway builds from a scripted root, assuming
/// the fixed test signer.
pub fn expected_sth(instance: &Instance, tree_size: u64, timestamp_ms: u64, hash: &[u8]) -> SignedTreeHeadV1 {
    SignedTreeHeadV1 {
        tree_head: TreeHeadV1 {
            timestamp: timestamp_ms,
            tree_size,
            root_hash: NodeHash::new(hash.to_vec()),
            extensions: Vec::new(),
        },
        log_id: instance.state.params.log_id.clone(),
        signature: TEST_SIGNATURE.to_vec(),
    }
}

/// An add-cosignature body: `sth` cosigned by the key behind `seed`.
pub fn cosignature_request(sth: SignedTreeHeadV1, seed: [u8; 32]) -> AddCosignatureRequest {
    let key = ed25519_dalek::SigningKey::from_bytes(&seed);
    let message = StItem::SignedTreeHeadV1(sth.clone()).marshal().unwrap();
    let costh = CosignedTreeHeadV1::new(
        sth,
        vec![SignatureV1 {
            namespace: Namespace::new_ed25519(key.verifying_key().to_bytes()),
            signature: key.sign(&message).to_bytes().to_vec(),
        }],
    );
    AddCosignatureRequest {
        costh: StItem::CosignedTreeHeadV1(costh).marshal().unwrap(),
    }
}
