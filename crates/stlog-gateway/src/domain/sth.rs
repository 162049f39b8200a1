//! The cosigned tree head rotation.
//!
//! Two cosigned tree heads exist at all times once bootstrapped: `current`
//! is served to clients and stays stable for a whole rotation period;
//! `next` is the candidate witnesses cosign. On every rotation tick the
//! candidate is promoted together with whatever cosignatures it gathered,
//! and a freshly fetched tree head becomes the new candidate. Witnesses
//! therefore always sign a head that is not yet being served, and clients
//! always see a head that had a full period to gather signatures.
//!
//! All three pieces of state live behind one lock; critical sections are a
//! swap or a set insert. Signature verification happens outside the lock.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use stlog_types::{CosignedTreeHeadV1, SignedTreeHeadV1, StItem};
use tracing::debug;

use crate::adapters::BackendClient;
use crate::domain::error::GatewayError;
use crate::domain::params::LogParameters;

#[derive(Default)]
struct CosiState {
    current: Option<CosignedTreeHeadV1>,
    next: Option<CosignedTreeHeadV1>,
    /// Serialized namespaces that already cosigned `next` this rotation.
    seen: HashSet<Vec<u8>>,
}

/// Source of signed and cosigned tree heads.
pub struct SthSource {
    params: Arc<LogParameters>,
    backend: Arc<BackendClient>,
    state: RwLock<CosiState>,
}

impl SthSource {
    pub fn new(params: Arc<LogParameters>, backend: Arc<BackendClient>) -> Self {
        Self {
            params,
            backend,
            state: RwLock::new(CosiState::default()),
        }
    }

    /// Fetch the backend's latest tree head and sign it.
    pub async fn latest_sth(&self) -> Result<SignedTreeHeadV1, GatewayError> {
        let tree_head = self.backend.latest_tree_head().await?;
        let message = StItem::TreeHeadV1(tree_head.clone())
            .marshal()
            .map_err(GatewayError::Encoding)?;
        let signature = self.params.signer.sign(&message)?;
        Ok(SignedTreeHeadV1 {
            tree_head,
            log_id: self.params.log_id.clone(),
            signature,
        })
    }

    /// The stable tree head: the signed head inside the currently served
    /// cosigned head, without its cosignatures.
    pub fn stable_sth(&self) -> Option<SignedTreeHeadV1> {
        self.state.read().current.as_ref().map(|c| c.sth.clone())
    }

    /// The currently served cosigned tree head.
    pub fn cosigned_sth(&self) -> Option<CosignedTreeHeadV1> {
        self.state.read().current.clone()
    }

    /// One rotation tick: promote the candidate and install a fresh one.
    ///
    /// If fetching a fresh tree head fails, nothing is promoted and the
    /// previous state keeps serving; the caller retries on the next tick.
    pub async fn rotate(&self) -> Result<(), GatewayError> {
        let fresh = self.latest_sth().await?;
        let tree_size = fresh.tree_head.tree_size;
        let mut state = self.state.write();
        if let Some(next) = state.next.take() {
            state.current = Some(next);
        }
        state.next = Some(CosignedTreeHeadV1::new(fresh, Vec::new()));
        state.seen.clear();
        drop(state);
        debug!(tree_size, "rotated cosigned tree head");
        Ok(())
    }

    /// Apply one witness cosignature to the candidate tree head.
    ///
    /// The submitted cosigned head must carry exactly one cosignature and
    /// embed a signed tree head byte-identical to the current candidate. A
    /// witness that already cosigned this candidate is accepted without
    /// effect.
    pub fn add_cosignature(&self, costh: CosignedTreeHeadV1) -> Result<(), GatewayError> {
        let CosignedTreeHeadV1 {
            sth: submitted,
            mut cosignatures,
        } = costh;
        let cosignature = match (cosignatures.pop(), cosignatures.is_empty()) {
            (Some(cosignature), true) => cosignature,
            _ => {
                return Err(GatewayError::BadRequest(
                    "expected exactly one cosignature".into(),
                ))
            }
        };

        if !self.params.has_witness(&cosignature.namespace) {
            return Err(GatewayError::UntrustedWitness);
        }
        let witness = cosignature.namespace.marshal();

        let candidate = self
            .state
            .read()
            .next
            .as_ref()
            .map(|n| n.sth.clone())
            .ok_or(GatewayError::StaleCosignature)?;
        // The codec is canonical, so structural equality is byte equality.
        if submitted != candidate {
            return Err(GatewayError::StaleCosignature);
        }

        let message = StItem::SignedTreeHeadV1(submitted)
            .marshal()
            .map_err(GatewayError::Encoding)?;
        cosignature
            .namespace
            .verify(&message, &cosignature.signature)
            .map_err(|e| GatewayError::BadRequest(format!("cosignature rejected: {e}")))?;

        let mut state = self.state.write();
        let CosiState { next, seen, .. } = &mut *state;
        let next = next.as_mut().ok_or(GatewayError::StaleCosignature)?;
        // A rotation may have happened between the two lock scopes.
        if next.sth != candidate {
            return Err(GatewayError::StaleCosignature);
        }
        if !seen.insert(witness) {
            return Ok(());
        }
        next.cosignatures.push(cosignature);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use ed25519_dalek::Signer as _;
    use parking_lot::Mutex;
    use stlog_crypto::Ed25519KeyPair;
    use stlog_types::{AcceptPolicy, Encoder, Namespace, SignatureV1};

    use crate::ports::{
        BackendError, BackendProof, LogLeaf, MerkleBackend, QueuedLeaf, SignedLogRoot,
    };

    fn encode_log_root(tree_size: u64, timestamp_nanos: u64) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.put_u16(1);
        enc.put_u64(tree_size);
        enc.put_var8("root_hash", &[0u8; 32], 0, 128).unwrap();
        enc.put_u64(timestamp_nanos);
        enc.put_u64(0);
        enc.put_var16("metadata", &[], 0, 65535).unwrap();
        enc.into_bytes()
    }

    /// Serves a settable log root; everything else is unreachable here.
    struct RootBackend {
        root: Mutex<Result<Vec<u8>, BackendError>>,
    }

    impl RootBackend {
        fn new(tree_size: u64, timestamp_nanos: u64) -> Self {
            Self {
                root: Mutex::new(Ok(encode_log_root(tree_size, timestamp_nanos))),
            }
        }

        fn set_root(&self, tree_size: u64, timestamp_nanos: u64) {
            *self.root.lock() = Ok(encode_log_root(tree_size, timestamp_nanos));
        }

        fn fail(&self) {
            *self.root.lock() = Err(BackendError::Unavailable("rpc".into()));
        }
    }

    #[async_trait]
    impl MerkleBackend for RootBackend {
        async fn queue_leaf(&self, _: &[u8], _: &[u8]) -> Result<QueuedLeaf, BackendError> {
            unreachable!("not used by the rotation")
        }

        async fn latest_signed_log_root(&self) -> Result<SignedLogRoot, BackendError> {
            self.root
                .lock()
                .clone()
                .map(|log_root| SignedLogRoot { log_root })
        }

        async fn leaves_by_range(&self, _: i64, _: i64) -> Result<Vec<LogLeaf>, BackendError> {
            unreachable!("not used by the rotation")
        }

        async fn inclusion_proof_by_hash(
            &self,
            _: &[u8],
            _: i64,
        ) -> Result<BackendProof, BackendError> {
            unreachable!("not used by the rotation")
        }

        async fn consistency_proof(&self, _: i64, _: i64) -> Result<Vec<Vec<u8>>, BackendError> {
            unreachable!("not used by the rotation")
        }
    }

    struct Fixture {
        backend: Arc<RootBackend>,
        source: SthSource,
        witness_key: ed25519_dalek::SigningKey,
    }

    fn fixture() -> Fixture {
        let witness_key = ed25519_dalek::SigningKey::from_bytes(&[2u8; 32]);
        let witness = Namespace::new_ed25519(witness_key.verifying_key().to_bytes());
        let params = Arc::new(LogParameters::new(
            1,
            "st/v1",
            10,
            Arc::new(Ed25519KeyPair::from_seed([1u8; 32])),
            AcceptPolicy::Any,
            &[witness],
            Vec::new(),
        ));
        let backend = Arc::new(RootBackend::new(1, 1_000_000));
        let client = Arc::new(BackendClient::new(
            backend.clone(),
            Duration::from_millis(100),
        ));
        Fixture {
            backend,
            source: SthSource::new(params, client),
            witness_key,
        }
    }

    fn cosign(
        key: &ed25519_dalek::SigningKey,
        sth: SignedTreeHeadV1,
    ) -> CosignedTreeHeadV1 {
        let message = StItem::SignedTreeHeadV1(sth.clone()).marshal().unwrap();
        CosignedTreeHeadV1::new(
            sth,
            vec![SignatureV1 {
                namespace: Namespace::new_ed25519(key.verifying_key().to_bytes()),
                signature: key.sign(&message).to_bytes().to_vec(),
            }],
        )
    }

    #[tokio::test]
    async fn heads_are_empty_until_rotations_happen() {
        let f = fixture();
        assert!(f.source.stable_sth().is_none());
        assert!(f.source.cosigned_sth().is_none());

        // First rotation installs a candidate but serves nothing yet.
        f.source.rotate().await.unwrap();
        assert!(f.source.cosigned_sth().is_none());

        // Second rotation promotes it.
        f.source.rotate().await.unwrap();
        let cosigned = f.source.cosigned_sth().unwrap();
        assert_eq!(cosigned.sth.tree_head.tree_size, 1);
        assert_eq!(f.source.stable_sth().unwrap(), cosigned.sth);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_heads() {
        let f = fixture();
        f.source.rotate().await.unwrap();
        f.source.rotate().await.unwrap();
        let before = f.source.cosigned_sth().unwrap();

        f.backend.fail();
        assert!(f.source.rotate().await.is_err());
        assert_eq!(f.source.cosigned_sth().unwrap(), before);

        // Recovery on a later tick.
        f.backend.set_root(7, 2_000_000);
        f.source.rotate().await.unwrap();
        f.source.rotate().await.unwrap();
        assert_eq!(f.source.cosigned_sth().unwrap().sth.tree_head.tree_size, 7);
    }

    /// Reconstruct the candidate head: signing is deterministic, so
    /// re-building the latest signed tree head yields the exact bytes the
    /// rotation installed as `next.sth`.
    async fn candidate(f: &Fixture) -> SignedTreeHeadV1 {
        f.source.latest_sth().await.unwrap()
    }

    #[tokio::test]
    async fn cosignature_is_promoted_with_its_head() {
        let f = fixture();
        f.source.rotate().await.unwrap();
        let candidate = candidate(&f).await;
        f.source
            .add_cosignature(cosign(&f.witness_key, candidate))
            .unwrap();

        f.source.rotate().await.unwrap();
        let cosigned = f.source.cosigned_sth().unwrap();
        assert_eq!(cosigned.cosignatures.len(), 1);
        assert_eq!(
            cosigned.cosignatures[0].namespace,
            Namespace::new_ed25519(f.witness_key.verifying_key().to_bytes())
        );
    }

    #[tokio::test]
    async fn untrusted_witness_is_rejected() {
        let f = fixture();
        f.source.rotate().await.unwrap();
        let candidate = candidate(&f).await;
        let outsider = ed25519_dalek::SigningKey::from_bytes(&[9u8; 32]);
        let err = f
            .source
            .add_cosignature(cosign(&outsider, candidate))
            .unwrap_err();
        assert!(matches!(err, GatewayError::UntrustedWitness));
    }

    #[tokio::test]
    async fn cosignature_over_wrong_sth_is_stale() {
        let f = fixture();
        f.source.rotate().await.unwrap();
        let mut other = candidate(&f).await;
        other.tree_head.timestamp += 1_000_000;
        let err = f
            .source
            .add_cosignature(cosign(&f.witness_key, other))
            .unwrap_err();
        assert!(matches!(err, GatewayError::StaleCosignature));
    }

    #[tokio::test]
    async fn forged_cosignature_is_rejected() {
        let f = fixture();
        f.source.rotate().await.unwrap();
        let candidate = candidate(&f).await;
        let mut costh = cosign(&f.witness_key, candidate);
        costh.cosignatures[0].signature[0] ^= 0xff;
        let err = f.source.add_cosignature(costh).unwrap_err();
        assert!(matches!(err, GatewayError::BadRequest(_)));
    }

    #[tokio::test]
    async fn duplicate_cosignature_is_idempotent() {
        let f = fixture();
        f.source.rotate().await.unwrap();
        let candidate = candidate(&f).await;
        f.source
            .add_cosignature(cosign(&f.witness_key, candidate.clone()))
            .unwrap();
        f.source
            .add_cosignature(cosign(&f.witness_key, candidate))
            .unwrap();

        f.source.rotate().await.unwrap();
        assert_eq!(f.source.cosigned_sth().unwrap().cosignatures.len(), 1);
    }

    #[tokio::test]
    async fn rotation_clears_the_seen_set() {
        let f = fixture();
        f.source.rotate().await.unwrap();
        let first = candidate(&f).await;
        f.source
            .add_cosignature(cosign(&f.witness_key, first))
            .unwrap();

        f.backend.set_root(2, 3_000_000);
        f.source.rotate().await.unwrap();
        let second = candidate(&f).await;
        f.source
            .add_cosignature(cosign(&f.witness_key, second))
            .unwrap();

        f.source.rotate().await.unwrap();
        assert_eq!(f.source.cosigned_sth().unwrap().cosignatures.len(), 1);
    }

    #[tokio::test]
    async fn cosignature_before_any_candidate_is_stale() {
        let f = fixture();
        let sth = SignedTreeHeadV1 {
            tree_head: stlog_types::TreeHeadV1 {
                timestamp: 0,
                tree_size: 0,
                root_hash: stlog_types::NodeHash::new(vec![0u8; 32]),
                extensions: Vec::new(),
            },
            log_id: Namespace::new_ed25519([1u8; 32]).marshal(),
            signature: vec![1u8; 64],
        };
        let err = f
            .source
            .add_cosignature(cosign(&f.witness_key, sth))
            .unwrap_err();
        assert!(matches!(err, GatewayError::StaleCosignature));
    }
}
