//! The `StItem` tagged union.
//!
//! Every logged leaf and every cryptographically signed response is an
//! `StItem`: a 2-byte format tag followed by the variant body. The variant
//! structs keep the wire field order; bounds are enforced symmetrically on
//! encode and decode so a value that marshals also unmarshals to itself.
//!
//! Tags: `signed_tree_head_v1 = 1`, `signed_debug_info_v1 = 2`,
//! `consistency_proof_v1 = 3`, `inclusion_proof_v1 = 4`, `checksum_v1 = 5`,
//! `cosigned_tree_head_v1 = 6`, `tree_head_v1 = 7`. Tag 0 is reserved and
//! never emitted.

use std::fmt;

use crate::codec::{Decoder, Encoder, WireError};
use crate::namespace::Namespace;

/// Fixed width of a package checksum.
pub const CHECKSUM_LEN: usize = 32;

const PACKAGE_MIN: usize = 1;
const PACKAGE_MAX: usize = 256;
const LOG_ID_MIN: usize = 32;
const LOG_ID_MAX: usize = 255;
const SIGNATURE_MIN: usize = 1;
const SIGNATURE_MAX: usize = 65535;
const MESSAGE_MIN: usize = 1;
const MESSAGE_MAX: usize = 65535;
const EXTENSIONS_MAX: usize = 65535;

/// Minimum accepted node hash width.
pub const NODE_HASH_MIN: usize = 32;
/// Maximum accepted node hash width.
pub const NODE_HASH_MAX: usize = 255;

const FORMAT_SIGNED_TREE_HEAD_V1: u16 = 1;
const FORMAT_SIGNED_DEBUG_INFO_V1: u16 = 2;
const FORMAT_CONSISTENCY_PROOF_V1: u16 = 3;
const FORMAT_INCLUSION_PROOF_V1: u16 = 4;
const FORMAT_CHECKSUM_V1: u16 = 5;
const FORMAT_COSIGNED_TREE_HEAD_V1: u16 = 6;
const FORMAT_TREE_HEAD_V1: u16 = 7;

/// Wire format tag of an [`StItem`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    SignedTreeHeadV1,
    SignedDebugInfoV1,
    ConsistencyProofV1,
    InclusionProofV1,
    ChecksumV1,
    CosignedTreeHeadV1,
    TreeHeadV1,
}

impl Format {
    fn tag(self) -> u16 {
        match self {
            Format::SignedTreeHeadV1 => FORMAT_SIGNED_TREE_HEAD_V1,
            Format::SignedDebugInfoV1 => FORMAT_SIGNED_DEBUG_INFO_V1,
            Format::ConsistencyProofV1 => FORMAT_CONSISTENCY_PROOF_V1,
            Format::InclusionProofV1 => FORMAT_INCLUSION_PROOF_V1,
            Format::ChecksumV1 => FORMAT_CHECKSUM_V1,
            Format::CosignedTreeHeadV1 => FORMAT_COSIGNED_TREE_HEAD_V1,
            Format::TreeHeadV1 => FORMAT_TREE_HEAD_V1,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::SignedTreeHeadV1 => "signed_tree_head_v1",
            Format::SignedDebugInfoV1 => "signed_debug_info_v1",
            Format::ConsistencyProofV1 => "consistency_proof_v1",
            Format::InclusionProofV1 => "inclusion_proof_v1",
            Format::ChecksumV1 => "checksum_v1",
            Format::CosignedTreeHeadV1 => "cosigned_tree_head_v1",
            Format::TreeHeadV1 => "tree_head_v1",
        };
        f.write_str(name)
    }
}

/// A Merkle tree node hash, 32..=255 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHash {
    pub data: Vec<u8>,
}

impl NodeHash {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    fn encode(&self, enc: &mut Encoder) -> Result<(), WireError> {
        enc.put_var8("node_hash", &self.data, NODE_HASH_MIN, NODE_HASH_MAX)
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, WireError> {
        Ok(Self {
            data: dec.var8("node_hash", NODE_HASH_MIN, NODE_HASH_MAX)?.to_vec(),
        })
    }
}

/// An unsigned tree head: the log's commitment to a tree of a given size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeHeadV1 {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub tree_size: u64,
    pub root_hash: NodeHash,
    pub extensions: Vec<u8>,
}

impl TreeHeadV1 {
    fn encode(&self, enc: &mut Encoder) -> Result<(), WireError> {
        enc.put_u64(self.timestamp);
        enc.put_u64(self.tree_size);
        self.root_hash.encode(enc)?;
        enc.put_var16("extensions", &self.extensions, 0, EXTENSIONS_MAX)
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, WireError> {
        Ok(Self {
            timestamp: dec.u64()?,
            tree_size: dec.u64()?,
            root_hash: NodeHash::decode(dec)?,
            extensions: dec.var16("extensions", 0, EXTENSIONS_MAX)?.to_vec(),
        })
    }
}

/// A tree head plus the log's signature over its `tree_head_v1` item bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTreeHeadV1 {
    pub tree_head: TreeHeadV1,
    pub log_id: Vec<u8>,
    pub signature: Vec<u8>,
}

impl SignedTreeHeadV1 {
    fn encode(&self, enc: &mut Encoder) -> Result<(), WireError> {
        self.tree_head.encode(enc)?;
        enc.put_var8("log_id", &self.log_id, LOG_ID_MIN, LOG_ID_MAX)?;
        enc.put_var16("signature", &self.signature, SIGNATURE_MIN, SIGNATURE_MAX)
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, WireError> {
        Ok(Self {
            tree_head: TreeHeadV1::decode(dec)?,
            log_id: dec.var8("log_id", LOG_ID_MIN, LOG_ID_MAX)?.to_vec(),
            signature: dec
                .var16("signature", SIGNATURE_MIN, SIGNATURE_MAX)?
                .to_vec(),
        })
    }
}

/// A witness cosignature: who signed, and the signature bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureV1 {
    pub namespace: Namespace,
    pub signature: Vec<u8>,
}

impl SignatureV1 {
    fn encode(&self, enc: &mut Encoder) -> Result<(), WireError> {
        self.namespace.encode(enc);
        enc.put_var16("signature", &self.signature, SIGNATURE_MIN, SIGNATURE_MAX)
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, WireError> {
        Ok(Self {
            namespace: Namespace::decode(dec)?,
            signature: dec
                .var16("signature", SIGNATURE_MIN, SIGNATURE_MAX)?
                .to_vec(),
        })
    }
}

/// A signed tree head and the witness cosignatures collected over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosignedTreeHeadV1 {
    pub sth: SignedTreeHeadV1,
    pub cosignatures: Vec<SignatureV1>,
}

impl CosignedTreeHeadV1 {
    pub fn new(sth: SignedTreeHeadV1, cosignatures: Vec<SignatureV1>) -> Self {
        Self { sth, cosignatures }
    }

    fn encode(&self, enc: &mut Encoder) -> Result<(), WireError> {
        self.sth.encode(enc)?;
        let mut body = Encoder::new();
        for cosig in &self.cosignatures {
            cosig.encode(&mut body)?;
        }
        enc.put_list("cosignatures", body)
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, WireError> {
        let sth = SignedTreeHeadV1::decode(dec)?;
        let mut body = dec.list()?;
        let mut cosignatures = Vec::new();
        while !body.is_empty() {
            cosignatures.push(SignatureV1::decode(&mut body)?);
        }
        Ok(Self { sth, cosignatures })
    }
}

/// A logged leaf: package identifier, checksum, and submitter identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumV1 {
    pub package: Vec<u8>,
    pub checksum: [u8; CHECKSUM_LEN],
    pub namespace: Namespace,
}

impl ChecksumV1 {
    fn encode(&self, enc: &mut Encoder) -> Result<(), WireError> {
        enc.put_var16("package", &self.package, PACKAGE_MIN, PACKAGE_MAX)?;
        enc.put_fixed(&self.checksum);
        self.namespace.encode(enc);
        Ok(())
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, WireError> {
        let package = dec.var16("package", PACKAGE_MIN, PACKAGE_MAX)?.to_vec();
        let mut checksum = [0u8; CHECKSUM_LEN];
        checksum.copy_from_slice(dec.take(CHECKSUM_LEN)?);
        Ok(Self {
            package,
            checksum,
            namespace: Namespace::decode(dec)?,
        })
    }
}

/// A signed statement returned on `add-entry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedDebugInfoV1 {
    pub log_id: Vec<u8>,
    pub message: Vec<u8>,
    pub signature: Vec<u8>,
}

impl SignedDebugInfoV1 {
    fn encode(&self, enc: &mut Encoder) -> Result<(), WireError> {
        enc.put_var8("log_id", &self.log_id, LOG_ID_MIN, LOG_ID_MAX)?;
        enc.put_var16("message", &self.message, MESSAGE_MIN, MESSAGE_MAX)?;
        enc.put_var16("signature", &self.signature, SIGNATURE_MIN, SIGNATURE_MAX)
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, WireError> {
        Ok(Self {
            log_id: dec.var8("log_id", LOG_ID_MIN, LOG_ID_MAX)?.to_vec(),
            message: dec.var16("message", MESSAGE_MIN, MESSAGE_MAX)?.to_vec(),
            signature: dec
                .var16("signature", SIGNATURE_MIN, SIGNATURE_MAX)?
                .to_vec(),
        })
    }
}

/// A Merkle audit path for one leaf against one tree size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionProofV1 {
    pub log_id: Vec<u8>,
    pub tree_size: u64,
    pub leaf_index: u64,
    pub path: Vec<NodeHash>,
}

impl InclusionProofV1 {
    fn encode(&self, enc: &mut Encoder) -> Result<(), WireError> {
        enc.put_var8("log_id", &self.log_id, LOG_ID_MIN, LOG_ID_MAX)?;
        enc.put_u64(self.tree_size);
        enc.put_u64(self.leaf_index);
        encode_path(enc, &self.path)
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, WireError> {
        Ok(Self {
            log_id: dec.var8("log_id", LOG_ID_MIN, LOG_ID_MAX)?.to_vec(),
            tree_size: dec.u64()?,
            leaf_index: dec.u64()?,
            path: decode_path(dec)?,
        })
    }
}

/// A Merkle consistency path between two tree sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyProofV1 {
    pub log_id: Vec<u8>,
    pub tree_size1: u64,
    pub tree_size2: u64,
    pub path: Vec<NodeHash>,
}

impl ConsistencyProofV1 {
    fn encode(&self, enc: &mut Encoder) -> Result<(), WireError> {
        enc.put_var8("log_id", &self.log_id, LOG_ID_MIN, LOG_ID_MAX)?;
        enc.put_u64(self.tree_size1);
        enc.put_u64(self.tree_size2);
        encode_path(enc, &self.path)
    }

    fn decode(dec: &mut Decoder<'_>) -> Result<Self, WireError> {
        Ok(Self {
            log_id: dec.var8("log_id", LOG_ID_MIN, LOG_ID_MAX)?.to_vec(),
            tree_size1: dec.u64()?,
            tree_size2: dec.u64()?,
            path: decode_path(dec)?,
        })
    }
}

fn encode_path(enc: &mut Encoder, path: &[NodeHash]) -> Result<(), WireError> {
    let mut body = Encoder::new();
    for hash in path {
        hash.encode(&mut body)?;
    }
    enc.put_list("path", body)
}

fn decode_path(dec: &mut Decoder<'_>) -> Result<Vec<NodeHash>, WireError> {
    let mut body = dec.list()?;
    let mut path = Vec::new();
    while !body.is_empty() {
        path.push(NodeHash::decode(&mut body)?);
    }
    Ok(path)
}

/// The tagged union of everything the log emits, signs, or stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StItem {
    SignedTreeHeadV1(SignedTreeHeadV1),
    SignedDebugInfoV1(SignedDebugInfoV1),
    ConsistencyProofV1(ConsistencyProofV1),
    InclusionProofV1(InclusionProofV1),
    ChecksumV1(ChecksumV1),
    CosignedTreeHeadV1(CosignedTreeHeadV1),
    TreeHeadV1(TreeHeadV1),
}

impl StItem {
    /// The variant's wire format tag.
    pub fn format(&self) -> Format {
        match self {
            StItem::SignedTreeHeadV1(_) => Format::SignedTreeHeadV1,
            StItem::SignedDebugInfoV1(_) => Format::SignedDebugInfoV1,
            StItem::ConsistencyProofV1(_) => Format::ConsistencyProofV1,
            StItem::InclusionProofV1(_) => Format::InclusionProofV1,
            StItem::ChecksumV1(_) => Format::ChecksumV1,
            StItem::CosignedTreeHeadV1(_) => Format::CosignedTreeHeadV1,
            StItem::TreeHeadV1(_) => Format::TreeHeadV1,
        }
    }

    /// Serialize the item, enforcing the declared field bounds.
    pub fn marshal(&self) -> Result<Vec<u8>, WireError> {
        let mut enc = Encoder::new();
        enc.put_u16(self.format().tag());
        match self {
            StItem::SignedTreeHeadV1(v) => v.encode(&mut enc)?,
            StItem::SignedDebugInfoV1(v) => v.encode(&mut enc)?,
            StItem::ConsistencyProofV1(v) => v.encode(&mut enc)?,
            StItem::InclusionProofV1(v) => v.encode(&mut enc)?,
            StItem::ChecksumV1(v) => v.encode(&mut enc)?,
            StItem::CosignedTreeHeadV1(v) => v.encode(&mut enc)?,
            StItem::TreeHeadV1(v) => v.encode(&mut enc)?,
        }
        Ok(enc.into_bytes())
    }

    /// Strictly decode one item from `bytes`: unknown tags, out-of-bounds
    /// lengths, overruns, and trailing bytes are all rejected.
    pub fn unmarshal(bytes: &[u8]) -> Result<Self, WireError> {
        let mut dec = Decoder::new(bytes);
        let item = match dec.u16()? {
            FORMAT_SIGNED_TREE_HEAD_V1 => {
                StItem::SignedTreeHeadV1(SignedTreeHeadV1::decode(&mut dec)?)
            }
            FORMAT_SIGNED_DEBUG_INFO_V1 => {
                StItem::SignedDebugInfoV1(SignedDebugInfoV1::decode(&mut dec)?)
            }
            FORMAT_CONSISTENCY_PROOF_V1 => {
                StItem::ConsistencyProofV1(ConsistencyProofV1::decode(&mut dec)?)
            }
            FORMAT_INCLUSION_PROOF_V1 => {
                StItem::InclusionProofV1(InclusionProofV1::decode(&mut dec)?)
            }
            FORMAT_CHECKSUM_V1 => StItem::ChecksumV1(ChecksumV1::decode(&mut dec)?),
            FORMAT_COSIGNED_TREE_HEAD_V1 => {
                StItem::CosignedTreeHeadV1(CosignedTreeHeadV1::decode(&mut dec)?)
            }
            FORMAT_TREE_HEAD_V1 => StItem::TreeHeadV1(TreeHeadV1::decode(&mut dec)?),
            other => return Err(WireError::UnknownFormat(other)),
        };
        dec.finish()?;
        Ok(item)
    }
}

impl fmt::Display for StItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}
