//! # stlog wire types
//!
//! The binary presentation layer shared by the stlog gateway, its clients,
//! and its witnesses. Everything the log signs or stores is an [`StItem`]:
//! a 2-byte format tag followed by the variant body, encoded with TLS-style
//! fixed-width big-endian integers and length-prefixed variable fields.
//!
//! # Layout
//!
//! - [`codec`] - encoder/decoder primitives and [`WireError`]
//! - [`item`] - the `StItem` union and its variant structs
//! - [`namespace`] - the tagged identity container (Ed25519 today)
//! - [`appendix`] - opaque per-leaf metadata stored next to a leaf
//! - [`policy`] - namespace acceptance sets for submitters
//!
//! Encoding is canonical: a well-formed item has exactly one serialization,
//! and `unmarshal(marshal(x)) == x` holds for every well-formed `x`.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod appendix;
pub mod codec;
pub mod item;
pub mod namespace;
pub mod policy;

pub use appendix::Appendix;
pub use codec::{Decoder, Encoder, WireError};
pub use item::{
    ChecksumV1, ConsistencyProofV1, CosignedTreeHeadV1, Format, InclusionProofV1, NodeHash,
    SignatureV1, SignedDebugInfoV1, SignedTreeHeadV1, StItem, TreeHeadV1, CHECKSUM_LEN,
};
pub use namespace::{Namespace, NamespaceEd25519V1, VerifyError};
pub use policy::AcceptPolicy;
