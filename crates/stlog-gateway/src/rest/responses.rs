//! Response building.
//!
//! Signed responses are a single base64 blob: the marshalled item, which
//! the client feeds back into the wire decoder. Only `get-entries` and
//! `get-anchors` return structured JSON.

use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};
use stlog_types::Appendix;

use crate::domain::error::GatewayError;
use crate::ports::{BackendError, LogLeaf};

/// A marshalled item, serialized as one base64 string.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse(#[serde_as(as = "Base64")] pub Vec<u8>);

/// One `get-entries` element: the leaf and its unpacked appendix.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetEntryResponse {
    /// A serialized `checksum_v1` item.
    #[serde_as(as = "Base64")]
    pub leaf: Vec<u8>,
    /// The submitter's signature over `leaf`.
    #[serde_as(as = "Base64")]
    pub signature: Vec<u8>,
    /// DER certificate chain.
    #[serde_as(as = "Vec<Base64>")]
    pub chain: Vec<Vec<u8>>,
}

impl GetEntryResponse {
    /// Unpack a stored leaf. The appendix was written by this log, so a
    /// decode failure here is the backend's fault, not the client's.
    pub fn from_leaf(leaf: LogLeaf) -> Result<Self, GatewayError> {
        let appendix = Appendix::unmarshal(&leaf.extra_data).map_err(|e| {
            GatewayError::Backend(BackendError::Malformed(format!(
                "appendix of leaf {}: {e}",
                leaf.leaf_index
            )))
        })?;
        Ok(Self {
            leaf: leaf.leaf_value,
            signature: appendix.signature,
            chain: appendix.chain,
        })
    }
}

/// The `get-anchors` body: a list of DER certificates.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorsResponse(#[serde_as(as = "Vec<Base64>")] pub Vec<Vec<u8>>);
