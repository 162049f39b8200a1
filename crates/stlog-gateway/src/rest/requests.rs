//! Request parsing and validation, one constructor per endpoint.
//!
//! Byte fields travel as base64 strings inside JSON, matching what
//! stock JSON encoders on the client side produce for byte arrays.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as b64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};
use stlog_types::{Appendix, CosignedTreeHeadV1, StItem};

use crate::domain::error::GatewayError;
use crate::domain::params::LogParameters;

/// Body of `add-entry`.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddEntryRequest {
    /// A serialized `checksum_v1` item.
    #[serde_as(as = "Base64")]
    pub item: Vec<u8>,
    /// The submitter's detached signature over `item`.
    #[serde_as(as = "Base64")]
    pub signature: Vec<u8>,
    /// RFC 8446 section 4.2.3 code point.
    #[serde(default)]
    pub signature_scheme: u16,
    /// DER certificate chain, kept opaque.
    #[serde(default)]
    #[serde_as(as = "Option<Vec<Base64>>")]
    pub chain: Option<Vec<Vec<u8>>>,
}

/// A validated `add-entry`: the leaf value to queue and its appendix.
#[derive(Debug, Clone)]
pub struct EntrySubmission {
    pub leaf: Vec<u8>,
    pub appendix: Vec<u8>,
}

impl AddEntryRequest {
    /// Decode the item, check the format and the submitter policy, verify
    /// the detached signature, and assemble the appendix.
    pub fn validate(self, params: &LogParameters) -> Result<EntrySubmission, GatewayError> {
        let item = StItem::unmarshal(&self.item)?;
        let leaf = match item {
            StItem::ChecksumV1(leaf) => leaf,
            other => {
                return Err(GatewayError::BadRequest(format!(
                    "expected a checksum_v1 item, got {other}"
                )))
            }
        };
        if !params.submitters.accepts(&leaf.namespace) {
            return Err(GatewayError::BadRequest(
                "submitter namespace not accepted".into(),
            ));
        }
        leaf.namespace
            .verify(&self.item, &self.signature)
            .map_err(|e| GatewayError::BadRequest(format!("invalid signature: {e}")))?;

        let appendix = Appendix::new(
            self.signature,
            self.signature_scheme,
            self.chain.unwrap_or_default(),
        )
        .marshal()?;
        Ok(EntrySubmission {
            leaf: self.item,
            appendix,
        })
    }
}

/// Body of `add-cosignature`.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCosignatureRequest {
    /// A serialized `cosigned_tree_head_v1` item carrying exactly one
    /// cosignature.
    #[serde_as(as = "Base64")]
    pub costh: Vec<u8>,
}

impl AddCosignatureRequest {
    /// Decode the cosigned tree head and check its shape. Witness and
    /// candidate gating happen in the tree head source.
    pub fn validate(self) -> Result<CosignedTreeHeadV1, GatewayError> {
        let costh = match StItem::unmarshal(&self.costh)? {
            StItem::CosignedTreeHeadV1(costh) => costh,
            other => {
                return Err(GatewayError::BadRequest(format!(
                    "expected a cosigned_tree_head_v1 item, got {other}"
                )))
            }
        };
        if costh.cosignatures.len() != 1 {
            return Err(GatewayError::BadRequest(format!(
                "expected exactly one cosignature, got {}",
                costh.cosignatures.len()
            )));
        }
        Ok(costh)
    }
}

/// Validated `get-entries` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetEntriesRequest {
    pub start: i64,
    pub end: i64,
}

impl GetEntriesRequest {
    /// Parse `start` and `end`, requiring `0 <= start <= end`. Ranges
    /// larger than the log's maximum are truncated; the tree size is not
    /// known here, so no upper clamp against it happens.
    pub fn parse(
        query: &HashMap<String, String>,
        params: &LogParameters,
    ) -> Result<Self, GatewayError> {
        let start = require_i64(query, "start")?;
        let mut end = require_i64(query, "end")?;
        if start < 0 {
            return Err(GatewayError::BadRequest(format!(
                "start({start}) must be non-negative"
            )));
        }
        if start > end {
            return Err(GatewayError::BadRequest(format!(
                "start({start}) must not be larger than end({end})"
            )));
        }
        if end - start + 1 > params.max_range {
            end = start + params.max_range - 1;
        }
        Ok(Self { start, end })
    }
}

/// Validated `get-proof-by-hash` parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetProofByHashRequest {
    pub hash: Vec<u8>,
    pub tree_size: i64,
}

impl GetProofByHashRequest {
    pub fn parse(query: &HashMap<String, String>) -> Result<Self, GatewayError> {
        let tree_size = require_i64(query, "tree_size")?;
        if tree_size < 1 {
            return Err(GatewayError::BadRequest(format!(
                "tree_size({tree_size}) must be a positive value"
            )));
        }
        let hash = b64
            .decode(require_param(query, "hash")?)
            .map_err(|e| GatewayError::BadRequest(format!("bad hash parameter: {e}")))?;
        Ok(Self { hash, tree_size })
    }
}

/// Validated `get-consistency-proof` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetConsistencyProofRequest {
    pub first: i64,
    pub second: i64,
}

impl GetConsistencyProofRequest {
    pub fn parse(query: &HashMap<String, String>) -> Result<Self, GatewayError> {
        let first = require_i64(query, "first")?;
        let second = require_i64(query, "second")?;
        if first < 1 {
            return Err(GatewayError::BadRequest(format!(
                "first({first}) must be a natural number"
            )));
        }
        if first >= second {
            return Err(GatewayError::BadRequest(format!(
                "second({second}) must be larger than first({first})"
            )));
        }
        Ok(Self { first, second })
    }
}

fn require_param<'a>(
    query: &'a HashMap<String, String>,
    name: &str,
) -> Result<&'a str, GatewayError> {
    query
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| GatewayError::BadRequest(format!("missing {name} parameter")))
}

fn require_i64(query: &HashMap<String, String>, name: &str) -> Result<i64, GatewayError> {
    require_param(query, name)?
        .parse()
        .map_err(|e| GatewayError::BadRequest(format!("bad {name} parameter: {e}")))
}
