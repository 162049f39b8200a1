//! Opaque per-leaf metadata.
//!
//! An appendix is stored as the backend's extra data next to a leaf value.
//! It carries the submitter's detached signature over the leaf, the
//! signature scheme identifier (RFC 8446 section 4.2.3 code points), and an
//! optional DER certificate chain. The chain is opaque to the log; any
//! X.509 policy belongs to the deployment.

use crate::codec::{Decoder, Encoder, WireError};

const SIGNATURE_MIN: usize = 1;
const SIGNATURE_MAX: usize = 65535;
const DER_CERT_MIN: usize = 1;
const DER_CERT_MAX: usize = 65535;

/// Submitter signature, scheme, and certificate chain for one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Appendix {
    pub signature: Vec<u8>,
    pub signature_scheme: u16,
    pub chain: Vec<Vec<u8>>,
}

impl Appendix {
    pub fn new(signature: Vec<u8>, signature_scheme: u16, chain: Vec<Vec<u8>>) -> Self {
        Self {
            signature,
            signature_scheme,
            chain,
        }
    }

    pub fn marshal(&self) -> Result<Vec<u8>, WireError> {
        let mut enc = Encoder::new();
        enc.put_var16("signature", &self.signature, SIGNATURE_MIN, SIGNATURE_MAX)?;
        enc.put_u16(self.signature_scheme);
        let mut body = Encoder::new();
        for cert in &self.chain {
            body.put_var16("der_cert", cert, DER_CERT_MIN, DER_CERT_MAX)?;
        }
        enc.put_list("chain", body)?;
        Ok(enc.into_bytes())
    }

    pub fn unmarshal(bytes: &[u8]) -> Result<Self, WireError> {
        let mut dec = Decoder::new(bytes);
        let signature = dec
            .var16("signature", SIGNATURE_MIN, SIGNATURE_MAX)?
            .to_vec();
        let signature_scheme = dec.u16()?;
        let mut body = dec.list()?;
        let mut chain = Vec::new();
        while !body.is_empty() {
            chain.push(body.var16("der_cert", DER_CERT_MIN, DER_CERT_MAX)?.to_vec());
        }
        dec.finish()?;
        Ok(Self {
            signature,
            signature_scheme,
            chain,
        })
    }
}
