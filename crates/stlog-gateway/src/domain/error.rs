//! Error taxonomy for the gateway.
//!
//! Request-level failures map onto exactly two client-visible classes: 400
//! for anything the client got wrong, 500 for anything the log or its
//! backend got wrong. Client bodies are the coarse `StatusText + "\n"`
//! plaintext; detail stays in the server logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use stlog_crypto::SignerError;
use stlog_types::WireError;
use tracing::{debug, error};

use crate::domain::config::ConfigError;
use crate::ports::BackendError;

/// A failed request or a failed attempt to answer one.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The client sent bytes that do not decode as the expected item.
    /// Covers unknown tags, unsupported namespaces, and bounds violations.
    #[error("malformed item: {0}")]
    Malformed(#[from] WireError),

    /// The client's parameters failed validation.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A cosignature arrived from a namespace outside the witness set.
    #[error("untrusted witness")]
    UntrustedWitness,

    /// A cosignature covers something other than the current candidate
    /// tree head.
    #[error("cosignature does not match the current tree head candidate")]
    StaleCosignature,

    /// The Merkle tree backend failed or answered nonsense.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The log signer refused to sign.
    #[error("signer failure: {0}")]
    Signer(#[from] SignerError),

    /// An item built by the log itself failed to serialize.
    #[error("item encoding failed: {0}")]
    Encoding(WireError),

    /// No cosigned tree head has been established yet.
    #[error("no cosigned tree head available yet")]
    NoCosignedTreeHead,
}

impl GatewayError {
    /// The HTTP status this error surfaces as.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Malformed(_)
            | GatewayError::BadRequest(_)
            | GatewayError::UntrustedWitness
            | GatewayError::StaleCosignature => StatusCode::BAD_REQUEST,
            GatewayError::Backend(_)
            | GatewayError::Signer(_)
            | GatewayError::Encoding(_)
            | GatewayError::NoCosignedTreeHead => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            debug!(error = %self, "rejecting request");
        }
        let body = format!("{}\n", status.canonical_reason().unwrap_or("Error"));
        (status, body).into_response()
    }
}

/// Failures while assembling or running the service itself.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("metrics registration failed: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("failed to bind listener: {0}")]
    Bind(std::io::Error),

    #[error("server error: {0}")]
    Serve(std::io::Error),
}
