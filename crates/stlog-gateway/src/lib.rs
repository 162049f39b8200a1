//! # stlog gateway
//!
//! The HTTP front-end of the stlog transparency log. Handlers translate
//! typed JSON requests into calls against an external Merkle tree backend,
//! wrap the replies as signed wire items, and keep a rotating cosigned tree
//! head that witnesses countersign.
//!
//! # Architecture
//!
//! ```text
//! client ── axum router ── rest::handlers ── rest::{requests,responses}
//!                │                 │
//!         middleware::metrics      ├── adapters::BackendClient ── MerkleBackend (gRPC, out of tree)
//!                                  └── domain::SthSource ───────── rotation task
//! ```
//!
//! - `domain` - log parameters, configuration, errors, and the cosigning
//!   state machine
//! - `ports` - the outbound backend contract
//! - `adapters` - deadline and error mapping around the backend
//! - `rest` - endpoint table, request parsing, response building, handlers
//! - `middleware` - per-endpoint request counters and latency histograms
//! - `service` - router assembly, rotation task, serve loop

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod middleware;
pub mod ports;
pub mod rest;
pub mod service;

pub use adapters::BackendClient;
pub use domain::config::{ConfigError, GatewayConfig};
pub use domain::error::{GatewayError, ServiceError};
pub use domain::params::LogParameters;
pub use domain::sth::SthSource;
pub use middleware::HttpMetrics;
pub use ports::MerkleBackend;
pub use rest::Endpoint;
pub use service::{AppState, LogService};
