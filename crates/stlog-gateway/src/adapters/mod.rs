//! Adapters over the outbound ports.

pub mod backend;

pub use backend::BackendClient;
