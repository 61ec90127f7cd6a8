//! Infrastructure layer
//!
//! Adapters for external systems. The only one is the top-up backend REST
//! API.

pub mod backend;

pub use backend::BackendClient;
