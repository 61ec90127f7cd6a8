//! Top-up backend integration

pub mod client;

pub use client::BackendClient;
