//! # ZETDC Top-up
//!
//! Prepaid electricity top-up service: converts payment amounts into whole
//! kWh unit estimates using the cumulative ZETDC tariff, and tracks how the
//! backend applies recharge tokens.
//!
//! ## Architecture
//!
//! - **domain**: tariff schedule, exchange rate and recharge records
//! - **application**: pricing service, recharge watcher and outbound ports
//! - **infrastructure**: HTTP client for the top-up backend
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: errors, polling and shutdown helpers
//! - **server**: runtime that wires config, metrics and the API together

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export API router
pub use interfaces::create_api_router;
