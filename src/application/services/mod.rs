//! Application services

mod pricing;

pub use pricing::{PricingService, QuickEstimate};
