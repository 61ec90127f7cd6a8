pub mod ports;
pub mod recharge;
pub mod services;

// Re-export key types for convenience
pub use ports::RechargeBackend;
pub use recharge::{RechargeWatcher, TokenAllocation};
pub use services::{PricingService, QuickEstimate};
