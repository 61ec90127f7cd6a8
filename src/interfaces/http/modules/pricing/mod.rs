//! Pricing endpoints: schedule, estimates and costs

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
