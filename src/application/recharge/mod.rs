//! Recharge tracking use cases

pub mod watcher;

pub use watcher::{allocations, RechargeWatcher, TokenAllocation};
