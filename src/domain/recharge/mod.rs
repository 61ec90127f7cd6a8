//! Recharge aggregate
//!
//! Manual token recharges and auto-recharge events owned by the backend.

pub mod model;

pub use model::{
    extract_token, AutoRechargeEvent, AutoRechargeStatus, Listing, ManualRecharge, RechargeStatus,
};
