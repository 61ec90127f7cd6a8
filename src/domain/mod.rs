//! Domain layer
//!
//! Pure pricing logic and the recharge records exchanged with the backend.

pub mod recharge;
pub mod tariff;

pub use recharge::{
    AutoRechargeEvent, AutoRechargeStatus, Listing, ManualRecharge, RechargeStatus,
};
pub use tariff::{
    estimate_units, ExchangeRate, ExchangeRateError, ScheduleError, TariffSchedule, TariffTier,
    TierPosition, UnitQuote,
};
