//! Tariff aggregate
//!
//! Contains the progressive tariff schedule, exchange rate, and the
//! money → units conversion in both directions.

pub mod model;

pub use model::{
    estimate_units, ExchangeRate, ExchangeRateError, ScheduleError, TariffSchedule, TariffTier,
    TierPosition, UnitQuote,
};
