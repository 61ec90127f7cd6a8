//! Pricing DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::services::{PricingService, QuickEstimate};
use crate::domain::{TariffTier, TierPosition, UnitQuote};

/// One cumulative tariff band
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TierDto {
    #[serde(with = "rust_decimal::serde::float")]
    pub units: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cumulative_cost: Decimal,
}

impl From<&TariffTier> for TierDto {
    fn from(t: &TariffTier) -> Self {
        Self {
            units: t.cumulative_units,
            cumulative_cost: t.cumulative_cost,
        }
    }
}

/// Active tariff schedule and conversion settings
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScheduleResponse {
    pub input_currency: String,
    pub billing_currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub exchange_rate: Decimal,
    #[schema(value_type = Vec<f64>)]
    #[serde(with = "float_vec")]
    pub quick_amounts: Vec<Decimal>,
    pub tiers: Vec<TierDto>,
}

impl From<&PricingService> for ScheduleResponse {
    fn from(s: &PricingService) -> Self {
        Self {
            input_currency: s.input_currency().to_string(),
            billing_currency: s.billing_currency().to_string(),
            exchange_rate: s.rate().value(),
            quick_amounts: s.quick_amounts().to_vec(),
            tiers: s.schedule().tiers().iter().map(TierDto::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EstimateParams {
    /// Payment amount in the input currency
    #[param(value_type = f64)]
    pub amount: Decimal,
}

/// Estimate for one amount
///
/// `units` is `null` when the amount is zero or negative; there is nothing
/// to show in that case.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EstimateResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub units: Option<u64>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub budget: Option<Decimal>,
    /// Zero-based tier index, or `null` when extrapolated past the last tier
    pub tier: Option<usize>,
    pub extrapolated: bool,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub marginal_rate: Option<Decimal>,
}

impl EstimateResponse {
    pub fn new(amount: Decimal, quote: Option<UnitQuote>) -> Self {
        match quote {
            Some(q) => Self {
                amount,
                units: Some(q.units),
                budget: Some(q.budget),
                tier: match q.position {
                    TierPosition::Within(index) => Some(index),
                    TierPosition::Extrapolated => None,
                },
                extrapolated: q.position == TierPosition::Extrapolated,
                marginal_rate: Some(q.marginal_rate),
            },
            None => Self {
                amount,
                units: None,
                budget: None,
                tier: None,
                extrapolated: false,
                marginal_rate: None,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuickEstimateDto {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub units: Option<u64>,
}

impl From<QuickEstimate> for QuickEstimateDto {
    fn from(q: QuickEstimate) -> Self {
        Self {
            amount: q.amount,
            units: q.units,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct QuoteRequest {
    #[validate(length(min = 1, max = 50, message = "between 1 and 50 amounts are required"))]
    #[schema(value_type = Vec<f64>)]
    pub amounts: Vec<Decimal>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CostParams {
    /// Units (kWh) to price
    #[param(value_type = f64)]
    pub units: Decimal,
}

/// Price of a number of units
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CostResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub units: Decimal,
    /// Cost in the billing currency
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    /// Input-currency amount that buys at least `units`
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub billing_currency: String,
    pub input_currency: String,
}

mod float_vec {
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[Decimal], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| v.to_f64().unwrap_or(f64::NAN)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Decimal>, D::Error> {
        Vec::<Decimal>::deserialize(deserializer)
    }
}
