//! Pricing service for turning payment amounts into unit estimates

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::{ExchangeRate, TariffSchedule, UnitQuote};

/// Estimate for one of the configured quick-purchase amounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickEstimate {
    pub amount: Decimal,
    pub units: Option<u64>,
}

/// Service for pricing operations
///
/// Holds a validated schedule behind an `Arc`, so clones are cheap and can
/// be handed to every request handler.
#[derive(Debug, Clone)]
pub struct PricingService {
    schedule: Arc<TariffSchedule>,
    rate: ExchangeRate,
    quick_amounts: Vec<Decimal>,
    input_currency: String,
    billing_currency: String,
}

impl PricingService {
    pub fn new(
        schedule: TariffSchedule,
        rate: ExchangeRate,
        quick_amounts: Vec<Decimal>,
        input_currency: impl Into<String>,
        billing_currency: impl Into<String>,
    ) -> Self {
        Self {
            schedule: Arc::new(schedule),
            rate,
            quick_amounts,
            input_currency: input_currency.into(),
            billing_currency: billing_currency.into(),
        }
    }

    pub fn schedule(&self) -> &TariffSchedule {
        &self.schedule
    }

    pub fn rate(&self) -> ExchangeRate {
        self.rate
    }

    pub fn quick_amounts(&self) -> &[Decimal] {
        &self.quick_amounts
    }

    pub fn input_currency(&self) -> &str {
        &self.input_currency
    }

    pub fn billing_currency(&self) -> &str {
        &self.billing_currency
    }

    /// Whole units affordable for `amount` (input currency).
    pub fn estimate(&self, amount: Decimal) -> Option<u64> {
        self.quote(amount).map(|q| q.units)
    }

    pub fn quote(&self, amount: Decimal) -> Option<UnitQuote> {
        let quote = self.schedule.quote(amount, self.rate);
        metrics::counter!(
            "pricing_estimates_total",
            "outcome" => if quote.is_some() { "estimated" } else { "no_estimate" }
        )
        .increment(1);

        debug!(
            %amount,
            units = quote.as_ref().map(|q| q.units),
            "Unit estimate computed"
        );
        quote
    }

    pub fn quick_estimates(&self) -> Vec<QuickEstimate> {
        self.quick_amounts
            .iter()
            .map(|&amount| QuickEstimate {
                amount,
                units: self.estimate(amount),
            })
            .collect()
    }

    /// Billing-currency cost of `units`.
    pub fn cost_for_units(&self, units: Decimal) -> Decimal {
        self.schedule.cost_for_units(units)
    }

    /// Input-currency amount that buys at least `units`.
    pub fn amount_for_units(&self, units: Decimal) -> Decimal {
        self.schedule.amount_for_units(units, self.rate)
    }

    /// Units to show for a backend transaction record.
    ///
    /// Recorded units win; otherwise the amount paid is run through the
    /// tariff.
    pub fn transaction_units(&self, units: Option<Decimal>, amount: Option<Decimal>) -> Option<Decimal> {
        if let Some(units) = units.filter(|u| *u > Decimal::ZERO) {
            return Some(units);
        }
        amount
            .and_then(|a| self.schedule.estimate_units(a, self.rate))
            .map(Decimal::from)
    }
}

// ── Tests ──────────────────────────────────────────────────────
