//! Tariff domain entity
//!
//! A progressive tariff is described by cumulative `(units, cost)` tiers:
//! each tier says how much it costs in total to buy that many units from
//! zero. The marginal price inside a tier is the slope between two
//! neighbouring tiers.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Schedule construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("tariff schedule must contain at least one tier")]
    Empty,

    #[error("tier {index} has a negative value")]
    NegativeValue { index: usize },

    #[error("tier {index} has zero unit width (same cumulative units as the previous tier)")]
    ZeroWidthTier { index: usize },

    #[error("tier {index} cumulative units must be greater than the previous tier")]
    UnitsNotIncreasing { index: usize },

    #[error("tier {index} cumulative cost must be greater than the previous tier")]
    CostNotIncreasing { index: usize },
}

/// Exchange rate construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("exchange rate must be positive, got {0}")]
pub struct ExchangeRateError(pub Decimal);

/// Cumulative tier boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TariffTier {
    /// Total units purchasable up to this boundary
    pub cumulative_units: Decimal,
    /// Total cost (billing currency) of buying `cumulative_units`
    pub cumulative_cost: Decimal,
}

impl TariffTier {
    /// Implicit tier every schedule starts from.
    pub const ORIGIN: TariffTier = TariffTier {
        cumulative_units: Decimal::ZERO,
        cumulative_cost: Decimal::ZERO,
    };

    pub fn new(cumulative_units: Decimal, cumulative_cost: Decimal) -> Self {
        Self {
            cumulative_units,
            cumulative_cost,
        }
    }
}

/// Conversion factor from the input currency (USD) into the billing currency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeRate(Decimal);

impl ExchangeRate {
    pub fn new(rate: Decimal) -> Result<Self, ExchangeRateError> {
        if rate <= Decimal::ZERO {
            return Err(ExchangeRateError(rate));
        }
        Ok(Self(rate))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Convert an input-currency amount into billing-currency budget.
    ///
    /// Saturates toward `Decimal::MAX` or `Decimal::MIN`, following the
    /// sign of `amount`, on overflow.
    pub fn convert(&self, amount: Decimal) -> Decimal {
        amount.checked_mul(self.0).unwrap_or(if amount.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        })
    }
}

/// Where a budget landed in the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierPosition {
    /// Inside (or exactly at the upper boundary of) the tier with this index
    Within(usize),
    /// Past the last tier; the last marginal rate was extrapolated
    Extrapolated,
}

/// An estimate together with how it was derived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitQuote {
    /// Input-currency amount the quote was requested for
    pub amount: Decimal,
    /// Budget in the billing currency
    pub budget: Decimal,
    /// Whole units affordable
    pub units: u64,
    pub position: TierPosition,
    /// Billing-currency price per unit applied to the final partial tier
    pub marginal_rate: Decimal,
}

/// Validated, immutable progressive tariff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TariffSchedule {
    tiers: Vec<TariffTier>,
}

impl TariffSchedule {
    /// Validate and build a schedule.
    pub fn new(tiers: Vec<TariffTier>) -> Result<Self, ScheduleError> {
        if tiers.is_empty() {
            return Err(ScheduleError::Empty);
        }

        let mut prev = TariffTier::ORIGIN;
        for (index, tier) in tiers.iter().enumerate() {
            if tier.cumulative_units < Decimal::ZERO || tier.cumulative_cost < Decimal::ZERO {
                return Err(ScheduleError::NegativeValue { index });
            }
            if tier.cumulative_units == prev.cumulative_units {
                return Err(ScheduleError::ZeroWidthTier { index });
            }
            if tier.cumulative_units < prev.cumulative_units {
                return Err(ScheduleError::UnitsNotIncreasing { index });
            }
            if tier.cumulative_cost <= prev.cumulative_cost {
                return Err(ScheduleError::CostNotIncreasing { index });
            }
            prev = *tier;
        }

        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[TariffTier] {
        &self.tiers
    }

    fn last(&self) -> TariffTier {
        // non-empty by construction
        self.tiers[self.tiers.len() - 1]
    }

    fn second_last(&self) -> TariffTier {
        match self.tiers.len() {
            0 | 1 => TariffTier::ORIGIN,
            n => self.tiers[n - 2],
        }
    }

    /// Estimate whole units affordable for an input-currency amount.
    ///
    /// Returns `None` when the amount (and so the budget) is not positive.
    pub fn estimate_units(&self, amount: Decimal, rate: ExchangeRate) -> Option<u64> {
        self.quote(amount, rate).map(|q| q.units)
    }

    /// Same as [`estimate_units`](Self::estimate_units) with the breakdown.
    pub fn quote(&self, amount: Decimal, rate: ExchangeRate) -> Option<UnitQuote> {
        if amount <= Decimal::ZERO {
            return None;
        }
        let budget = rate.convert(amount);
        if budget <= Decimal::ZERO {
            return None;
        }

        let mut prev = TariffTier::ORIGIN;
        for (index, tier) in self.tiers.iter().enumerate() {
            if budget >= tier.cumulative_cost {
                prev = *tier;
                continue;
            }

            let units = prev
                .cumulative_units
                .checked_add(affordable(budget - prev.cumulative_cost, prev, *tier))
                .unwrap_or(Decimal::MAX);
            return Some(UnitQuote {
                amount,
                budget,
                units: floor_units(units),
                position: TierPosition::Within(index),
                marginal_rate: marginal_rate(prev, *tier),
            });
        }

        let last = self.last();
        let before = self.second_last();
        let units = last
            .cumulative_units
            .checked_add(affordable(budget - last.cumulative_cost, before, last))
            .unwrap_or(Decimal::MAX);

        // A budget exactly at the last boundary is still inside the last tier.
        let position = if budget == last.cumulative_cost {
            TierPosition::Within(self.tiers.len() - 1)
        } else {
            TierPosition::Extrapolated
        };

        Some(UnitQuote {
            amount,
            budget,
            units: floor_units(units),
            position,
            marginal_rate: marginal_rate(before, last),
        })
    }

    /// Cumulative billing-currency cost of buying `units`.
    pub fn cost_for_units(&self, units: Decimal) -> Decimal {
        if units <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let mut prev = TariffTier::ORIGIN;
        for tier in &self.tiers {
            if units <= tier.cumulative_units {
                return prev
                    .cumulative_cost
                    .checked_add(cost_of(units - prev.cumulative_units, prev, *tier))
                    .unwrap_or(Decimal::MAX);
            }
            prev = *tier;
        }

        let last = self.last();
        last.cumulative_cost
            .checked_add(cost_of(units - last.cumulative_units, self.second_last(), last))
            .unwrap_or(Decimal::MAX)
    }

    /// Input-currency amount needed for `units`, rounded up to cents.
    pub fn amount_for_units(&self, units: Decimal, rate: ExchangeRate) -> Decimal {
        let cost = self.cost_for_units(units);
        cost.checked_div(rate.value())
            .unwrap_or(Decimal::MAX)
            .round_dp_with_strategy(2, RoundingStrategy::ToPositiveInfinity)
    }
}

/// Units `remaining` buys at the slope between `from` and `to`.
///
/// Multiplies before dividing so exact budgets do not pick up rounding
/// error from a non-terminating per-unit rate.
fn affordable(remaining: Decimal, from: TariffTier, to: TariffTier) -> Decimal {
    let width_units = to.cumulative_units - from.cumulative_units;
    let width_cost = to.cumulative_cost - from.cumulative_cost;
    remaining
        .checked_mul(width_units)
        .and_then(|scaled| scaled.checked_div(width_cost))
        .unwrap_or(Decimal::MAX)
}

fn cost_of(units: Decimal, from: TariffTier, to: TariffTier) -> Decimal {
    let width_units = to.cumulative_units - from.cumulative_units;
    let width_cost = to.cumulative_cost - from.cumulative_cost;
    units
        .checked_mul(width_cost)
        .and_then(|scaled| scaled.checked_div(width_units))
        .unwrap_or(Decimal::MAX)
}

fn marginal_rate(from: TariffTier, to: TariffTier) -> Decimal {
    (to.cumulative_cost - from.cumulative_cost)
        .checked_div(to.cumulative_units - from.cumulative_units)
        .unwrap_or(Decimal::MAX)
}

fn floor_units(units: Decimal) -> u64 {
    units.floor().to_u64().unwrap_or(u64::MAX)
}

/// Estimate whole units affordable for `amount` under `schedule`.
pub fn estimate_units(amount: Decimal, schedule: &TariffSchedule, rate: ExchangeRate) -> Option<u64> {
    schedule.estimate_units(amount, rate)
}

// ── Tests ──────────────────────────────────────────────────────
