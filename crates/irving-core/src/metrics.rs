use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::aggregate::ProductAggregate;
use crate::types::{Money, Percent};

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

/// Period-over-period change as a percentage, one decimal place.
///
/// A previous value of zero reads as +100% when anything was sold at all
/// (growth from nothing), and 0% when both periods are zero.
pub fn trend(actual: Decimal, previous: Decimal) -> Decimal {
    if actual.is_zero() && previous.is_zero() {
        Decimal::ZERO
    } else if previous.is_zero() {
        dec!(100)
    } else {
        ((actual - previous) / previous * dec!(100)).round_dp(1)
    }
}

// ---------------------------------------------------------------------------
// Status classification
// ---------------------------------------------------------------------------

/// Health classification for one product row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus {
    /// No unit cost configured. Overrides every other signal, since margin
    /// figures are meaningless without a cost.
    #[serde(rename = "cost missing")]
    CostMissing,
    /// Selling at a loss while paying for ads.
    #[serde(rename = "pause advertising")]
    PauseAdvertising,
    /// Selling at a loss with no ad spend involved.
    #[serde(rename = "pricing error")]
    PricingError,
    /// Profitable and already converting ad spend.
    #[serde(rename = "scale advertising")]
    ScaleAdvertising,
    #[serde(rename = "healthy / organic")]
    Healthy,
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CostMissing => "cost missing",
            Self::PauseAdvertising => "pause advertising",
            Self::PricingError => "pricing error",
            Self::ScaleAdvertising => "scale advertising",
            Self::Healthy => "healthy / organic",
        };
        write!(f, "{}", s)
    }
}

/// Classify a product, in strict precedence order.
pub fn classify_status(
    has_unset_cost: bool,
    net_margin_per_unit: Money,
    ad_spend: Money,
) -> ProductStatus {
    if has_unset_cost {
        ProductStatus::CostMissing
    } else if net_margin_per_unit < Decimal::ZERO {
        if ad_spend > Decimal::ZERO {
            ProductStatus::PauseAdvertising
        } else {
            ProductStatus::PricingError
        }
    } else if net_margin_per_unit > Decimal::ZERO && ad_spend > Decimal::ZERO {
        ProductStatus::ScaleAdvertising
    } else {
        ProductStatus::Healthy
    }
}

// ---------------------------------------------------------------------------
// Prior-period estimation
// ---------------------------------------------------------------------------

/// Prior-period figures a product's trends are computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorPeriod {
    pub units_sold: u64,
    pub margin_per_unit: Money,
}

/// Strategy supplying prior-period figures per product. Swapping in a real
/// historical lookup changes nothing downstream.
pub trait PriorPeriodEstimator: Send + Sync {
    fn estimate(&self, product_id: &str, units_sold: u64, net_margin_per_unit: Money)
        -> PriorPeriod;
}

/// Placeholder policy in lieu of real history: prior units are
/// floor(current × 0.85) and prior margin is current × 0.9.
#[derive(Debug, Clone)]
pub struct ScaledEstimate {
    pub units_factor: Decimal,
    pub margin_factor: Decimal,
}

impl Default for ScaledEstimate {
    fn default() -> Self {
        Self {
            units_factor: dec!(0.85),
            margin_factor: dec!(0.9),
        }
    }
}

impl PriorPeriodEstimator for ScaledEstimate {
    fn estimate(
        &self,
        _product_id: &str,
        units_sold: u64,
        net_margin_per_unit: Money,
    ) -> PriorPeriod {
        let scaled_units = (Decimal::from(units_sold) * self.units_factor).floor();
        PriorPeriod {
            units_sold: scaled_units.to_u64().unwrap_or(0),
            margin_per_unit: net_margin_per_unit * self.margin_factor,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-product metrics
// ---------------------------------------------------------------------------

/// Derived figures for one product row, computed after ad enrichment.
#[derive(Debug, Clone, Serialize)]
pub struct ProductMetrics {
    /// Contribution margin per unit after netting out the product's whole
    /// ad spend: (margin_total − ad_cost_total) / units_sold.
    pub net_margin_per_unit: Money,
    /// Revenue / units_sold; the price base for the discount headroom.
    pub avg_unit_price: Money,
    pub prior_units_sold: u64,
    pub prior_margin_per_unit: Money,
    pub units_trend_percent: Decimal,
    pub margin_trend_percent: Decimal,
    pub status: ProductStatus,
    /// Largest percentage price cut that still breaks even. Negative when
    /// the product already sells at a loss.
    pub max_discount_percent: Percent,
    /// Same figure clamped at zero for charting.
    pub max_discount_for_chart: Percent,
    /// Missing cost or negative net margin; feeds the alert KPI.
    pub is_critical: bool,
}

/// Derive the full metrics block for one enriched aggregate.
pub fn product_metrics(
    aggregate: &ProductAggregate,
    estimator: &dyn PriorPeriodEstimator,
) -> ProductMetrics {
    let units = Decimal::from(aggregate.units_sold);

    let net_margin_per_unit = if units.is_zero() {
        Decimal::ZERO
    } else {
        (aggregate.margin_total - aggregate.ad_cost_total) / units
    };

    let avg_unit_price = if units.is_zero() {
        Decimal::ZERO
    } else {
        aggregate.revenue / units
    };

    let prior = estimator.estimate(
        &aggregate.product_id,
        aggregate.units_sold,
        net_margin_per_unit,
    );

    let units_trend_percent = trend(units, Decimal::from(prior.units_sold));
    let margin_trend_percent = trend(net_margin_per_unit, prior.margin_per_unit);

    let status = classify_status(
        aggregate.has_unset_cost,
        net_margin_per_unit,
        aggregate.ad_cost_total,
    );

    let max_discount_percent = if avg_unit_price.is_zero() {
        Decimal::ZERO
    } else {
        (net_margin_per_unit / avg_unit_price * dec!(100)).round_dp(2)
    };
    let max_discount_for_chart = max_discount_percent.max(Decimal::ZERO);

    let is_critical = aggregate.has_unset_cost || net_margin_per_unit < Decimal::ZERO;

    ProductMetrics {
        net_margin_per_unit,
        avg_unit_price,
        prior_units_sold: prior.units_sold,
        prior_margin_per_unit: prior.margin_per_unit,
        units_trend_percent,
        margin_trend_percent,
        status,
        max_discount_percent,
        max_discount_for_chart,
        is_critical,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
