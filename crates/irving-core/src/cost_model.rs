use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent, Rate};

// ---------------------------------------------------------------------------
// Cost model parameters
// ---------------------------------------------------------------------------

/// Fixed marketplace cost assumptions applied to every line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostModelParams {
    /// Flat shipping charge per unit shipped.
    pub flat_shipping_per_unit: Money,
    /// Destination country that ships free of charge.
    pub free_shipping_country: String,
    /// Commission rate applied to unit price when the marketplace did not
    /// report a commission for the line item.
    pub fallback_commission_rate: Rate,
}

impl Default for CostModelParams {
    fn default() -> Self {
        Self {
            flat_shipping_per_unit: dec!(18.50),
            free_shipping_country: "AR".to_string(),
            fallback_commission_rate: dec!(0.16),
        }
    }
}

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

/// Per-unit cost decomposition for one line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitCostBreakdown {
    pub shipping_per_unit: Money,
    pub commission_per_unit: Money,
    pub tax_per_unit: Money,
    /// Always zero here; advertising spend is merged per product after
    /// aggregation, not per line item.
    pub ad_per_unit: Money,
    /// Always zero; returns cost modelling is a reserved extension point.
    pub returns_per_unit: Money,
    /// unit_price − unit_cost − shipping − commission − tax − ads − returns.
    /// Negative when the product sells below its cost stack.
    pub margin_per_unit: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Decompose the per-unit cost stack for one line item and derive its
/// contribution margin. Pure; no state or I/O.
///
/// An unset `unit_cost` is treated as zero for the margin arithmetic; callers
/// track unset-ness separately so it is never mistaken for a configured zero.
pub fn unit_cost_breakdown(
    params: &CostModelParams,
    unit_price: Money,
    unit_cost: Option<Money>,
    destination_country: &str,
    reported_commission: Option<Money>,
    tax_percent: Percent,
) -> UnitCostBreakdown {
    let shipping_per_unit = if destination_country == params.free_shipping_country {
        Decimal::ZERO
    } else {
        params.flat_shipping_per_unit
    };

    let commission_per_unit =
        reported_commission.unwrap_or_else(|| unit_price * params.fallback_commission_rate);

    let tax_per_unit = unit_price * tax_percent / dec!(100);

    let ad_per_unit = Decimal::ZERO;
    let returns_per_unit = Decimal::ZERO;

    let margin_per_unit = unit_price
        - unit_cost.unwrap_or(Decimal::ZERO)
        - shipping_per_unit
        - commission_per_unit
        - tax_per_unit
        - ad_per_unit
        - returns_per_unit;

    UnitCostBreakdown {
        shipping_per_unit,
        commission_per_unit,
        tax_per_unit,
        ad_per_unit,
        returns_per_unit,
        margin_per_unit,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
