use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::cost_model::{unit_cost_breakdown, CostModelParams};
use crate::types::{CostConfig, Money, Order, ProductId};

// ---------------------------------------------------------------------------
// Aggregation types
// ---------------------------------------------------------------------------

/// Running totals for one product across every line item observed in the
/// window. Built during one computation and discarded with the response.
#[derive(Debug, Clone, Serialize)]
pub struct ProductAggregate {
    pub product_id: ProductId,
    /// Listing title from the most recent line item seen.
    pub title: String,
    pub units_sold: u64,
    pub revenue: Money,
    pub shipping_cost_total: Money,
    pub commission_total: Money,
    pub tax_cost_total: Money,
    /// Filled in by the advertising enrichment pass; zero until then.
    pub ad_cost_total: Money,
    /// Configured unit cost, or `None` when the seller never set one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<Money>,
    /// True iff the product was missing from the cost config. Gates whether
    /// the product contributes to profit totals.
    pub has_unset_cost: bool,
    /// Quantity-weighted contribution margin summed over all units, before
    /// advertising spend.
    pub margin_total: Money,
}

impl ProductAggregate {
    fn new(product_id: ProductId, title: String) -> Self {
        Self {
            product_id,
            title,
            units_sold: 0,
            revenue: Decimal::ZERO,
            shipping_cost_total: Decimal::ZERO,
            commission_total: Decimal::ZERO,
            tax_cost_total: Decimal::ZERO,
            ad_cost_total: Decimal::ZERO,
            unit_cost: None,
            has_unset_cost: false,
            margin_total: Decimal::ZERO,
        }
    }

    /// Quantity-weighted contribution margin per unit, before ad spend.
    /// Every observed line item contributes in proportion to its quantity,
    /// so products sold at several prices average out correctly.
    pub fn margin_per_unit(&self) -> Money {
        if self.units_sold == 0 {
            Decimal::ZERO
        } else {
            self.margin_total / Decimal::from(self.units_sold)
        }
    }
}

/// Revenue and profit accumulated for one calendar day.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DailyBucket {
    pub revenue_total: Money,
    /// Only products with a configured unit cost contribute here, so unset
    /// costs cannot inflate the series.
    pub profit_total: Money,
}

/// Output of one aggregation pass: per-product totals plus the daily series.
/// Both maps iterate in key order, which keeps downstream output stable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderAggregation {
    pub products: BTreeMap<ProductId, ProductAggregate>,
    pub daily: BTreeMap<NaiveDate, DailyBucket>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Group a window of orders into per-product aggregates and a daily
/// revenue/profit series.
///
/// Returns `None` when the window holds no orders at all, so callers can
/// short-circuit with a minimal response instead of an all-zero table.
pub fn aggregate_orders(
    orders: &[Order],
    config: &CostConfig,
    params: &CostModelParams,
) -> Option<OrderAggregation> {
    if orders.is_empty() {
        return None;
    }

    let mut agg = OrderAggregation::default();

    for order in orders {
        let day = order.created_at.date_naive();
        // Touch the bucket even when the order carries no line items.
        let bucket = agg.daily.entry(day).or_default();

        for item in &order.line_items {
            let unit_cost = config.unit_cost(&item.product_id);
            let breakdown = unit_cost_breakdown(
                params,
                item.unit_price,
                unit_cost,
                &order.destination_country,
                item.reported_commission,
                config.default_tax_percent,
            );

            let quantity = Decimal::from(item.quantity);
            let line_revenue = item.unit_price * quantity;
            let line_margin = breakdown.margin_per_unit * quantity;

            let product = agg
                .products
                .entry(item.product_id.clone())
                .or_insert_with(|| {
                    ProductAggregate::new(item.product_id.clone(), item.title.clone())
                });

            product.title = item.title.clone();
            product.units_sold += item.quantity;
            product.revenue += line_revenue;
            product.shipping_cost_total += breakdown.shipping_per_unit * quantity;
            product.commission_total += breakdown.commission_per_unit * quantity;
            product.tax_cost_total += breakdown.tax_per_unit * quantity;
            product.margin_total += line_margin;
            if unit_cost.is_none() {
                product.has_unset_cost = true;
            } else {
                product.unit_cost = unit_cost;
            }

            bucket.revenue_total += line_revenue;
            if unit_cost.is_some() {
                bucket.profit_total += line_margin;
            }
        }
    }

    Some(agg)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
