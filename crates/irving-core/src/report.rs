use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::OrderAggregation;
use crate::metrics::{product_metrics, PriorPeriodEstimator, ProductStatus};
use crate::types::{Money, Percent, ProductId};

// ---------------------------------------------------------------------------
// Currency formatting
// ---------------------------------------------------------------------------

/// Locale convention for displayed amounts. Presentation only; every numeric
/// field in the report keeps its raw decimal value alongside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyStyle {
    pub symbol: String,
    pub thousands_separator: char,
    pub decimal_separator: char,
    pub decimal_places: u32,
}

impl Default for CurrencyStyle {
    /// Brazilian convention: "R$ 1.234,56".
    fn default() -> Self {
        Self {
            symbol: "R$".to_string(),
            thousands_separator: '.',
            decimal_separator: ',',
            decimal_places: 2,
        }
    }
}

impl CurrencyStyle {
    /// Fixed-point rendering with grouping, e.g. `-1234.5` to "-R$ 1.234,50".
    pub fn format(&self, amount: Money) -> String {
        let mut rounded = amount.round_dp(self.decimal_places);
        rounded.rescale(self.decimal_places);

        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let text = rounded.abs().to_string();
        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i, f),
            None => (text.as_str(), ""),
        };

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(&self.symbol);
        out.push(' ');
        out.push_str(&group_thousands(int_part, self.thousands_separator));
        if !frac_part.is_empty() {
            out.push(self.decimal_separator);
            out.push_str(frac_part);
        }
        out
    }
}

fn group_thousands(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Report shapes
// ---------------------------------------------------------------------------

/// One product row: aggregation totals plus every derived metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRow {
    pub product_id: ProductId,
    pub title: String,
    pub units_sold: u64,
    pub revenue: Money,
    pub revenue_display: String,
    pub avg_unit_price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<Money>,
    pub has_unset_cost: bool,
    pub shipping_cost_total: Money,
    pub commission_total: Money,
    pub tax_cost_total: Money,
    pub ad_cost_total: Money,
    /// Quantity-weighted contribution margin per unit before ad spend.
    pub margin_per_unit: Money,
    /// Margin per unit after the product's ad spend is netted out.
    pub net_margin_per_unit: Money,
    pub net_margin_per_unit_display: String,
    pub units_sold_previous_period: u64,
    pub margin_per_unit_previous_period: Money,
    pub units_trend_percent: Decimal,
    pub margin_trend_percent: Decimal,
    pub status: ProductStatus,
    pub max_discount_percent: Percent,
    pub max_discount_for_chart: Percent,
    pub is_critical: bool,
}

/// Whole-table totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiSummary {
    pub revenue_total: Money,
    pub revenue_total_display: String,
    /// Net profit across products with a configured cost; rows flagged
    /// `has_unset_cost` are excluded so a missing cost cannot fake profit.
    pub profit_total: Money,
    pub profit_total_display: String,
    pub ad_spend_total: Money,
    pub ad_spend_total_display: String,
    pub units_total: u64,
    pub critical_alert_count: u64,
    pub period_label: String,
    pub default_tax_percent: Percent,
}

/// One point of the charting series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub revenue_total: Money,
    pub profit_total: Money,
}

/// The full response: rows sorted by revenue, KPI block, daily series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitReport {
    pub kpis: KpiSummary,
    pub products: Vec<ProductRow>,
    /// Ascending by date.
    pub daily_series: Vec<DailyPoint>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}

/// Minimal response for a window with no orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmptyReport {
    pub kpis: KpiSummary,
}

/// What one computation produced: a populated report, or the explicit
/// no-orders outcome. Neither is an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReportOutcome {
    Report(ProfitReport),
    Empty(EmptyReport),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Assemble the response from an enriched aggregation.
pub fn assemble_report(
    aggregation: &OrderAggregation,
    estimator: &dyn PriorPeriodEstimator,
    style: &CurrencyStyle,
    period_label: String,
    default_tax_percent: Percent,
    warnings: Vec<String>,
) -> ProfitReport {
    let mut revenue_total = Decimal::ZERO;
    let mut profit_total = Decimal::ZERO;
    let mut ad_spend_total = Decimal::ZERO;
    let mut units_total: u64 = 0;
    let mut critical_alert_count: u64 = 0;

    let mut products: Vec<ProductRow> = Vec::with_capacity(aggregation.products.len());

    for aggregate in aggregation.products.values() {
        let metrics = product_metrics(aggregate, estimator);

        revenue_total += aggregate.revenue;
        ad_spend_total += aggregate.ad_cost_total;
        units_total += aggregate.units_sold;
        if !aggregate.has_unset_cost {
            profit_total += aggregate.margin_total - aggregate.ad_cost_total;
        }
        if metrics.is_critical {
            critical_alert_count += 1;
        }

        products.push(ProductRow {
            product_id: aggregate.product_id.clone(),
            title: aggregate.title.clone(),
            units_sold: aggregate.units_sold,
            revenue: aggregate.revenue,
            revenue_display: style.format(aggregate.revenue),
            avg_unit_price: metrics.avg_unit_price,
            unit_cost: aggregate.unit_cost,
            has_unset_cost: aggregate.has_unset_cost,
            shipping_cost_total: aggregate.shipping_cost_total,
            commission_total: aggregate.commission_total,
            tax_cost_total: aggregate.tax_cost_total,
            ad_cost_total: aggregate.ad_cost_total,
            margin_per_unit: aggregate.margin_per_unit(),
            net_margin_per_unit: metrics.net_margin_per_unit,
            net_margin_per_unit_display: style.format(metrics.net_margin_per_unit),
            units_sold_previous_period: metrics.prior_units_sold,
            margin_per_unit_previous_period: metrics.prior_margin_per_unit,
            units_trend_percent: metrics.units_trend_percent,
            margin_trend_percent: metrics.margin_trend_percent,
            status: metrics.status,
            max_discount_percent: metrics.max_discount_percent,
            max_discount_for_chart: metrics.max_discount_for_chart,
            is_critical: metrics.is_critical,
        });
    }

    // Highest-grossing rows first; ties stay in id order.
    products.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });

    let daily_series: Vec<DailyPoint> = aggregation
        .daily
        .iter()
        .map(|(date, bucket)| DailyPoint {
            date: *date,
            revenue_total: bucket.revenue_total,
            profit_total: bucket.profit_total,
        })
        .collect();

    ProfitReport {
        kpis: KpiSummary {
            revenue_total,
            revenue_total_display: style.format(revenue_total),
            profit_total,
            profit_total_display: style.format(profit_total),
            ad_spend_total,
            ad_spend_total_display: style.format(ad_spend_total),
            units_total,
            critical_alert_count,
            period_label,
            default_tax_percent,
        },
        products,
        daily_series,
        warnings,
    }
}

/// Zeroed KPI block for a window with no orders.
pub fn empty_report(
    style: &CurrencyStyle,
    period_label: String,
    default_tax_percent: Percent,
) -> EmptyReport {
    let zero = style.format(Decimal::ZERO);
    EmptyReport {
        kpis: KpiSummary {
            revenue_total: Decimal::ZERO,
            revenue_total_display: zero.clone(),
            profit_total: Decimal::ZERO,
            profit_total_display: zero.clone(),
            ad_spend_total: Decimal::ZERO,
            ad_spend_total_display: zero,
            units_total: 0,
            critical_alert_count: 0,
            period_label,
            default_tax_percent,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
