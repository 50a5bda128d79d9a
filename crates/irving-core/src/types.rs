use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Shared aliases
// ---------------------------------------------------------------------------

/// Monetary amount in the seller's marketplace currency.
pub type Money = Decimal;

/// Dimensionless rate, e.g. 0.16 for a 16% commission.
pub type Rate = Decimal;

/// Percentage expressed on the 0..100 scale, e.g. 4.0 for 4%.
pub type Percent = Decimal;

/// Marketplace listing identifier, e.g. "MLB123".
pub type ProductId = String;

/// Marketplace seller identifier.
pub type SellerId = String;

/// Opaque bearer token for marketplace calls.
pub type AccessToken = String;

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// One product line within a paid order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u64,
    /// Price the buyer paid for one unit.
    pub unit_price: Money,
    /// Per-unit commission reported by the marketplace, when present.
    /// Absent means the marketplace did not report one, not zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_commission: Option<Money>,
}

/// A paid order as returned by the marketplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub created_at: DateTime<Utc>,
    /// ISO country code of the shipping destination.
    pub destination_country: String,
    pub line_items: Vec<LineItem>,
}

// ---------------------------------------------------------------------------
// Cost configuration
// ---------------------------------------------------------------------------

/// Seller-maintained cost settings: per-product unit costs and the tax
/// percentage applied to every sale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostConfig {
    /// Unit cost per product. A product absent from this map has an unset
    /// cost, which is different from a configured cost of zero.
    #[serde(default)]
    pub unit_costs: HashMap<ProductId, Money>,
    /// Tax percentage on the 0..100 scale applied to the sale price.
    #[serde(default)]
    pub default_tax_percent: Percent,
}

impl CostConfig {
    /// Configured unit cost for a product, or `None` when the seller has not
    /// set one.
    pub fn unit_cost(&self, product_id: &str) -> Option<Money> {
        self.unit_costs.get(product_id).copied()
    }
}

// ---------------------------------------------------------------------------
// Reporting window
// ---------------------------------------------------------------------------

/// Half-open UTC interval `[start, end)` a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window covering the `days` days ending now.
    pub fn last_days(days: u32) -> Self {
        let end = Utc::now();
        let start = end - Duration::days(i64::from(days));
        Self { start, end }
    }

    /// Number of whole days spanned by the window, rounded up.
    pub fn span_days(&self) -> i64 {
        let seconds = (self.end - self.start).num_seconds();
        (seconds + 86_399) / 86_400
    }

    /// Human-readable period label, e.g. "Last 30 days".
    pub fn label(&self) -> String {
        let days = self.span_days();
        if days > 0 {
            format!("Last {} days", days)
        } else {
            format!(
                "{} to {}",
                self.start.format("%Y-%m-%d"),
                self.end.format("%Y-%m-%d")
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Token pair held on behalf of a connected seller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerCredentials {
    pub access_token: AccessToken,
    pub refresh_token: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
