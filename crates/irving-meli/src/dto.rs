//! Wire shapes of the Mercado Libre endpoints the client consumes, plus the
//! mapping into the engine's order model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use irving_core::types::{LineItem, Order};

/// Country assumed when an order carries no shipping address block.
const DEFAULT_COUNTRY: &str = "BR";

// ---------------------------------------------------------------------------
// Order search
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct OrderSearchResponse {
    #[serde(default)]
    pub results: Vec<OrderDto>,
    pub paging: PagingDto,
}

#[derive(Debug, Deserialize)]
pub struct PagingDto {
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Deserialize)]
pub struct OrderDto {
    pub id: u64,
    pub date_created: DateTime<Utc>,
    #[serde(default)]
    pub order_items: Vec<OrderItemDto>,
    #[serde(default)]
    pub shipping: Option<ShippingDto>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemDto {
    pub item: ItemDto,
    pub quantity: u64,
    pub unit_price: Decimal,
    /// Commission charged per unit, when the marketplace discloses it.
    #[serde(default)]
    pub sale_fee: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct ItemDto {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ShippingDto {
    #[serde(default)]
    pub receiver_address: Option<ReceiverAddressDto>,
}

#[derive(Debug, Deserialize)]
pub struct ReceiverAddressDto {
    #[serde(default)]
    pub country: Option<CountryDto>,
}

#[derive(Debug, Deserialize)]
pub struct CountryDto {
    pub id: String,
}

impl OrderDto {
    /// Destination country from the shipping address, defaulting to
    /// [`DEFAULT_COUNTRY`] when the block is missing.
    pub fn destination_country(&self) -> String {
        self.shipping
            .as_ref()
            .and_then(|s| s.receiver_address.as_ref())
            .and_then(|a| a.country.as_ref())
            .map(|c| c.id.clone())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string())
    }

    pub fn into_order(self) -> Order {
        let destination_country = self.destination_country();
        Order {
            order_id: self.id.to_string(),
            created_at: self.date_created,
            destination_country,
            line_items: self
                .order_items
                .into_iter()
                .map(|oi| LineItem {
                    product_id: oi.item.id,
                    title: oi.item.title,
                    quantity: oi.quantity,
                    unit_price: oi.unit_price,
                    reported_commission: oi.sale_fee,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Advertising metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AdMetricsResponse {
    #[serde(default)]
    pub results: Vec<AdMetricDto>,
}

#[derive(Debug, Deserialize)]
pub struct AdMetricDto {
    pub item_id: String,
    #[serde(default)]
    pub total_spend: Decimal,
}

// ---------------------------------------------------------------------------
// OAuth token endpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parses_a_realistic_order_page() {
        let json = r#"{
            "results": [{
                "id": 2000003508419013,
                "date_created": "2024-03-10T14:02:51.000Z",
                "order_items": [{
                    "item": {"id": "MLB123", "title": "Capa de celular"},
                    "quantity": 2,
                    "unit_price": 100.0,
                    "sale_fee": 16.0
                }],
                "shipping": {
                    "receiver_address": {
                        "country": {"id": "AR"}
                    }
                }
            }],
            "paging": {"total": 1, "offset": 0, "limit": 50}
        }"#;

        let page: OrderSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(page.paging.total, 1);

        let order = page.results.into_iter().next().unwrap().into_order();
        assert_eq!(order.order_id, "2000003508419013");
        assert_eq!(order.destination_country, "AR");
        assert_eq!(order.line_items.len(), 1);

        let item = &order.line_items[0];
        assert_eq!(item.product_id, "MLB123");
        assert_eq!(item.title, "Capa de celular");
        assert_eq!(item.quantity, 2);
        assert_eq!(item.unit_price, dec!(100));
        assert_eq!(item.reported_commission, Some(dec!(16)));
    }

    #[test]
    fn test_missing_address_defaults_to_brazil() {
        let json = r#"{
            "id": 1,
            "date_created": "2024-03-10T14:02:51.000Z",
            "order_items": []
        }"#;

        let order: OrderDto = serde_json::from_str(json).unwrap();
        assert_eq!(order.destination_country(), "BR");
    }

    #[test]
    fn test_absent_sale_fee_stays_unset() {
        let json = r#"{
            "item": {"id": "MLB1"},
            "quantity": 1,
            "unit_price": 59.9
        }"#;

        let item: OrderItemDto = serde_json::from_str(json).unwrap();
        assert_eq!(item.sale_fee, None);
        assert_eq!(item.unit_price, dec!(59.9));
        // Title omitted entirely by some endpoints.
        assert_eq!(item.item.title, "");
    }

    #[test]
    fn test_ad_metric_spend_defaults_to_zero() {
        let json = r#"{"results": [{"item_id": "MLB1"}, {"item_id": "MLB2", "total_spend": 12.5}]}"#;

        let metrics: AdMetricsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(metrics.results[0].total_spend, dec!(0));
        assert_eq!(metrics.results[1].total_spend, dec!(12.5));
    }

    #[test]
    fn test_token_response_tolerates_missing_refresh_token() {
        let json = r#"{"access_token": "APP_USR-abc", "token_type": "Bearer", "expires_in": 21600}"#;

        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "APP_USR-abc");
        assert_eq!(token.refresh_token, None);
    }
}
