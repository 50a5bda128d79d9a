use std::collections::HashMap;

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use irving_core::error::SourceError;
use irving_core::sources::{AdInsightsSource, OrderSource, TokenRefresher};
use irving_core::types::{AccessToken, Money, Order, ProductId, ReportWindow};

use crate::config::MeliConfig;
use crate::dto::{AdMetricsResponse, OrderDto, OrderSearchResponse, TokenResponse};

/// Order search page size.
const PAGE_SIZE: u64 = 50;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Thin client over the Mercado Libre REST API. Implements the engine's
/// order, ad-insights and token-refresh collaborators; one instance is
/// shared across computations.
pub struct MeliClient {
    http: reqwest::Client,
    config: MeliConfig,
}

impl MeliClient {
    pub fn new(config: MeliConfig) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        access_token: &str,
    ) -> Result<T, SourceError> {
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(transport_error)?;
            return Err(data_status_error(status, &body));
        }
        response.json().await.map_err(transport_error)
    }
}

// ---------------------------------------------------------------------------
// Collaborator implementations
// ---------------------------------------------------------------------------

#[async_trait]
impl OrderSource for MeliClient {
    async fn fetch_orders(
        &self,
        seller_id: &str,
        access_token: &str,
        window: ReportWindow,
    ) -> Result<Vec<Order>, SourceError> {
        let (from, to) = window_bounds(window);
        let mut orders = Vec::new();
        let mut offset: u64 = 0;

        loop {
            let query = [
                ("seller", seller_id.to_string()),
                ("order.status", "paid".to_string()),
                ("order.date_created.from", from.clone()),
                ("order.date_created.to", to.clone()),
                ("limit", PAGE_SIZE.to_string()),
                ("offset", offset.to_string()),
            ];
            let page: OrderSearchResponse =
                self.get_json("/orders/search", &query, access_token).await?;

            let fetched = page.results.len() as u64;
            orders.extend(page.results.into_iter().map(OrderDto::into_order));
            offset += fetched;

            // Stop on a short page too, in case paging.total overshoots.
            if fetched == 0 || offset >= page.paging.total {
                break;
            }
        }

        tracing::debug!(seller_id, count = orders.len(), "Fetched paid orders");
        Ok(orders)
    }
}

#[async_trait]
impl AdInsightsSource for MeliClient {
    async fn fetch_ad_spend(
        &self,
        item_ids: &[ProductId],
        access_token: &str,
        window: ReportWindow,
    ) -> Result<HashMap<ProductId, Money>, SourceError> {
        let query = [
            ("item_ids", item_ids.join(",")),
            ("date_from", window.start.format("%Y-%m-%d").to_string()),
            ("date_to", window.end.format("%Y-%m-%d").to_string()),
        ];
        let metrics: AdMetricsResponse = self
            .get_json("/advertising/product_ads/metrics", &query, access_token)
            .await?;

        Ok(metrics
            .results
            .into_iter()
            .map(|m| (m.item_id, m.total_spend))
            .collect())
    }
}

#[async_trait]
impl TokenRefresher for MeliClient {
    async fn refresh_token(
        &self,
        seller_id: &str,
        refresh_token: &str,
    ) -> Result<AccessToken, SourceError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.config.app_id.as_str()),
            ("client_secret", self.config.secret_key.as_str()),
            ("refresh_token", refresh_token),
        ];
        let response = self
            .http
            .post(self.url("/oauth/token"))
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(transport_error)?;
            return Err(refresh_status_error(status, &body));
        }

        let token: TokenResponse = response.json().await.map_err(transport_error)?;
        tracing::info!(seller_id, "Obtained a fresh marketplace access token");
        Ok(token.access_token)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Data-endpoint statuses in the terms the engine understands: 401 means the
/// token aged out and one refresh is worth trying, 403 is a hard rejection.
fn data_status_error(status: StatusCode, body: &str) -> SourceError {
    match status {
        StatusCode::UNAUTHORIZED => SourceError::TokenExpired,
        StatusCode::FORBIDDEN => SourceError::Auth(format!("access denied: {}", snippet(body))),
        _ => SourceError::Unavailable(format!("HTTP {}: {}", status.as_u16(), snippet(body))),
    }
}

/// The token endpoint never warrants a retry: any 4xx means the refresh
/// token itself is no longer good.
fn refresh_status_error(status: StatusCode, body: &str) -> SourceError {
    if status.is_client_error() {
        SourceError::Auth(format!(
            "refresh rejected (HTTP {}): {}",
            status.as_u16(),
            snippet(body)
        ))
    } else {
        SourceError::Unavailable(format!("HTTP {}: {}", status.as_u16(), snippet(body)))
    }
}

fn transport_error(err: reqwest::Error) -> SourceError {
    SourceError::Unavailable(err.to_string())
}

/// Leading part of an error body, enough to log without dumping whole pages.
fn snippet(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    if body.chars().count() <= MAX_CHARS {
        body.to_string()
    } else {
        let head: String = body.chars().take(MAX_CHARS).collect();
        format!("{}...", head)
    }
}

fn window_bounds(window: ReportWindow) -> (String, String) {
    (
        window.start.to_rfc3339_opts(SecondsFormat::Millis, true),
        window.end.to_rfc3339_opts(SecondsFormat::Millis, true),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
