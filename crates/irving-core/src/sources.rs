use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::types::{
    AccessToken, CostConfig, Money, Order, ProductId, ReportWindow, SellerCredentials,
};

// ---------------------------------------------------------------------------
// External collaborators
// ---------------------------------------------------------------------------
//
// The engine never talks to the marketplace or any store directly. Everything
// it needs arrives through these traits, so a computation can run against the
// real API, a cache, or in-memory fixtures without changing the engine.

/// Supplies paid orders for a seller within a window.
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Fetch every paid order created inside `window`.
    ///
    /// Fails with [`SourceError::TokenExpired`] when the access token is
    /// stale, which tells the engine to refresh once and retry.
    async fn fetch_orders(
        &self,
        seller_id: &str,
        access_token: &str,
        window: ReportWindow,
    ) -> Result<Vec<Order>, SourceError>;
}

/// Supplies advertising spend per product for a window.
#[async_trait]
pub trait AdInsightsSource: Send + Sync {
    /// Spend per product id. Callers batch the ids; one call never exceeds
    /// the upstream batch limit.
    async fn fetch_ad_spend(
        &self,
        item_ids: &[ProductId],
        access_token: &str,
        window: ReportWindow,
    ) -> Result<HashMap<ProductId, Money>, SourceError>;
}

/// Read-only access to the seller's cost and tax configuration.
#[async_trait]
pub trait CostConfigStore: Send + Sync {
    async fn get_cost_config(&self, seller_id: &str) -> Result<CostConfig, SourceError>;
}

/// Holds the token pair for each connected seller.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` means the seller never connected their account.
    async fn get_credentials(
        &self,
        seller_id: &str,
    ) -> Result<Option<SellerCredentials>, SourceError>;
}

/// Exchanges a refresh token for a fresh access token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh_token(
        &self,
        seller_id: &str,
        refresh_token: &str,
    ) -> Result<AccessToken, SourceError>;
}
