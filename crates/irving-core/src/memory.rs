//! In-memory collaborator implementations, used by tests and offline runs
//! against fixture data.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::SourceError;
use crate::sources::{
    AdInsightsSource, CostConfigStore, CredentialStore, OrderSource, TokenRefresher,
};
use crate::types::{
    AccessToken, CostConfig, Money, Order, ProductId, ReportWindow, SellerCredentials,
};

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// [`OrderSource`] backed by a fixed list of orders, filtered by window.
pub struct StaticOrders {
    orders: Vec<Order>,
    /// When set, any other access token fails with `TokenExpired`.
    required_token: Option<String>,
    fail_message: Option<String>,
    calls: AtomicUsize,
}

impl StaticOrders {
    pub fn new(orders: Vec<Order>) -> Self {
        Self {
            orders,
            required_token: None,
            fail_message: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Serve orders only to `token`; every other token reads as expired.
    pub fn requiring_token(orders: Vec<Order>, token: &str) -> Self {
        Self {
            required_token: Some(token.to_string()),
            ..Self::new(orders)
        }
    }

    /// Always fails with `Unavailable`.
    pub fn unavailable(message: &str) -> Self {
        Self {
            fail_message: Some(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    /// Number of fetch attempts, including rejected ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderSource for StaticOrders {
    async fn fetch_orders(
        &self,
        _seller_id: &str,
        access_token: &str,
        window: ReportWindow,
    ) -> Result<Vec<Order>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.fail_message {
            return Err(SourceError::Unavailable(message.clone()));
        }
        if let Some(required) = &self.required_token {
            if access_token != required {
                return Err(SourceError::TokenExpired);
            }
        }

        Ok(self
            .orders
            .iter()
            .filter(|o| o.created_at >= window.start && o.created_at < window.end)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Ad insights
// ---------------------------------------------------------------------------

/// [`AdInsightsSource`] backed by a spend map. A batch containing any id in
/// `failing_ids` fails as a whole, which is how a dead upstream shard looks.
pub struct StaticAdInsights {
    spend: HashMap<ProductId, Money>,
    failing_ids: HashSet<ProductId>,
    calls: AtomicUsize,
}

impl StaticAdInsights {
    pub fn new(spend: HashMap<ProductId, Money>) -> Self {
        Self {
            spend,
            failing_ids: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_failing_ids<I: IntoIterator<Item = ProductId>>(mut self, ids: I) -> Self {
        self.failing_ids.extend(ids);
        self
    }

    /// Number of batch calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdInsightsSource for StaticAdInsights {
    async fn fetch_ad_spend(
        &self,
        item_ids: &[ProductId],
        _access_token: &str,
        _window: ReportWindow,
    ) -> Result<HashMap<ProductId, Money>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if item_ids.iter().any(|id| self.failing_ids.contains(id)) {
            return Err(SourceError::Unavailable("insights shard offline".into()));
        }

        Ok(item_ids
            .iter()
            .filter_map(|id| self.spend.get(id).map(|s| (id.clone(), *s)))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Cost config
// ---------------------------------------------------------------------------

/// [`CostConfigStore`] returning one fixed config for every seller.
pub struct StaticCostConfig {
    config: CostConfig,
    fail_message: Option<String>,
}

impl StaticCostConfig {
    pub fn new(config: CostConfig) -> Self {
        Self {
            config,
            fail_message: None,
        }
    }

    /// Always fails with `Unavailable`.
    pub fn failing(message: &str) -> Self {
        Self {
            config: CostConfig::default(),
            fail_message: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl CostConfigStore for StaticCostConfig {
    async fn get_cost_config(&self, _seller_id: &str) -> Result<CostConfig, SourceError> {
        match &self.fail_message {
            Some(message) => Err(SourceError::Unavailable(message.clone())),
            None => Ok(self.config.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// [`CredentialStore`] backed by a seller-to-credentials map.
#[derive(Default)]
pub struct StaticCredentials {
    credentials: HashMap<String, SellerCredentials>,
    fail_message: Option<String>,
}

impl StaticCredentials {
    pub fn with(mut self, seller_id: &str, access_token: &str, refresh_token: &str) -> Self {
        self.credentials.insert(
            seller_id.to_string(),
            SellerCredentials {
                access_token: access_token.to_string(),
                refresh_token: refresh_token.to_string(),
            },
        );
        self
    }

    /// Always fails with `Unavailable`.
    pub fn failing(message: &str) -> Self {
        Self {
            credentials: HashMap::new(),
            fail_message: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl CredentialStore for StaticCredentials {
    async fn get_credentials(
        &self,
        seller_id: &str,
    ) -> Result<Option<SellerCredentials>, SourceError> {
        if let Some(message) = &self.fail_message {
            return Err(SourceError::Unavailable(message.clone()));
        }
        Ok(self.credentials.get(seller_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// Token refresh
// ---------------------------------------------------------------------------

/// [`TokenRefresher`] handing out one fixed replacement token.
pub struct StaticRefresher {
    new_token: Option<AccessToken>,
    calls: AtomicUsize,
}

impl StaticRefresher {
    pub fn new(new_token: &str) -> Self {
        Self {
            new_token: Some(new_token.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always rejects the refresh.
    pub fn failing() -> Self {
        Self {
            new_token: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of refresh attempts.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRefresher for StaticRefresher {
    async fn refresh_token(
        &self,
        _seller_id: &str,
        _refresh_token: &str,
    ) -> Result<AccessToken, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.new_token {
            Some(token) => Ok(token.clone()),
            None => Err(SourceError::Auth("refresh token rejected".into())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
