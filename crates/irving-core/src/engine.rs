use std::sync::Arc;

use crate::ads::enrich_ad_costs;
use crate::aggregate::aggregate_orders;
use crate::cost_model::CostModelParams;
use crate::error::{IrvingError, SourceError};
use crate::metrics::{PriorPeriodEstimator, ScaledEstimate};
use crate::report::{assemble_report, empty_report, CurrencyStyle, ReportOutcome};
use crate::sources::{
    AdInsightsSource, CostConfigStore, CredentialStore, OrderSource, TokenRefresher,
};
use crate::types::{AccessToken, CostConfig, Order, ReportWindow, SellerCredentials};
use crate::IrvingResult;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Collaborator handles one engine instance works with. Constructed once at
/// startup and shared across computations; the engine holds no other state.
pub struct EngineSources {
    pub orders: Arc<dyn OrderSource>,
    pub ads: Arc<dyn AdInsightsSource>,
    pub cost_config: Arc<dyn CostConfigStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub refresher: Arc<dyn TokenRefresher>,
}

/// Orchestrates one profitability computation end to end: credentials,
/// orders (with one token refresh-retry), cost config, aggregation,
/// advertising enrichment, report assembly.
pub struct ProfitabilityEngine {
    sources: EngineSources,
    params: CostModelParams,
    estimator: Box<dyn PriorPeriodEstimator>,
    currency: CurrencyStyle,
}

impl ProfitabilityEngine {
    pub fn new(sources: EngineSources) -> Self {
        Self {
            sources,
            params: CostModelParams::default(),
            estimator: Box::new(ScaledEstimate::default()),
            currency: CurrencyStyle::default(),
        }
    }

    pub fn with_params(mut self, params: CostModelParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_estimator(mut self, estimator: Box<dyn PriorPeriodEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_currency(mut self, currency: CurrencyStyle) -> Self {
        self.currency = currency;
        self
    }

    /// Compute the report for the `period_days` days ending now.
    pub async fn compute_profitability_report(
        &self,
        seller_id: &str,
        period_days: u32,
    ) -> IrvingResult<ReportOutcome> {
        if period_days == 0 {
            return Err(IrvingError::InvalidInput {
                field: "period_days".to_string(),
                reason: "Reporting period must cover at least one day.".to_string(),
            });
        }
        self.compute_for_window(seller_id, ReportWindow::last_days(period_days))
            .await
    }

    /// Window-explicit variant. Identical inputs produce an identical
    /// report, so pinning the window makes a computation reproducible.
    pub async fn compute_for_window(
        &self,
        seller_id: &str,
        window: ReportWindow,
    ) -> IrvingResult<ReportOutcome> {
        let credentials = self
            .sources
            .credentials
            .get_credentials(seller_id)
            .await
            .map_err(|err| upstream("credential store", &err))?
            .ok_or_else(|| IrvingError::Auth {
                reason: format!("No marketplace connection for seller {}", seller_id),
            })?;

        let (orders, access_token) = self
            .fetch_orders_with_refresh(seller_id, &credentials, window)
            .await?;

        // Absent or unreachable config never sinks the computation; missing
        // costs surface per product as "cost missing" instead.
        let config = match self.sources.cost_config.get_cost_config(seller_id).await {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(seller_id, error = %err, "Cost config unavailable; using defaults");
                CostConfig::default()
            }
        };

        let period_label = window.label();
        let Some(mut aggregation) = aggregate_orders(&orders, &config, &self.params) else {
            tracing::debug!(seller_id, "No orders in window");
            return Ok(ReportOutcome::Empty(empty_report(
                &self.currency,
                period_label,
                config.default_tax_percent,
            )));
        };

        let warnings = enrich_ad_costs(
            self.sources.ads.as_ref(),
            &access_token,
            window,
            &mut aggregation,
        )
        .await;

        Ok(ReportOutcome::Report(assemble_report(
            &aggregation,
            self.estimator.as_ref(),
            &self.currency,
            period_label,
            config.default_tax_percent,
            warnings,
        )))
    }

    /// Fetch orders, refreshing the token at most once. The first fetch
    /// doubles as the token probe; only `TokenExpired` triggers the refresh.
    /// Returns the orders together with whichever token ended up working,
    /// so later marketplace calls reuse it.
    async fn fetch_orders_with_refresh(
        &self,
        seller_id: &str,
        credentials: &SellerCredentials,
        window: ReportWindow,
    ) -> IrvingResult<(Vec<Order>, AccessToken)> {
        let first = self
            .sources
            .orders
            .fetch_orders(seller_id, &credentials.access_token, window)
            .await;

        match first {
            Ok(orders) => Ok((orders, credentials.access_token.clone())),
            Err(SourceError::TokenExpired) => {
                tracing::info!(seller_id, "Access token expired; refreshing");
                let fresh = self
                    .sources
                    .refresher
                    .refresh_token(seller_id, &credentials.refresh_token)
                    .await
                    .map_err(|err| IrvingError::Auth {
                        reason: format!("Token refresh failed: {}", err),
                    })?;

                match self
                    .sources
                    .orders
                    .fetch_orders(seller_id, &fresh, window)
                    .await
                {
                    Ok(orders) => Ok((orders, fresh)),
                    Err(SourceError::TokenExpired) | Err(SourceError::Auth(_)) => {
                        Err(IrvingError::Auth {
                            reason: "Marketplace rejected the refreshed token.".to_string(),
                        })
                    }
                    Err(err @ SourceError::Unavailable(_)) => {
                        Err(upstream("marketplace orders", &err))
                    }
                }
            }
            Err(SourceError::Auth(reason)) => Err(IrvingError::Auth { reason }),
            Err(err @ SourceError::Unavailable(_)) => Err(upstream("marketplace orders", &err)),
        }
    }
}

fn upstream(service: &str, err: &SourceError) -> IrvingError {
    IrvingError::Upstream {
        service: service.to_string(),
        message: err.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
