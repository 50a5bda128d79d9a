use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use irving_core::engine::{EngineSources, ProfitabilityEngine};
use irving_core::memory::{
    StaticAdInsights, StaticCostConfig, StaticCredentials, StaticOrders, StaticRefresher,
};
use irving_core::types::{CostConfig, Order, ReportWindow, SellerCredentials};
use irving_meli::{MeliClient, MeliConfig};

use crate::input;

/// Arguments for an offline report computed from fixture files
#[derive(Args)]
pub struct ReportArgs {
    /// Path to a JSON array of paid orders
    #[arg(long)]
    pub orders: String,

    /// Path to a JSON cost configuration (unit_costs map and default_tax_percent)
    #[arg(long)]
    pub cost_config: Option<String>,

    /// Path to a JSON object mapping product ids to advertising spend
    #[arg(long)]
    pub ad_spend: Option<String>,

    /// Override the tax percentage from the cost configuration
    #[arg(long)]
    pub tax_percent: Option<Decimal>,

    /// Seller identifier stamped on the run
    #[arg(long, default_value = "local")]
    pub seller_id: String,

    /// Report the last N days ending now instead of the span of the fixture
    #[arg(long)]
    pub period_days: Option<u32>,
}

/// Arguments for a report against the live marketplace API
#[derive(Args)]
pub struct LiveArgs {
    /// Marketplace seller id
    #[arg(long)]
    pub seller_id: String,

    /// Path to a JSON file holding the seller's access_token and refresh_token
    #[arg(long)]
    pub credentials: String,

    /// Marketplace application id (falls back to MELI_APP_ID)
    #[arg(long)]
    pub app_id: Option<String>,

    /// Marketplace application secret (falls back to MELI_SECRET_KEY)
    #[arg(long)]
    pub secret_key: Option<String>,

    /// Path to a JSON cost configuration
    #[arg(long)]
    pub cost_config: Option<String>,

    /// Days of history to report
    #[arg(long, default_value = "30")]
    pub period_days: u32,

    /// Override the marketplace API base URL
    #[arg(long)]
    pub base_url: Option<String>,
}

pub fn run_report(args: ReportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let orders: Vec<Order> = input::file::read_json(&args.orders)?;

    let mut config: CostConfig = match &args.cost_config {
        Some(path) => input::file::read_json(path)?,
        None => CostConfig::default(),
    };
    if let Some(tax) = args.tax_percent {
        config.default_tax_percent = tax;
    }

    let ad_spend: HashMap<String, Decimal> = match &args.ad_spend {
        Some(path) => input::file::read_json(path)?,
        None => HashMap::new(),
    };

    let window = match args.period_days {
        Some(0) => return Err("--period-days must be at least 1".into()),
        Some(days) => ReportWindow::last_days(days),
        None => fixture_window(&orders).unwrap_or_else(|| ReportWindow::last_days(30)),
    };

    // The fixture run goes through the same engine as a live run; only the
    // collaborators are swapped for in-memory ones fed from the files.
    let engine = ProfitabilityEngine::new(EngineSources {
        orders: Arc::new(StaticOrders::new(orders)),
        ads: Arc::new(StaticAdInsights::new(ad_spend)),
        cost_config: Arc::new(StaticCostConfig::new(config)),
        credentials: Arc::new(StaticCredentials::default().with(
            &args.seller_id,
            "local-token",
            "local-refresh",
        )),
        refresher: Arc::new(StaticRefresher::new("local-token")),
    });

    let runtime = tokio::runtime::Runtime::new()?;
    let outcome = runtime.block_on(engine.compute_for_window(&args.seller_id, window))?;
    Ok(serde_json::to_value(outcome)?)
}

pub fn run_live(args: LiveArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let app_id = flag_or_env(args.app_id, "MELI_APP_ID", "--app-id")?;
    let secret_key = flag_or_env(args.secret_key, "MELI_SECRET_KEY", "--secret-key")?;

    let credentials: SellerCredentials = input::file::read_json(&args.credentials)?;

    let config: CostConfig = match &args.cost_config {
        Some(path) => input::file::read_json(path)?,
        None => CostConfig::default(),
    };

    let mut meli_config = MeliConfig::new(&app_id, &secret_key);
    if let Some(base) = &args.base_url {
        meli_config = meli_config.with_base_url(base);
    }
    let client = Arc::new(MeliClient::new(meli_config)?);

    // One client serves as order source, ad insights source and token
    // refresher; costs and credentials come from local files.
    let engine = ProfitabilityEngine::new(EngineSources {
        orders: client.clone(),
        ads: client.clone(),
        cost_config: Arc::new(StaticCostConfig::new(config)),
        credentials: Arc::new(StaticCredentials::default().with(
            &args.seller_id,
            &credentials.access_token,
            &credentials.refresh_token,
        )),
        refresher: client,
    });

    let runtime = tokio::runtime::Runtime::new()?;
    let outcome = runtime.block_on(
        engine.compute_profitability_report(&args.seller_id, args.period_days),
    )?;
    Ok(serde_json::to_value(outcome)?)
}

/// Tight window around the fixture: midnight of the earliest order day to
/// midnight after the latest. Every order lands inside and the same fixture
/// always yields the same report.
fn fixture_window(orders: &[Order]) -> Option<ReportWindow> {
    let earliest = orders.iter().map(|o| o.created_at).min()?;
    let latest = orders.iter().map(|o| o.created_at).max()?;

    let start = midnight(earliest);
    let end = midnight(latest) + Duration::days(1);
    Some(ReportWindow::new(start, end))
}

fn midnight(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn flag_or_env(
    flag: Option<String>,
    var: &str,
    flag_name: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(value) = flag {
        return Ok(value);
    }
    std::env::var(var)
        .map_err(|_| format!("{} is required (flag or {} env var)", flag_name, var).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn order_at(day: u32, hour: u32) -> Order {
        Order {
            order_id: format!("O{}-{}", day, hour),
            created_at: Utc.with_ymd_and_hms(2024, 3, day, hour, 30, 0).unwrap(),
            destination_country: "BR".to_string(),
            line_items: Vec::new(),
        }
    }

    #[test]
    fn test_fixture_window_spans_whole_days() {
        let orders = vec![order_at(5, 9), order_at(12, 23), order_at(8, 0)];

        let window = fixture_window(&orders).unwrap();

        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 3, 13, 0, 0, 0).unwrap());
        // All three orders fall inside the half-open window.
        assert!(orders
            .iter()
            .all(|o| o.created_at >= window.start && o.created_at < window.end));
    }

    #[test]
    fn test_single_order_fixture_covers_one_day() {
        let orders = vec![order_at(5, 12)];

        let window = fixture_window(&orders).unwrap();

        assert_eq!(window.span_days(), 1);
        assert_eq!(window.label(), "Last 1 days");
    }

    #[test]
    fn test_empty_fixture_has_no_window() {
        assert!(fixture_window(&[]).is_none());
    }
}
