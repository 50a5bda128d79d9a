use std::collections::HashMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

use irving_core::engine::{EngineSources, ProfitabilityEngine};
use irving_core::memory::{
    StaticAdInsights, StaticCostConfig, StaticCredentials, StaticOrders, StaticRefresher,
};
use irving_core::metrics::ProductStatus;
use irving_core::report::{ProfitReport, ReportOutcome};
use irving_core::types::{CostConfig, LineItem, Money, Order, ReportWindow};
use irving_core::IrvingError;

// ===========================================================================
// Fixtures
// ===========================================================================

fn item(product_id: &str, quantity: u64, unit_price: Money) -> LineItem {
    LineItem {
        product_id: product_id.to_string(),
        title: format!("{} title", product_id),
        quantity,
        unit_price,
        reported_commission: None,
    }
}

fn order(order_id: &str, day: u32, country: &str, items: Vec<LineItem>) -> Order {
    Order {
        order_id: order_id.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
        destination_country: country.to_string(),
        line_items: items,
    }
}

fn march() -> ReportWindow {
    ReportWindow::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap(),
    )
}

fn sku1_config() -> CostConfig {
    let mut config = CostConfig {
        default_tax_percent: dec!(6),
        ..CostConfig::default()
    };
    config.unit_costs.insert("SKU1".to_string(), dec!(40));
    config
}

struct Fixture {
    orders: Arc<StaticOrders>,
    ads: Arc<StaticAdInsights>,
    refresher: Arc<StaticRefresher>,
    engine: ProfitabilityEngine,
}

fn fixture(orders: StaticOrders, ads: StaticAdInsights, config: StaticCostConfig) -> Fixture {
    fixture_with_refresher(orders, ads, config, StaticRefresher::new("fresh"))
}

fn fixture_with_refresher(
    orders: StaticOrders,
    ads: StaticAdInsights,
    config: StaticCostConfig,
    refresher: StaticRefresher,
) -> Fixture {
    let orders = Arc::new(orders);
    let ads = Arc::new(ads);
    let refresher = Arc::new(refresher);
    let engine = ProfitabilityEngine::new(EngineSources {
        orders: orders.clone(),
        ads: ads.clone(),
        cost_config: Arc::new(config),
        credentials: Arc::new(StaticCredentials::default().with("seller", "tok", "ref")),
        refresher: refresher.clone(),
    });
    Fixture {
        orders,
        ads,
        refresher,
        engine,
    }
}

fn expect_report(outcome: ReportOutcome) -> ProfitReport {
    match outcome {
        ReportOutcome::Report(report) => report,
        ReportOutcome::Empty(_) => panic!("expected a populated report"),
    }
}

// ===========================================================================
// End-to-end numbers
// ===========================================================================

#[tokio::test]
async fn test_reference_scenario_end_to_end() {
    // One order: SKU1 qty=2 at 100, destination BR, cost 40, tax 6%.
    // Per unit: shipping 18.50, commission 16, tax 6, margin 19.50.
    let f = fixture(
        StaticOrders::new(vec![order("O1", 10, "BR", vec![item("SKU1", 2, dec!(100))])]),
        StaticAdInsights::new(HashMap::new()),
        StaticCostConfig::new(sku1_config()),
    );

    let report = expect_report(f.engine.compute_for_window("seller", march()).await.unwrap());

    assert_eq!(report.products.len(), 1);
    let row = &report.products[0];
    assert_eq!(row.units_sold, 2);
    assert_eq!(row.revenue, dec!(200.00));
    assert_eq!(row.shipping_cost_total, dec!(37.00)); // 18.50 * 2
    assert_eq!(row.commission_total, dec!(32.00)); // 16 * 2
    assert_eq!(row.tax_cost_total, dec!(12.00)); // 6 * 2
    assert_eq!(row.margin_per_unit, dec!(19.50));
    assert_eq!(row.net_margin_per_unit, dec!(19.50)); // no ad spend
    assert_eq!(row.status, ProductStatus::Healthy);
    assert_eq!(row.max_discount_percent, dec!(19.5));

    assert_eq!(report.kpis.revenue_total, dec!(200.00));
    assert_eq!(report.kpis.profit_total, dec!(39.00));
    assert_eq!(report.kpis.units_total, 2);
    assert_eq!(report.kpis.critical_alert_count, 0);
    assert_eq!(report.kpis.period_label, "Last 30 days");
    assert_eq!(report.kpis.default_tax_percent, dec!(6));

    assert_eq!(report.daily_series.len(), 1);
    assert_eq!(report.daily_series[0].revenue_total, dec!(200.00));
    assert_eq!(report.daily_series[0].profit_total, dec!(39.00));
}

#[tokio::test]
async fn test_product_without_cost_entry_is_flagged_and_excluded_from_profit() {
    let f = fixture(
        StaticOrders::new(vec![order(
            "O1",
            10,
            "BR",
            vec![item("SKU1", 2, dec!(100)), item("SKU9", 1, dec!(100))],
        )]),
        StaticAdInsights::new(HashMap::new()),
        StaticCostConfig::new(sku1_config()),
    );

    let report = expect_report(f.engine.compute_for_window("seller", march()).await.unwrap());

    let sku9 = report
        .products
        .iter()
        .find(|r| r.product_id == "SKU9")
        .expect("SKU9 row");
    assert!(sku9.has_unset_cost);
    assert_eq!(sku9.status, ProductStatus::CostMissing);
    assert_eq!(sku9.unit_cost, None);

    // Revenue counts both products, profit only the costed one.
    assert_eq!(report.kpis.revenue_total, dec!(300.00));
    assert_eq!(report.kpis.profit_total, dec!(39.00));
    assert_eq!(report.kpis.critical_alert_count, 1);
}

#[tokio::test]
async fn test_ad_spend_reshapes_margin_and_status() {
    // SKU1 margin_total 39; spend 9 -> net 15/unit, profitable with ads.
    // SKU2: 1 unit at 30, cost 20: margin 30 - 20 - 18.50 - 4.80 - 1.80
    // = -15.10; spend 5 -> net -20.10, losing money while advertising.
    let mut config = sku1_config();
    config.unit_costs.insert("SKU2".to_string(), dec!(20));
    let mut spend = HashMap::new();
    spend.insert("SKU1".to_string(), dec!(9));
    spend.insert("SKU2".to_string(), dec!(5));

    let f = fixture(
        StaticOrders::new(vec![order(
            "O1",
            10,
            "BR",
            vec![item("SKU1", 2, dec!(100)), item("SKU2", 1, dec!(30))],
        )]),
        StaticAdInsights::new(spend),
        StaticCostConfig::new(config),
    );

    let report = expect_report(f.engine.compute_for_window("seller", march()).await.unwrap());

    let sku1 = report.products.iter().find(|r| r.product_id == "SKU1").unwrap();
    assert_eq!(sku1.ad_cost_total, dec!(9));
    assert_eq!(sku1.net_margin_per_unit, dec!(15.00));
    assert_eq!(sku1.status, ProductStatus::ScaleAdvertising);

    let sku2 = report.products.iter().find(|r| r.product_id == "SKU2").unwrap();
    assert_eq!(sku2.net_margin_per_unit, dec!(-20.10));
    assert_eq!(sku2.status, ProductStatus::PauseAdvertising);
    assert!(sku2.is_critical);

    // KPI profit nets ad spend: (39 - 9) + (-15.10 - 5) = 9.90
    assert_eq!(report.kpis.profit_total, dec!(9.90));
    assert_eq!(report.kpis.ad_spend_total, dec!(14));
    assert_eq!(report.kpis.critical_alert_count, 1);
}

// ===========================================================================
// Empty window
// ===========================================================================

#[tokio::test]
async fn test_empty_window_short_circuits_without_error() {
    let f = fixture(
        StaticOrders::new(Vec::new()),
        StaticAdInsights::new(HashMap::new()),
        StaticCostConfig::new(sku1_config()),
    );

    let outcome = f.engine.compute_for_window("seller", march()).await.unwrap();

    match outcome {
        ReportOutcome::Empty(empty) => {
            assert_eq!(empty.kpis.revenue_total, dec!(0));
            assert_eq!(empty.kpis.units_total, 0);
            assert_eq!(empty.kpis.period_label, "Last 30 days");
            assert_eq!(empty.kpis.default_tax_percent, dec!(6));
        }
        ReportOutcome::Report(_) => panic!("expected the empty outcome"),
    }
    // No orders means nothing to enrich.
    assert_eq!(f.ads.calls(), 0);
}

// ===========================================================================
// Token refresh
// ===========================================================================

#[tokio::test]
async fn test_expired_token_refreshes_once_and_retries() {
    // Stored token "tok" reads as expired; refresher hands out "fresh".
    let f = fixture(
        StaticOrders::requiring_token(
            vec![order("O1", 10, "BR", vec![item("SKU1", 2, dec!(100))])],
            "fresh",
        ),
        StaticAdInsights::new(HashMap::new()),
        StaticCostConfig::new(sku1_config()),
    );

    let report = expect_report(f.engine.compute_for_window("seller", march()).await.unwrap());

    assert_eq!(report.kpis.units_total, 2);
    assert_eq!(f.refresher.calls(), 1, "exactly one refresh");
    assert_eq!(f.orders.calls(), 2, "probe then retry");
}

#[tokio::test]
async fn test_failed_refresh_fails_the_whole_computation() {
    let f = fixture_with_refresher(
        StaticOrders::requiring_token(
            vec![order("O1", 10, "BR", vec![item("SKU1", 2, dec!(100))])],
            "fresh",
        ),
        StaticAdInsights::new(HashMap::new()),
        StaticCostConfig::new(sku1_config()),
        StaticRefresher::failing(),
    );

    let err = f.engine.compute_for_window("seller", march()).await.unwrap_err();

    assert!(matches!(err, IrvingError::Auth { .. }));
    assert_eq!(f.orders.calls(), 1, "no retry without a new token");
}

#[tokio::test]
async fn test_refreshed_token_rejected_again_surfaces_auth() {
    // Refresher hands out a token the marketplace still rejects; exactly one
    // refresh is attempted, never a loop.
    let f = fixture_with_refresher(
        StaticOrders::requiring_token(
            vec![order("O1", 10, "BR", vec![item("SKU1", 2, dec!(100))])],
            "the-real-token",
        ),
        StaticAdInsights::new(HashMap::new()),
        StaticCostConfig::new(sku1_config()),
        StaticRefresher::new("still-stale"),
    );

    let err = f.engine.compute_for_window("seller", march()).await.unwrap_err();

    assert!(matches!(err, IrvingError::Auth { .. }));
    assert_eq!(f.refresher.calls(), 1);
    assert_eq!(f.orders.calls(), 2);
}

// ===========================================================================
// Upstream failures
// ===========================================================================

#[tokio::test]
async fn test_order_fetch_outage_aborts_the_computation() {
    let f = fixture(
        StaticOrders::unavailable("gateway timeout"),
        StaticAdInsights::new(HashMap::new()),
        StaticCostConfig::new(sku1_config()),
    );

    let err = f.engine.compute_for_window("seller", march()).await.unwrap_err();

    match err {
        IrvingError::Upstream { service, message } => {
            assert_eq!(service, "marketplace orders");
            assert!(message.contains("gateway timeout"));
        }
        other => panic!("expected Upstream, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_ad_batch_is_absorbed_with_a_warning() {
    // 60 products split into a batch of 50 and a batch of 10; an id in the
    // second batch poisons only that call.
    let items: Vec<LineItem> = (0..60)
        .map(|i| item(&format!("MLB{:03}", i), 1, dec!(100)))
        .collect();
    let mut config = CostConfig {
        default_tax_percent: dec!(6),
        ..CostConfig::default()
    };
    for i in 0..60 {
        config.unit_costs.insert(format!("MLB{:03}", i), dec!(40));
    }
    let mut spend = HashMap::new();
    spend.insert("MLB000".to_string(), dec!(7));

    let f = fixture(
        StaticOrders::new(vec![order("O1", 10, "BR", items)]),
        StaticAdInsights::new(spend).with_failing_ids(["MLB059".to_string()]),
        StaticCostConfig::new(config),
    );

    let report = expect_report(f.engine.compute_for_window("seller", march()).await.unwrap());

    assert_eq!(f.ads.calls(), 2);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("10 products"));

    let first = report.products.iter().find(|r| r.product_id == "MLB000").unwrap();
    let poisoned = report.products.iter().find(|r| r.product_id == "MLB059").unwrap();
    assert_eq!(first.ad_cost_total, dec!(7));
    assert_eq!(poisoned.ad_cost_total, dec!(0));
}

#[tokio::test]
async fn test_cost_store_outage_degrades_to_missing_costs() {
    let f = fixture(
        StaticOrders::new(vec![order("O1", 10, "BR", vec![item("SKU1", 2, dec!(100))])]),
        StaticAdInsights::new(HashMap::new()),
        StaticCostConfig::failing("config db down"),
    );

    let report = expect_report(f.engine.compute_for_window("seller", march()).await.unwrap());

    // Still a report; every product just reads as cost-missing.
    let row = &report.products[0];
    assert!(row.has_unset_cost);
    assert_eq!(row.status, ProductStatus::CostMissing);
    assert_eq!(report.kpis.profit_total, dec!(0));
    assert_eq!(report.kpis.default_tax_percent, dec!(0));
}

// ===========================================================================
// Determinism
// ===========================================================================

#[tokio::test]
async fn test_identical_inputs_yield_identical_reports() {
    let orders = vec![
        order("O1", 10, "BR", vec![item("SKU1", 2, dec!(100))]),
        order("O2", 12, "AR", vec![item("SKU2", 1, dec!(80))]),
    ];
    let mut config = sku1_config();
    config.unit_costs.insert("SKU2".to_string(), dec!(30));
    let mut spend = HashMap::new();
    spend.insert("SKU1".to_string(), dec!(4));

    let f = fixture(
        StaticOrders::new(orders),
        StaticAdInsights::new(spend),
        StaticCostConfig::new(config),
    );

    let first = f.engine.compute_for_window("seller", march()).await.unwrap();
    let second = f.engine.compute_for_window("seller", march()).await.unwrap();

    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap(),
        "same window and fixtures must serialize identically"
    );
}

#[tokio::test]
async fn test_orders_outside_the_window_are_invisible() {
    let f = fixture(
        StaticOrders::new(vec![
            order("O1", 10, "BR", vec![item("SKU1", 2, dec!(100))]),
            // 2024-04-10, outside the March window.
            Order {
                order_id: "O2".to_string(),
                created_at: Utc.with_ymd_and_hms(2024, 4, 10, 12, 0, 0).unwrap(),
                destination_country: "BR".to_string(),
                line_items: vec![item("SKU1", 5, dec!(100))],
            },
        ]),
        StaticAdInsights::new(HashMap::new()),
        StaticCostConfig::new(sku1_config()),
    );

    let report = expect_report(f.engine.compute_for_window("seller", march()).await.unwrap());

    assert_eq!(report.kpis.units_total, 2);
}
