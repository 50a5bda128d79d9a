use futures::future::join_all;

use crate::aggregate::OrderAggregation;
use crate::sources::AdInsightsSource;
use crate::types::{ProductId, ReportWindow};

/// Upstream limit on product ids per insights call.
pub const AD_BATCH_SIZE: usize = 50;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Merge advertising spend into the aggregates.
///
/// Ids are split into batches of [`AD_BATCH_SIZE`]; the batch calls run
/// concurrently and all join before this returns. A failed batch is absorbed
/// rather than fatal: its products keep zero spend and a warning is recorded,
/// while the remaining batches still land.
pub async fn enrich_ad_costs(
    ads: &dyn AdInsightsSource,
    access_token: &str,
    window: ReportWindow,
    aggregation: &mut OrderAggregation,
) -> Vec<String> {
    let ids: Vec<ProductId> = aggregation.products.keys().cloned().collect();
    if ids.is_empty() {
        return Vec::new();
    }

    let batches: Vec<&[ProductId]> = ids.chunks(AD_BATCH_SIZE).collect();
    let results = join_all(
        batches
            .iter()
            .map(|batch| ads.fetch_ad_spend(batch, access_token, window)),
    )
    .await;

    let mut warnings = Vec::new();
    for (batch, result) in batches.iter().zip(results) {
        match result {
            Ok(spend) => {
                for (product_id, amount) in spend {
                    // Ids the upstream knows but we did not aggregate are
                    // ignored; spend without sales has no row to land on.
                    if let Some(product) = aggregation.products.get_mut(&product_id) {
                        product.ad_cost_total += amount;
                    }
                }
            }
            Err(err) => {
                tracing::warn!(
                    batch_size = batch.len(),
                    error = %err,
                    "Ad spend batch failed; counting zero spend for its products"
                );
                warnings.push(format!(
                    "Advertising spend unavailable for {} products; counted as zero.",
                    batch.len()
                ));
            }
        }
    }

    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
