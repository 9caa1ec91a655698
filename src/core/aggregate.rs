//! Grouped statistics over enriched records.

use crate::core::enrich::NOT_FOUND;
use crate::domain::model::{AggregateResult, EnrichedRecord};
use std::collections::HashMap;

/// Groups records by exact (legal_name, region) and computes total,
/// mean per period and population standard deviation (divisor N).
///
/// Records whose region carries the NOT_FOUND sentinel are excluded:
/// without registry data there is no region to group under. Output is
/// sorted by total descending; ties order by legal_name then region
/// ascending, so equal totals still have one fixed order.
pub fn aggregate(records: &[EnrichedRecord]) -> Vec<AggregateResult> {
    let mut groups: HashMap<(String, String), Vec<f64>> = HashMap::new();
    for record in records {
        if record.region == NOT_FOUND {
            continue;
        }
        groups
            .entry((record.legal_name.clone(), record.region.clone()))
            .or_default()
            .push(record.amount);
    }

    let mut results: Vec<AggregateResult> = groups
        .into_iter()
        .map(|((legal_name, region), amounts)| {
            let count = amounts.len();
            let total: f64 = amounts.iter().sum();
            // Groups are never empty, but a zero count must yield zero,
            // never a division fault.
            let mean = if count > 0 { total / count as f64 } else { 0.0 };
            let variance = if count > 0 {
                amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / count as f64
            } else {
                0.0
            };

            AggregateResult {
                legal_name,
                region,
                total_amount: total,
                mean_per_period: mean,
                population_std_dev: variance.sqrt(),
                period_count: count,
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.total_amount
            .total_cmp(&a.total_amount)
            .then_with(|| a.legal_name.cmp(&b.legal_name))
            .then_with(|| a.region.cmp(&b.region))
    });

    results
}
