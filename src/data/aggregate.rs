use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::model::{SalesRecord, SalesTable};

// ---------------------------------------------------------------------------
// Snapshot of the KPIs and grouped revenue series
// ---------------------------------------------------------------------------

/// Best-selling product and its revenue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProduct {
    pub name: String,
    pub revenue: f64,
}

/// Everything the dashboard shows, computed from one filtered table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSnapshot {
    pub total_revenue: f64,
    pub total_units: f64,
    /// `None` for an empty table.
    pub avg_unit_price: Option<f64>,
    /// `None` for an empty table.
    pub top_product: Option<TopProduct>,
    /// Ascending by revenue.
    pub revenue_by_product: Vec<(String, f64)>,
    /// Descending by revenue.
    pub revenue_by_region: Vec<(String, f64)>,
    /// Ascending by date, one entry per calendar day.
    pub revenue_by_day: Vec<(NaiveDate, f64)>,
}

/// Sum revenue per key. Groups come back in ascending key order.
fn group_revenue<K: Ord>(
    table: &SalesTable,
    key: impl Fn(&SalesRecord) -> K,
) -> Vec<(K, f64)> {
    let mut groups: BTreeMap<K, f64> = BTreeMap::new();
    for rec in &table.records {
        *groups.entry(key(rec)).or_default() += rec.revenue.unwrap_or(0.0);
    }
    groups.into_iter().collect()
}

/// Compute the snapshot. Expects a table whose revenues are all present
/// (the output of [`crate::data::filter::apply_filters`]).
///
/// Sorts are stable over the key-ordered groups, so equal revenues keep
/// alphabetical order.
pub fn aggregate(table: &SalesTable) -> AggregateSnapshot {
    let total_revenue: f64 = table.records.iter().filter_map(|r| r.revenue).sum();
    let total_units: f64 = table.records.iter().map(|r| r.units).sum();
    let avg_unit_price = (!table.is_empty()).then(|| {
        table.records.iter().map(|r| r.unit_price).sum::<f64>() / table.len() as f64
    });

    let mut by_product_desc = group_revenue(table, |r| r.product.clone());
    by_product_desc.sort_by(|a, b| b.1.total_cmp(&a.1));
    let top_product = by_product_desc.first().map(|(name, revenue)| TopProduct {
        name: name.clone(),
        revenue: *revenue,
    });

    let mut revenue_by_product = group_revenue(table, |r| r.product.clone());
    revenue_by_product.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut revenue_by_region = group_revenue(table, |r| r.region.clone());
    revenue_by_region.sort_by(|a, b| b.1.total_cmp(&a.1));

    let revenue_by_day = group_revenue(table, |r| r.day());

    AggregateSnapshot {
        total_revenue,
        total_units,
        avg_unit_price,
        top_product,
        revenue_by_product,
        revenue_by_region,
        revenue_by_day,
    }
}
