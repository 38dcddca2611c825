//! Grouped aggregate tables over the filtered enriched rows.
//!
//! Shared measure semantics, applied identically by every grouping:
//! - `total_revenue` sums row revenue (one order's items each contribute);
//! - `total_orders` counts distinct `order_id`;
//! - `total_customers` counts distinct `customer_unique_id`;
//! - `aov` is `total_revenue / total_orders`, absent when the group has no
//!   orders (never infinity, never an error).
//!
//! Keyed summaries (category, region) list groups in first-occurrence order
//! so that stable descending sorts over them break ties by first appearance.
//! Calendar summaries carry a `transactions` row count as well; the weekday
//! table always contains the seven fixed days Monday..Sunday, zero-filled.

use crate::dataset::EnrichedRow;
use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Bucket label for rows whose product has no category.
pub const UNCATEGORIZED: &str = "uncategorized";
/// Bucket label for rows whose customer record (and thus state) is missing.
pub const UNKNOWN_STATE: &str = "unknown";

/// Fixed weekday labels in calendar order.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// The shared measures computed for every group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMeasures {
    pub total_revenue: f64,
    pub total_orders: usize,
    pub total_customers: usize,
    /// Average order value; `None` when `total_orders == 0`.
    pub aov: Option<f64>,
}

impl GroupMeasures {
    /// Computes the shared measures over a set of rows (a group, or the whole
    /// filtered window for the headline KPIs).
    pub fn from_rows(rows: &[&EnrichedRow]) -> Self {
        let mut total_revenue = 0.0;
        let mut orders = HashSet::new();
        let mut customers = HashSet::new();
        for row in rows {
            total_revenue += row.revenue;
            orders.insert(row.order_id.as_str());
            if let Some(id) = row.customer_unique_id.as_deref() {
                customers.insert(id);
            }
        }
        let total_orders = orders.len();
        let aov = if total_orders > 0 {
            Some(total_revenue / total_orders as f64)
        } else {
            None
        };
        GroupMeasures {
            total_revenue,
            total_orders,
            total_customers: customers.len(),
            aov,
        }
    }

    fn empty() -> Self {
        GroupMeasures {
            total_revenue: 0.0,
            total_orders: 0,
            total_customers: 0,
            aov: None,
        }
    }
}

/// One row of the per-category summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    #[serde(flatten)]
    pub measures: GroupMeasures,
    /// Distinct products seen in the category within the window.
    pub product_count: usize,
}

/// One row of the per-state summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub state: String,
    #[serde(flatten)]
    pub measures: GroupMeasures,
    /// Same absence rule as AOV: `None` when the state has no orders.
    pub revenue_per_order: Option<f64>,
}

/// One row of the day-of-week summary. All seven days always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub day: String,
    /// Enriched-row count (not order-deduplicated).
    pub transactions: usize,
    #[serde(flatten)]
    pub measures: GroupMeasures,
}

/// One row of the hour-of-day summary. Only hours that occur appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySummary {
    pub hour: u32,
    pub transactions: usize,
    #[serde(flatten)]
    pub measures: GroupMeasures,
}

/// One row of the calendar-month summary, labeled as a sortable "YYYY-MM".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month: String,
    pub transactions: usize,
    #[serde(flatten)]
    pub measures: GroupMeasures,
}

/// Groups rows by a key, preserving first-occurrence key order and input
/// order within each group.
fn group_rows<'a, K, F>(rows: &[&'a EnrichedRow], key_of: F) -> Vec<(K, Vec<&'a EnrichedRow>)>
where
    K: Clone + std::hash::Hash + Eq,
    F: Fn(&EnrichedRow) -> K,
{
    let mut index_of_key: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&EnrichedRow>)> = Vec::new();
    for row in rows {
        let key = key_of(row);
        match index_of_key.get(&key) {
            Some(&index) => groups[index].1.push(row),
            None => {
                index_of_key.insert(key.clone(), groups.len());
                groups.push((key, vec![row]));
            }
        }
    }
    groups
}

/// Per-category summary. Rows without a category fall into the
/// [`UNCATEGORIZED`] bucket so revenue partitions exactly across groups.
pub fn category_summary(rows: &[&EnrichedRow]) -> Vec<CategorySummary> {
    group_rows(rows, |row| {
        row.product_category
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED.to_string())
    })
    .into_iter()
    .map(|(category, group)| {
        let product_count = group
            .iter()
            .filter_map(|row| row.product_id.as_deref())
            .collect::<HashSet<_>>()
            .len();
        CategorySummary {
            category,
            measures: GroupMeasures::from_rows(&group),
            product_count,
        }
    })
    .collect()
}

/// Per-state summary. Rows with no customer record fall into the
/// [`UNKNOWN_STATE`] bucket.
pub fn region_summary(rows: &[&EnrichedRow]) -> Vec<RegionSummary> {
    group_rows(rows, |row| {
        row.customer_state
            .clone()
            .unwrap_or_else(|| UNKNOWN_STATE.to_string())
    })
    .into_iter()
    .map(|(state, group)| {
        let measures = GroupMeasures::from_rows(&group);
        let revenue_per_order = measures.aov;
        RegionSummary {
            state,
            measures,
            revenue_per_order,
        }
    })
    .collect()
}

/// Day-of-week summary in fixed Monday..Sunday order. Days with no
/// transactions appear with zero counts rather than being omitted.
pub fn daily_summary(rows: &[&EnrichedRow]) -> Vec<DailySummary> {
    let mut buckets: Vec<Vec<&EnrichedRow>> = vec![Vec::new(); 7];
    for row in rows {
        let index = row.purchase_timestamp.weekday().num_days_from_monday() as usize;
        buckets[index].push(row);
    }
    WEEKDAY_NAMES
        .iter()
        .zip(buckets.iter())
        .map(|(day, group)| DailySummary {
            day: day.to_string(),
            transactions: group.len(),
            measures: if group.is_empty() {
                GroupMeasures::empty()
            } else {
                GroupMeasures::from_rows(group)
            },
        })
        .collect()
}

/// Hour-of-day summary, hours 0..=23 ascending, only hours that occur.
pub fn hourly_summary(rows: &[&EnrichedRow]) -> Vec<HourlySummary> {
    let mut summaries: Vec<HourlySummary> = group_rows(rows, |row| row.purchase_timestamp.hour())
        .into_iter()
        .map(|(hour, group)| HourlySummary {
            hour,
            transactions: group.len(),
            measures: GroupMeasures::from_rows(&group),
        })
        .collect();
    summaries.sort_by_key(|s| s.hour);
    summaries
}

/// Calendar-month summary sorted chronologically, labeled "YYYY-MM".
pub fn monthly_summary(rows: &[&EnrichedRow]) -> Vec<MonthlySummary> {
    let mut summaries: Vec<((i32, u32), MonthlySummary)> = group_rows(rows, |row| {
        (row.purchase_timestamp.year(), row.purchase_timestamp.month())
    })
    .into_iter()
    .map(|((year, month), group)| {
        let summary = MonthlySummary {
            month: format!("{:04}-{:02}", year, month),
            transactions: group.len(),
            measures: GroupMeasures::from_rows(&group),
        };
        ((year, month), summary)
    })
    .collect();
    summaries.sort_by_key(|(key, _)| *key);
    summaries.into_iter().map(|(_, summary)| summary).collect()
}
