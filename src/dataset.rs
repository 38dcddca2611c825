//! The denormalized transaction dataset and its date-range filter.
//!
//! `Dataset::new` performs the left-outer join chain
//! Order -> Customer -> Line Item -> Product exactly once; the enriched table
//! is immutable for the lifetime of the process and every downstream
//! computation borrows from it.

use crate::loader::BaseTables;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One joined (order x line item x product x customer) record.
///
/// Invariant: one row per (order, line item) pair. An order with no matched
/// items still yields a single row with null item fields. Order-level
/// attributes repeat identically across an order's rows, so consumers that
/// count orders or customers must deduplicate by `order_id` /
/// `customer_unique_id` rather than counting rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRow {
    pub order_id: String,
    pub purchase_timestamp: DateTime<Utc>,
    /// Durable customer identity; `None` when the customer record is missing.
    pub customer_unique_id: Option<String>,
    pub customer_state: Option<String>,
    pub product_id: Option<String>,
    pub product_category: Option<String>,
    /// Line item price with nulls already coerced to zero. This is the single
    /// normalization point; no consumer re-coerces.
    pub revenue: f64,
}

/// Inclusive calendar date range used to window the enriched table.
///
/// Precondition: `start <= end`. The caller validates this before invoking
/// the core; the filter itself never swaps bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Start date (inclusive)
    pub start: NaiveDate,
    /// End date (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new DateRange.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Tests whether a timestamp falls inside the range at day granularity.
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        let date = timestamp.date_naive();
        date >= self.start && date <= self.end
    }
}

/// The immutable dataset: base tables joined into the enriched table once.
#[derive(Debug, Clone)]
pub struct Dataset {
    enriched: Vec<EnrichedRow>,
}

impl Dataset {
    /// Builds the enriched transaction table from the base tables.
    ///
    /// All three joins are left-outer: every order survives, non-matching
    /// foreign keys become nulls rather than errors.
    pub fn new(tables: &BaseTables) -> Self {
        // Index lookup tables; first occurrence wins on duplicate keys.
        let mut customers_by_id = HashMap::new();
        for customer in &tables.customers {
            customers_by_id
                .entry(customer.customer_id.as_str())
                .or_insert(customer);
        }

        let mut products_by_id = HashMap::new();
        for product in &tables.products {
            products_by_id
                .entry(product.product_id.as_str())
                .or_insert(product);
        }

        // Items grouped by order, preserving input order within each order.
        let mut items_by_order: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, item) in tables.order_items.iter().enumerate() {
            items_by_order
                .entry(item.order_id.as_str())
                .or_default()
                .push(index);
        }

        let mut enriched = Vec::new();
        for order in &tables.orders {
            let customer = customers_by_id.get(order.customer_id.as_str());
            let customer_unique_id = customer.map(|c| c.customer_unique_id.clone());
            let customer_state = customer.map(|c| c.customer_state.clone());

            match items_by_order.get(order.order_id.as_str()) {
                Some(item_indices) => {
                    for &index in item_indices {
                        let item = &tables.order_items[index];
                        let product = products_by_id.get(item.product_id.as_str());
                        enriched.push(EnrichedRow {
                            order_id: order.order_id.clone(),
                            purchase_timestamp: order.order_purchase_timestamp,
                            customer_unique_id: customer_unique_id.clone(),
                            customer_state: customer_state.clone(),
                            product_id: Some(item.product_id.clone()),
                            product_category: product
                                .and_then(|p| p.product_category_name.clone()),
                            revenue: item.price.unwrap_or(0.0),
                        });
                    }
                }
                None => {
                    // Order with no matched items appears once, zero revenue.
                    enriched.push(EnrichedRow {
                        order_id: order.order_id.clone(),
                        purchase_timestamp: order.order_purchase_timestamp,
                        customer_unique_id,
                        customer_state,
                        product_id: None,
                        product_category: None,
                        revenue: 0.0,
                    });
                }
            }
        }

        log::debug!("enriched table built: {} rows", enriched.len());
        Dataset { enriched }
    }

    /// The full enriched table, in order input order.
    pub fn enriched_rows(&self) -> &[EnrichedRow] {
        &self.enriched
    }

    /// Restricts the enriched table to rows whose purchase date lies inside
    /// the range, both bounds inclusive. An empty result is valid; downstream
    /// components produce empty summaries from it.
    pub fn filter(&self, range: &DateRange) -> Vec<&EnrichedRow> {
        self.enriched
            .iter()
            .filter(|row| range.contains(row.purchase_timestamp))
            .collect()
    }
}
