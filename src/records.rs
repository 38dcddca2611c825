//! Row types for the four base CSV tables.
//!
//! Field names match the source dataset column headers so the rows can be
//! deserialized directly with `csv` + serde. Timestamps in the orders table
//! use the `%Y-%m-%d %H:%M:%S` format and are treated as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One row of the customers table.
///
/// `customer_id` is a per-order pseudonymous id; `customer_unique_id` is the
/// durable identity a real-world customer keeps across orders. All
/// customer-level aggregation keys on `customer_unique_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub customer_unique_id: String,
    pub customer_state: String,
}

/// One row of the orders table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub customer_id: String,
    #[serde(deserialize_with = "deserialize_purchase_timestamp")]
    pub order_purchase_timestamp: DateTime<Utc>,
}

/// One row of the order items table.
///
/// `price` is optional: a missing value is preserved here and coerced to zero
/// revenue once, during enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemRecord {
    pub order_id: String,
    pub product_id: String,
    pub price: Option<f64>,
}

/// One row of the products table. The category label may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: String,
    #[serde(deserialize_with = "deserialize_optional_string")]
    pub product_category_name: Option<String>,
}

/// Parses `YYYY-MM-DD HH:MM:SS` purchase timestamps as UTC.
fn deserialize_purchase_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let naive = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S")
        .map_err(serde::de::Error::custom)?;
    Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// Maps empty CSV fields to `None` instead of an empty string.
fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.filter(|v| !v.trim().is_empty()))
}
