//! Shared application state for the API server

use crate::dataset::Dataset;
use chrono::NaiveDate;
use std::sync::Arc;

/// Shared application state
///
/// The dataset (with its memoized join) and the geo boundaries are built once
/// at startup and shared read-only across requests; every request recomputes
/// the filtered tables from them.
#[derive(Clone)]
pub struct AppState {
    /// The immutable enriched dataset
    pub dataset: Arc<Dataset>,
    /// GeoJSON state boundaries, served verbatim
    pub geo: Arc<serde_json::Value>,
    /// Earliest date the API accepts
    pub min_date: NaiveDate,
    /// Latest date the API accepts
    pub max_date: NaiveDate,
}

impl AppState {
    /// Creates a new application state
    pub fn new(
        dataset: Dataset,
        geo: serde_json::Value,
        min_date: NaiveDate,
        max_date: NaiveDate,
    ) -> Self {
        AppState {
            dataset: Arc::new(dataset),
            geo: Arc::new(geo),
            min_date,
            max_date,
        }
    }
}
