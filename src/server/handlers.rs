//! HTTP request handlers for API endpoints
//!
//! Date validation lives here: the core filter and aggregation functions are
//! only ever invoked with a parseable, ordered range inside the permitted
//! bounds. Each request recomputes its tables from the shared dataset.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::ApiError;
use super::state::AppState;
use crate::aggregate::{
    CategorySummary, DailySummary, HourlySummary, MonthlySummary, RegionSummary,
};
use crate::dataset::DateRange;
use crate::insights::Finding;
use crate::pipeline::Snapshot;
use crate::rfm::{RfmRecord, SegmentSummary};

/// Health check endpoint
///
/// Returns a simple status response to verify the server is running
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok"
    }))
}

/// Query parameters shared by every analytical endpoint
#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub start: String,
    pub end: String,
}

/// Parses and validates the date-range parameters.
///
/// Rejects unparseable dates, `start > end` (bounds are never silently
/// swapped), and dates outside the permitted window.
fn parse_range(state: &AppState, params: &RangeParams) -> Result<DateRange, ApiError> {
    let start = NaiveDate::parse_from_str(&params.start, "%Y-%m-%d")
        .map_err(|e| ApiError::InvalidDateRange(format!("Invalid start date: {}", e)))?;
    let end = NaiveDate::parse_from_str(&params.end, "%Y-%m-%d")
        .map_err(|e| ApiError::InvalidDateRange(format!("Invalid end date: {}", e)))?;

    if start > end {
        return Err(ApiError::InvalidDateRange(
            "Start date must be before or equal to end date".to_string(),
        ));
    }
    if start < state.min_date || end > state.max_date {
        return Err(ApiError::InvalidDateRange(format!(
            "Range must lie within {} to {}",
            state.min_date, state.max_date
        )));
    }

    Ok(DateRange::new(start, end))
}

fn snapshot(state: &AppState, params: &RangeParams) -> Result<Snapshot, ApiError> {
    let range = parse_range(state, params)?;
    Ok(Snapshot::compute(&state.dataset, &range))
}

/// GET /summary - Window KPIs (total revenue, orders, customers)
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Value>, ApiError> {
    let snapshot = snapshot(&state, &params)?;
    Ok(Json(json!({
        "start_date": params.start,
        "end_date": params.end,
        "kpis": snapshot.kpis,
    })))
}

/// GET /rfm - Per-customer RFM table with scores and segments
pub async fn get_rfm(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Vec<RfmRecord>>, ApiError> {
    Ok(Json(snapshot(&state, &params)?.rfm_table))
}

/// GET /segments - Per-segment summary
pub async fn get_segments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Vec<SegmentSummary>>, ApiError> {
    Ok(Json(snapshot(&state, &params)?.segment_summary))
}

/// GET /categories - Per-category summary
pub async fn get_categories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Vec<CategorySummary>>, ApiError> {
    Ok(Json(snapshot(&state, &params)?.category_summary))
}

/// GET /regions - Per-state summary
pub async fn get_regions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Vec<RegionSummary>>, ApiError> {
    Ok(Json(snapshot(&state, &params)?.region_summary))
}

/// GET /temporal/daily - Day-of-week summary (fixed Monday..Sunday axis)
pub async fn get_daily(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Vec<DailySummary>>, ApiError> {
    Ok(Json(snapshot(&state, &params)?.daily_summary))
}

/// GET /temporal/hourly - Hour-of-day summary
pub async fn get_hourly(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Vec<HourlySummary>>, ApiError> {
    Ok(Json(snapshot(&state, &params)?.hourly_summary))
}

/// GET /temporal/monthly - Calendar-month summary
pub async fn get_monthly(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Vec<MonthlySummary>>, ApiError> {
    Ok(Json(snapshot(&state, &params)?.monthly_summary))
}

/// GET /insights - Ordered narrative findings for the window
pub async fn get_insights(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Vec<Finding>>, ApiError> {
    Ok(Json(snapshot(&state, &params)?.findings))
}

/// GET /geo - GeoJSON state boundaries for the choropleth layer
pub async fn get_geo(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(state.geo.as_ref().clone())
}
