//! Route definitions for the API server

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Creates the main application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    // Allow-all CORS: the API is read-only and serves a local dashboard
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Window KPIs
        .route("/summary", get(handlers::get_summary))
        // Customer segmentation
        .route("/rfm", get(handlers::get_rfm))
        .route("/segments", get(handlers::get_segments))
        // Category and geography
        .route("/categories", get(handlers::get_categories))
        .route("/regions", get(handlers::get_regions))
        // Temporal patterns
        .route("/temporal/daily", get(handlers::get_daily))
        .route("/temporal/hourly", get(handlers::get_hourly))
        .route("/temporal/monthly", get(handlers::get_monthly))
        // Narrative findings
        .route("/insights", get(handlers::get_insights))
        // Static geo boundaries
        .route("/geo", get(handlers::get_geo))
        // Add middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Add shared state
        .with_state(state)
}
