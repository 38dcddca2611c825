//! REST API presentation boundary for the analytics core

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use state::AppState;

use crate::dataset::Dataset;
use crate::loader;
use chrono::NaiveDate;
use std::sync::Arc;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host address (default: "127.0.0.1")
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
    /// Directory containing the four base CSV tables
    pub data_dir: String,
    /// Path to the GeoJSON state-boundary file
    pub geo_path: String,
    /// Earliest date accepted by the date-range parameters
    pub min_date: NaiveDate,
    /// Latest date accepted by the date-range parameters
    pub max_date: NaiveDate,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            data_dir: "data".to_string(),
            geo_path: "geo/br_states.geojson".to_string(),
            min_date: NaiveDate::from_ymd_opt(2016, 1, 1).expect("valid default date"),
            max_date: NaiveDate::from_ymd_opt(2018, 12, 31).expect("valid default date"),
        }
    }
}

/// Runs the API server
///
/// Loads the source tables and geo boundaries (any load failure aborts
/// startup), builds the enriched dataset once, and serves read-only
/// analytical endpoints until stopped.
///
/// # Errors
/// Returns an error if loading fails or the server cannot bind.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    // Fatal-at-load phase: tables, join, geo boundaries
    let tables = loader::load_tables(&config.data_dir)?;
    let dataset = Dataset::new(&tables);
    let geo = loader::load_geo_boundaries(&config.geo_path)?;
    tracing::info!(
        "dataset ready: {} enriched rows",
        dataset.enriched_rows().len()
    );

    let state = Arc::new(AppState::new(
        dataset,
        geo,
        config.min_date,
        config.max_date,
    ));

    let app = routes::create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
