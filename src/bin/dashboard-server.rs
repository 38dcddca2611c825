//! Dashboard API Server Binary
//!
//! Run with: `cargo run --bin dashboard-server`

use chrono::NaiveDate;
use retail_analytics::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Note: Tracing is initialized in run_server()
    // Set RUST_LOG to control log level:
    //   RUST_LOG=debug cargo run --bin dashboard-server

    let defaults = ServerConfig::default();
    let host = std::env::var("HOST").unwrap_or(defaults.host);
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(defaults.port);
    let data_dir = std::env::var("DATA_DIR").unwrap_or(defaults.data_dir);
    let geo_path = std::env::var("GEO_PATH").unwrap_or(defaults.geo_path);
    let min_date = std::env::var("MIN_DATE")
        .ok()
        .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok())
        .unwrap_or(defaults.min_date);
    let max_date = std::env::var("MAX_DATE")
        .ok()
        .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok())
        .unwrap_or(defaults.max_date);

    let config = ServerConfig {
        host,
        port,
        data_dir,
        geo_path,
        min_date,
        max_date,
    };

    println!("Starting dashboard API server...");
    println!("   Host: {}", config.host);
    println!("   Port: {}", config.port);
    println!("   Data: {}", config.data_dir);
    println!("   Geo:  {}", config.geo_path);
    println!();
    println!("Available endpoints (all ranges ?start=YYYY-MM-DD&end=YYYY-MM-DD):");
    println!("  GET /health             - Health check");
    println!("  GET /summary            - Window KPIs");
    println!("  GET /rfm                - Per-customer RFM table");
    println!("  GET /segments           - Segment summary");
    println!("  GET /categories         - Category summary");
    println!("  GET /regions            - Regional summary");
    println!("  GET /temporal/daily     - Day-of-week summary");
    println!("  GET /temporal/hourly    - Hour-of-day summary");
    println!("  GET /temporal/monthly   - Monthly summary");
    println!("  GET /insights           - Narrative findings");
    println!("  GET /geo                - GeoJSON state boundaries");
    println!();

    run_server(config).await?;

    Ok(())
}
