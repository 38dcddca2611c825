//! Loading of the four base CSV tables and the geographic boundary file.
//!
//! Any failure here is fatal at startup: a missing file, a missing required
//! column, or an unparseable timestamp means the core cannot produce a join.
//! Partial foreign-key mismatches between tables are not load errors; they
//! surface as left-outer nulls during enrichment.

use crate::records::{CustomerRecord, OrderItemRecord, OrderRecord, ProductRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// The four immutable source tables, loaded once per process.
#[derive(Debug, Clone, Default)]
pub struct BaseTables {
    pub customers: Vec<CustomerRecord>,
    pub orders: Vec<OrderRecord>,
    pub order_items: Vec<OrderItemRecord>,
    pub products: Vec<ProductRecord>,
}

/// Errors that can occur while loading source data.
#[derive(Debug)]
pub enum LoadError {
    /// File could not be opened or read
    Io { path: String, source: std::io::Error },
    /// A row failed to deserialize (missing column, bad timestamp, bad number)
    Csv { path: String, source: csv::Error },
    /// The geo boundary file is not valid JSON
    GeoJson { path: String, source: serde_json::Error },
    /// The geo boundary file parses but is not a FeatureCollection
    InvalidGeoDocument { path: String },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io { path, source } => write!(f, "failed to read '{}': {}", path, source),
            LoadError::Csv { path, source } => write!(f, "failed to parse '{}': {}", path, source),
            LoadError::GeoJson { path, source } => {
                write!(f, "failed to parse geo file '{}': {}", path, source)
            }
            LoadError::InvalidGeoDocument { path } => {
                write!(f, "geo file '{}' is not a FeatureCollection", path)
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Csv { source, .. } => Some(source),
            LoadError::GeoJson { source, .. } => Some(source),
            LoadError::InvalidGeoDocument { .. } => None,
        }
    }
}

/// Deserializes every row of a CSV reader into `T`.
pub fn read_csv<T, R>(reader: R, path: &str) -> Result<Vec<T>, LoadError>
where
    T: for<'de> serde::Deserialize<'de>,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in csv_reader.deserialize() {
        let row: T = result.map_err(|source| LoadError::Csv {
            path: path.to_string(),
            source,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn read_csv_file<T>(path: &Path) -> Result<Vec<T>, LoadError>
where
    T: for<'de> serde::Deserialize<'de>,
{
    let display = path.display().to_string();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;
    read_csv(file, &display)
}

/// Loads the four base tables from a data directory.
///
/// Expects `customers_dataset.csv`, `orders_dataset.csv`,
/// `order_items_dataset.csv` and `products_dataset.csv`.
pub fn load_tables<P: AsRef<Path>>(data_dir: P) -> Result<BaseTables, LoadError> {
    let dir = data_dir.as_ref();

    let customers = read_csv_file(&dir.join("customers_dataset.csv"))?;
    let orders = read_csv_file(&dir.join("orders_dataset.csv"))?;
    let order_items = read_csv_file(&dir.join("order_items_dataset.csv"))?;
    let products = read_csv_file(&dir.join("products_dataset.csv"))?;

    let tables = BaseTables {
        customers,
        orders,
        order_items,
        products,
    };

    log::info!(
        "loaded base tables: {} customers, {} orders, {} items, {} products",
        tables.customers.len(),
        tables.orders.len(),
        tables.order_items.len(),
        tables.products.len()
    );

    Ok(tables)
}

/// Loads the GeoJSON state-boundary file.
///
/// The document is validated to be a FeatureCollection and then served
/// verbatim to the presentation layer; the core never interprets geometry.
pub fn load_geo_boundaries<P: AsRef<Path>>(path: P) -> Result<serde_json::Value, LoadError> {
    let display = path.as_ref().display().to_string();
    let file = File::open(path.as_ref()).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;

    let value: serde_json::Value =
        serde_json::from_reader(file).map_err(|source| LoadError::GeoJson {
            path: display.clone(),
            source,
        })?;

    let is_feature_collection = value
        .get("type")
        .and_then(|t| t.as_str())
        .map(|t| t == "FeatureCollection")
        .unwrap_or(false);
    if !is_feature_collection || value.get("features").map(|f| !f.is_array()).unwrap_or(true) {
        return Err(LoadError::InvalidGeoDocument { path: display });
    }

    Ok(value)
}
