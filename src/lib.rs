pub mod records;
pub mod loader;
pub mod dataset;
pub mod aggregate;
pub mod rfm;
pub mod insights;
pub mod pipeline;
pub mod server;


pub use records::{CustomerRecord, OrderItemRecord, OrderRecord, ProductRecord};
pub use loader::{load_geo_boundaries, load_tables, BaseTables, LoadError};
pub use dataset::{Dataset, DateRange, EnrichedRow};
pub use aggregate::{
    category_summary, daily_summary, hourly_summary, monthly_summary, region_summary,
    CategorySummary, DailySummary, GroupMeasures, HourlySummary, MonthlySummary, RegionSummary,
};
pub use rfm::{compute_rfm, segment_summary, RfmRecord, Segment, SegmentSummary};
pub use insights::{Finding, FindingKind, Metric};
pub use pipeline::{Snapshot, WindowKpis};
pub use server::{run_server, ApiError, AppState, ServerConfig};
