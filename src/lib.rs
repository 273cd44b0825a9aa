//! # sales_dashboard
//!
//! Aggregation engine behind a single-page sales dashboard. It loads a
//! superstore-style CSV once and computes, for a chosen year:
//!
//! - Memory-mapped CSV loading with parallel, quote-aware chunk parsing
//! - A year filter producing a zero-copy view of the table
//! - Scalar aggregates (sum, mean, min, max, distinct count)
//! - Group-by aggregation in ascending key order
//! - Top-N ranking with stable tie handling
//! - A shipping-time gauge (mean inside a [min, max] range)
//! - AVX2 SIMD acceleration for the numeric scans (scalar fallback)
//!
//! # Example
//!
//! ```rust
//! use sales_dashboard::{DashboardConfig, LoadOptions, SalesTable, YearSelection, build_report};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let csv = "Year,Category,Product Name,Sales,Profit,Order ID,Days to ship\n\
//!                2021,Furniture,Chair,120.5,20,CA-1,4\n\
//!                2021,Technology,Phone,800,150,CA-2,2\n\
//!                2022,Furniture,Desk,300,-12,CA-3,6\n";
//!     let (table, summary) = SalesTable::from_csv_bytes(csv, &LoadOptions::default())?;
//!     assert_eq!(summary.rows_loaded, 3);
//!
//!     let report = build_report(&table, YearSelection::Year(2021), &DashboardConfig::default());
//!     assert_eq!(report.summary.order_count, 2);
//!     assert_eq!(report.top_sales.bars[0].label.to_string(), "Phone");
//!     println!("{report}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dashboard;
mod helpers;
pub mod processor;

pub use config::{ConfigError, DashboardConfig};
pub use dashboard::{DashboardReport, build_report};
pub use processor::sales_table::SalesTable;
pub use processor::year_filter::{TableView, YearOptions, YearSelection, select};
pub use processor::{
    AggregateOp, AggregateResult, InvalidValuePolicy, LoadOptions, ParseSummary, ProcessorError,
};
