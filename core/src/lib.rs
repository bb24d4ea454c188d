//! # Funding Ledger Core
//!
//! Statistics and forecasting engine for funding-rate transaction exports.
//!
//! A request flows through five stages, each rebuilt from the raw text on every
//! call with no state kept between calls:
//!
//! - [`csv`]: tokenizes one line, honouring double-quoted commas
//! - [`document`]: splits the text into header and rows and discovers markets
//! - [`filter`]: keeps the rows of the selected markets
//! - [`stats`]: per-market totals, rate extrema, date range and year-end forecast
//! - [`chart`]: per-market rate series sorted by time
//!
//! [`report::FundingReport`] runs the whole pipeline.
//!
//! ```
//! use chrono::Utc;
//! use funding_ledger_core::{FundingReport, MarketSelection};
//!
//! let csv = "market,side,ts,size,payment,rate\n\
//!            BTC,long,2024-01-01T00:00:00Z,1,10,0.01%\n\
//!            BTC,short,2024-01-02T00:00:00Z,1,20,0.02%";
//! let report = FundingReport::build(Some(csv), &MarketSelection::new(["BTC"]), Utc::now())?;
//! assert_eq!(report.stats["BTC"].total_payment, 30.0);
//! # Ok::<(), funding_ledger_core::ValidationError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications, missing_debug_implementations)]

pub mod chart;
pub mod csv;
pub mod document;
pub mod error;
pub mod filter;
pub mod parse;
pub mod record;
pub mod report;
pub mod stats;

pub use chart::{build_chart_series, ChartPoint, ChartSeries, ChartSeriesMap, Timeframe};
pub use document::{FundingDocument, MarketSet};
pub use error::{CoreResult, UnknownTimeframe, ValidationError};
pub use filter::{filter_rows, MarketSelection};
pub use record::{NumericField, RawRecord, RATE_SCALE};
pub use report::FundingReport;
pub use stats::{compute_statistics, DataQuality, MarketStatistics, StatisticsMap, YearEndProjection};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
