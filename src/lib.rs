//! # Funding Ledger
//!
//! Turns an exchange's funding-payment CSV export into per-market statistics,
//! a linear year-end forecast and chart-ready rate series, and serves them as
//! an HTML report.
//!
//! ## Architecture
//!
//! The system is organized into modular crates:
//! - `core`: CSV extraction, market filtering, aggregation, forecasting and charting
//! - `api`: Axum HTTP surface with upload, selection and report pages
//!
//! ## Quick Start
//!
//! ```rust
//! use funding_ledger::prelude::*;
//! use chrono::{TimeZone, Utc};
//!
//! let csv = "market,side,time,size,payment,rate\n\
//!            BTC-PERP,long,2024-01-01T00:00:00Z,1,10,0.01%";
//! let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
//! let report = FundingReport::build(Some(csv), &MarketSelection::new(["BTC-PERP"]), now)?;
//! assert_eq!(report.stats["BTC-PERP"].count, 1);
//! # Ok::<(), ValidationError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]

pub use funding_ledger_api as api;
pub use funding_ledger_core as core;

/// Re-exports for convenience
pub mod prelude {
    pub use funding_ledger_api::{ApiConfig, ApiServer};
    pub use funding_ledger_core::{
        FundingDocument, FundingReport, MarketSelection, MarketStatistics, Timeframe,
        ValidationError,
    };
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build information
pub const BUILD_INFO: &str = concat!("Funding Ledger v", env!("CARGO_PKG_VERSION"));
