//! Core error types
//!
//! Structural problems with the supplied document or selection are reported as
//! [`ValidationError`]. Malformed values inside individual rows are never errors;
//! they are substituted locally and surfaced through
//! [`DataQuality`](crate::stats::DataQuality) counters instead.

use thiserror::Error;

/// Validation failures raised before any aggregation runs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No CSV text was supplied at all
    #[error("no CSV data supplied")]
    MissingData,

    /// The document lacks a header plus at least one data row
    #[error("empty document: expected a header and at least one data row, found {lines} non-blank line(s)")]
    EmptyDocument { lines: usize },

    /// The market selection is empty
    #[error("no markets selected")]
    NoMarketsSelected,
}

impl ValidationError {
    /// Name of the request field the error refers to
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingData | ValidationError::EmptyDocument { .. } => "csvData",
            ValidationError::NoMarketsSelected => "markets",
        }
    }
}

/// A timeframe name outside `day`, `week`, `month`, `all` and their aliases
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown timeframe '{0}', expected one of: day, week, month, all")]
pub struct UnknownTimeframe(pub String);

/// Type alias for core results
pub type CoreResult<T> = Result<T, ValidationError>;
