//! API request/response models
//!
//! The HTML form payloads mirror the field names the pages submit (`csvFile`,
//! `csvData`, `markets`); the JSON payloads are used by `/api/v1/funding/*`.

use chrono::{DateTime, Utc};
use funding_ledger_core::{RawRecord, Timeframe};
use serde::{Deserialize, Serialize};

/// Standardized API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,

    /// Response data
    pub data: Option<T>,

    /// Response timestamp
    pub timestamp: DateTime<Utc>,

    /// Request ID for tracing
    pub request_id: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            timestamp: Utc::now(),
            request_id: None,
        }
    }

    /// Create a successful response tagged with the request id, when known
    pub fn success_with_request_id(data: T, request_id: Option<String>) -> Self {
        Self {
            request_id,
            ..Self::success(data)
        }
    }
}

/// Form posted by the selection page to `/view`
#[derive(Debug, Default, Deserialize)]
pub struct ViewForm {
    /// Raw CSV text carried through the hidden field
    #[serde(rename = "csvData")]
    pub csv_data: Option<String>,

    /// Every checked market checkbox
    #[serde(default)]
    pub markets: Vec<String>,
}

/// Body of `POST /api/v1/funding/markets`
#[derive(Debug, Deserialize)]
pub struct MarketsRequest {
    /// Raw CSV text
    pub csv: Option<String>,
}

/// Markets discovered in an uploaded document
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketsResponse {
    /// Header labels
    pub headers: RawRecord,
    /// Distinct markets, sorted
    pub markets: Vec<String>,
    /// Number of data rows
    pub row_count: usize,
}

/// Body of `POST /api/v1/funding/report`
#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    /// Raw CSV text
    pub csv: Option<String>,

    /// Markets to include
    #[serde(default)]
    pub markets: Vec<String>,

    /// Optional chart window
    #[serde(default)]
    pub timeframe: Option<Timeframe>,
}
