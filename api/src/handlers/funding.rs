//! JSON endpoints over the funding pipeline

use axum::{http::HeaderMap, response::Json};
use chrono::Utc;
use funding_ledger_core::{FundingDocument, FundingReport, MarketSelection, ValidationError};
use tracing::info;

use super::request_id;
use crate::error::ApiResult;
use crate::models::{ApiResponse, MarketsRequest, MarketsResponse, ReportRequest};

/// `POST /api/v1/funding/markets`
pub async fn list_markets(
    headers: HeaderMap,
    Json(request): Json<MarketsRequest>,
) -> ApiResult<Json<ApiResponse<MarketsResponse>>> {
    let text = request
        .csv
        .as_deref()
        .filter(|text| !text.is_empty())
        .ok_or(ValidationError::MissingData)?;
    let document = FundingDocument::parse(text)?;

    Ok(Json(ApiResponse::success_with_request_id(
        MarketsResponse {
            headers: document.header().clone(),
            markets: document.markets(),
            row_count: document.rows().len(),
        },
        request_id(&headers),
    )))
}

/// `POST /api/v1/funding/report`
pub async fn build_report(
    headers: HeaderMap,
    Json(request): Json<ReportRequest>,
) -> ApiResult<Json<ApiResponse<FundingReport>>> {
    let selection = MarketSelection::new(request.markets);
    let mut report = FundingReport::build(request.csv.as_deref(), &selection, Utc::now())?;

    if let Some(timeframe) = request.timeframe {
        report = report.with_timeframe(timeframe);
    }

    metrics::increment_counter!("funding_reports_total");
    metrics::histogram!("funding_rows_processed", report.row_count() as f64);
    info!(
        rows = report.row_count(),
        timeframe = request.timeframe.map(|t| t.as_str()).unwrap_or("all"),
        "served funding report"
    );

    Ok(Json(ApiResponse::success_with_request_id(
        report,
        request_id(&headers),
    )))
}
