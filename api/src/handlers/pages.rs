//! Browser-facing handlers: upload form, market selection and report page

use axum::{extract::Multipart, response::Html};
use axum_extra::extract::Form;
use chrono::Utc;
use funding_ledger_core::{FundingDocument, FundingReport, MarketSelection, ValidationError};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::models::ViewForm;
use crate::render;

/// Multipart field carrying the uploaded export
pub const UPLOAD_FIELD: &str = "csvFile";

/// `GET /`
pub async fn index() -> Html<String> {
    Html(render::upload_page())
}

/// `POST /upload`
///
/// Reads the `csvFile` part, discovers its markets and answers with the
/// selection page. The raw text is echoed back in a hidden field so the
/// follow-up `/view` request is self contained.
pub async fn upload(mut multipart: Multipart) -> ApiResult<Html<String>> {
    let mut csv_text = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            let file_name = field.file_name().map(str::to_string);
            let text = field.text().await?;
            debug!(file = ?file_name, bytes = text.len(), "received upload");
            csv_text = Some(text);
            break;
        }
    }

    let csv_text = csv_text
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ApiError::validation("No CSV file uploaded", Some(UPLOAD_FIELD)))?;

    let document = FundingDocument::parse(&csv_text)?;
    let markets = document.markets();

    metrics::increment_counter!("funding_uploads_total");
    info!(
        rows = document.rows().len(),
        markets = markets.len(),
        "parsed funding upload"
    );

    Ok(Html(render::selection_page(&csv_text, &markets)))
}

/// `POST /view`
pub async fn view(Form(form): Form<ViewForm>) -> ApiResult<Html<String>> {
    let csv_text = form
        .csv_data
        .as_deref()
        .filter(|text| !text.is_empty())
        .ok_or(ValidationError::MissingData)?;
    let selection = MarketSelection::new(form.markets);

    let report = FundingReport::build(Some(csv_text), &selection, Utc::now())?;

    metrics::increment_counter!("funding_reports_total");
    metrics::histogram!("funding_rows_processed", report.row_count() as f64);

    Ok(Html(render::report_page(&report)?))
}
