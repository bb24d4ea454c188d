//! The extract → filter → aggregate → chart pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chart::{build_chart_series, ChartSeriesMap, Timeframe};
use crate::document::FundingDocument;
use crate::error::{CoreResult, ValidationError};
use crate::filter::{filter_rows, MarketSelection};
use crate::record::RawRecord;
use crate::stats::{compute_statistics, StatisticsMap};

/// Everything a renderer needs for one view request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingReport {
    /// Moment the forecast was computed against
    pub generated_at: DateTime<Utc>,
    /// All markets discovered in the document, sorted
    pub markets: Vec<String>,
    /// Markets requested for this view, in submission order
    pub selected_markets: Vec<String>,
    /// Header labels
    pub headers: RawRecord,
    /// Selected rows in file order
    pub rows: Vec<RawRecord>,
    /// Per-market statistics
    pub stats: StatisticsMap,
    /// Per-market rate series
    pub charts: ChartSeriesMap,
}

impl FundingReport {
    /// Runs the full pipeline over raw CSV text.
    ///
    /// Validation happens before any aggregation: missing text, a document
    /// without data rows and an empty selection are all rejected.
    pub fn build(
        csv_text: Option<&str>,
        selection: &MarketSelection,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        let text = csv_text
            .filter(|text| !text.is_empty())
            .ok_or(ValidationError::MissingData)?;
        selection.ensure_not_empty()?;

        let document = FundingDocument::parse(text)?;
        Ok(Self::from_document(&document, selection, now))
    }

    /// Runs filter, aggregation and charting over an already parsed document
    pub fn from_document(
        document: &FundingDocument,
        selection: &MarketSelection,
        now: DateTime<Utc>,
    ) -> Self {
        let rows = filter_rows(document.rows(), selection);
        let stats = compute_statistics(&rows, now);
        let charts = build_chart_series(&rows, selection);

        info!(
            selected = selection.len(),
            rows = rows.len(),
            markets_with_data = stats.len(),
            "built funding report"
        );

        Self {
            generated_at: now,
            markets: document.markets(),
            selected_markets: selection.iter().map(str::to_string).collect(),
            headers: document.header().clone(),
            rows,
            stats,
            charts,
        }
    }

    /// Restricts every chart series to `timeframe`
    pub fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        let now = self.generated_at;
        for series in self.charts.values_mut() {
            *series = series.within(timeframe, now);
        }
        self
    }

    /// Number of selected rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Sum of payments across all selected markets
    pub fn total_payment(&self) -> f64 {
        self.stats.values().map(|stats| stats.total_payment).sum()
    }

    /// Sum of year-end forecasts across all selected markets
    pub fn total_forecast(&self) -> f64 {
        self.stats.values().map(|stats| stats.year_end_forecast).sum()
    }
}
