//! Per-market rate series for time-series charts

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::UnknownTimeframe;
use crate::filter::MarketSelection;
use crate::record::RawRecord;

/// Series keyed by market, in selection order
pub type ChartSeriesMap = IndexMap<String, ChartSeries>;

/// One plotted observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Timestamp cell exactly as it appeared in the CSV
    pub date: String,
    /// Parsed timestamp, `None` when unrecognised
    pub timestamp: Option<DateTime<Utc>>,
    /// Scaled funding rate
    pub rate: f64,
}

/// Date-sorted observations for one market
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartSeries {
    points: Vec<ChartPoint>,
}

impl ChartSeries {
    /// Builds a series from `rows`, sorted by timestamp.
    ///
    /// The sort is stable; rows with unrecognised timestamps sort first.
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a RawRecord>,
    {
        let mut points: Vec<ChartPoint> = rows
            .into_iter()
            .map(|row| ChartPoint {
                date: row.timestamp_raw().to_string(),
                timestamp: row.timestamp(),
                rate: row.scaled_rate().value,
            })
            .collect();
        points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Self { points }
    }

    pub fn points(&self) -> &[ChartPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points with a valid timestamp at or after the timeframe cutoff
    pub fn within(&self, timeframe: Timeframe, now: DateTime<Utc>) -> Self {
        let cutoff = timeframe.cutoff(now);
        Self {
            points: self
                .points
                .iter()
                .filter(|point| point.timestamp.is_some_and(|ts| ts >= cutoff))
                .cloned()
                .collect(),
        }
    }
}

/// Chart window relative to the current moment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// Last 24 hours
    Day,
    /// Last 7 days
    Week,
    /// Last 30 days
    Month,
    /// Everything since the Unix epoch
    #[default]
    All,
}

impl Timeframe {
    /// Earliest timestamp shown for this window
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Timeframe::Day => now - Duration::hours(24),
            Timeframe::Week => now - Duration::days(7),
            Timeframe::Month => now - Duration::days(30),
            Timeframe::All => DateTime::UNIX_EPOCH,
        }
    }

    /// Lowercase wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Day => "day",
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::All => "all",
        }
    }
}

impl FromStr for Timeframe {
    type Err = UnknownTimeframe;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "24h" => Ok(Timeframe::Day),
            "week" | "7d" => Ok(Timeframe::Week),
            "month" | "30d" => Ok(Timeframe::Month),
            "all" => Ok(Timeframe::All),
            _ => Err(UnknownTimeframe(s.to_string())),
        }
    }
}

/// One series per selected market; markets without rows get an empty series
pub fn build_chart_series(rows: &[RawRecord], selection: &MarketSelection) -> ChartSeriesMap {
    selection
        .iter()
        .map(|market| {
            let series = ChartSeries::from_rows(rows.iter().filter(|row| row.market() == market));
            (market.to_string(), series)
        })
        .collect()
}
