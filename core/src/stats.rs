//! Per-market aggregation and the linear year-end forecast
//!
//! Statistics are rebuilt from the filtered rows on every call. The forecast is
//! a run-rate extrapolation: total payment divided by the observed span in
//! days, multiplied by the days left until `YYYY-12-31T23:59:59Z` of the
//! supplied `now`, and added on top of the total.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::RawRecord;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Statistics keyed by market, ordered by first appearance in the rows
pub type StatisticsMap = IndexMap<String, MarketStatistics>;

/// Counts of cells that were substituted or ignored during aggregation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    /// Payment cells that did not parse and counted as zero
    pub malformed_payments: usize,
    /// Rate cells that did not parse and counted as zero
    pub malformed_rates: usize,
    /// Timestamp cells ignored for first/last date tracking
    pub invalid_timestamps: usize,
}

impl DataQuality {
    /// Whether every cell parsed cleanly
    pub fn is_clean(&self) -> bool {
        self.malformed_payments == 0 && self.malformed_rates == 0 && self.invalid_timestamps == 0
    }
}

/// Aggregate view of one market's funding rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStatistics {
    /// Sum of payments
    pub total_payment: f64,
    /// Mean of scaled rates
    pub avg_rate: f64,
    /// Number of rows
    pub count: usize,
    /// Smallest scaled rate
    pub min_rate: f64,
    /// Largest scaled rate
    pub max_rate: f64,
    /// Earliest valid timestamp
    pub first_date: Option<DateTime<Utc>>,
    /// Latest valid timestamp
    pub last_date: Option<DateTime<Utc>>,
    /// `total_payment` plus the projected remainder of the year
    pub year_end_forecast: f64,
    /// Substitution counters
    pub quality: DataQuality,
}

impl MarketStatistics {
    /// Observed span between first and last valid timestamp, in days
    pub fn days_observed(&self) -> f64 {
        match (self.first_date, self.last_date) {
            (Some(first), Some(last)) => days_between(first, last),
            _ => 0.0,
        }
    }

    /// Forecast inputs and result for this market at `now`
    pub fn projection(&self, now: DateTime<Utc>) -> YearEndProjection {
        YearEndProjection::compute(self.total_payment, self.first_date, self.last_date, now)
    }
}

/// Breakdown of the linear year-end forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearEndProjection {
    pub days_since_start: f64,
    /// Days until year end; negative once the year is over
    pub days_to_year_end: f64,
    pub avg_payment_per_day: f64,
    pub forecasted_additional: f64,
    pub year_end_forecast: f64,
}

impl YearEndProjection {
    pub fn compute(
        total_payment: f64,
        first_date: Option<DateTime<Utc>>,
        last_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let days_since_start = match (first_date, last_date) {
            (Some(first), Some(last)) => days_between(first, last),
            _ => 0.0,
        };
        let days_to_year_end = year_end(now)
            .map(|end| days_between(now, end))
            .unwrap_or(0.0);

        let avg_payment_per_day = if days_since_start > 0.0 {
            total_payment / days_since_start
        } else {
            0.0
        };
        let forecasted_additional = avg_payment_per_day * days_to_year_end.max(0.0);

        Self {
            days_since_start,
            days_to_year_end,
            avg_payment_per_day,
            forecasted_additional,
            year_end_forecast: total_payment + forecasted_additional,
        }
    }
}

/// Last second of `now`'s UTC calendar year
pub fn year_end(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(now.year(), 12, 31)
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|end| end.and_utc())
}

fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Running totals for one market
#[derive(Debug)]
struct MarketAccumulator {
    total_payment: f64,
    rate_sum: f64,
    count: usize,
    min_rate: f64,
    max_rate: f64,
    first_date: Option<DateTime<Utc>>,
    last_date: Option<DateTime<Utc>>,
    quality: DataQuality,
}

impl MarketAccumulator {
    fn new() -> Self {
        Self {
            total_payment: 0.0,
            rate_sum: 0.0,
            count: 0,
            min_rate: f64::INFINITY,
            max_rate: f64::NEG_INFINITY,
            first_date: None,
            last_date: None,
            quality: DataQuality::default(),
        }
    }

    fn observe(&mut self, row: &RawRecord) {
        let payment = row.payment();
        let rate = row.scaled_rate();

        self.total_payment += payment.value;
        self.rate_sum += rate.value;
        self.count += 1;
        self.min_rate = self.min_rate.min(rate.value);
        self.max_rate = self.max_rate.max(rate.value);

        if payment.malformed {
            self.quality.malformed_payments += 1;
        }
        if rate.malformed {
            self.quality.malformed_rates += 1;
        }

        match row.timestamp() {
            Some(ts) => {
                if self.first_date.map_or(true, |first| ts < first) {
                    self.first_date = Some(ts);
                }
                if self.last_date.map_or(true, |last| ts > last) {
                    self.last_date = Some(ts);
                }
            }
            None => self.quality.invalid_timestamps += 1,
        }
    }

    fn finish(self, now: DateTime<Utc>) -> MarketStatistics {
        // Summation error can push the mean an ulp outside the observed range.
        let avg_rate = (self.rate_sum / self.count as f64).clamp(self.min_rate, self.max_rate);
        let projection =
            YearEndProjection::compute(self.total_payment, self.first_date, self.last_date, now);

        MarketStatistics {
            total_payment: self.total_payment,
            avg_rate,
            count: self.count,
            min_rate: self.min_rate,
            max_rate: self.max_rate,
            first_date: self.first_date,
            last_date: self.last_date,
            year_end_forecast: projection.year_end_forecast,
            quality: self.quality,
        }
    }
}

/// Aggregates `rows` per market and projects each market to year end at `now`.
///
/// Markets only appear once they have at least one row.
pub fn compute_statistics(rows: &[RawRecord], now: DateTime<Utc>) -> StatisticsMap {
    let mut accumulators: IndexMap<String, MarketAccumulator> = IndexMap::new();

    for row in rows {
        accumulators
            .entry(row.market().to_string())
            .or_insert_with(MarketAccumulator::new)
            .observe(row);
    }

    debug!(
        markets = accumulators.len(),
        rows = rows.len(),
        "aggregated funding rows"
    );

    accumulators
        .into_iter()
        .map(|(market, acc)| (market, acc.finish(now)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn rows(lines: &[&str]) -> Vec<RawRecord> {
        lines.iter().map(|line| RawRecord::parse(line)).collect()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn two_row_market_matches_reference_figures() {
        let data = rows(&[
            "BTC,long,2024-01-01T00:00:00Z,1,10,0.01%",
            "BTC,short,2024-01-02T00:00:00Z,1,20,0.02%",
        ]);
        let stats = compute_statistics(&data, at(2024, 6, 1, 0, 0, 0));
        let btc = &stats["BTC"];

        assert_eq!(btc.total_payment, 30.0);
        assert_eq!(btc.avg_rate, 1.5);
        assert_eq!(btc.min_rate, 1.0);
        assert_eq!(btc.max_rate, 2.0);
        assert_eq!(btc.count, 2);
        assert_eq!(btc.first_date, Some(at(2024, 1, 1, 0, 0, 0)));
        assert_eq!(btc.last_date, Some(at(2024, 1, 2, 0, 0, 0)));
        assert!(btc.quality.is_clean());
    }

    #[test]
    fn forecast_extrapolates_daily_run_rate() {
        let data = rows(&[
            "BTC,long,2024-12-01T00:00:00Z,1,10,0.01%",
            "BTC,long,2024-12-03T00:00:00Z,1,10,0.01%",
        ]);
        // 20 paid over 2 days, 10 days left at 23:59:59 on Dec 21.
        let now = at(2024, 12, 21, 23, 59, 59);
        let stats = compute_statistics(&data, now);
        let btc = &stats["BTC"];

        assert_eq!(btc.days_observed(), 2.0);
        assert!((btc.year_end_forecast - 120.0).abs() < 1e-9);

        let projection = btc.projection(now);
        assert_eq!(projection.avg_payment_per_day, 10.0);
        assert!((projection.days_to_year_end - 10.0).abs() < 1e-9);
    }

    #[test]
    fn single_row_forecast_equals_total() {
        let data = rows(&["ETH,short,2024-03-01,1,-4.5,0.03%"]);
        let stats = compute_statistics(&data, at(2024, 3, 2, 0, 0, 0));
        let eth = &stats["ETH"];
        assert_eq!(eth.year_end_forecast, eth.total_payment);
        assert_eq!(eth.first_date, eth.last_date);
    }

    #[test]
    fn shared_timestamp_forecast_equals_total() {
        let data = rows(&[
            "ETH,short,2024-03-01,1,1,0.03%",
            "ETH,long,2024-03-01,1,2,0.03%",
        ]);
        let stats = compute_statistics(&data, at(2024, 3, 2, 0, 0, 0));
        assert_eq!(stats["ETH"].year_end_forecast, 3.0);
    }

    #[test]
    fn no_projection_after_year_end() {
        let projection = YearEndProjection::compute(
            50.0,
            Some(at(2024, 1, 1, 0, 0, 0)),
            Some(at(2024, 1, 11, 0, 0, 0)),
            at(2024, 12, 31, 23, 59, 59),
        );
        assert_eq!(projection.avg_payment_per_day, 5.0);
        assert_eq!(projection.forecasted_additional, 0.0);
        assert_eq!(projection.year_end_forecast, 50.0);
    }

    #[test]
    fn year_end_is_last_second_of_utc_year() {
        assert_eq!(
            year_end(at(2025, 2, 14, 9, 0, 0)),
            Some(at(2025, 12, 31, 23, 59, 59))
        );
    }

    #[test]
    fn malformed_numbers_count_as_zero() {
        let data = rows(&[
            "SOL,long,2024-01-01,1,abc,xyz%",
            "SOL,long,2024-01-02,1,4,0.05%",
        ]);
        let stats = compute_statistics(&data, at(2024, 1, 3, 0, 0, 0));
        let sol = &stats["SOL"];

        assert_eq!(sol.total_payment, 4.0);
        assert_eq!(sol.min_rate, 0.0);
        assert_eq!(sol.max_rate, 5.0);
        assert_eq!(sol.avg_rate, 2.5);
        assert_eq!(sol.quality.malformed_payments, 1);
        assert_eq!(sol.quality.malformed_rates, 1);
    }

    #[test]
    fn invalid_timestamps_do_not_move_date_range() {
        let data = rows(&[
            "SOL,long,not-a-date,1,1,0.01%",
            "SOL,long,2024-01-05,1,1,0.01%",
            "SOL,long,2024-01-02,1,1,0.01%",
            "SOL,long,,1,1,0.01%",
        ]);
        let stats = compute_statistics(&data, at(2024, 2, 1, 0, 0, 0));
        let sol = &stats["SOL"];

        assert_eq!(sol.first_date, Some(at(2024, 1, 2, 0, 0, 0)));
        assert_eq!(sol.last_date, Some(at(2024, 1, 5, 0, 0, 0)));
        assert_eq!(sol.quality.invalid_timestamps, 2);
        assert_eq!(sol.count, 4);
    }

    #[test]
    fn all_invalid_timestamps_forecast_equals_total() {
        let data = rows(&["SOL,long,??,1,7,0.01%", "SOL,long,??,1,3,0.01%"]);
        let stats = compute_statistics(&data, at(2024, 2, 1, 0, 0, 0));
        let sol = &stats["SOL"];
        assert_eq!(sol.first_date, None);
        assert_eq!(sol.last_date, None);
        assert_eq!(sol.year_end_forecast, 10.0);
    }

    #[test]
    fn markets_keep_first_appearance_order() {
        let data = rows(&[
            "ETH,long,2024-01-01,1,1,0.01%",
            "BTC,long,2024-01-01,1,1,0.01%",
            "ETH,long,2024-01-02,1,1,0.01%",
        ]);
        let stats = compute_statistics(&data, at(2024, 2, 1, 0, 0, 0));
        assert_eq!(stats.keys().collect::<Vec<_>>(), vec!["ETH", "BTC"]);
        assert_eq!(stats["ETH"].count, 2);
    }

    #[test]
    fn empty_rows_produce_empty_map() {
        assert!(compute_statistics(&[], Utc::now()).is_empty());
    }

    fn row_strategy() -> impl Strategy<Value = String> {
        (
            prop_oneof!["BTC", "ETH", "SOL"],
            0u32..365,
            -1000.0f64..1000.0,
            -1.0f64..1.0,
        )
            .prop_map(|(market, day, payment, rate)| {
                let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i64::from(day));
                format!("{market},long,{date},1,{payment},{rate}%")
            })
    }

    proptest! {
        #[test]
        fn statistics_hold_ordering_invariants(lines in proptest::collection::vec(row_strategy(), 1..60)) {
            let data: Vec<RawRecord> = lines.iter().map(|line| RawRecord::parse(line)).collect();
            let stats = compute_statistics(&data, at(2024, 6, 1, 0, 0, 0));

            let total: usize = stats.values().map(|s| s.count).sum();
            prop_assert_eq!(total, data.len());

            for market in stats.values() {
                prop_assert!(market.count > 0);
                prop_assert!(market.min_rate <= market.avg_rate);
                prop_assert!(market.avg_rate <= market.max_rate);
                prop_assert!(market.first_date <= market.last_date);
            }
        }

        #[test]
        fn aggregation_is_idempotent(lines in proptest::collection::vec(row_strategy(), 1..40)) {
            let data: Vec<RawRecord> = lines.iter().map(|line| RawRecord::parse(line)).collect();
            let now = at(2024, 9, 15, 12, 0, 0);
            prop_assert_eq!(compute_statistics(&data, now), compute_statistics(&data, now));
        }
    }
}
