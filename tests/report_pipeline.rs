//! End-to-end pipeline scenarios through the library re-exports

use chrono::{DateTime, TimeZone, Utc};
use funding_ledger::core::{
    compute_statistics, filter_rows, FundingDocument, FundingReport, MarketSelection, Timeframe,
    ValidationError,
};

const REFERENCE: &str = "market,side,ts,size,payment,rate\n\
BTC,long,2024-01-01T00:00:00Z,1,10,0.01%\n\
BTC,short,2024-01-02T00:00:00Z,1,20,0.02%";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

#[test]
fn reference_scenario_statistics() {
    let report = FundingReport::build(Some(REFERENCE), &MarketSelection::new(["BTC"]), now())
        .expect("reference csv is valid");
    let btc = &report.stats["BTC"];

    assert_eq!(btc.total_payment, 30.0);
    assert_eq!(btc.avg_rate, 1.5);
    assert_eq!(btc.min_rate, 1.0);
    assert_eq!(btc.max_rate, 2.0);
    assert_eq!(btc.count, 2);
    assert_eq!(
        btc.first_date,
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(
        btc.last_date,
        Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
    );

    // 30 per day over one observed day, projected to 2024-12-31T23:59:59Z
    let days_left = 213.0 + 86_399.0 / 86_400.0;
    let expected = 30.0 + 30.0 * days_left;
    assert!((btc.year_end_forecast - expected).abs() < 1e-9);
}

#[test]
fn single_row_forecast_equals_total() {
    let csv = "market,side,ts,size,payment,rate\nSOL,long,2024-03-01T00:00:00Z,5,7.25,0.003%";
    let report =
        FundingReport::build(Some(csv), &MarketSelection::new(["SOL"]), now()).unwrap();
    assert_eq!(report.stats["SOL"].year_end_forecast, 7.25);
}

#[test]
fn forecast_adds_nothing_past_year_end() {
    let late = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let report =
        FundingReport::build(Some(REFERENCE), &MarketSelection::new(["BTC"]), late).unwrap();
    // 2025-01-01 lies in a new year, so the projection runs to 2025-12-31
    assert!(report.stats["BTC"].year_end_forecast > 30.0);

    let stats = compute_statistics(
        FundingDocument::parse(REFERENCE).unwrap().rows(),
        Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap(),
    );
    assert_eq!(stats["BTC"].year_end_forecast, 30.0);
}

#[test]
fn empty_inputs_fail_validation() {
    let selection = MarketSelection::new(["BTC"]);
    assert_eq!(
        FundingReport::build(Some(""), &selection, now()),
        Err(ValidationError::MissingData)
    );
    assert!(matches!(
        FundingReport::build(Some("market,side,ts,size,payment,rate\n"), &selection, now()),
        Err(ValidationError::EmptyDocument { .. })
    ));
    assert_eq!(
        FundingReport::build(Some(REFERENCE), &MarketSelection::default(), now()),
        Err(ValidationError::NoMarketsSelected)
    );
}

#[test]
fn quoted_market_keeps_embedded_comma() {
    let csv = "market,side,ts,size,payment,rate\n\"A,B\",long,2024-01-01,1,1,1%";
    let document = FundingDocument::parse(csv).unwrap();
    assert_eq!(document.markets(), vec!["A,B"]);

    let report =
        FundingReport::build(Some(csv), &MarketSelection::new(["A,B"]), now()).unwrap();
    assert_eq!(report.stats["A,B"].max_rate, 100.0);
}

#[test]
fn malformed_numbers_are_zeroed_and_counted() {
    let csv = "market,side,ts,size,payment,rate\n\
        ETH,long,2024-02-01T00:00:00Z,1,n/a,0.01%\n\
        ETH,long,not a date,1,4,??\n\
        ETH,short,2024-02-03T00:00:00Z,1,6,0.03%";
    let report =
        FundingReport::build(Some(csv), &MarketSelection::new(["ETH"]), now()).unwrap();
    let eth = &report.stats["ETH"];

    assert_eq!(eth.total_payment, 10.0);
    assert_eq!(eth.count, 3);
    assert_eq!(eth.min_rate, 0.0);
    assert_eq!(eth.quality.malformed_payments, 1);
    assert_eq!(eth.quality.malformed_rates, 1);
    assert_eq!(eth.quality.invalid_timestamps, 1);
    assert!(eth.first_date <= eth.last_date);
}

#[test]
fn filter_preserves_file_order_across_markets() {
    let csv = "market,side,ts,size,payment,rate\n\
        A,long,2024-01-03,1,1,1%\n\
        B,long,2024-01-02,1,1,1%\n\
        A,long,2024-01-01,1,1,1%\n\
        C,long,2024-01-04,1,1,1%";
    let document = FundingDocument::parse(csv).unwrap();
    let rows = filter_rows(document.rows(), &MarketSelection::new(["C", "A"]));
    let order: Vec<&str> = rows.iter().map(|row| row.timestamp_raw()).collect();
    assert_eq!(order, vec!["2024-01-03", "2024-01-01", "2024-01-04"]);

    let report =
        FundingReport::from_document(&document, &MarketSelection::new(["C", "A"]), now());
    let stats_order: Vec<&str> = report.stats.keys().map(String::as_str).collect();
    assert_eq!(stats_order, vec!["A", "C"]);
    let chart_order: Vec<&str> = report.charts.keys().map(String::as_str).collect();
    assert_eq!(chart_order, vec!["C", "A"]);
    assert_eq!(report.charts["A"].points()[0].date, "2024-01-01");
}

#[test]
fn rebuilding_is_idempotent() {
    let selection = MarketSelection::new(["BTC"]);
    let first = FundingReport::build(Some(REFERENCE), &selection, now()).unwrap();
    let second = FundingReport::build(Some(REFERENCE), &selection, now()).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn timeframe_leaves_statistics_alone() {
    let csv = "market,side,ts,size,payment,rate\n\
        BTC,long,2024-05-31T12:00:00Z,1,1,0.01%\n\
        BTC,long,2024-01-01T00:00:00Z,1,1,0.01%";
    let report = FundingReport::build(Some(csv), &MarketSelection::new(["BTC"]), now())
        .unwrap()
        .with_timeframe("24h".parse::<Timeframe>().unwrap());
    assert_eq!(report.charts["BTC"].len(), 1);
    assert_eq!(report.stats["BTC"].count, 2);
}

#[test]
fn compact_offsets_count_towards_the_date_range() {
    let csv = "market,side,ts,size,payment,rate\n\
        BTC,long,2024-01-01T00:00:00+0000,1,10,0.01%\n\
        BTC,long,2024-01-03T00:00:00+0000,1,10,0.01%";
    let report =
        FundingReport::build(Some(csv), &MarketSelection::new(["BTC"]), now()).unwrap();
    let btc = &report.stats["BTC"];
    assert_eq!(btc.quality.invalid_timestamps, 0);
    assert_eq!(btc.days_observed(), 2.0);
}
