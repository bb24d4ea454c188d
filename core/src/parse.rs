//! Lenient field parsers
//!
//! Both parsers return `None` instead of failing; callers decide how to
//! substitute and whether to count the miss.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Naive date-time layouts, interpreted as UTC
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S UTC",
];

/// Date-time layouts that carry an explicit offset
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S %z",
];

/// Date-only layouts, interpreted as UTC midnight
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parses the longest leading decimal prefix of `input`.
///
/// Leading whitespace is skipped. The prefix grammar is an optional sign,
/// digits with an optional fraction, and an optional exponent, so
/// `"12.5 USDC"` parses as `12.5` while `"$12.5"` does not parse at all.
/// Non-finite results are rejected.
pub fn parse_decimal(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let len = bytes.len();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < len && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < len && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        let frac_digits = frac_end - frac_start;
        if digits > 0 || frac_digits > 0 {
            end = frac_end;
            digits += frac_digits;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < len && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < len && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < len && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parses a timestamp cell into a UTC instant.
///
/// RFC 3339 is tried first, then offset-bearing layouts, then naive
/// date-times and plain dates (both taken as UTC).
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(s, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(s, format) {
            return Some(parsed.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0).map(|midnight| midnight.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn decimal_plain_values() {
        assert_eq!(parse_decimal("10"), Some(10.0));
        assert_eq!(parse_decimal("-0.25"), Some(-0.25));
        assert_eq!(parse_decimal("+3"), Some(3.0));
        assert_eq!(parse_decimal(".5"), Some(0.5));
        assert_eq!(parse_decimal("5."), Some(5.0));
        assert_eq!(parse_decimal("1e3"), Some(1000.0));
        assert_eq!(parse_decimal("2.5E-1"), Some(0.25));
    }

    #[test]
    fn decimal_takes_leading_prefix() {
        assert_eq!(parse_decimal("  12.5 USDC"), Some(12.5));
        assert_eq!(parse_decimal("0.01%"), Some(0.01));
        assert_eq!(parse_decimal("7e"), Some(7.0));
        assert_eq!(parse_decimal("1.2.3"), Some(1.2));
    }

    #[test]
    fn decimal_rejects_non_numeric() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("$12"), None);
        assert_eq!(parse_decimal("."), None);
        assert_eq!(parse_decimal("-"), None);
        assert_eq!(parse_decimal("1e999"), None);
    }

    #[test]
    fn timestamp_rfc3339() {
        let ts = parse_timestamp("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        let shifted = parse_timestamp("2024-01-01T02:00:00+02:00").unwrap();
        assert_eq!(shifted, ts);
    }

    #[test]
    fn timestamp_offset_without_colon() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-01T00:00:00+0000"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T05:30:00+0530"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-01T00:00:00.250-0100"),
            Some(expected + chrono::Duration::milliseconds(3_600_250))
        );
    }

    #[test]
    fn timestamp_naive_forms_are_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-05 08:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T08:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05 08:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05 08:30:00 UTC"), Some(expected));
    }

    #[test]
    fn timestamp_date_only_is_midnight() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-05"), Some(expected));
        assert_eq!(parse_timestamp("2024/03/05"), Some(expected));
    }

    #[test]
    fn timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-01"), None);
    }
}
