//! Positional funding-transaction records
//!
//! Column layout of a funding export row:
//!
//! | index | meaning    |
//! |-------|------------|
//! | 0     | market     |
//! | 1     | side       |
//! | 2     | timestamp  |
//! | 3     | size       |
//! | 4     | payment    |
//! | 5     | rate (`%`) |
//!
//! Missing trailing columns read as empty strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::csv::parse_line;
use crate::parse::{parse_decimal, parse_timestamp};

/// Market identifier column
pub const MARKET_COLUMN: usize = 0;
/// Position side column
pub const SIDE_COLUMN: usize = 1;
/// Timestamp column
pub const TIMESTAMP_COLUMN: usize = 2;
/// Position size column
pub const SIZE_COLUMN: usize = 3;
/// Payment column
pub const PAYMENT_COLUMN: usize = 4;
/// Funding rate column
pub const RATE_COLUMN: usize = 5;

/// Factor applied to the parsed rate cell before display or aggregation
pub const RATE_SCALE: f64 = 100.0;

/// A numeric cell after lenient parsing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericField {
    /// Parsed value, or `0.0` when the cell was malformed
    pub value: f64,
    /// Whether the cell failed to parse
    pub malformed: bool,
}

impl NumericField {
    fn from_cell(parsed: Option<f64>) -> Self {
        match parsed {
            Some(value) => Self {
                value,
                malformed: false,
            },
            None => Self {
                value: 0.0,
                malformed: true,
            },
        }
    }
}

/// One parsed CSV line; arity is not enforced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: Vec<String>,
}

impl RawRecord {
    /// Wraps already-split fields
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Tokenizes one CSV line
    pub fn parse(line: &str) -> Self {
        Self::new(parse_line(line))
    }

    /// All fields in column order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Number of fields on the line
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the line produced no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field at `index`, or `""` when the column is absent
    pub fn field(&self, index: usize) -> &str {
        self.fields.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn market(&self) -> &str {
        self.field(MARKET_COLUMN)
    }

    pub fn side(&self) -> &str {
        self.field(SIDE_COLUMN)
    }

    pub fn timestamp_raw(&self) -> &str {
        self.field(TIMESTAMP_COLUMN)
    }

    /// Parsed timestamp, `None` when the cell is not a recognised date
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.timestamp_raw())
    }

    /// Position size; malformed cells read as zero
    pub fn size(&self) -> NumericField {
        NumericField::from_cell(parse_decimal(self.field(SIZE_COLUMN)))
    }

    /// Funding payment; malformed cells read as zero
    pub fn payment(&self) -> NumericField {
        NumericField::from_cell(parse_decimal(self.field(PAYMENT_COLUMN)))
    }

    /// Funding rate with the first `%` stripped, multiplied by [`RATE_SCALE`].
    ///
    /// Malformed cells read as zero.
    pub fn scaled_rate(&self) -> NumericField {
        let cell = self.field(RATE_COLUMN).replacen('%', "", 1);
        let mut rate = NumericField::from_cell(parse_decimal(&cell));
        rate.value *= RATE_SCALE;
        rate
    }
}

impl From<Vec<String>> for RawRecord {
    fn from(fields: Vec<String>) -> Self {
        Self::new(fields)
    }
}
