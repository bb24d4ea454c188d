//! CSV document extraction and market discovery

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreResult, ValidationError};
use crate::record::RawRecord;

/// Minimum non-blank lines: one header plus one data row
pub const MIN_DOCUMENT_LINES: usize = 2;

/// Distinct market identifiers in order of first appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketSet {
    markets: IndexSet<String>,
}

impl MarketSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `market` if it is non-empty and not yet present.
    ///
    /// Returns `true` when the set grew.
    pub fn insert(&mut self, market: &str) -> bool {
        if market.is_empty() || self.markets.contains(market) {
            return false;
        }
        self.markets.insert(market.to_string())
    }

    pub fn contains(&self, market: &str) -> bool {
        self.markets.contains(market)
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    /// Markets sorted by plain byte-wise string order
    pub fn sorted(&self) -> Vec<String> {
        let mut markets: Vec<String> = self.markets.iter().cloned().collect();
        markets.sort();
        markets
    }
}

impl<'a> FromIterator<&'a str> for MarketSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = MarketSet::new();
        for market in iter {
            set.insert(market);
        }
        set
    }
}

/// A funding export split into header and body records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingDocument {
    header: RawRecord,
    rows: Vec<RawRecord>,
}

impl FundingDocument {
    /// Splits `text` on `\n`, drops blank lines and tokenizes the rest.
    ///
    /// Fails with [`ValidationError::EmptyDocument`] when fewer than
    /// [`MIN_DOCUMENT_LINES`] non-blank lines remain.
    pub fn parse(text: &str) -> CoreResult<Self> {
        let lines: Vec<&str> = text
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .collect();

        if lines.len() < MIN_DOCUMENT_LINES {
            return Err(ValidationError::EmptyDocument { lines: lines.len() });
        }

        let header = RawRecord::parse(lines[0]);
        let rows: Vec<RawRecord> = lines[1..].iter().map(|line| RawRecord::parse(line)).collect();

        debug!(
            columns = header.len(),
            rows = rows.len(),
            "parsed funding document"
        );

        Ok(Self { header, rows })
    }

    /// Header fields, used only as display labels
    pub fn header(&self) -> &RawRecord {
        &self.header
    }

    /// Body records in file order
    pub fn rows(&self) -> &[RawRecord] {
        &self.rows
    }

    /// Set of non-empty market identifiers found in column 0
    pub fn market_set(&self) -> MarketSet {
        self.rows.iter().map(RawRecord::market).collect()
    }

    /// Markets offered for selection, sorted ascending
    pub fn markets(&self) -> Vec<String> {
        self.market_set().sorted()
    }
}
