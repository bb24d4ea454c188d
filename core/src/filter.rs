//! Market selection and row filtering

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ValidationError};
use crate::record::RawRecord;

/// The markets a user picked for one view, in the order they were submitted.
///
/// Matching is exact and case-sensitive; duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketSelection {
    markets: IndexSet<String>,
}

impl MarketSelection {
    pub fn new<I, S>(markets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markets: markets.into_iter().map(Into::into).collect(),
        }
    }

    /// Fails with [`ValidationError::NoMarketsSelected`] when nothing was picked
    pub fn ensure_not_empty(&self) -> CoreResult<()> {
        if self.markets.is_empty() {
            return Err(ValidationError::NoMarketsSelected);
        }
        Ok(())
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

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.markets.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for MarketSelection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Rows whose market is in `selection`, in file order
pub fn filter_rows(rows: &[RawRecord], selection: &MarketSelection) -> Vec<RawRecord> {
    rows.iter()
        .filter(|row| selection.contains(row.market()))
        .cloned()
        .collect()
}
