//! Raw per-ticker input records
//!
//! These are produced by the data-fetch collaborator each refresh cycle and are
//! read-only to the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily bar of a price series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
    /// `None` models a null volume cell from the provider
    pub volume: Option<u64>,
}

impl PriceBar {
    /// Create a bar with a known volume
    pub fn new(date: NaiveDate, close: f64, volume: u64) -> Self {
        Self {
            date,
            close,
            volume: Some(volume),
        }
    }

    /// Create a bar whose volume is unknown
    pub fn without_volume(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close,
            volume: None,
        }
    }
}

/// Company fundamentals; every field may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    /// Expressed as a fraction (0.15 is 15%)
    pub return_on_equity: Option<f64>,
    pub profit_margin: Option<f64>,
}

/// Everything the fetcher knows about one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerRecord {
    pub symbol: String,
    /// Chronological, most recent bar last
    pub price_series: Option<Vec<PriceBar>>,
    pub fundamentals: Option<Fundamentals>,
    /// In [-1, 1]; treated as neutral when absent
    pub news_sentiment: Option<f64>,
}

impl TickerRecord {
    /// Create a record with only a price series
    pub fn new(symbol: impl Into<String>, price_series: Vec<PriceBar>) -> Self {
        Self {
            symbol: symbol.into(),
            price_series: Some(price_series),
            fundamentals: None,
            news_sentiment: None,
        }
    }

    /// Attach fundamentals
    pub fn with_fundamentals(mut self, fundamentals: Fundamentals) -> Self {
        self.fundamentals = Some(fundamentals);
        self
    }

    /// Attach a news sentiment reading
    pub fn with_news_sentiment(mut self, sentiment: f64) -> Self {
        self.news_sentiment = Some(sentiment);
        self
    }

    /// Number of bars in the price series (0 when absent)
    pub fn bar_count(&self) -> usize {
        self.price_series.as_ref().map_or(0, Vec::len)
    }
}

/// Insertion-ordered symbol → record collection
///
/// Iteration order is the order symbols were first inserted. Ranking ties are broken
/// by this order, so it must be the universe order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerBatch {
    entries: Vec<(String, Option<TickerRecord>)>,
}

impl TickerBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for a symbol
    ///
    /// Replacing keeps the symbol where it was first inserted.
    pub fn insert(&mut self, symbol: impl Into<String>, record: Option<TickerRecord>) {
        let symbol = symbol.into();
        if let Some(entry) = self.entries.iter_mut().find(|(s, _)| *s == symbol) {
            entry.1 = record;
        } else {
            self.entries.push((symbol, record));
        }
    }

    /// Look up a symbol's record
    pub fn get(&self, symbol: &str) -> Option<&TickerRecord> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .and_then(|(_, r)| r.as_ref())
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&TickerRecord>)> {
        self.entries.iter().map(|(s, r)| (s.as_str(), r.as_ref()))
    }

    /// Symbols in insertion order
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(s, _)| s.as_str())
    }

    /// Number of symbols, including those without a record
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[(String, Option<TickerRecord>)] {
        &self.entries
    }
}

impl FromIterator<(String, Option<TickerRecord>)> for TickerBatch {
    fn from_iter<I: IntoIterator<Item = (String, Option<TickerRecord>)>>(iter: I) -> Self {
        let mut batch = Self::new();
        for (symbol, record) in iter {
            batch.insert(symbol, record);
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), close, 1_000)
    }

    #[test]
    fn test_batch_preserves_insertion_order() {
        let mut batch = TickerBatch::new();
        batch.insert("TSLA", None);
        batch.insert("AMD", Some(TickerRecord::new("AMD", vec![bar(1, 10.0)])));
        batch.insert("NVDA", None);

        let symbols: Vec<&str> = batch.symbols().collect();
        assert_eq!(symbols, vec!["TSLA", "AMD", "NVDA"]);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_batch_replace_keeps_position() {
        let mut batch = TickerBatch::new();
        batch.insert("A", None);
        batch.insert("B", None);
        batch.insert("A", Some(TickerRecord::new("A", vec![bar(1, 1.0)])));

        let symbols: Vec<&str> = batch.symbols().collect();
        assert_eq!(symbols, vec!["A", "B"]);
        assert_eq!(batch.get("A").map(TickerRecord::bar_count), Some(1));
        assert!(batch.get("B").is_none());
    }

    #[test]
    fn test_record_builders() {
        let record = TickerRecord::new("ML.PA", vec![bar(1, 10.0), bar(2, 11.0)])
            .with_fundamentals(Fundamentals {
                pe_ratio: Some(12.0),
                ..Default::default()
            })
            .with_news_sentiment(0.4);

        assert_eq!(record.bar_count(), 2);
        assert_eq!(record.news_sentiment, Some(0.4));
        assert_eq!(record.fundamentals.unwrap().pe_ratio, Some(12.0));
    }
}
