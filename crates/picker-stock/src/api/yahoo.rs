//! Yahoo Finance API client

use crate::error::{Result, StockError};
use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use picker_core::PriceBar;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use yahoo_finance_api as yahoo;

/// Yahoo Finance API client
#[derive(Debug, Clone, Default)]
pub struct YahooFinanceClient {}

/// Daily quote data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adjclose: f64,
}

impl Quote {
    /// Daily bar used by the scoring engine
    pub fn to_price_bar(&self) -> PriceBar {
        PriceBar::new(self.timestamp.date_naive(), self.close, self.volume)
    }
}

/// Look-back window for historical quotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryRange {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "ytd")]
    YearToDate,
}

impl HistoryRange {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryRange::OneMonth => "1mo",
            HistoryRange::ThreeMonths => "3mo",
            HistoryRange::SixMonths => "6mo",
            HistoryRange::OneYear => "1y",
            HistoryRange::YearToDate => "ytd",
        }
    }

    /// First instant of the window ending at `end`
    pub fn start(self, end: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let days = match self {
            HistoryRange::OneMonth => 30,
            HistoryRange::ThreeMonths => 90,
            HistoryRange::SixMonths => 180,
            HistoryRange::OneYear => 365,
            HistoryRange::YearToDate => {
                return NaiveDate::from_ymd_opt(end.year(), 1, 1)
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|start| start.and_utc())
                    .ok_or_else(|| {
                        StockError::YahooFinanceError(format!(
                            "Invalid start of year for {}",
                            end.year()
                        ))
                    });
            }
        };
        Ok(end - TimeDelta::days(days))
    }
}

impl fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryRange {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1mo" => Ok(HistoryRange::OneMonth),
            "3mo" => Ok(HistoryRange::ThreeMonths),
            "6mo" => Ok(HistoryRange::SixMonths),
            "1y" => Ok(HistoryRange::OneYear),
            "ytd" => Ok(HistoryRange::YearToDate),
            other => Err(StockError::ConfigError(format!("Invalid range: {other}"))),
        }
    }
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new() -> Self {
        Self {}
    }

    fn connector() -> Result<yahoo::YahooConnector> {
        yahoo::YahooConnector::new().map_err(|e| StockError::YahooFinanceError(e.to_string()))
    }

    /// Get the latest quote for a symbol
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        let response = Self::connector()?
            .get_latest_quotes(symbol, "1d")
            .await
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let quote = response
            .last_quote()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        Ok(convert_quote(symbol, &quote))
    }

    /// Get historical quotes for a symbol
    pub async fn get_historical_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Quote>> {
        // Convert chrono DateTime to time OffsetDateTime
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp()).map_err(|e| {
            StockError::YahooFinanceError(format!("Invalid start timestamp: {e}"))
        })?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| StockError::YahooFinanceError(format!("Invalid end timestamp: {e}")))?;

        let response = Self::connector()?
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        Ok(quotes.iter().map(|q| convert_quote(symbol, q)).collect())
    }

    /// Get historical quotes for a look-back window ending now
    pub async fn get_historical_range(&self, symbol: &str, range: HistoryRange) -> Result<Vec<Quote>> {
        let end = Utc::now();
        let start = range.start(end)?;
        self.get_historical_quotes(symbol, start, end).await
    }
}

fn convert_quote(symbol: &str, quote: &yahoo::Quote) -> Quote {
    Quote {
        symbol: symbol.to_string(),
        timestamp: DateTime::from_timestamp(quote.timestamp as i64, 0).unwrap_or_else(Utc::now),
        open: quote.open,
        high: quote.high,
        low: quote.low,
        close: quote.close,
        volume: quote.volume,
        adjclose: quote.adjclose,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_parsing() {
        assert_eq!("3mo".parse::<HistoryRange>().unwrap(), HistoryRange::ThreeMonths);
        assert_eq!(HistoryRange::YearToDate.to_string(), "ytd");
        assert!("10y".parse::<HistoryRange>().is_err());
    }

    #[test]
    fn test_range_start() {
        let end = DateTime::parse_from_rfc3339("2024-07-15T16:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let start = HistoryRange::ThreeMonths.start(end).unwrap();
        assert_eq!((end - start).num_days(), 90);

        let ytd = HistoryRange::YearToDate.start(end).unwrap();
        assert_eq!(ytd.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_quote_to_price_bar() {
        let quote = Quote {
            symbol: "NVDA".to_string(),
            timestamp: DateTime::from_timestamp(1_718_000_000, 0).unwrap(),
            open: 120.0,
            high: 125.0,
            low: 119.0,
            close: 121.5,
            volume: 3_000_000,
            adjclose: 121.5,
        };
        let bar = quote.to_price_bar();
        assert_eq!(bar.close, 121.5);
        assert_eq!(bar.volume, Some(3_000_000));
        assert_eq!(bar.date, quote.timestamp.date_naive());
    }

    #[test]
    fn test_range_serde_uses_short_form() {
        let json = serde_json::to_string(&HistoryRange::ThreeMonths).unwrap();
        assert_eq!(json, "\"3mo\"");
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_get_quote() {
        let client = YahooFinanceClient::new();
        let quote = client.get_quote("AAPL").await.unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert!(quote.close > 0.0);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_get_historical_range() {
        let client = YahooFinanceClient::new();
        let quotes = client
            .get_historical_range("NVDA", HistoryRange::ThreeMonths)
            .await
            .unwrap();
        assert!(quotes.len() >= 20);
    }
}
