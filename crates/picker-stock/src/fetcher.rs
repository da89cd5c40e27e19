//! Per-cycle market data fetching
//!
//! A [`MarketDataSource`] answers three questions about a symbol. [`DataFetcher`]
//! asks them for every symbol of a [`Universe`] and assembles the ordered
//! [`TickerBatch`] the scoring engine consumes. A failure never aborts the cycle:
//! a missing price history turns the whole record into `None`, a missing
//! fundamentals or sentiment answer only empties that field.

use crate::api::{AlphaVantageClient, HistoryRange, YahooFinanceClient};
use crate::cache::FundamentalsCache;
use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::universe::Universe;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use picker_core::{Fundamentals, PriceBar, TickerBatch, TickerRecord};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default lifetime of a memoized company overview
const FUNDAMENTALS_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Source of raw per-ticker market data
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Daily bars, oldest first
    async fn price_history(&self, symbol: &str) -> Result<Vec<PriceBar>>;

    /// Company fundamentals, `None` when the source has none
    async fn fundamentals(&self, symbol: &str) -> Result<Option<Fundamentals>>;

    /// News sentiment in [-1, 1], `None` when the source has none
    async fn news_sentiment(&self, symbol: &str) -> Result<Option<f64>>;
}

/// Yahoo Finance prices, with Alpha Vantage fundamentals and sentiment when keyed
///
/// Company overviews change slowly and are memoized per symbol, so successive
/// cycles spend the Alpha Vantage quota only on symbols not fetched yet. News
/// sentiment costs one request per ticker and is off unless enabled.
#[derive(Debug, Clone)]
pub struct YahooDataSource {
    yahoo: YahooFinanceClient,
    alpha_vantage: Option<AlphaVantageClient>,
    overviews: FundamentalsCache,
    news_sentiment: bool,
    range: HistoryRange,
}

impl YahooDataSource {
    /// Price history only
    pub fn new(range: HistoryRange) -> Self {
        Self {
            yahoo: YahooFinanceClient::new(),
            alpha_vantage: None,
            overviews: FundamentalsCache::new(FUNDAMENTALS_TTL),
            news_sentiment: false,
            range,
        }
    }

    /// Add Alpha Vantage as the fundamentals and sentiment provider
    pub fn with_alpha_vantage(mut self, client: AlphaVantageClient) -> Self {
        self.alpha_vantage = Some(client);
        self
    }

    /// Set how long a company overview is reused
    pub fn with_fundamentals_ttl(mut self, ttl: Duration) -> Self {
        self.overviews = FundamentalsCache::new(ttl);
        self
    }

    /// Request news sentiment from Alpha Vantage as well
    pub fn with_news_sentiment(mut self, enabled: bool) -> Self {
        self.news_sentiment = enabled;
        self
    }

    /// Build from configuration; Alpha Vantage is used only when a key is set
    pub fn from_config(config: &StockConfig) -> Result<Self> {
        let source = Self::new(config.history_range)
            .with_fundamentals_ttl(config.fundamentals_ttl)
            .with_news_sentiment(config.news_sentiment);
        match &config.alpha_vantage_api_key {
            Some(key) => Ok(source.with_alpha_vantage(AlphaVantageClient::with_timeout(
                key.clone(),
                config.alpha_vantage_rate_limit,
                config.request_timeout,
            )?)),
            None => Ok(source),
        }
    }
}

#[async_trait]
impl MarketDataSource for YahooDataSource {
    async fn price_history(&self, symbol: &str) -> Result<Vec<PriceBar>> {
        let quotes = self.yahoo.get_historical_range(symbol, self.range).await?;
        if quotes.is_empty() {
            return Err(StockError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("no quotes in the {} range", self.range),
            });
        }
        Ok(quotes.iter().map(|q| q.to_price_bar()).collect())
    }

    async fn fundamentals(&self, symbol: &str) -> Result<Option<Fundamentals>> {
        let Some(client) = &self.alpha_vantage else {
            return Ok(None);
        };

        let fundamentals = self
            .overviews
            .get_or_fetch(symbol.to_string(), || async {
                let overview = client.get_company_overview(symbol).await?;
                Ok::<_, StockError>(overview.to_fundamentals())
            })
            .await?;
        Ok(Some(fundamentals))
    }

    async fn news_sentiment(&self, symbol: &str) -> Result<Option<f64>> {
        match &self.alpha_vantage {
            Some(client) if self.news_sentiment => client.get_news_sentiment(symbol).await,
            _ => Ok(None),
        }
    }
}

/// Fetches a universe into an ordered batch with bounded concurrency
pub struct DataFetcher {
    source: Arc<dyn MarketDataSource>,
    concurrency: usize,
}

impl DataFetcher {
    pub fn new(source: Arc<dyn MarketDataSource>, concurrency: usize) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch every symbol of the universe
    ///
    /// The batch lists symbols in universe order regardless of which request
    /// finished first.
    pub async fn fetch(&self, universe: &Universe) -> TickerBatch {
        let batch: TickerBatch = stream::iter(universe.symbols())
            .map(|symbol| async move { (symbol.clone(), self.fetch_one(symbol).await) })
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect();

        let available = batch.iter().filter(|(_, record)| record.is_some()).count();
        info!(
            universe = universe.len(),
            available,
            "market data fetch complete"
        );

        batch
    }

    async fn fetch_one(&self, symbol: &str) -> Option<TickerRecord> {
        let bars = match self.source.price_history(symbol).await {
            Ok(bars) if bars.is_empty() => {
                warn!(symbol, "No data available");
                return None;
            }
            Ok(bars) => bars,
            Err(e) => {
                warn!(symbol, error = %e, "Error fetching price history");
                return None;
            }
        };

        let fundamentals = self.source.fundamentals(symbol).await.unwrap_or_else(|e| {
            warn!(symbol, error = %e, "Error fetching fundamentals");
            None
        });

        let news_sentiment = self.source.news_sentiment(symbol).await.unwrap_or_else(|e| {
            warn!(symbol, error = %e, "Error fetching news sentiment");
            None
        });

        Some(TickerRecord {
            symbol: symbol.to_string(),
            price_series: Some(bars),
            fundamentals,
            news_sentiment,
        })
    }
}
