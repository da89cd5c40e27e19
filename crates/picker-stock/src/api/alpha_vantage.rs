//! Alpha Vantage API client
//!
//! Supplies the optional inputs the engine can live without: company fundamentals
//! (`OVERVIEW`) and news sentiment (`NEWS_SENTIMENT`). Every request draws from a
//! shared per-minute quota; once it is spent, requests fail immediately with
//! [`StockError::RateLimitExceeded`] instead of stalling the refresh cycle.

use crate::error::{Result, StockError};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use picker_core::Fundamentals;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://www.alphavantage.co/query";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Alpha Vantage API client
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

/// Company overview data
///
/// Alpha Vantage encodes every number as a string and uses `"None"` or `"-"` for
/// missing values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompanyOverview {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(rename = "MarketCapitalization", default)]
    pub market_cap: Option<String>,
    #[serde(rename = "PERatio", default)]
    pub pe_ratio: Option<String>,
    #[serde(rename = "ReturnOnEquityTTM", default)]
    pub return_on_equity: Option<String>,
    #[serde(default)]
    pub profit_margin: Option<String>,
}

impl CompanyOverview {
    /// Fundamentals as consumed by the scoring engine
    ///
    /// The overview carries no leverage figure, so `debt_to_equity` stays empty and
    /// the engine substitutes its default.
    pub fn to_fundamentals(&self) -> Fundamentals {
        Fundamentals {
            sector: present(self.sector.as_deref()).map(str::to_string),
            industry: present(self.industry.as_deref()).map(str::to_string),
            market_cap: parse_number(self.market_cap.as_deref()),
            pe_ratio: parse_number(self.pe_ratio.as_deref()),
            debt_to_equity: None,
            return_on_equity: parse_number(self.return_on_equity.as_deref()),
            profit_margin: parse_number(self.profit_margin.as_deref()),
        }
    }
}

/// Response of the `NEWS_SENTIMENT` endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsSentimentResponse {
    #[serde(default)]
    pub feed: Vec<NewsArticle>,
}

/// One article of the news feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub ticker_sentiment: Vec<TickerSentiment>,
}

/// Per-ticker sentiment attached to an article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerSentiment {
    pub ticker: String,
    pub relevance_score: String,
    pub ticker_sentiment_score: String,
}

impl NewsSentimentResponse {
    /// Relevance-weighted mean sentiment for `symbol`, in [-1, 1]
    ///
    /// Falls back to the plain mean when every relevance is zero. `None` when no
    /// article scores the ticker.
    pub fn ticker_sentiment(&self, symbol: &str) -> Option<f64> {
        let scores: Vec<(f64, f64)> = self
            .feed
            .iter()
            .flat_map(|article| &article.ticker_sentiment)
            .filter(|entry| entry.ticker.eq_ignore_ascii_case(symbol))
            .filter_map(|entry| {
                let score = parse_number(Some(entry.ticker_sentiment_score.as_str()))?;
                let relevance = parse_number(Some(entry.relevance_score.as_str())).unwrap_or(0.0);
                Some((score, relevance.max(0.0)))
            })
            .collect();

        if scores.is_empty() {
            return None;
        }

        let total_weight: f64 = scores.iter().map(|(_, w)| w).sum();
        let mean = if total_weight > 0.0 {
            scores.iter().map(|(s, w)| s * w).sum::<f64>() / total_weight
        } else {
            scores.iter().map(|(s, _)| s).sum::<f64>() / scores.len() as f64
        };
        Some(mean.clamp(-1.0, 1.0))
    }
}

impl AlphaVantageClient {
    /// Create a new Alpha Vantage client with API key and rate limit
    ///
    /// # Arguments
    /// * `api_key` - Alpha Vantage API key
    /// * `rate_limit` - Maximum requests per minute (5 on the free tier)
    pub fn new(api_key: impl Into<String>, rate_limit: u32) -> Self {
        Self::with_client(Client::new(), api_key, rate_limit)
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_key, rate_limit))
    }

    fn with_client(client: Client, api_key: impl Into<String>, rate_limit: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        Self {
            client,
            api_key: api_key.into(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Create from environment variable ALPHA_VANTAGE_API_KEY with the free-tier rate limit
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ALPHA_VANTAGE_API_KEY").map_err(|_| {
            StockError::ConfigError(
                "ALPHA_VANTAGE_API_KEY environment variable not set".to_string(),
            )
        })?;

        Ok(Self::new(api_key, 5))
    }

    /// Take one request from the per-minute quota
    pub(crate) fn acquire(&self) -> Result<()> {
        self.rate_limiter
            .check()
            .map_err(|_| StockError::RateLimitExceeded {
                provider: "Alpha Vantage".to_string(),
            })
    }

    /// Issue one rate-limited query and surface Alpha Vantage's in-body errors
    async fn query(&self, params: &[(&str, &str)]) -> Result<serde_json::Value> {
        self.acquire()?;

        let response = self
            .client
            .get(BASE_URL)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StockError::AlphaVantageError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let data: serde_json::Value = response.json().await?;
        check_payload(&data)?;
        Ok(data)
    }

    /// Get company overview and fundamental data
    pub async fn get_company_overview(&self, symbol: &str) -> Result<CompanyOverview> {
        let data = self.query(&[("function", "OVERVIEW"), ("symbol", symbol)]).await?;

        // An empty object means the symbol is unknown
        if data.as_object().is_none_or(serde_json::Map::is_empty) {
            return Err(StockError::InvalidSymbol(symbol.to_string()));
        }

        Ok(serde_json::from_value(data)?)
    }

    /// Get relevance-weighted news sentiment for a ticker
    pub async fn get_news_sentiment(&self, symbol: &str) -> Result<Option<f64>> {
        let data = self
            .query(&[("function", "NEWS_SENTIMENT"), ("tickers", symbol), ("limit", "50")])
            .await?;

        let response: NewsSentimentResponse = serde_json::from_value(data)?;
        debug!(symbol, articles = response.feed.len(), "news sentiment feed received");
        Ok(response.ticker_sentiment(symbol))
    }

    /// Get global quote (current price data)
    pub async fn get_quote(&self, symbol: &str) -> Result<serde_json::Value> {
        self.query(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol)]).await
    }
}

/// Map Alpha Vantage's in-body error conventions onto errors
fn check_payload(data: &serde_json::Value) -> Result<()> {
    if let Some(error) = data.get("Error Message") {
        return Err(StockError::AlphaVantageError(error.to_string()));
    }

    // "Note" (older) and "Information" (newer) both signal an exhausted quota
    if data.get("Note").is_some() || data.get("Information").is_some() {
        return Err(StockError::RateLimitExceeded {
            provider: "Alpha Vantage".to_string(),
        });
    }

    Ok(())
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty() && *v != "None" && *v != "-")
}

fn parse_number(raw: Option<&str>) -> Option<f64> {
    present(raw)?.parse::<f64>().ok().filter(|v| v.is_finite())
}
