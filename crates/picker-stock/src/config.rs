//! Configuration for the fetch / score / commentary cycle

use crate::api::yahoo::HistoryRange;
use crate::error::{Result, StockError};
use crate::universe::Universe;
use picker_core::ScoringModel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shortest auto-refresh interval, in minutes
pub const MIN_REFRESH_MINUTES: u64 = 1;

/// Longest auto-refresh interval, in minutes
pub const MAX_REFRESH_MINUTES: u64 = 30;

/// Configuration for one stock-picker deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockConfig {
    /// Which sub-score set ranks the universe
    pub scoring_model: ScoringModel,

    /// Symbols fetched every cycle
    pub universe: Universe,

    /// Time between refresh cycles (1 to 30 minutes)
    pub refresh_interval: Duration,

    /// Maximum number of tickers fetched at once
    pub fetch_concurrency: usize,

    /// Price history window requested from Yahoo Finance
    pub history_range: HistoryRange,

    /// Request timeout duration
    pub request_timeout: Duration,

    /// Alpha Vantage API key (optional; fundamentals and sentiment are skipped without it)
    pub alpha_vantage_api_key: Option<String>,

    /// Alpha Vantage requests per minute
    pub alpha_vantage_rate_limit: u32,

    /// How long a company overview is reused before Alpha Vantage is asked again
    pub fundamentals_ttl: Duration,

    /// Ask Alpha Vantage for news sentiment as well (one more request per ticker)
    pub news_sentiment: bool,

    /// Chat model used for commentary
    pub openai_model: String,

    /// How long a generated commentary is reused
    pub commentary_ttl: Duration,

    /// Token budget for one commentary
    pub commentary_max_tokens: usize,

    /// Sampling temperature for commentary
    pub commentary_temperature: f32,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            scoring_model: ScoringModel::default(),
            universe: Universe::default_universe(),
            refresh_interval: Duration::from_secs(MAX_REFRESH_MINUTES * 60),
            fetch_concurrency: 4,
            history_range: HistoryRange::ThreeMonths,
            request_timeout: Duration::from_secs(30),
            alpha_vantage_api_key: None,
            alpha_vantage_rate_limit: 5, // free tier
            fundamentals_ttl: Duration::from_secs(24 * 60 * 60),
            news_sentiment: false,
            openai_model: "gpt-4".to_string(),
            commentary_ttl: Duration::from_secs(MAX_REFRESH_MINUTES * 60),
            commentary_max_tokens: 150,
            commentary_temperature: 0.5,
        }
    }
}

impl StockConfig {
    /// Create a new configuration builder
    pub fn builder() -> StockConfigBuilder {
        StockConfigBuilder::default()
    }

    /// Load Alpha Vantage API key from environment
    pub fn with_env_api_key(mut self) -> Self {
        if let Some(key) = env_var("ALPHA_VANTAGE_API_KEY") {
            self.alpha_vantage_api_key = Some(key);
        }
        self
    }

    /// Load every key and model override the cycle understands from the environment
    pub fn with_env_all_keys(mut self) -> Self {
        if let Some(model) = env_var("OPENAI_MODEL") {
            self.openai_model = model;
        }
        self.with_env_api_key()
    }

    /// Refresh interval in whole minutes
    pub fn refresh_minutes(&self) -> u64 {
        self.refresh_interval.as_secs() / 60
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let minutes = self.refresh_minutes();
        if !(MIN_REFRESH_MINUTES..=MAX_REFRESH_MINUTES).contains(&minutes)
            || self.refresh_interval.as_secs() % 60 != 0
        {
            return Err(StockError::ConfigError(format!(
                "refresh interval must be a whole number of minutes between {MIN_REFRESH_MINUTES} and {MAX_REFRESH_MINUTES}"
            )));
        }

        if self.universe.is_empty() {
            return Err(StockError::ConfigError("universe must not be empty".to_string()));
        }

        if self.fetch_concurrency == 0 {
            return Err(StockError::ConfigError(
                "fetch_concurrency must be greater than 0".to_string(),
            ));
        }

        if self.alpha_vantage_rate_limit == 0 {
            return Err(StockError::ConfigError(
                "alpha_vantage_rate_limit must be greater than 0".to_string(),
            ));
        }

        if self.openai_model.trim().is_empty() {
            return Err(StockError::ConfigError("openai_model must not be blank".to_string()));
        }

        if self.commentary_max_tokens == 0 {
            return Err(StockError::ConfigError(
                "commentary_max_tokens must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.commentary_temperature) {
            return Err(StockError::ConfigError(
                "commentary_temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Non-blank environment variable
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Builder for StockConfig
#[derive(Debug, Default)]
pub struct StockConfigBuilder {
    scoring_model: Option<ScoringModel>,
    universe: Option<Universe>,
    refresh_interval: Option<Duration>,
    fetch_concurrency: Option<usize>,
    history_range: Option<HistoryRange>,
    request_timeout: Option<Duration>,
    alpha_vantage_api_key: Option<String>,
    alpha_vantage_rate_limit: Option<u32>,
    fundamentals_ttl: Option<Duration>,
    news_sentiment: Option<bool>,
    openai_model: Option<String>,
    commentary_ttl: Option<Duration>,
    commentary_max_tokens: Option<usize>,
    commentary_temperature: Option<f32>,
}

impl StockConfigBuilder {
    /// Set the scoring model
    pub fn scoring_model(mut self, model: ScoringModel) -> Self {
        self.scoring_model = Some(model);
        self
    }

    /// Set the symbols fetched each cycle
    pub fn universe(mut self, universe: Universe) -> Self {
        self.universe = Some(universe);
        self
    }

    /// Set the refresh interval in minutes
    pub fn refresh_interval_minutes(mut self, minutes: u64) -> Self {
        self.refresh_interval = Some(Duration::from_secs(minutes * 60));
        self
    }

    /// Set the fetch concurrency
    pub fn fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = Some(concurrency);
        self
    }

    /// Set the price history window
    pub fn history_range(mut self, range: HistoryRange) -> Self {
        self.history_range = Some(range);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set Alpha Vantage API key
    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.alpha_vantage_api_key = Some(key.into());
        self
    }

    /// Set Alpha Vantage requests per minute
    pub fn alpha_vantage_rate_limit(mut self, per_minute: u32) -> Self {
        self.alpha_vantage_rate_limit = Some(per_minute);
        self
    }

    /// Set how long company fundamentals are memoized
    pub fn fundamentals_ttl(mut self, ttl: Duration) -> Self {
        self.fundamentals_ttl = Some(ttl);
        self
    }

    /// Enable or disable the news sentiment request
    pub fn news_sentiment(mut self, enabled: bool) -> Self {
        self.news_sentiment = Some(enabled);
        self
    }

    /// Set the chat model used for commentary
    pub fn openai_model(mut self, model: impl Into<String>) -> Self {
        self.openai_model = Some(model.into());
        self
    }

    /// Set how long commentary is memoized
    pub fn commentary_ttl(mut self, ttl: Duration) -> Self {
        self.commentary_ttl = Some(ttl);
        self
    }

    /// Set the commentary token budget
    pub fn commentary_max_tokens(mut self, max_tokens: usize) -> Self {
        self.commentary_max_tokens = Some(max_tokens);
        self
    }

    /// Set the commentary sampling temperature
    pub fn commentary_temperature(mut self, temperature: f32) -> Self {
        self.commentary_temperature = Some(temperature);
        self
    }

    /// Load Alpha Vantage API key from environment
    pub fn with_env_api_key(mut self) -> Self {
        if let Some(key) = env_var("ALPHA_VANTAGE_API_KEY") {
            self.alpha_vantage_api_key = Some(key);
        }
        self
    }

    /// Load the Alpha Vantage key and the `OPENAI_MODEL` override from environment
    pub fn with_env_all_keys(mut self) -> Self {
        if let Some(model) = env_var("OPENAI_MODEL") {
            self.openai_model = Some(model);
        }
        self.with_env_api_key()
    }

    /// Build the configuration
    pub fn build(self) -> Result<StockConfig> {
        let defaults = StockConfig::default();

        let config = StockConfig {
            scoring_model: self.scoring_model.unwrap_or(defaults.scoring_model),
            universe: self.universe.unwrap_or(defaults.universe),
            refresh_interval: self.refresh_interval.unwrap_or(defaults.refresh_interval),
            fetch_concurrency: self.fetch_concurrency.unwrap_or(defaults.fetch_concurrency),
            history_range: self.history_range.unwrap_or(defaults.history_range),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            alpha_vantage_api_key: self.alpha_vantage_api_key,
            alpha_vantage_rate_limit: self
                .alpha_vantage_rate_limit
                .unwrap_or(defaults.alpha_vantage_rate_limit),
            fundamentals_ttl: self.fundamentals_ttl.unwrap_or(defaults.fundamentals_ttl),
            news_sentiment: self.news_sentiment.unwrap_or(defaults.news_sentiment),
            openai_model: self.openai_model.unwrap_or(defaults.openai_model),
            commentary_ttl: self.commentary_ttl.unwrap_or(defaults.commentary_ttl),
            commentary_max_tokens: self
                .commentary_max_tokens
                .unwrap_or(defaults.commentary_max_tokens),
            commentary_temperature: self
                .commentary_temperature
                .unwrap_or(defaults.commentary_temperature),
        };

        config.validate()?;
        Ok(config)
    }
}
