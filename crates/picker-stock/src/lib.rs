//! Market data, ticker universe and commentary for stock-picker
//!
//! This crate wraps the pure scoring engine of `picker-core` with everything that
//! touches the outside world during a refresh cycle. It includes:
//!
//! - The ticker universe, grouped by market (France, Asia, US)
//! - Data fetching from Yahoo Finance (price history) and Alpha Vantage
//!   (memoized fundamentals, optional news sentiment) behind the
//!   `MarketDataSource` trait
//! - LLM commentary per top pick, memoized with a TTL
//! - `PickerEngine`, which runs fetch, rank and commentary as one cycle
//!
//! # Example
//!
//! ```rust,no_run
//! use picker_stock::{PickerEngine, StockConfig, YahooDataSource};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StockConfig::builder().with_env_all_keys().build()?;
//!     let source = Arc::new(YahooDataSource::from_config(&config)?);
//!
//!     let engine = PickerEngine::new(source, None, &config);
//!     let report = engine.run_cycle().await?;
//!
//!     for pick in &report.ranking.top {
//!         println!("{} {:.2}", pick.symbol, pick.overall_score);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod commentary;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod universe;

// Re-export main types for convenience
pub use api::{AlphaVantageClient, HistoryRange, YahooFinanceClient};
pub use cache::{CommentaryCache, Fingerprint, FundamentalsCache, TtlCache};
pub use commentary::{CommentaryGenerator, MISSING_KEY_MESSAGE, SYSTEM_PROMPT};
pub use config::StockConfig;
pub use engine::{CycleReport, PickerEngine};
pub use error::{Result, StockError};
pub use fetcher::{DataFetcher, MarketDataSource, YahooDataSource};
pub use universe::{Market, Universe};
