//! API clients for market data providers

pub mod alpha_vantage;
pub mod yahoo;

pub use alpha_vantage::{
    AlphaVantageClient, CompanyOverview, NewsArticle, NewsSentimentResponse, TickerSentiment,
};
pub use yahoo::{HistoryRange, Quote, YahooFinanceClient};
