//! Connectivity probes for the external APIs

use picker_llm::{CompletionRequest, LLMProvider, Message};
use picker_stock::{AlphaVantageClient, YahooFinanceClient};
use std::fmt;

/// Symbol used by the price probes
const PROBE_SYMBOL: &str = "AAPL";

/// Outcome of one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiStatus {
    Working,
    Error(String),
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiStatus::Working => f.write_str("Working"),
            ApiStatus::Error(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for ApiStatus {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(_) => ApiStatus::Working,
            Err(e) => ApiStatus::Error(e.to_string()),
        }
    }
}

/// Fetch the latest AAPL quote
pub async fn check_yahoo(client: &YahooFinanceClient) -> ApiStatus {
    client.get_quote(PROBE_SYMBOL).await.into()
}

/// Ask for a 5-token completion
pub async fn check_openai(provider: Option<&dyn LLMProvider>, model: &str) -> ApiStatus {
    let Some(provider) = provider else {
        return ApiStatus::Error("API Key missing".to_string());
    };

    let request = CompletionRequest::builder(model)
        .system("Test API functionality.")
        .add_message(Message::user("Test OpenAI API"))
        .max_tokens(5)
        .build();

    provider.complete(request).await.into()
}

/// Fetch the AAPL global quote
pub async fn check_alpha_vantage(client: Option<&AlphaVantageClient>) -> ApiStatus {
    match client {
        Some(client) => client.get_quote(PROBE_SYMBOL).await.into(),
        None => ApiStatus::Error("API Key missing".to_string()),
    }
}
