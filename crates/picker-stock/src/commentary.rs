//! LLM-written recommendation for each top pick
//!
//! Commentary is best effort. A missing provider or a failed completion is turned
//! into a printable "unavailable" sentence instead of an error, and only real
//! answers are memoized.

use crate::cache::{CommentaryCache, Fingerprint};
use crate::config::StockConfig;
use crate::error::{Result, StockError};
use futures::future;
use picker_core::{Ranking, ScoreRecord, ScoringModel};
use picker_llm::{CompletionRequest, LLMProvider, Message};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, warn};

/// System prompt sent with every commentary request
pub const SYSTEM_PROMPT: &str = "You are a financial analyst providing stock investment insights.";

/// Text shown when no LLM provider is configured
pub const MISSING_KEY_MESSAGE: &str = "AI analysis unavailable: OpenAI API key is missing.";

/// Generates and memoizes commentary for score records
pub struct CommentaryGenerator {
    provider: Option<Arc<dyn LLMProvider>>,
    model: String,
    max_tokens: usize,
    temperature: f32,
    cache: CommentaryCache,
}

impl CommentaryGenerator {
    /// Create a generator; `None` means no API key was available
    pub fn new(provider: Option<Arc<dyn LLMProvider>>, config: &StockConfig) -> Self {
        Self {
            provider,
            model: config.openai_model.clone(),
            max_tokens: config.commentary_max_tokens,
            temperature: config.commentary_temperature,
            cache: CommentaryCache::new(config.commentary_ttl),
        }
    }

    /// Whether a provider is configured
    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Commentary for one pick; never fails
    pub async fn commentary(&self, record: &ScoreRecord) -> String {
        let Some(provider) = &self.provider else {
            return MISSING_KEY_MESSAGE.to_string();
        };

        let key = Fingerprint::of(record);
        match self
            .cache
            .get_or_fetch(key, || self.request(provider.as_ref(), record))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(symbol = %record.symbol, error = %e, "commentary request failed");
                format!("AI analysis unavailable: {e}")
            }
        }
    }

    /// Commentary for every pick of a ranking, in ranking order
    pub async fn for_ranking(&self, ranking: &Ranking) -> Vec<(String, String)> {
        future::join_all(ranking.top.iter().map(|record| async move {
            (record.symbol.clone(), self.commentary(record).await)
        }))
        .await
    }

    async fn request(&self, provider: &dyn LLMProvider, record: &ScoreRecord) -> Result<String> {
        let request = CompletionRequest::builder(&self.model)
            .system(SYSTEM_PROMPT)
            .add_message(Message::user(build_prompt(record)))
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build();

        let response = provider.complete(request).await?;
        debug!(
            symbol = %record.symbol,
            provider = provider.name(),
            tokens = response.usage.total(),
            "commentary generated"
        );

        response
            .text()
            .map(str::to_string)
            .ok_or_else(|| StockError::ApiError("empty completion".to_string()))
    }
}

/// User prompt describing one pick's indicators
pub fn build_prompt(record: &ScoreRecord) -> String {
    let features = &record.features;
    let mut prompt = format!(
        "Analyze the stock {} based on the following indicators:\n",
        record.symbol
    );

    let _ = writeln!(
        prompt,
        "- Momentum: {:.2}% (score {:.2}/10)",
        features.momentum_pct, record.momentum_score
    );

    match record.model {
        ScoringModel::Fundamental => {
            let _ = writeln!(
                prompt,
                "- P/E ratio: {:.2}{} (score {:.2}/10)",
                features.pe_ratio,
                default_marker(features.defaulted.pe_ratio),
                record.valuation_score
            );
            let _ = writeln!(
                prompt,
                "- Debt/Equity: {:.2}{} (score {:.2}/10)",
                features.debt_to_equity,
                default_marker(features.defaulted.debt_to_equity),
                record.health_score
            );
            let _ = writeln!(
                prompt,
                "- Return on equity: {:.2}%{} (score {:.2}/10)",
                features.return_on_equity * 100.0,
                default_marker(features.defaulted.return_on_equity),
                record.quality_score.unwrap_or_default()
            );
        }
        ScoringModel::PriceAction => {
            let rsi = features
                .rsi
                .map_or_else(|| "n/a".to_string(), |rsi| format!("{rsi:.2}"));
            let _ = writeln!(prompt, "- RSI: {rsi} (score {:.2}/10)", record.valuation_score);
            let ratio = features
                .volume_ratio
                .map_or_else(|| "n/a".to_string(), |ratio| format!("{ratio:.2}x"));
            let _ = writeln!(
                prompt,
                "- Volume: {} vs 20-day average {:.0} ({ratio}, score {:.2}/10)",
                features.last_volume, features.average_volume, record.health_score
            );
        }
    }

    if !features.defaulted.news_sentiment {
        let _ = writeln!(prompt, "- News sentiment: {:.2}", features.news_sentiment);
    }

    let _ = writeln!(prompt, "- Overall score: {:.2}/10", record.overall_score);
    prompt.push_str(
        "Provide a concise investment recommendation without extensive explanations.",
    );
    prompt
}

fn default_marker(defaulted: bool) -> &'static str {
    if defaulted { " (default)" } else { "" }
}
