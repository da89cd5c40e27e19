//! One refresh cycle: fetch, rank, comment

use crate::commentary::CommentaryGenerator;
use crate::config::StockConfig;
use crate::error::Result;
use crate::fetcher::{DataFetcher, MarketDataSource};
use crate::universe::Universe;
use chrono::{DateTime, Utc};
use picker_core::{Ranking, ScoringEngine};
use picker_llm::LLMProvider;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Everything a refresh cycle produces for presentation
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub ranking: Ranking,
    /// `(symbol, commentary)` in ranking order; empty when commentary is disabled
    pub commentary: Vec<(String, String)>,
    pub generated_at: DateTime<Utc>,
}

impl CycleReport {
    /// Commentary for one of the top picks
    pub fn commentary_for(&self, symbol: &str) -> Option<&str> {
        self.commentary
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, text)| text.as_str())
    }
}

/// Runs the fetch / score / commentary pipeline over a fixed universe
pub struct PickerEngine {
    universe: Universe,
    fetcher: DataFetcher,
    scoring: ScoringEngine,
    commentary: Option<CommentaryGenerator>,
}

impl PickerEngine {
    /// Create an engine; `provider` is `None` when no LLM key is configured
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        provider: Option<Arc<dyn LLMProvider>>,
        config: &StockConfig,
    ) -> Self {
        Self {
            universe: config.universe.clone(),
            fetcher: DataFetcher::new(source, config.fetch_concurrency),
            scoring: ScoringEngine::new(config.scoring_model),
            commentary: Some(CommentaryGenerator::new(provider, config)),
        }
    }

    /// Skip the commentary step entirely
    pub fn without_commentary(mut self) -> Self {
        self.commentary = None;
        self
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Run one full cycle
    ///
    /// Scoring runs on the rayon pool from a blocking task, off the async workers.
    #[instrument(skip(self), fields(model = %self.scoring.model(), universe = self.universe.len()))]
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let batch = self.fetcher.fetch(&self.universe).await;
        let scoring = self.scoring;
        let ranking = tokio::task::spawn_blocking(move || scoring.rank_parallel(&batch)).await?;

        let commentary = match &self.commentary {
            Some(generator) => generator.for_ranking(&ranking).await,
            None => Vec::new(),
        };

        info!(
            qualifying = ranking.qualifying_count,
            coverage_pct = ranking.coverage_pct(),
            "refresh cycle complete"
        );

        Ok(CycleReport {
            ranking,
            commentary,
            generated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commentary::MISSING_KEY_MESSAGE;
    use crate::fetcher::MockMarketDataSource;
    use chrono::{Days, NaiveDate};
    use picker_core::{PriceBar, ScoringModel};

    fn bars(n: usize, last_move_pct: f64) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let mut bars: Vec<PriceBar> = (0..n)
            .map(|i| PriceBar::new(start + Days::new(i as u64), 50.0, 10_000))
            .collect();
        if let Some(last) = bars.last_mut() {
            last.close = 50.0 * (1.0 + last_move_pct / 100.0);
        }
        bars
    }

    fn mock_source() -> MockMarketDataSource {
        let mut mock = MockMarketDataSource::new();
        mock.expect_price_history().returning(|symbol| {
            Ok(match symbol {
                "NVDA" => bars(60, 4.0),
                "TSLA" => bars(60, 1.0),
                "SOFI" => bars(12, 9.0),
                _ => bars(60, 2.5),
            })
        });
        mock.expect_fundamentals().returning(|_| Ok(None));
        mock.expect_news_sentiment().returning(|_| Ok(None));
        mock
    }

    fn config() -> StockConfig {
        StockConfig::builder()
            .scoring_model(ScoringModel::PriceAction)
            .universe(Universe::from_symbols(["TSLA", "NVDA", "SOFI", "AMD"]))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_cycle_ranks_and_comments() {
        let engine = PickerEngine::new(Arc::new(mock_source()), None, &config());
        let report = engine.run_cycle().await.unwrap();

        let symbols: Vec<&str> = report.ranking.top.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["NVDA", "AMD", "TSLA"]);
        assert_eq!(report.ranking.qualifying_count, 3);
        assert!((report.ranking.coverage_pct() - 75.0).abs() < 1e-9);
        assert_eq!(report.commentary.len(), 3);
        assert_eq!(report.commentary_for("NVDA"), Some(MISSING_KEY_MESSAGE));
    }

    #[tokio::test]
    async fn test_cycle_without_commentary() {
        let engine =
            PickerEngine::new(Arc::new(mock_source()), None, &config()).without_commentary();
        let report = engine.run_cycle().await.unwrap();

        assert_eq!(report.ranking.top.len(), 3);
        assert!(report.commentary.is_empty());
        assert_eq!(report.commentary_for("NVDA"), None);
    }
}
