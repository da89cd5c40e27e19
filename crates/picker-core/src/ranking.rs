//! Ranking of scored tickers into the top picks

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::SkipReason;
use crate::normalize::normalize;
use crate::record::{TickerBatch, TickerRecord};
use crate::scoring::{ScoreRecord, ScoringModel, score};

/// Number of picks returned by a ranking pass
pub const TOP_N: usize = 3;

/// Result of one ranking pass over a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    /// At most [`TOP_N`] records, best first
    pub top: Vec<ScoreRecord>,
    /// Tickers that passed the eligibility gate and were scored
    pub qualifying_count: usize,
    /// Symbols in the batch, with or without a record
    pub universe_size: usize,
    /// Tickers dropped from the ranking, in input order
    pub skipped: Vec<(String, SkipReason)>,
}

impl Ranking {
    /// Share of the universe that produced a score, in percent
    pub fn coverage_pct(&self) -> f64 {
        if self.universe_size == 0 {
            0.0
        } else {
            self.qualifying_count as f64 / self.universe_size as f64 * 100.0
        }
    }

    /// True when no ticker qualified
    pub fn is_empty(&self) -> bool {
        self.top.is_empty()
    }
}

/// Scores, sorts and truncates a batch under a fixed scoring model
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine {
    model: ScoringModel,
}

impl ScoringEngine {
    pub fn new(model: ScoringModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> ScoringModel {
        self.model
    }

    /// Normalize and score a single ticker
    pub fn evaluate(
        &self,
        symbol: &str,
        record: Option<&TickerRecord>,
    ) -> Result<ScoreRecord, SkipReason> {
        let features = normalize(record)?;
        Ok(score(symbol, &features, self.model)?)
    }

    /// Rank a batch sequentially
    pub fn rank(&self, batch: &TickerBatch) -> Ranking {
        let outcomes = batch
            .iter()
            .map(|(symbol, record)| (symbol.to_string(), self.evaluate(symbol, record)))
            .collect();
        self.assemble(batch.len(), outcomes)
    }

    /// Rank a batch with per-ticker work spread over the rayon pool
    ///
    /// The indexed collect keeps input order, so ties resolve exactly as in [`rank`](Self::rank).
    pub fn rank_parallel(&self, batch: &TickerBatch) -> Ranking {
        let outcomes = batch
            .entries()
            .par_iter()
            .map(|(symbol, record)| (symbol.clone(), self.evaluate(symbol, record.as_ref())))
            .collect();
        self.assemble(batch.len(), outcomes)
    }

    fn assemble(
        &self,
        universe_size: usize,
        outcomes: Vec<(String, Result<ScoreRecord, SkipReason>)>,
    ) -> Ranking {
        let mut scored = Vec::new();
        let mut skipped = Vec::new();

        for (symbol, outcome) in outcomes {
            match outcome {
                Ok(record) => scored.push(record),
                Err(reason) => {
                    debug!(symbol = %symbol, reason = %reason, "ticker skipped");
                    skipped.push((symbol, reason));
                }
            }
        }

        let qualifying_count = scored.len();

        // sort_by is stable: equal scores keep input order
        scored.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));
        scored.truncate(TOP_N);

        info!(
            model = %self.model,
            universe = universe_size,
            qualifying = qualifying_count,
            top = ?scored.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(),
            "ranking complete"
        );

        Ranking {
            top: scored,
            qualifying_count,
            universe_size,
            skipped,
        }
    }
}
