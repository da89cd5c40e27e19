//! Error types for the normalization and scoring pass
//!
//! None of these abort a batch. A ticker that hits one of them is dropped from the
//! ranking and recorded in [`Ranking::skipped`](crate::Ranking).

use serde::Serialize;
use thiserror::Error;

/// Why a ticker did not produce canonical features
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// No record was supplied for the symbol
    #[error("no data record")]
    MissingRecord,

    /// The record has no price series, or an empty one
    #[error("no price series")]
    MissingPriceSeries,

    /// The price series is shorter than the eligibility minimum
    #[error("insufficient history: {bars} bars, need {required}")]
    InsufficientHistory {
        /// Bars available
        bars: usize,
        /// Bars required
        required: usize,
    },

    /// A derived value could not be computed from the data
    #[error("computation error: {detail}")]
    Computation {
        /// What could not be computed
        detail: String,
    },
}

/// Failure while turning canonical features into a score record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    /// A sub-score or the overall score was not a finite number
    #[error("non-finite {field} for {symbol}")]
    NonFinite {
        /// Ticker symbol
        symbol: String,
        /// Name of the offending score
        field: &'static str,
    },
}

impl From<ScoreError> for SkipReason {
    fn from(err: ScoreError) -> Self {
        SkipReason::Computation {
            detail: err.to_string(),
        }
    }
}
