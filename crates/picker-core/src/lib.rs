//! Scoring and ranking engine for stock-picker
//!
//! This crate turns raw per-ticker price/volume/fundamental records into a small,
//! ordered set of top picks. It is pure and synchronous: no I/O, no shared state
//! between calls. It includes:
//!
//! - Input records (`TickerRecord`, `TickerBatch`) supplied by a data-fetch collaborator
//! - The normalization adapter that maps a record to `CanonicalFeatures` or a `SkipReason`
//! - Step-function sub-scores clamped to [0, 10] and their unweighted mean
//! - Stable descending ranking truncated to the top 3, plus the qualifying count
//!
//! # Example
//!
//! ```
//! use picker_core::{ScoringEngine, ScoringModel, TickerBatch};
//!
//! let batch = TickerBatch::new();
//! let ranking = ScoringEngine::new(ScoringModel::Fundamental).rank(&batch);
//!
//! assert!(ranking.is_empty());
//! assert_eq!(ranking.coverage_pct(), 0.0);
//! ```

pub mod error;
pub mod indicators;
pub mod normalize;
pub mod ranking;
pub mod record;
pub mod scoring;

pub use error::{ScoreError, SkipReason};
pub use normalize::{CanonicalFeatures, DefaultedFields, MIN_HISTORY_BARS, normalize};
pub use ranking::{Ranking, ScoringEngine, TOP_N};
pub use record::{Fundamentals, PriceBar, TickerBatch, TickerRecord};
pub use scoring::{ScoreRecord, ScoringModel, score};
