//! Sub-score step functions and their aggregation
//!
//! Every sub-score lives in [0, 10]. Tier thresholds use strict comparisons, so a
//! value sitting exactly on a boundary falls into the lower tier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;
use crate::normalize::CanonicalFeatures;

/// Highest value any sub-score can take
pub const MAX_SCORE: f64 = 10.0;

/// Score for the middle tier of every step function
pub const MID_TIER: f64 = 4.0;

/// Which set of sub-scores feeds the overall score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringModel {
    /// Momentum, P/E valuation, debt/equity health and ROE quality (mean of 4)
    #[default]
    Fundamental,
    /// Momentum, RSI oscillator and volume surge (mean of 3)
    PriceAction,
}

impl ScoringModel {
    /// Number of sub-scores averaged into the overall score
    pub fn sub_score_count(self) -> usize {
        match self {
            Self::Fundamental => 4,
            Self::PriceAction => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fundamental => "fundamental",
            Self::PriceAction => "price-action",
        }
    }
}

impl fmt::Display for ScoringModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fundamental" | "fundamentals" => Ok(Self::Fundamental),
            "price-action" | "price_action" | "technical" => Ok(Self::PriceAction),
            other => Err(format!(
                "unknown scoring model '{other}', expected 'fundamental' or 'price-action'"
            )),
        }
    }
}

/// Scores for one qualifying ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub symbol: String,
    pub model: ScoringModel,
    pub momentum_score: f64,
    /// P/E tier (fundamental) or RSI tier (price action)
    pub valuation_score: f64,
    /// Debt/equity tier (fundamental) or volume-surge tier (price action)
    pub health_score: f64,
    /// ROE tier; only present in the fundamental model
    pub quality_score: Option<f64>,
    pub overall_score: f64,
    pub features: CanonicalFeatures,
}

impl ScoreRecord {
    /// Active sub-scores in display order
    pub fn sub_scores(&self) -> Vec<(&'static str, f64)> {
        let (valuation, health) = match self.model {
            ScoringModel::Fundamental => ("P/E", "Debt/Equity"),
            ScoringModel::PriceAction => ("RSI", "Volume"),
        };
        let mut scores = vec![
            ("Momentum", self.momentum_score),
            (valuation, self.valuation_score),
            (health, self.health_score),
        ];
        if let Some(quality) = self.quality_score {
            scores.push(("ROE", quality));
        }
        scores
    }
}

/// One-bar momentum: the percentage move itself, clamped to 0-10
pub fn momentum_score(momentum_pct: f64) -> f64 {
    momentum_pct.clamp(0.0, MAX_SCORE)
}

/// Oversold is attractive: below 30 scores 10, below 50 scores 4
pub fn rsi_score(rsi: f64) -> f64 {
    if rsi < 30.0 {
        MAX_SCORE
    } else if rsi < 50.0 {
        MID_TIER
    } else {
        0.0
    }
}

/// Lower P/E is better: below 15 scores 10, below 30 scores 4
pub fn pe_score(pe_ratio: f64) -> f64 {
    if pe_ratio < 15.0 {
        MAX_SCORE
    } else if pe_ratio < 30.0 {
        MID_TIER
    } else {
        0.0
    }
}

/// Volume surge: above 1.5x the rolling average scores 10, above the average scores 4
pub fn volume_score(last_volume: u64, average_volume: f64) -> f64 {
    let last = last_volume as f64;
    if last > 1.5 * average_volume {
        MAX_SCORE
    } else if last > average_volume {
        MID_TIER
    } else {
        0.0
    }
}

/// Lower leverage is healthier: below 1 scores 10, below 2 scores 4
pub fn debt_score(debt_to_equity: f64) -> f64 {
    if debt_to_equity < 1.0 {
        MAX_SCORE
    } else if debt_to_equity < 2.0 {
        MID_TIER
    } else {
        0.0
    }
}

/// Higher ROE is better: above 0.15 scores 10, above 0.05 scores 4
pub fn roe_score(return_on_equity: f64) -> f64 {
    if return_on_equity > 0.15 {
        MAX_SCORE
    } else if return_on_equity > 0.05 {
        MID_TIER
    } else {
        0.0
    }
}

/// Compute the score record for one ticker under `model`
pub fn score(
    symbol: &str,
    features: &CanonicalFeatures,
    model: ScoringModel,
) -> Result<ScoreRecord, ScoreError> {
    let momentum_score = momentum_score(features.momentum_pct);

    let (valuation_score, health_score, quality_score) = match model {
        ScoringModel::Fundamental => (
            pe_score(features.pe_ratio),
            debt_score(features.debt_to_equity),
            Some(roe_score(features.return_on_equity)),
        ),
        ScoringModel::PriceAction => {
            // NaN RSI falls through every tier to 0, but a missing one is an error
            let rsi = features.rsi.ok_or_else(|| ScoreError::NonFinite {
                symbol: symbol.to_string(),
                field: "rsi",
            })?;
            (
                rsi_score(rsi),
                volume_score(features.last_volume, features.average_volume),
                None,
            )
        }
    };

    let total = momentum_score + valuation_score + health_score + quality_score.unwrap_or(0.0);
    let overall_score = total / model.sub_score_count() as f64;

    for (field, value) in [("momentum_score", momentum_score), ("overall_score", overall_score)] {
        if !value.is_finite() {
            return Err(ScoreError::NonFinite {
                symbol: symbol.to_string(),
                field,
            });
        }
    }

    Ok(ScoreRecord {
        symbol: symbol.to_string(),
        model,
        momentum_score,
        valuation_score,
        health_score,
        quality_score,
        overall_score,
        features: features.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::DefaultedFields;

    fn features() -> CanonicalFeatures {
        CanonicalFeatures {
            momentum_pct: 0.0,
            rsi: Some(50.0),
            last_volume: 100,
            average_volume: 100.0,
            volume_ratio: Some(1.0),
            pe_ratio: 15.0,
            debt_to_equity: 1.0,
            return_on_equity: 0.0,
            news_sentiment: 0.0,
            defaulted: DefaultedFields::default(),
        }
    }

    #[test]
    fn test_momentum_clamp() {
        assert_eq!(momentum_score(-90.0), 0.0);
        assert_eq!(momentum_score(0.0), 0.0);
        assert_eq!(momentum_score(2.5), 2.5);
        assert_eq!(momentum_score(7.85), 7.85);
        assert_eq!(momentum_score(10.0), 10.0);
        assert_eq!(momentum_score(500.0), 10.0);
    }

    #[test]
    fn test_tier_boundaries_are_strict() {
        assert_eq!(rsi_score(29.99), 10.0);
        assert_eq!(rsi_score(30.0), 4.0);
        assert_eq!(rsi_score(50.0), 0.0);

        assert_eq!(pe_score(14.9), 10.0);
        assert_eq!(pe_score(15.0), 4.0);
        assert_eq!(pe_score(30.0), 0.0);

        assert_eq!(debt_score(0.99), 10.0);
        assert_eq!(debt_score(1.0), 4.0);
        assert_eq!(debt_score(2.0), 0.0);

        assert_eq!(roe_score(0.16), 10.0);
        assert_eq!(roe_score(0.15), 4.0);
        assert_eq!(roe_score(0.05), 0.0);
    }

    #[test]
    fn test_negative_pe_is_cheapest_tier() {
        assert_eq!(pe_score(-8.0), 10.0);
    }

    #[test]
    fn test_volume_tiers() {
        assert_eq!(volume_score(151, 100.0), 10.0);
        assert_eq!(volume_score(150, 100.0), 4.0);
        assert_eq!(volume_score(101, 100.0), 4.0);
        assert_eq!(volume_score(100, 100.0), 0.0);
        // synthesized zero volume never beats a zero average
        assert_eq!(volume_score(0, 0.0), 0.0);
    }

    #[test]
    fn test_fundamental_defaults_score() {
        let record = score("SONY", &features(), ScoringModel::Fundamental).unwrap();

        assert_eq!(record.valuation_score, 4.0);
        assert_eq!(record.health_score, 4.0);
        assert_eq!(record.quality_score, Some(0.0));
        assert_eq!(record.overall_score, 2.0);
    }

    #[test]
    fn test_fundamental_uses_raw_momentum() {
        let f = CanonicalFeatures {
            momentum_pct: 3.0,
            ..features()
        };
        let record = score("NVDA", &f, ScoringModel::Fundamental).unwrap();

        assert_eq!(record.momentum_score, 3.0);
        assert_eq!(record.overall_score, 2.75);
    }

    #[test]
    fn test_price_action_scenario() {
        let f = CanonicalFeatures {
            momentum_pct: 7.85,
            rsi: Some(45.6),
            last_volume: 150,
            average_volume: 100.0,
            volume_ratio: Some(1.5),
            ..features()
        };
        let record = score("NVDA", &f, ScoringModel::PriceAction).unwrap();

        assert_eq!(record.momentum_score, 7.85);
        assert_eq!(record.valuation_score, 4.0);
        assert_eq!(record.health_score, 4.0);
        assert_eq!(record.quality_score, None);
        assert!((record.overall_score - 15.85 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_price_action_requires_rsi() {
        let f = CanonicalFeatures {
            rsi: None,
            ..features()
        };
        assert!(score("X", &f, ScoringModel::PriceAction).is_err());
        assert!(score("X", &f, ScoringModel::Fundamental).is_ok());
    }

    #[test]
    fn test_sub_scores_labels() {
        let record = score("AMD", &features(), ScoringModel::Fundamental).unwrap();
        let labels: Vec<&str> = record.sub_scores().iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec!["Momentum", "P/E", "Debt/Equity", "ROE"]);

        let record = score("AMD", &features(), ScoringModel::PriceAction).unwrap();
        assert_eq!(record.sub_scores().len(), 3);
    }

    #[test]
    fn test_model_parsing() {
        assert_eq!("price-action".parse::<ScoringModel>(), Ok(ScoringModel::PriceAction));
        assert_eq!("Fundamental".parse::<ScoringModel>(), Ok(ScoringModel::Fundamental));
        assert!("weighted".parse::<ScoringModel>().is_err());
        assert_eq!(ScoringModel::default(), ScoringModel::Fundamental);
        assert_eq!(ScoringModel::PriceAction.to_string(), "price-action");
    }
}
