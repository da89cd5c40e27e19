//! Normalization adapter: raw `TickerRecord` → `CanonicalFeatures`
//!
//! A record either becomes a fully populated feature set or an explicit
//! [`SkipReason`]. Missing fundamentals and volumes are substituted, never skipped.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SkipReason;
use crate::indicators::{
    RSI_PERIOD, VOLUME_WINDOW, last_pct_change, relative_strength_index, simple_moving_average,
};
use crate::record::{Fundamentals, TickerRecord};

/// Minimum number of bars for a ticker to be scored at all
pub const MIN_HISTORY_BARS: usize = 20;

/// P/E used when the provider has none
pub const DEFAULT_PE_RATIO: f64 = 15.0;

/// Debt/equity used when the provider has none
pub const DEFAULT_DEBT_TO_EQUITY: f64 = 1.0;

/// Return on equity used when the provider has none
pub const DEFAULT_RETURN_ON_EQUITY: f64 = 0.0;

/// Which inputs were substituted with defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultedFields {
    pub pe_ratio: bool,
    pub debt_to_equity: bool,
    pub return_on_equity: bool,
    pub news_sentiment: bool,
    /// The whole volume column was missing and zeros were synthesized
    pub volume: bool,
}

/// Per-ticker features derived for one scoring pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalFeatures {
    /// Last close vs previous close, in percent
    pub momentum_pct: f64,
    /// 14-period RSI at the last bar
    pub rsi: Option<f64>,
    pub last_volume: u64,
    /// Mean of the trailing 20 volumes, last bar included
    pub average_volume: f64,
    /// `None` when the average volume is zero
    pub volume_ratio: Option<f64>,
    pub pe_ratio: f64,
    pub debt_to_equity: f64,
    pub return_on_equity: f64,
    /// In [-1, 1]
    pub news_sentiment: f64,
    pub defaulted: DefaultedFields,
}

/// Map one record to canonical features, or say why it is not eligible
///
/// Checks run in order, first match wins: no record, no (or empty) price series,
/// fewer than [`MIN_HISTORY_BARS`] bars.
pub fn normalize(record: Option<&TickerRecord>) -> Result<CanonicalFeatures, SkipReason> {
    let record = record.ok_or(SkipReason::MissingRecord)?;
    let bars = match record.price_series.as_deref() {
        Some(bars) if !bars.is_empty() => bars,
        _ => return Err(SkipReason::MissingPriceSeries),
    };
    if bars.len() < MIN_HISTORY_BARS {
        return Err(SkipReason::InsufficientHistory {
            bars: bars.len(),
            required: MIN_HISTORY_BARS,
        });
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    if let Some(bad) = closes.iter().find(|c| !c.is_finite()) {
        return Err(SkipReason::Computation {
            detail: format!("non-finite close {bad}"),
        });
    }

    let momentum_pct = last_pct_change(&closes).ok_or_else(|| SkipReason::Computation {
        detail: "previous close is not positive".to_string(),
    })?;
    let rsi = relative_strength_index(&closes, RSI_PERIOD)
        .map_err(|detail| SkipReason::Computation { detail })?;

    let mut defaulted = DefaultedFields::default();

    if bars.iter().all(|b| b.volume.is_none()) {
        debug!(symbol = %record.symbol, "volume column missing, using zeros");
        defaulted.volume = true;
    }
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume.unwrap_or(0)).collect();
    let last_volume = volumes.last().copied().unwrap_or(0);
    let volumes_f64: Vec<f64> = volumes.iter().map(|&v| v as f64).collect();
    let average_volume = simple_moving_average(&volumes_f64, VOLUME_WINDOW).unwrap_or(0.0);
    let volume_ratio = (average_volume > 0.0).then(|| last_volume as f64 / average_volume);

    let fundamentals = record.fundamentals.as_ref();
    let pe_ratio = pick(fundamentals, |f| f.pe_ratio, DEFAULT_PE_RATIO, &mut defaulted.pe_ratio);
    let debt_to_equity = pick(
        fundamentals,
        |f| f.debt_to_equity,
        DEFAULT_DEBT_TO_EQUITY,
        &mut defaulted.debt_to_equity,
    );
    let return_on_equity = pick(
        fundamentals,
        |f| f.return_on_equity,
        DEFAULT_RETURN_ON_EQUITY,
        &mut defaulted.return_on_equity,
    );

    let news_sentiment = match record.news_sentiment {
        Some(s) if s.is_finite() => s.clamp(-1.0, 1.0),
        _ => {
            defaulted.news_sentiment = true;
            0.0
        }
    };

    Ok(CanonicalFeatures {
        momentum_pct,
        rsi: Some(rsi),
        last_volume,
        average_volume,
        volume_ratio,
        pe_ratio,
        debt_to_equity,
        return_on_equity,
        news_sentiment,
        defaulted,
    })
}

/// Read one fundamentals field, falling back to `default` for absent or non-finite values
fn pick(
    fundamentals: Option<&Fundamentals>,
    field: impl Fn(&Fundamentals) -> Option<f64>,
    default: f64,
    flag: &mut bool,
) -> f64 {
    match fundamentals.and_then(field) {
        Some(value) if value.is_finite() => value,
        _ => {
            *flag = true;
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PriceBar;
    use chrono::{Days, NaiveDate};

    fn series(closes: &[f64], volume: Option<u64>) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + Days::new(i as u64),
                close,
                volume,
            })
            .collect()
    }

    fn flat(n: usize) -> Vec<f64> {
        vec![100.0; n]
    }

    #[test]
    fn test_skip_order() {
        assert_eq!(normalize(None), Err(SkipReason::MissingRecord));

        let mut record = TickerRecord::new("AMD", Vec::new());
        assert_eq!(normalize(Some(&record)), Err(SkipReason::MissingPriceSeries));

        record.price_series = None;
        assert_eq!(normalize(Some(&record)), Err(SkipReason::MissingPriceSeries));

        record.price_series = Some(series(&flat(19), Some(10)));
        assert_eq!(
            normalize(Some(&record)),
            Err(SkipReason::InsufficientHistory {
                bars: 19,
                required: 20
            })
        );
    }

    #[test]
    fn test_exactly_minimum_history_qualifies() {
        let record = TickerRecord::new("AMD", series(&flat(20), Some(10)));
        assert!(normalize(Some(&record)).is_ok());
    }

    #[test]
    fn test_fundamental_defaults() {
        let record = TickerRecord::new("SONY", series(&flat(25), Some(10)));
        let features = normalize(Some(&record)).unwrap();

        assert_eq!(features.pe_ratio, 15.0);
        assert_eq!(features.debt_to_equity, 1.0);
        assert_eq!(features.return_on_equity, 0.0);
        assert_eq!(features.news_sentiment, 0.0);
        assert!(features.defaulted.pe_ratio);
        assert!(features.defaulted.debt_to_equity);
        assert!(features.defaulted.return_on_equity);
        assert!(features.defaulted.news_sentiment);
    }

    #[test]
    fn test_partial_fundamentals() {
        let record = TickerRecord::new("NET", series(&flat(25), Some(10))).with_fundamentals(
            Fundamentals {
                pe_ratio: Some(42.0),
                debt_to_equity: Some(f64::NAN),
                ..Default::default()
            },
        );
        let features = normalize(Some(&record)).unwrap();

        assert_eq!(features.pe_ratio, 42.0);
        assert!(!features.defaulted.pe_ratio);
        assert_eq!(features.debt_to_equity, 1.0);
        assert!(features.defaulted.debt_to_equity);
    }

    #[test]
    fn test_missing_volume_is_synthesized() {
        let record = TickerRecord::new("700.HK", series(&flat(25), None));
        let features = normalize(Some(&record)).unwrap();

        assert_eq!(features.last_volume, 0);
        assert_eq!(features.average_volume, 0.0);
        assert_eq!(features.volume_ratio, None);
        assert!(features.defaulted.volume);
    }

    #[test]
    fn test_momentum_and_volume_ratio() {
        let mut closes = flat(24);
        closes.push(110.0);
        let mut bars = series(&closes, Some(100));
        bars.last_mut().unwrap().volume = Some(290);

        let features = normalize(Some(&TickerRecord::new("COIN", bars))).unwrap();

        assert!((features.momentum_pct - 10.0).abs() < 1e-9);
        // 19 bars of 100 plus one of 290
        assert!((features.average_volume - 109.5).abs() < 1e-9);
        let ratio = features.volume_ratio.unwrap();
        assert!((ratio - 290.0 / 109.5).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_close_is_a_computation_skip() {
        let mut closes = flat(25);
        closes[3] = f64::NAN;
        let record = TickerRecord::new("UPST", series(&closes, Some(1)));

        assert!(matches!(
            normalize(Some(&record)),
            Err(SkipReason::Computation { .. })
        ));
    }

    #[test]
    fn test_zero_previous_close_is_a_computation_skip() {
        let mut closes = flat(25);
        closes[23] = 0.0;
        let record = TickerRecord::new("FSLY", series(&closes, Some(1)));

        assert!(matches!(
            normalize(Some(&record)),
            Err(SkipReason::Computation { .. })
        ));
    }

    #[test]
    fn test_sentiment_is_clamped() {
        let record =
            TickerRecord::new("BABA", series(&flat(25), Some(1))).with_news_sentiment(3.0);
        let features = normalize(Some(&record)).unwrap();
        assert_eq!(features.news_sentiment, 1.0);
        assert!(!features.defaulted.news_sentiment);
    }
}
