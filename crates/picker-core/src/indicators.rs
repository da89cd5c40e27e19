//! Price-series indicators used by the normalization adapter

use ta::Next;
use ta::indicators::{RelativeStrengthIndex, SimpleMovingAverage};

/// Lookback for the relative strength index
pub const RSI_PERIOD: usize = 14;

/// Window of the rolling average volume
pub const VOLUME_WINDOW: usize = 20;

/// Percentage change of the last close relative to the previous one
///
/// Returns `None` with fewer than two closes or a non-positive previous close.
pub fn last_pct_change(closes: &[f64]) -> Option<f64> {
    let [.., prev, last] = closes else {
        return None;
    };
    if *prev <= 0.0 {
        return None;
    }
    Some((last / prev - 1.0) * 100.0)
}

/// Relative strength index of the series, evaluated at the last close
///
/// Average gains and losses are exponentially smoothed over `period` bars, so the
/// result is the ratio-based oscillator bounded to [0, 100].
pub fn relative_strength_index(closes: &[f64], period: usize) -> Result<f64, String> {
    let mut rsi = RelativeStrengthIndex::new(period).map_err(|e| e.to_string())?;

    let mut current = None;
    for &close in closes {
        current = Some(rsi.next(close));
    }

    match current {
        Some(value) if value.is_finite() => Ok(value.clamp(0.0, 100.0)),
        Some(value) => Err(format!("RSI evaluated to {value}")),
        None => Err("RSI needs at least one close".to_string()),
    }
}

/// Simple moving average over `window` values, evaluated at the last one
///
/// The window includes the last value. `None` until a full window is available.
pub fn simple_moving_average(values: &[f64], window: usize) -> Option<f64> {
    if values.len() < window {
        return None;
    }
    let mut sma = SimpleMovingAverage::new(window).ok()?;
    values.iter().fold(None, |_, &value| Some(sma.next(value)))
}
