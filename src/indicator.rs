pub mod adx;
pub mod atr;
pub mod cci;
pub mod ma;
pub mod macd;
pub mod momentum;
pub mod rsi;
pub mod stochastic;

use error_stack::Report;

use crate::error::IndicatorError;
use crate::model::Bar;

/// A technical analysis indicator that operates on a slice of daily bars.
///
/// Bars must be in ascending chronological order (oldest first).
pub trait Indicator: Send {
    /// Unique name of this indicator (e.g., "rsi", "sma").
    fn name(&self) -> &str;

    /// Minimum number of bars required to produce at least one output value.
    fn required_bars(&self) -> usize;

    /// Calculate indicator values from bars.
    ///
    /// Returns one value per output point. The number of values may be less
    /// than the number of input bars depending on the indicator's lookback.
    fn calculate(&self, bars: &[Bar]) -> Result<Vec<f64>, Report<IndicatorError>>;

    /// Most recent value, the one a report is built from.
    fn latest(&self, bars: &[Bar]) -> Result<f64, Report<IndicatorError>> {
        let values = self.calculate(bars)?;
        values.last().copied().ok_or_else(|| {
            Report::new(IndicatorError::InsufficientData {
                required: self.required_bars(),
                available: bars.len(),
            })
        })
    }
}

/// Extract close prices from a slice of bars.
pub fn close_prices(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// True range of each bar against the previous close.
///
/// The first bar has no predecessor, so the result is one element shorter
/// than `bars`.
pub fn true_ranges(bars: &[Bar]) -> Vec<f64> {
    bars.windows(2)
        .map(|w| {
            let (prev, cur) = (&w[0], &w[1]);
            (cur.high - cur.low)
                .max((cur.high - prev.close).abs())
                .max((cur.low - prev.close).abs())
        })
        .collect()
}

/// Wilder's running average. The first output is the mean of the first
/// `period` inputs; each later one is `(prev * (period - 1) + x) / period`.
///
/// Empty when `values` holds fewer than `period` elements.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    let n = period as f64;
    let seed = values[..period].iter().sum::<f64>() / n;
    std::iter::once(seed)
        .chain(values[period..].iter().scan(seed, |avg, &x| {
            *avg = (*avg * (n - 1.0) + x) / n;
            Some(*avg)
        }))
        .collect()
}

pub(crate) fn ensure_period(period: usize) -> Result<(), Report<IndicatorError>> {
    if period == 0 {
        error_stack::bail!(IndicatorError::InvalidParameter {
            name: "period must be > 0".into(),
        });
    }
    Ok(())
}

pub(crate) fn ensure_available(
    required: usize,
    available: usize,
) -> Result<(), Report<IndicatorError>> {
    if available < required {
        error_stack::bail!(IndicatorError::InsufficientData {
            required,
            available,
        });
    }
    Ok(())
}
