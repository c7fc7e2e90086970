use error_stack::Report;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, close_prices, ensure_available, ensure_period, wilder_smooth};
use crate::model::Bar;

/// Relative Strength Index with Wilder-smoothed average gain and loss.
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        ensure_period(period)?;
        Ok(Self { period })
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn required_bars(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, bars: &[Bar]) -> Result<Vec<f64>, Report<IndicatorError>> {
        ensure_available(self.required_bars(), bars.len())?;

        let (gains, losses): (Vec<f64>, Vec<f64>) = close_prices(bars)
            .windows(2)
            .map(|w| {
                let change = w[1] - w[0];
                (change.max(0.0), (-change).max(0.0))
            })
            .unzip();

        Ok(wilder_smooth(&gains, self.period)
            .into_iter()
            .zip(wilder_smooth(&losses, self.period))
            .map(|(gain, loss)| strength_index(gain, loss))
            .collect())
    }
}

fn strength_index(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
