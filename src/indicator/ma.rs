use error_stack::Report;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, close_prices, ensure_available, ensure_period};
use crate::model::Bar;

/// Simple moving average over closes.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        ensure_period(period)?;
        Ok(Self { period })
    }

    /// Rolling mean of `prices`, one value per full window.
    pub fn calculate_prices(&self, prices: &[f64]) -> Result<Vec<f64>, Report<IndicatorError>> {
        ensure_available(self.period, prices.len())?;

        let n = self.period as f64;
        let mut sum: f64 = prices[..self.period].iter().sum();
        let mut means = Vec::with_capacity(prices.len() - self.period + 1);
        means.push(sum / n);
        for (leaving, entering) in prices.iter().zip(&prices[self.period..]) {
            sum += entering - leaving;
            means.push(sum / n);
        }
        Ok(means)
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        "sma"
    }

    fn required_bars(&self) -> usize {
        self.period
    }

    fn calculate(&self, bars: &[Bar]) -> Result<Vec<f64>, Report<IndicatorError>> {
        self.calculate_prices(&close_prices(bars))
    }
}

/// Exponential moving average with smoothing `2 / (period + 1)`, seeded by
/// the mean of the first `period` prices.
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        ensure_period(period)?;
        Ok(Self { period })
    }

    pub fn calculate_prices(&self, prices: &[f64]) -> Result<Vec<f64>, Report<IndicatorError>> {
        ensure_available(self.period, prices.len())?;

        let alpha = 2.0 / (self.period as f64 + 1.0);
        let seed = prices[..self.period].iter().sum::<f64>() / self.period as f64;
        Ok(std::iter::once(seed)
            .chain(prices[self.period..].iter().scan(seed, |ema, &price| {
                *ema += alpha * (price - *ema);
                Some(*ema)
            }))
            .collect())
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        "ema"
    }

    fn required_bars(&self) -> usize {
        self.period
    }

    fn calculate(&self, bars: &[Bar]) -> Result<Vec<f64>, Report<IndicatorError>> {
        self.calculate_prices(&close_prices(bars))
    }
}
