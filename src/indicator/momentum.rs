use error_stack::Report;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, close_prices, ensure_available, ensure_period};
use crate::model::Bar;

/// Momentum: absolute close change over `period` bars.
pub struct Momentum {
    period: usize,
}

impl Momentum {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        ensure_period(period)?;
        Ok(Self { period })
    }
}

impl Indicator for Momentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn required_bars(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, bars: &[Bar]) -> Result<Vec<f64>, Report<IndicatorError>> {
        ensure_available(self.required_bars(), bars.len())?;
        let prices = close_prices(bars);
        Ok(prices
            .windows(self.period + 1)
            .map(|w| w[self.period] - w[0])
            .collect())
    }
}
