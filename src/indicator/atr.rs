use error_stack::Report;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_available, ensure_period, true_ranges, wilder_smooth};
use crate::model::Bar;

/// Average True Range with Wilder's smoothing, seeded by the SMA of the first
/// `period` true ranges.
pub struct Atr {
    period: usize,
}

impl Atr {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        ensure_period(period)?;
        Ok(Self { period })
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        "atr"
    }

    fn required_bars(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, bars: &[Bar]) -> Result<Vec<f64>, Report<IndicatorError>> {
        ensure_available(self.required_bars(), bars.len())?;

        Ok(wilder_smooth(&true_ranges(bars), self.period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{bars_from_closes, bars_from_hlc};

    #[test]
    fn atr_period_zero_invalid() {
        assert!(Atr::new(0).is_err());
    }

    #[test]
    fn atr_insufficient_data() {
        let atr = Atr::new(14).unwrap();
        assert!(atr.calculate(&bars_from_closes(&[1.0; 14])).is_err());
    }

    #[test]
    fn atr_constant_range() {
        let atr = Atr::new(3).unwrap();
        let bars = bars_from_hlc(&[(102.0, 98.0, 100.0); 10]);
        for v in atr.calculate(&bars).unwrap() {
            assert!((v - 4.0).abs() < 1e-9);
        }
    }

    #[test]
    fn atr_wilder_step() {
        let atr = Atr::new(2).unwrap();
        // TR: 2, 2, then 5 -> seed 2, next (2 * 1 + 5) / 2 = 3.5
        let bars = bars_from_hlc(&[
            (11.0, 9.0, 10.0),
            (11.0, 9.0, 10.0),
            (11.0, 9.0, 10.0),
            (15.0, 10.0, 14.0),
        ]);
        let values = atr.calculate(&bars).unwrap();
        assert_eq!(values.len(), 2);
        assert!((values[1] - 3.5).abs() < 1e-9);
    }
}
