use error_stack::Report;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_available, ensure_period};
use crate::model::Bar;

/// Lambert's constant: scales CCI so most values fall within ±100.
const CCI_SCALE: f64 = 0.015;

/// Commodity Channel Index over the typical price `(H + L + C) / 3`.
pub struct Cci {
    period: usize,
}

impl Cci {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        ensure_period(period)?;
        Ok(Self { period })
    }
}

impl Indicator for Cci {
    fn name(&self) -> &str {
        "cci"
    }

    fn required_bars(&self) -> usize {
        self.period
    }

    fn calculate(&self, bars: &[Bar]) -> Result<Vec<f64>, Report<IndicatorError>> {
        ensure_available(self.period, bars.len())?;

        let typical: Vec<f64> = bars
            .iter()
            .map(|b| (b.high + b.low + b.close) / 3.0)
            .collect();
        let n = self.period as f64;

        Ok(typical
            .windows(self.period)
            .map(|w| {
                let mean = w.iter().sum::<f64>() / n;
                let mean_dev = w.iter().map(|tp| (tp - mean).abs()).sum::<f64>() / n;
                if mean_dev == 0.0 {
                    0.0
                } else {
                    (w[w.len() - 1] - mean) / (CCI_SCALE * mean_dev)
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::bars_from_closes;

    #[test]
    fn cci_insufficient_data() {
        let cci = Cci::new(20).unwrap();
        assert!(cci.calculate(&bars_from_closes(&[1.0; 19])).is_err());
    }

    #[test]
    fn cci_flat_prices_are_zero() {
        let cci = Cci::new(5).unwrap();
        for v in cci.calculate(&bars_from_closes(&[3.0; 8])).unwrap() {
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn cci_known_value() {
        let cci = Cci::new(3).unwrap();
        // tp = 1, 2, 3 -> mean 2, mean deviation 2/3
        // (3 - 2) / (0.015 * 2/3) = 100
        let values = cci.calculate(&bars_from_closes(&[1.0, 2.0, 3.0])).unwrap();
        assert!((values[0] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn cci_sharp_drop_is_deeply_negative() {
        let cci = Cci::new(5).unwrap();
        let values = cci
            .calculate(&bars_from_closes(&[10.0, 10.0, 10.0, 10.0, 5.0]))
            .unwrap();
        assert!(values[0] < -100.0);
    }
}
