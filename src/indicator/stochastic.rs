use error_stack::Report;

use crate::error::IndicatorError;
use crate::indicator::ma::Sma;
use crate::indicator::{Indicator, ensure_available, ensure_period};
use crate::model::Bar;

/// Slow stochastic oscillator: raw %K over `k_period`, smoothed by an SMA of
/// `smooth_k`, with %D as an SMA of the smoothed %K over `d_period`.
pub struct Stochastic {
    k_period: usize,
    smooth_k: usize,
    d_period: usize,
}

impl Stochastic {
    pub fn new(
        k_period: usize,
        smooth_k: usize,
        d_period: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        ensure_period(k_period)?;
        ensure_period(smooth_k)?;
        ensure_period(d_period)?;
        Ok(Self {
            k_period,
            smooth_k,
            d_period,
        })
    }

    /// Raw (unsmoothed) %K for every full `k_period` window.
    fn raw_k(&self, bars: &[Bar]) -> Vec<f64> {
        bars.windows(self.k_period)
            .map(|w| {
                let highest = w.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
                let lowest = w.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
                let range = highest - lowest;
                let close = w[w.len() - 1].close;
                if range == 0.0 {
                    50.0
                } else {
                    (close - lowest) / range * 100.0
                }
            })
            .collect()
    }

    /// Returns (%K, %D) pairs aligned to %D.
    pub fn calculate_full(&self, bars: &[Bar]) -> Result<Vec<(f64, f64)>, Report<IndicatorError>> {
        ensure_available(self.required_bars(), bars.len())?;

        let k = Sma::new(self.smooth_k)?.calculate_prices(&self.raw_k(bars))?;
        let d = Sma::new(self.d_period)?.calculate_prices(&k)?;

        Ok(k[self.d_period - 1..].iter().copied().zip(d).collect())
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        "stoch"
    }

    fn required_bars(&self) -> usize {
        self.k_period + self.smooth_k + self.d_period - 2
    }

    /// Returns smoothed %K values only.
    fn calculate(&self, bars: &[Bar]) -> Result<Vec<f64>, Report<IndicatorError>> {
        Ok(self
            .calculate_full(bars)?
            .into_iter()
            .map(|(k, _)| k)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{bars_from_closes, bars_from_hlc};

    #[test]
    fn stochastic_zero_period_invalid() {
        assert!(Stochastic::new(0, 3, 3).is_err());
        assert!(Stochastic::new(14, 0, 3).is_err());
    }

    #[test]
    fn stochastic_insufficient_data() {
        let stoch = Stochastic::new(14, 3, 3).unwrap();
        assert!(stoch.calculate(&bars_from_closes(&[1.0; 17])).is_err());
        assert!(stoch.calculate(&bars_from_closes(&[1.0; 18])).is_ok());
    }

    #[test]
    fn stochastic_flat_range_is_50() {
        let stoch = Stochastic::new(5, 3, 3).unwrap();
        let values = stoch.calculate(&bars_from_closes(&[7.0; 12])).unwrap();
        for v in values {
            assert!((v - 50.0).abs() < 1e-9);
        }
    }

    #[test]
    fn stochastic_close_at_high_is_100() {
        let stoch = Stochastic::new(3, 1, 1).unwrap();
        let bars = bars_from_hlc(&[(11.0, 9.0, 10.0), (12.0, 10.0, 11.0), (13.0, 11.0, 13.0)]);
        let values = stoch.calculate(&bars).unwrap();
        assert_eq!(values.len(), 1);
        assert!((values[0] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn stochastic_bounded() {
        let stoch = Stochastic::new(14, 3, 3).unwrap();
        let hlc: Vec<(f64, f64, f64)> = (0..60)
            .map(|i| {
                let base = 50.0 + (i as f64 * 0.7).sin() * 5.0;
                (base + 1.0, base - 1.0, base)
            })
            .collect();
        for (k, d) in stoch.calculate_full(&bars_from_hlc(&hlc)).unwrap() {
            assert!((0.0..=100.0).contains(&k));
            assert!((0.0..=100.0).contains(&d));
        }
    }

    #[test]
    fn stochastic_smooths_k_then_d() {
        // raw %K: 100, 0, 50 -> %K (2-bar mean): 50, 25 -> %D: 37.5
        let stoch = Stochastic::new(3, 2, 2).unwrap();
        let bars = bars_from_hlc(&[
            (10.0, 8.0, 9.0),
            (11.0, 9.0, 10.0),
            (12.0, 10.0, 12.0),
            (12.0, 9.0, 9.0),
            (11.0, 8.0, 10.0),
        ]);
        let points = stoch.calculate_full(&bars).unwrap();
        assert_eq!(points.len(), 1);
        assert!((points[0].0 - 25.0).abs() < 1e-9);
        assert!((points[0].1 - 37.5).abs() < 1e-9);
    }

    #[test]
    fn stochastic_matches_reference_on_long_series() {
        let hlc: Vec<(f64, f64, f64)> = (0..80)
            .map(|i| {
                let base = 100.0 + i as f64 * 0.3 + (i as f64 * 0.5).sin() * 4.0;
                (base + 1.0 + (i % 3) as f64 * 0.4, base - 1.2, base + (i as f64).cos())
            })
            .collect();
        let bars = bars_from_hlc(&hlc);
        let points = Stochastic::new(14, 3, 3).unwrap().calculate_full(&bars).unwrap();

        let mean = |xs: &[f64]| xs.iter().sum::<f64>() / xs.len() as f64;
        let mut raw = vec![f64::NAN; bars.len()];
        for i in 13..bars.len() {
            let window = &bars[i - 13..=i];
            let hi = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
            let lo = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
            raw[i] = (bars[i].close - lo) / (hi - lo) * 100.0;
        }
        let mut k = vec![f64::NAN; bars.len()];
        for i in 15..bars.len() {
            k[i] = mean(&raw[i - 2..=i]);
        }

        // first point sits on bar 17, the 18th bar
        assert_eq!(points.len(), bars.len() - 17);
        for (&(got_k, got_d), i) in points.iter().zip(17..) {
            assert!((got_k - k[i]).abs() < 1e-9, "%K at {i}");
            assert!((got_d - mean(&k[i - 2..=i])).abs() < 1e-9, "%D at {i}");
        }
    }
}
