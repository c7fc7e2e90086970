use crate::model::Bar;

/// Three support and three resistance bands derived from a pivot point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceLevels {
    pub pivot: f64,
    pub support: [f64; 3],
    pub resistance: [f64; 3],
}

impl PriceLevels {
    pub const ZERO: Self = Self {
        pivot: 0.0,
        support: [0.0; 3],
        resistance: [0.0; 3],
    };

    /// Classic floor-trader pivots from a window's high, low and the latest close.
    pub fn from_pivot(recent_high: f64, recent_low: f64, current: f64) -> Self {
        let pivot = (recent_high + recent_low + current) / 3.0;
        let range = recent_high - recent_low;

        Self {
            pivot,
            support: [
                2.0 * pivot - recent_high,
                pivot - range,
                recent_low - 2.0 * (recent_high - pivot),
            ],
            resistance: [
                2.0 * pivot - recent_low,
                pivot + range,
                recent_high + 2.0 * (pivot - recent_low),
            ],
        }
    }
}

/// Pivot levels over the most recent `lookback` bars; an empty window gives
/// all-zero levels.
pub fn compute(bars: &[Bar], lookback: usize) -> PriceLevels {
    let window = &bars[bars.len().saturating_sub(lookback)..];
    let Some(last) = window.last() else {
        return PriceLevels::ZERO;
    };

    let recent_high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let recent_low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);

    PriceLevels::from_pivot(recent_high, recent_low, last.close)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::bars_from_hlc;

    #[test]
    fn symmetric_window_round_trip() {
        let levels = PriceLevels::from_pivot(110.0, 90.0, 100.0);
        assert!((levels.pivot - 100.0).abs() < 1e-9);
        assert!((levels.resistance[0] - 110.0).abs() < 1e-9);
        assert!((levels.support[0] - 90.0).abs() < 1e-9);
        assert!((levels.resistance[1] - 120.0).abs() < 1e-9);
        assert!((levels.support[1] - 80.0).abs() < 1e-9);
        assert!((levels.resistance[2] - 130.0).abs() < 1e-9);
        assert!((levels.support[2] - 70.0).abs() < 1e-9);
    }

    #[test]
    fn window_limited_to_lookback() {
        // An old spike outside the 14-bar window must not affect the levels.
        let mut hlc = vec![(500.0, 1.0, 100.0)];
        hlc.extend(std::iter::repeat_n((110.0, 90.0, 100.0), 14));
        let levels = compute(&bars_from_hlc(&hlc), 14);
        assert_eq!(levels, PriceLevels::from_pivot(110.0, 90.0, 100.0));
    }

    #[test]
    fn short_window_uses_all_bars() {
        let hlc = [(105.0, 95.0, 100.0), (108.0, 99.0, 104.0)];
        let levels = compute(&bars_from_hlc(&hlc), 14);
        assert_eq!(levels, PriceLevels::from_pivot(108.0, 95.0, 104.0));
    }

    #[test]
    fn empty_window_is_zero() {
        assert_eq!(compute(&[], 14), PriceLevels::ZERO);
        assert_eq!(compute(&bars_from_hlc(&[(2.0, 1.0, 1.5)]), 0), PriceLevels::ZERO);
    }

    #[test]
    fn supports_below_resistances() {
        let levels = PriceLevels::from_pivot(120.0, 95.0, 101.0);
        assert!(levels.support.iter().all(|s| *s < levels.pivot));
        assert!(levels.resistance.iter().all(|r| *r > levels.pivot));
    }
}
