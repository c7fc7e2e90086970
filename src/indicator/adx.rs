use error_stack::Report;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, ensure_available, ensure_period, true_ranges, wilder_smooth};
use crate::model::Bar;

/// Average Directional Index: trend strength regardless of direction.
///
/// +DM, -DM and TR are Wilder-smoothed over `period` bars and each bar yields
/// a DX from the resulting +DI/-DI. ADX is the Wilder average of DX. DI is a
/// ratio, so smoothed averages and Wilder's running sums yield the same DX.
pub struct Adx {
    period: usize,
}

impl Adx {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        ensure_period(period)?;
        Ok(Self { period })
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        "adx"
    }

    /// `period + 1` bars give the first DX; `period - 1` more bars complete
    /// the DX window that seeds the ADX.
    fn required_bars(&self) -> usize {
        2 * self.period
    }

    fn calculate(&self, bars: &[Bar]) -> Result<Vec<f64>, Report<IndicatorError>> {
        ensure_available(self.required_bars(), bars.len())?;

        let (plus_dm, minus_dm) = directional_movement(bars);
        let plus = wilder_smooth(&plus_dm, self.period);
        let minus = wilder_smooth(&minus_dm, self.period);
        let tr = wilder_smooth(&true_ranges(bars), self.period);

        let dx: Vec<f64> = plus
            .iter()
            .zip(&minus)
            .zip(&tr)
            .map(|((&p, &m), &t)| directional_index(p, m, t))
            .collect();

        Ok(wilder_smooth(&dx, self.period))
    }
}

/// Per-transition (+DM, -DM); one element shorter than `bars`.
fn directional_movement(bars: &[Bar]) -> (Vec<f64>, Vec<f64>) {
    bars.windows(2)
        .map(|w| {
            let up_move = w[1].high - w[0].high;
            let down_move = w[0].low - w[1].low;
            let plus = if up_move > down_move && up_move > 0.0 {
                up_move
            } else {
                0.0
            };
            let minus = if down_move > up_move && down_move > 0.0 {
                down_move
            } else {
                0.0
            };
            (plus, minus)
        })
        .unzip()
}

fn directional_index(smooth_plus: f64, smooth_minus: f64, smooth_tr: f64) -> f64 {
    if smooth_tr == 0.0 {
        return 0.0;
    }
    let plus_di = smooth_plus / smooth_tr * 100.0;
    let minus_di = smooth_minus / smooth_tr * 100.0;
    let di_sum = plus_di + minus_di;
    if di_sum == 0.0 {
        0.0
    } else {
        (plus_di - minus_di).abs() / di_sum * 100.0
    }
}
