use error_stack::Report;
use serde::Serialize;

use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::indicator::ma::{Ema, Sma};
use crate::model::{Bar, Signal};
use crate::technicals::{ConsensusRating, Estimate, IndicatorReading};

pub const MA_PERIODS: [usize; 5] = [10, 20, 50, 100, 200];

/// Simple and exponential average for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaPair {
    pub simple: IndicatorReading,
    pub exponential: IndicatorReading,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingAverages {
    #[serde(flatten)]
    pub consensus: ConsensusRating,
    pub ma10: MaPair,
    pub ma20: MaPair,
    pub ma50: MaPair,
    pub ma100: MaPair,
    pub ma200: MaPair,
}

impl MovingAverages {
    /// Simple then exponential reading for each period, shortest first.
    pub fn readings(&self) -> impl Iterator<Item = &IndicatorReading> {
        [&self.ma10, &self.ma20, &self.ma50, &self.ma100, &self.ma200]
            .into_iter()
            .flat_map(|pair| [&pair.simple, &pair.exponential])
    }
}

/// BUY only when price is strictly above the average.
pub fn ma_signal(price: f64, ma_value: f64) -> Signal {
    if price > ma_value {
        Signal::Buy
    } else {
        Signal::Sell
    }
}

pub fn compute(bars: &[Bar], current_price: f64) -> MovingAverages {
    let [ma10, ma20, ma50, ma100, ma200] =
        MA_PERIODS.map(|period| pair(bars, period, current_price));

    let consensus = ConsensusRating::from_readings(
        [&ma10, &ma20, &ma50, &ma100, &ma200]
            .into_iter()
            .flat_map(|p| [&p.simple, &p.exponential]),
    );

    MovingAverages {
        consensus,
        ma10,
        ma20,
        ma50,
        ma100,
        ma200,
    }
}

fn pair(bars: &[Bar], period: usize, current_price: f64) -> MaPair {
    MaPair {
        simple: average(Sma::new(period), bars, period, current_price),
        exponential: average(Ema::new(period), bars, period, current_price),
    }
}

/// A history shorter than `period` uses the current price as the average.
fn average<I: Indicator>(
    indicator: Result<I, Report<IndicatorError>>,
    bars: &[Bar],
    period: usize,
    current_price: f64,
) -> IndicatorReading {
    let (name, result) = match indicator {
        Ok(ma) => (format!("{}_{period}", ma.name()), ma.latest(bars)),
        Err(report) => (format!("ma_{period}"), Err(report)),
    };
    let estimate = Estimate::resolve(&name, result, current_price);
    IndicatorReading::from_estimate(&name, estimate, |value| ma_signal(current_price, value))
}
