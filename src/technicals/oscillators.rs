use error_stack::Report;
use serde::{Serialize, Serializer, ser::SerializeStruct};
use tracing::debug;

use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::indicator::adx::Adx;
use crate::indicator::cci::Cci;
use crate::indicator::macd::Macd;
use crate::indicator::momentum::Momentum;
use crate::indicator::rsi::Rsi;
use crate::indicator::stochastic::Stochastic;
use crate::model::{Bar, Signal};
use crate::technicals::report::round_to;
use crate::technicals::{ConsensusRating, Estimate, IndicatorReading};

const RSI_PERIOD: usize = 14;
const STOCH_K_PERIOD: usize = 14;
const STOCH_SMOOTH_K: usize = 3;
const STOCH_D_PERIOD: usize = 3;
const CCI_PERIOD: usize = 20;
const ADX_PERIOD: usize = 14;
const MOMENTUM_PERIOD: usize = 10;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;

const RSI_DEFAULT: f64 = 50.0;
const STOCH_DEFAULT: f64 = 50.0;
const CCI_DEFAULT: f64 = 0.0;
const ADX_DEFAULT: f64 = 25.0;
const MOMENTUM_DEFAULT: f64 = 0.0;

const ADX_TREND_THRESHOLD: f64 = 25.0;

/// The six oscillator readings and their consensus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Oscillators {
    #[serde(flatten)]
    pub consensus: ConsensusRating,
    pub rsi: IndicatorReading,
    pub stoch: IndicatorReading,
    pub cci: IndicatorReading,
    #[serde(serialize_with = "serialize_macd")]
    pub macd: IndicatorReading,
    pub adx: IndicatorReading,
    pub momentum: IndicatorReading,
}

impl Oscillators {
    pub fn readings(&self) -> [&IndicatorReading; 6] {
        [
            &self.rsi,
            &self.stoch,
            &self.cci,
            &self.adx,
            &self.momentum,
            &self.macd,
        ]
    }
}

pub fn rsi_signal(value: f64) -> Signal {
    band_signal(value, 30.0, 70.0)
}

pub fn stoch_signal(value: f64) -> Signal {
    band_signal(value, 20.0, 80.0)
}

pub fn cci_signal(value: f64) -> Signal {
    band_signal(value, -100.0, 100.0)
}

/// ADX measures trend strength only; a strong trend counts as bullish.
pub fn adx_signal(value: f64) -> Signal {
    if value > ADX_TREND_THRESHOLD {
        Signal::Buy
    } else {
        Signal::Neutral
    }
}

pub fn momentum_signal(value: f64) -> Signal {
    band_signal(value, 0.0, 0.0)
}

/// MACD crossing state; never neutral.
pub fn macd_signal(macd: f64, signal_line: f64) -> Signal {
    if macd > signal_line {
        Signal::Buy
    } else {
        Signal::Sell
    }
}

/// BUY strictly below `oversold`, SELL strictly above `overbought`.
fn band_signal(value: f64, oversold: f64, overbought: f64) -> Signal {
    if value < oversold {
        Signal::Buy
    } else if value > overbought {
        Signal::Sell
    } else {
        Signal::Neutral
    }
}

pub fn compute(bars: &[Bar]) -> Oscillators {
    let rsi = reading("rsi", Rsi::new(RSI_PERIOD), bars, RSI_DEFAULT, rsi_signal);
    let stoch = reading(
        "stoch",
        Stochastic::new(STOCH_K_PERIOD, STOCH_SMOOTH_K, STOCH_D_PERIOD),
        bars,
        STOCH_DEFAULT,
        stoch_signal,
    );
    let cci = reading("cci", Cci::new(CCI_PERIOD), bars, CCI_DEFAULT, cci_signal);
    let adx = reading("adx", Adx::new(ADX_PERIOD), bars, ADX_DEFAULT, adx_signal);
    let momentum = reading(
        "momentum",
        Momentum::new(MOMENTUM_PERIOD),
        bars,
        MOMENTUM_DEFAULT,
        momentum_signal,
    );
    let macd = macd_reading(bars);

    let consensus = ConsensusRating::from_readings([&rsi, &stoch, &cci, &adx, &momentum, &macd]);

    Oscillators {
        consensus,
        rsi,
        stoch,
        cci,
        macd,
        adx,
        momentum,
    }
}

fn reading<I: Indicator>(
    name: &str,
    indicator: Result<I, Report<IndicatorError>>,
    bars: &[Bar],
    default: f64,
    classify: fn(f64) -> Signal,
) -> IndicatorReading {
    let result = indicator.and_then(|indicator| indicator.latest(bars));
    IndicatorReading::from_estimate(name, Estimate::resolve(name, result, default), classify)
}

/// MACD falls back to a flat, neutral reading when it cannot be computed.
fn macd_reading(bars: &[Bar]) -> IndicatorReading {
    let latest = Macd::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL)
        .and_then(|macd| macd.calculate_full(bars))
        .map(|points| points.last().copied());

    match latest {
        Ok(Some(point)) if point.macd.is_finite() && point.signal.is_finite() => {
            IndicatorReading::new("macd", point.macd, macd_signal(point.macd, point.signal))
        }
        other => {
            if let Err(report) = other {
                debug!(indicator = "macd", error = %report, "indicator unavailable, using default");
            }
            IndicatorReading {
                defaulted: true,
                ..IndicatorReading::new("macd", 0.0, Signal::Neutral)
            }
        }
    }
}

/// MACD values are reported with four decimals.
fn serialize_macd<S: Serializer>(reading: &IndicatorReading, s: S) -> Result<S::Ok, S::Error> {
    let mut state = s.serialize_struct("IndicatorReading", 2)?;
    state.serialize_field("value", &round_to(reading.value, 4))?;
    state.serialize_field("action", &reading.signal)?;
    state.end()
}
