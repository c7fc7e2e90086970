use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::indicator::Indicator;
use crate::indicator::atr::Atr;
use crate::model::{Bar, VolatilityRank, VolatilityScore};
use crate::technicals::Estimate;
use crate::technicals::report::round2;

const ATR_PERIOD: usize = 14;
const HIGH_RANK_PCT: f64 = 2.5;
const LOW_RANK_PCT: f64 = 1.5;
const HIGH_SCORE_FRACTION: f64 = 0.02;
const TRADING_DAYS: f64 = 252.0;

/// Scaling applied to the daily-return standard deviation.
///
/// `FourthRoot` multiplies by `sqrt(252^0.5)`, the factor historically
/// emitted by this report; `SquareRoot` is the conventional `sqrt(252)`
/// annualization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Annualization {
    #[default]
    FourthRoot,
    SquareRoot,
}

impl Annualization {
    pub fn factor(self) -> f64 {
        match self {
            Self::FourthRoot => TRADING_DAYS.sqrt().sqrt(),
            Self::SquareRoot => TRADING_DAYS.sqrt(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolatilityProfile {
    #[serde(serialize_with = "round2")]
    pub atr: f64,
    #[serde(serialize_with = "round2")]
    pub atr_percentage: f64,
    pub volatility_rank: VolatilityRank,
    #[serde(serialize_with = "round2")]
    pub historical_volatility: f64,
    pub volatility_score: VolatilityScore,
}

pub fn volatility_rank(atr_percentage: f64) -> VolatilityRank {
    if atr_percentage > HIGH_RANK_PCT {
        VolatilityRank::High
    } else if atr_percentage < LOW_RANK_PCT {
        VolatilityRank::Low
    } else {
        VolatilityRank::Medium
    }
}

pub fn volatility_score(atr: f64, current_price: f64) -> VolatilityScore {
    if atr > current_price * HIGH_SCORE_FRACTION {
        VolatilityScore::High
    } else {
        VolatilityScore::Low
    }
}

/// Sample standard deviation of daily percentage returns, scaled and
/// expressed in percent. Fewer than two returns yield 0.
pub fn historical_volatility(closes: &[f64], annualization: Annualization) -> f64 {
    let returns: Vec<f64> = closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt() * annualization.factor() * 100.0
}

pub fn compute(bars: &[Bar], current_price: f64, annualization: Annualization) -> VolatilityProfile {
    let result = Atr::new(ATR_PERIOD).and_then(|atr| atr.latest(bars));
    let atr = Estimate::resolve("atr", result, 0.0).value();

    let atr_percentage = if current_price > 0.0 {
        atr / current_price * 100.0
    } else {
        debug!(current_price, "non-positive price, atr percentage set to 0");
        0.0
    };

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    VolatilityProfile {
        atr,
        atr_percentage,
        volatility_rank: volatility_rank(atr_percentage),
        historical_volatility: historical_volatility(&closes, annualization),
        volatility_score: volatility_score(atr, current_price),
    }
}
