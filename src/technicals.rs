pub mod consensus;
pub mod levels;
pub mod moving_averages;
pub mod oscillators;
pub mod report;
pub mod volatility;

use error_stack::Report;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::IndicatorError;
use crate::model::{PriceSeries, Signal};
use crate::technicals::moving_averages::MovingAverages;
use crate::technicals::oscillators::Oscillators;

pub use consensus::{ConsensusRating, SignalCounts};
pub use report::{TechnicalAnalysis, TechnicalReport};

/// A named indicator value with its categorical signal.
///
/// `defaulted` marks readings whose value is a documented substitute because
/// the indicator could not be evaluated on the available history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorReading {
    #[serde(skip)]
    pub name: String,
    #[serde(serialize_with = "report::round2")]
    pub value: f64,
    #[serde(rename = "action")]
    pub signal: Signal,
    #[serde(skip)]
    pub defaulted: bool,
}

impl IndicatorReading {
    pub fn new(name: impl Into<String>, value: f64, signal: Signal) -> Self {
        Self {
            name: name.into(),
            value,
            signal,
            defaulted: false,
        }
    }

    fn from_estimate(name: &str, estimate: Estimate, classify: impl Fn(f64) -> Signal) -> Self {
        let value = estimate.value();
        Self {
            name: name.to_owned(),
            value,
            signal: classify(value),
            defaulted: estimate.is_default(),
        }
    }
}

/// Outcome of a fail-soft computation: the computed value, or the documented
/// default that replaces it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Estimate {
    Computed(f64),
    Default(f64),
}

impl Estimate {
    /// Resolve an indicator result, substituting `default` on error or on a
    /// non-finite value.
    pub fn resolve(name: &str, result: Result<f64, Report<IndicatorError>>, default: f64) -> Self {
        match result {
            Ok(value) if value.is_finite() => Self::Computed(value),
            Ok(value) => {
                debug!(indicator = name, value, fallback = default, "non-finite value, using default");
                Self::Default(default)
            }
            Err(report) => {
                debug!(
                    indicator = name,
                    error = %report,
                    fallback = default,
                    "indicator unavailable, using default"
                );
                Self::Default(default)
            }
        }
    }

    pub fn value(self) -> f64 {
        match self {
            Self::Computed(v) | Self::Default(v) => v,
        }
    }

    pub fn is_default(self) -> bool {
        matches!(self, Self::Default(_))
    }
}

/// Run every sub-engine over `series` and assemble the report.
///
/// Never fails: a series shorter than `config.min_bars` yields
/// [`TechnicalAnalysis::Unavailable`], and each sub-engine substitutes its
/// own defaults for indicators it cannot evaluate.
pub fn analyze(ticker: &str, series: &PriceSeries, config: &EngineConfig) -> TechnicalAnalysis {
    let current_price = match series.last_close() {
        Some(price) if series.len() >= config.min_bars => price,
        _ => {
            info!(
                ticker,
                available = series.len(),
                required = config.min_bars,
                "insufficient data for technical analysis"
            );
            return TechnicalAnalysis::Unavailable;
        }
    };

    let bars = series.bars();
    let oscillators = oscillators::compute(bars);
    let moving_averages = moving_averages::compute(bars, current_price);
    let overall = ConsensusRating::from_counts(
        oscillators.consensus.counts.merge(moving_averages.consensus.counts),
    );
    let levels = levels::compute(bars, config.level_lookback);
    let volatility = volatility::compute(bars, current_price, config.hv_annualization);

    let defaulted = defaulted_readings(&oscillators, &moving_averages);
    if !defaulted.is_empty() {
        debug!(ticker, ?defaulted, "readings substituted with defaults");
    }
    debug!(
        ticker,
        rating = %overall.rating,
        buy = overall.counts.buy,
        sell = overall.counts.sell,
        neutral = overall.counts.neutral,
        pivot = levels.pivot,
        "technical analysis complete"
    );

    TechnicalAnalysis::Report(Box::new(TechnicalReport::assemble(
        current_price,
        overall,
        oscillators,
        moving_averages,
        volatility,
        levels,
    )))
}

/// Names of the readings that fell back to a documented default.
fn defaulted_readings<'a>(
    oscillators: &'a Oscillators,
    moving_averages: &'a MovingAverages,
) -> Vec<&'a str> {
    oscillators
        .readings()
        .into_iter()
        .chain(moving_averages.readings())
        .filter(|reading| reading.defaulted)
        .map(|reading| reading.name.as_str())
        .collect()
}
