use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::model::{Rating, Signal};
use crate::technicals::levels::PriceLevels;
use crate::technicals::moving_averages::MovingAverages;
use crate::technicals::oscillators::Oscillators;
use crate::technicals::volatility::VolatilityProfile;
use crate::technicals::{ConsensusRating, SignalCounts};

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn round2<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round_to(*value, 2))
}

fn round2_levels<S: Serializer>(levels: &[f64; 3], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(levels.iter().map(|v| round_to(*v, 2)))
}

/// Condensed signals for downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signals {
    #[serde(serialize_with = "round2")]
    pub rsi: f64,
    pub macd: Signal,
    pub ema_20: Signal,
    pub ema_50: Signal,
    pub ema_100: Signal,
}

/// Complete technical-analysis document for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalReport {
    pub overall_signal: Rating,
    pub signal_strength: String,
    pub summary: SignalCounts,
    pub oscillators: Oscillators,
    pub moving_averages: MovingAverages,
    #[serde(serialize_with = "round2")]
    pub current_price: f64,
    pub volatility: VolatilityProfile,
    #[serde(serialize_with = "round2_levels")]
    pub support_levels: [f64; 3],
    #[serde(serialize_with = "round2_levels")]
    pub resistance_levels: [f64; 3],
    pub signals: Signals,
}

impl TechnicalReport {
    pub(crate) fn assemble(
        current_price: f64,
        overall: ConsensusRating,
        oscillators: Oscillators,
        moving_averages: MovingAverages,
        volatility: VolatilityProfile,
        levels: PriceLevels,
    ) -> Self {
        let signals = Signals {
            rsi: oscillators.rsi.value,
            macd: oscillators.macd.signal,
            ema_20: moving_averages.ma20.exponential.signal,
            ema_50: moving_averages.ma50.exponential.signal,
            ema_100: moving_averages.ma100.exponential.signal,
        };

        Self {
            overall_signal: overall.rating,
            signal_strength: format!(
                "{}/{} indicators bullish",
                overall.counts.buy,
                overall.counts.total()
            ),
            summary: overall.counts,
            oscillators,
            moving_averages,
            current_price,
            volatility,
            support_levels: levels.support,
            resistance_levels: levels.resistance,
            signals,
        }
    }

    pub fn overall(&self) -> ConsensusRating {
        ConsensusRating {
            rating: self.overall_signal,
            counts: self.summary,
        }
    }
}

/// Engine outcome: a report, or the explicit "no analysis available" result.
///
/// `Unavailable` serializes as the empty object `{}`.
#[derive(Debug, Clone, PartialEq)]
pub enum TechnicalAnalysis {
    Report(Box<TechnicalReport>),
    Unavailable,
}

impl TechnicalAnalysis {
    pub fn report(&self) -> Option<&TechnicalReport> {
        match self {
            Self::Report(report) => Some(report),
            Self::Unavailable => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

impl Serialize for TechnicalAnalysis {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Report(report) => report.serialize(s),
            Self::Unavailable => s.serialize_map(Some(0))?.end(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::model::test_support::wavy_series;
    use crate::technicals::analyze;

    #[test]
    fn round_to_places() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.23456, 4), 1.2346);
        assert_eq!(round_to(-0.125, 2), -0.13);
    }

    #[test]
    fn unavailable_is_empty_object() {
        let json = serde_json::to_string(&TechnicalAnalysis::Unavailable).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn report_document_shape() {
        let analysis = analyze("TEST", &wavy_series(220), &EngineConfig::default());
        let json = serde_json::to_value(&analysis).unwrap();

        for key in [
            "overall_signal",
            "signal_strength",
            "summary",
            "oscillators",
            "moving_averages",
            "current_price",
            "volatility",
            "support_levels",
            "resistance_levels",
            "signals",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }

        assert_eq!(json["support_levels"].as_array().unwrap().len(), 3);
        assert_eq!(json["resistance_levels"].as_array().unwrap().len(), 3);
        for ma in ["ma10", "ma20", "ma50", "ma100", "ma200"] {
            assert!(json["moving_averages"][ma]["simple"]["value"].is_f64());
            assert!(json["moving_averages"][ma]["exponential"]["action"].is_string());
        }
        for osc in ["rsi", "stoch", "cci", "macd", "adx", "momentum"] {
            assert!(json["oscillators"][osc]["action"].is_string());
        }
        for key in ["atr", "atr_percentage", "volatility_rank", "historical_volatility", "volatility_score"] {
            assert!(json["volatility"].get(key).is_some(), "missing volatility.{key}");
        }
        assert!(json["signals"]["ema_100"].is_string());
    }

    #[test]
    fn signal_strength_and_overall_agree() {
        let analysis = analyze("TEST", &wavy_series(220), &EngineConfig::default());
        let report = analysis.report().unwrap();
        let overall = report.overall();
        assert_eq!(
            report.signal_strength,
            format!("{}/16 indicators bullish", overall.counts.buy)
        );
        assert_eq!(overall.rating, overall.counts.rating());
        assert_eq!(report.signals.ema_50, report.moving_averages.ma50.exponential.signal);
        assert_eq!(report.signals.macd, report.oscillators.macd.signal);
    }
}
