use std::fmt;

use chrono::NaiveDate;
use error_stack::{Report, bail};
use serde::{Deserialize, Serialize};

use crate::error::SeriesError;

/// One daily OHLCV bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Why the bar cannot be used, if it cannot.
    pub(crate) fn defect(&self) -> Option<&'static str> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Some("non-finite price");
        }
        if prices.iter().any(|&p| p <= 0.0) {
            return Some("non-positive price");
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Some("invalid volume");
        }
        if self.low > self.high {
            return Some("low above high");
        }
        None
    }
}

/// Validated daily price history for a single instrument, oldest bar first.
///
/// Construction rejects malformed bars so that indicator code can assume
/// finite, positive prices and strictly increasing dates.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<Bar>) -> Result<Self, Report<SeriesError>> {
        for (index, bar) in bars.iter().enumerate() {
            if let Some(reason) = bar.defect() {
                bail!(SeriesError::MalformedBar {
                    index,
                    date: bar.date.to_string(),
                    reason: reason.into(),
                });
            }
            if index > 0 && bars[index - 1].date >= bar.date {
                bail!(SeriesError::OutOfOrder {
                    index,
                    date: bar.date.to_string(),
                });
            }
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Close of the most recent bar.
    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }
}

/// Categorical signal emitted by a single indicator reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Neutral,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Consensus rating over a set of signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    #[serde(rename = "Strong Sell")]
    StrongSell,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrongBuy => write!(f, "Strong Buy"),
            Self::Buy => write!(f, "Buy"),
            Self::Neutral => write!(f, "Neutral"),
            Self::Sell => write!(f, "Sell"),
            Self::StrongSell => write!(f, "Strong Sell"),
        }
    }
}

/// Three-tier volatility classification derived from ATR as a percentage of price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolatilityRank {
    Low,
    Medium,
    High,
}

/// Binary volatility classification (ATR above or below 2% of price).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolatilityScore {
    Low,
    High,
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn series_accepts_well_formed_bars() {
        let series = PriceSeries::new(bars_from_closes(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.last_close(), Some(3.0));
    }

    #[test]
    fn empty_series_has_no_last_close() {
        let series = PriceSeries::new(vec![]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.last_close(), None);
    }

    #[test]
    fn series_rejects_non_finite_price() {
        let mut bars = bars_from_closes(&[1.0, 2.0]);
        bars[1].close = f64::NAN;
        assert!(PriceSeries::new(bars).is_err());
    }

    #[test]
    fn series_rejects_inverted_range() {
        let mut bars = bars_from_closes(&[10.0, 11.0]);
        bars[0].low = 12.0;
        assert!(PriceSeries::new(bars).is_err());
    }

    #[test]
    fn series_rejects_negative_volume() {
        let mut bars = bars_from_closes(&[10.0, 11.0]);
        bars[1].volume = -1.0;
        assert!(PriceSeries::new(bars).is_err());
    }

    #[test]
    fn series_rejects_duplicate_dates() {
        let mut bars = bars_from_closes(&[10.0, 11.0]);
        bars[1].date = bars[0].date;
        let err = PriceSeries::new(bars).unwrap_err();
        assert!(matches!(
            err.current_context(),
            SeriesError::OutOfOrder { index: 1, .. }
        ));
    }

    #[test]
    fn signal_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"BUY\"");
        assert_eq!(
            serde_json::to_string(&Signal::Neutral).unwrap(),
            "\"NEUTRAL\""
        );
    }

    #[test]
    fn rating_serializes_with_spaces() {
        assert_eq!(
            serde_json::to_string(&Rating::StrongBuy).unwrap(),
            "\"Strong Buy\""
        );
        assert_eq!(Rating::StrongSell.to_string(), "Strong Sell");
    }
}
