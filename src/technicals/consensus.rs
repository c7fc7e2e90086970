use serde::Serialize;

use crate::model::{Rating, Signal};
use crate::technicals::IndicatorReading;

const STRONG_BUY_RATIO: f64 = 0.75;
const BUY_RATIO: f64 = 0.55;
const STRONG_SELL_RATIO: f64 = 0.25;
const SELL_RATIO: f64 = 0.45;

/// Number of BUY, SELL and NEUTRAL signals in a reading set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalCounts {
    pub buy: usize,
    pub sell: usize,
    pub neutral: usize,
}

impl SignalCounts {
    pub fn new(buy: usize, sell: usize, neutral: usize) -> Self {
        Self { buy, sell, neutral }
    }

    pub fn tally(signals: impl IntoIterator<Item = Signal>) -> Self {
        signals
            .into_iter()
            .fold(Self::default(), |mut counts, signal| {
                match signal {
                    Signal::Buy => counts.buy += 1,
                    Signal::Sell => counts.sell += 1,
                    Signal::Neutral => counts.neutral += 1,
                }
                counts
            })
    }

    pub fn total(&self) -> usize {
        self.buy + self.sell + self.neutral
    }

    /// Counts of the union of two disjoint reading sets.
    pub fn merge(self, other: Self) -> Self {
        Self::new(
            self.buy + other.buy,
            self.sell + other.sell,
            self.neutral + other.neutral,
        )
    }

    /// Map the bullish share of all signals to a rating.
    ///
    /// Thresholds are checked strongest-first, so a ratio of exactly 0.55 is
    /// `Buy` and exactly 0.45 is `Sell`.
    pub fn rating(&self) -> Rating {
        let total = self.total();
        if total == 0 {
            return Rating::Neutral;
        }

        let buy_ratio = self.buy as f64 / total as f64;
        if buy_ratio >= STRONG_BUY_RATIO {
            Rating::StrongBuy
        } else if buy_ratio >= BUY_RATIO {
            Rating::Buy
        } else if buy_ratio <= STRONG_SELL_RATIO {
            Rating::StrongSell
        } else if buy_ratio <= SELL_RATIO {
            Rating::Sell
        } else {
            Rating::Neutral
        }
    }
}

/// Rating together with the counts it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConsensusRating {
    pub rating: Rating,
    #[serde(flatten)]
    pub counts: SignalCounts,
}

impl ConsensusRating {
    pub fn from_counts(counts: SignalCounts) -> Self {
        Self {
            rating: counts.rating(),
            counts,
        }
    }

    pub fn from_readings<'a>(readings: impl IntoIterator<Item = &'a IndicatorReading>) -> Self {
        Self::from_counts(SignalCounts::tally(readings.into_iter().map(|r| r.signal)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(buy: usize, sell: usize, neutral: usize) -> Rating {
        SignalCounts::new(buy, sell, neutral).rating()
    }

    #[test]
    fn unanimous_counts() {
        assert_eq!(rating(6, 0, 0), Rating::StrongBuy);
        assert_eq!(rating(0, 6, 0), Rating::StrongSell);
    }

    #[test]
    fn balanced_and_empty_are_neutral() {
        assert_eq!(rating(2, 2, 2), Rating::Neutral);
        assert_eq!(rating(0, 0, 0), Rating::Neutral);
    }

    #[test]
    fn threshold_boundaries() {
        // 0.75
        assert_eq!(rating(3, 1, 0), Rating::StrongBuy);
        // 0.55 exactly resolves to Buy
        assert_eq!(rating(11, 9, 0), Rating::Buy);
        // 0.5
        assert_eq!(rating(5, 5, 0), Rating::Neutral);
        // 0.45 exactly resolves to Sell
        assert_eq!(rating(9, 11, 0), Rating::Sell);
        // 0.25
        assert_eq!(rating(1, 3, 0), Rating::StrongSell);
    }

    #[test]
    fn neutral_signals_dilute_buy_ratio() {
        // 3/6 = 0.5 even though nothing is bearish
        assert_eq!(rating(3, 0, 3), Rating::Neutral);
        // 1/6 < 0.25
        assert_eq!(rating(1, 0, 5), Rating::StrongSell);
    }

    #[test]
    fn tally_and_merge() {
        let osc = SignalCounts::tally([Signal::Buy, Signal::Neutral, Signal::Sell, Signal::Buy]);
        assert_eq!(osc, SignalCounts::new(2, 1, 1));
        let all = osc.merge(SignalCounts::new(1, 4, 0));
        assert_eq!(all, SignalCounts::new(3, 5, 1));
        assert_eq!(all.total(), 9);
    }

    #[test]
    fn consensus_serializes_flat() {
        let consensus = ConsensusRating::from_counts(SignalCounts::new(6, 0, 0));
        let json = serde_json::to_value(consensus).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"rating": "Strong Buy", "buy": 6, "sell": 0, "neutral": 0})
        );
    }
}
