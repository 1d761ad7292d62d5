//! Mean-reversion fusion for overbought / oversold markets
//!
//! The price prediction circuit measures a single output qubit. Outcome
//! `1` is read as reversion, `0` as continuation.

use super::SignalConfig;
use crate::{Action, Distribution, MarketRegime, TradeSignal};

pub const REVERSION_STATE: &str = "1";
pub const CONTINUATION_STATE: &str = "0";

/// Reversion and continuation probabilities read off the distribution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReversionReading {
    pub reversion_probability: f64,
    pub continuation_probability: f64,
}

impl ReversionReading {
    pub fn from_distribution(distribution: &Distribution) -> Self {
        ReversionReading {
            reversion_probability: distribution.probability(REVERSION_STATE),
            continuation_probability: distribution.probability(CONTINUATION_STATE),
        }
    }
}

/// Trade against an overextended move when reversion is likely enough.
///
/// The reversion mass sits on the direction a reversion would trade and
/// the rest is hold. Regimes other than overbought/oversold carry no
/// directional view.
pub fn fuse(regime: MarketRegime, distribution: &Distribution, config: &SignalConfig) -> TradeSignal {
    let reading = ReversionReading::from_distribution(distribution);
    let rev = reading.reversion_probability.clamp(0.0, 1.0);
    let hold = 1.0 - rev;

    let (buy, sell) = match regime {
        MarketRegime::Overbought => (0.0, rev),
        MarketRegime::Oversold => (rev, 0.0),
        MarketRegime::Trending | MarketRegime::Ranging => {
            return TradeSignal::from_masses(0.0, 0.0, 1.0);
        }
    };

    if rev > config.reversion_threshold {
        let action = if regime == MarketRegime::Overbought {
            Action::Sell
        } else {
            Action::Buy
        };
        return TradeSignal {
            action,
            confidence: rev,
            buy,
            sell,
            hold,
        };
    }

    TradeSignal {
        action: Action::Hold,
        confidence: hold.max(config.hold_confidence_floor),
        buy,
        sell,
        hold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn dist(reversion: f64) -> Distribution {
        [
            ("1".to_string(), reversion),
            ("0".to_string(), 1.0 - reversion),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_overbought_reversion_sells() {
        let signal = fuse(MarketRegime::Overbought, &dist(0.7), &SignalConfig::default());
        assert_eq!(signal.action, Action::Sell);
        assert_abs_diff_eq!(signal.confidence, 0.7, epsilon = 1e-12);
        assert_abs_diff_eq!(signal.sell, 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_oversold_reversion_buys() {
        let signal = fuse(MarketRegime::Oversold, &dist(0.55), &SignalConfig::default());
        assert_eq!(signal.action, Action::Buy);
        assert_abs_diff_eq!(signal.confidence, 0.55, epsilon = 1e-12);
    }

    #[test]
    fn test_threshold_is_strict() {
        let signal = fuse(MarketRegime::Oversold, &dist(0.5), &SignalConfig::default());
        assert_eq!(signal.action, Action::Hold);
        assert_abs_diff_eq!(signal.confidence, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_hold_confidence_floor() {
        let config = SignalConfig {
            reversion_threshold: 0.99,
            ..Default::default()
        };
        let signal = fuse(MarketRegime::Overbought, &dist(0.95), &config);
        assert_eq!(signal.action, Action::Hold);
        assert_abs_diff_eq!(signal.confidence, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_reading_extracts_both_states() {
        let reading = ReversionReading::from_distribution(&dist(0.25));
        assert_abs_diff_eq!(reading.reversion_probability, 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(reading.continuation_probability, 0.75, epsilon = 1e-12);
    }
}
