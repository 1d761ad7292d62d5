//! Market regime classification
//!
//! Conditions overlap, so the checks run in a fixed order and the first
//! match wins: overbought, oversold, trending, ranging.

use serde::{Deserialize, Serialize};

use crate::{FeatureVector, MarketRegime};

/// Regime decision thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeThresholds {
    /// RSI strictly above this is overbought
    pub overbought_rsi: f64,
    /// RSI strictly below this is oversold
    pub oversold_rsi: f64,
    /// |trend_pct| strictly above this is trending
    pub trending_pct: f64,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        RegimeThresholds {
            overbought_rsi: 70.0,
            oversold_rsi: 30.0,
            trending_pct: 5.0,
        }
    }
}

impl RegimeThresholds {
    pub fn classify(&self, features: &FeatureVector) -> MarketRegime {
        if features.rsi > self.overbought_rsi {
            MarketRegime::Overbought
        } else if features.rsi < self.oversold_rsi {
            MarketRegime::Oversold
        } else if features.trend_pct.abs() > self.trending_pct {
            MarketRegime::Trending
        } else {
            MarketRegime::Ranging
        }
    }
}

/// Classify with the default thresholds
pub fn classify(features: &FeatureVector) -> MarketRegime {
    RegimeThresholds::default().classify(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(rsi: f64, trend_pct: f64) -> FeatureVector {
        FeatureVector {
            volatility: 0.02,
            rsi,
            momentum_pct: 0.0,
            trend_pct,
        }
    }

    #[test]
    fn test_overbought_wins_over_trend() {
        assert_eq!(classify(&features(75.0, 40.0)), MarketRegime::Overbought);
        assert_eq!(classify(&features(75.0, -40.0)), MarketRegime::Overbought);
        assert_eq!(classify(&features(75.0, 0.0)), MarketRegime::Overbought);
    }

    #[test]
    fn test_oversold_wins_over_trend() {
        assert_eq!(classify(&features(25.0, -12.0)), MarketRegime::Oversold);
    }

    #[test]
    fn test_trending_in_both_directions() {
        assert_eq!(classify(&features(50.0, 5.1)), MarketRegime::Trending);
        assert_eq!(classify(&features(50.0, -5.1)), MarketRegime::Trending);
    }

    #[test]
    fn test_boundaries_are_strict() {
        assert_eq!(classify(&features(70.0, 0.0)), MarketRegime::Ranging);
        assert_eq!(classify(&features(30.0, 0.0)), MarketRegime::Ranging);
        assert_eq!(classify(&features(50.0, 5.0)), MarketRegime::Ranging);
    }

    #[test]
    fn test_classification_is_repeatable() {
        let f = features(64.2, -3.3);
        assert_eq!(classify(&f), classify(&f));
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = RegimeThresholds {
            trending_pct: 2.0,
            ..Default::default()
        };
        assert_eq!(thresholds.classify(&features(50.0, 3.0)), MarketRegime::Trending);
    }
}
