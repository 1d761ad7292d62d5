//! Signal fusion strategies
//!
//! The market regime selects one of three fusion strategies. Each strategy
//! picks the circuit to run and reads the measured distribution back as
//! buy / sell / hold probability mass.
//!
//! The bitstring-to-direction mappings are heuristics with no derivation
//! behind them. They are kept stable so signals stay comparable across runs.

pub mod mean_reversion;
pub mod momentum;
pub mod ranging;

use serde::{Deserialize, Serialize};

use crate::analysis::MarketAnalysis;
use crate::error::{PipelineError, PipelineResult};
use crate::quantum::{normalize_prices, CircuitDescriptor, QuantumError};
use crate::{MarketRegime, QuantumOutcome, TradeSignal};

/// Number of trailing prices fed to the price prediction circuit
pub const PREDICTION_WINDOW: usize = 4;

/// Fusion strategy, one per regime family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionStrategy {
    Momentum,
    MeanReversion,
    Ranging,
}

impl FusionStrategy {
    pub fn for_regime(regime: MarketRegime) -> Self {
        match regime {
            MarketRegime::Trending => FusionStrategy::Momentum,
            MarketRegime::Overbought | MarketRegime::Oversold => FusionStrategy::MeanReversion,
            MarketRegime::Ranging => FusionStrategy::Ranging,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FusionStrategy::Momentum => "momentum",
            FusionStrategy::MeanReversion => "mean_reversion",
            FusionStrategy::Ranging => "ranging",
        }
    }

    /// Circuit for this strategy given the pair analysis and recent base prices
    pub fn circuit(&self, market: &MarketAnalysis, recent_prices: &[f64]) -> CircuitDescriptor {
        match self {
            FusionStrategy::Momentum => CircuitDescriptor::Momentum {
                trend: (market.base.features.trend_pct / 10.0).clamp(-1.0, 1.0),
                volatility: (market.volatility_ratio / 5.0).clamp(0.0, 1.0),
            },
            FusionStrategy::MeanReversion => {
                let start = recent_prices.len().saturating_sub(PREDICTION_WINDOW);
                CircuitDescriptor::PricePrediction {
                    normalized_prices: normalize_prices(&recent_prices[start..]),
                }
            }
            FusionStrategy::Ranging => CircuitDescriptor::Bell,
        }
    }
}

impl std::fmt::Display for FusionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Signal fusion parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Reversion probability must exceed this to trade against the move
    pub reversion_threshold: f64,
    /// Lowest confidence reported for a mean-reversion HOLD
    pub hold_confidence_floor: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        SignalConfig {
            reversion_threshold: 0.5,
            hold_confidence_floor: 0.1,
        }
    }
}

/// Turns (regime, quantum outcome) into a trade signal
#[derive(Debug, Clone, Default)]
pub struct SignalGenerator {
    config: SignalConfig,
}

impl SignalGenerator {
    pub fn new(config: SignalConfig) -> Self {
        SignalGenerator { config }
    }

    /// Fuse an outcome into a signal. A distribution that does not sum to one
    /// is a quantum execution failure and yields no signal.
    pub fn generate(
        &self,
        regime: MarketRegime,
        outcome: &QuantumOutcome,
    ) -> PipelineResult<TradeSignal> {
        let distribution = &outcome.distribution;
        if !distribution.is_normalized() {
            return Err(PipelineError::QuantumExecution(
                QuantumError::InvalidDistribution(format!(
                    "job {} probabilities sum to {:.6}",
                    outcome.job_id,
                    distribution.total()
                )),
            ));
        }

        let signal = match FusionStrategy::for_regime(regime) {
            FusionStrategy::Momentum => momentum::fuse(distribution),
            FusionStrategy::MeanReversion => {
                mean_reversion::fuse(regime, distribution, &self.config)
            }
            FusionStrategy::Ranging => ranging::fuse(distribution),
        };

        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::TokenSnapshot;
    use crate::{Action, Distribution, FeatureVector};

    fn outcome(pairs: &[(&str, f64)]) -> QuantumOutcome {
        QuantumOutcome {
            distribution: pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            backend_id: "test".to_string(),
            job_id: "job".to_string(),
            execution_time_s: 0.0,
        }
    }

    fn analysis(trend_pct: f64, volatility: f64) -> MarketAnalysis {
        let features = FeatureVector {
            volatility,
            rsi: 50.0,
            momentum_pct: 0.0,
            trend_pct,
        };
        MarketAnalysis::new(
            TokenSnapshot {
                symbol: "ETH".to_string(),
                price: 100.0,
                features,
            },
            TokenSnapshot {
                symbol: "USDC".to_string(),
                price: 1.0,
                features: FeatureVector {
                    volatility: 0.01,
                    ..features
                },
            },
            MarketRegime::Trending,
        )
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(
            FusionStrategy::for_regime(MarketRegime::Trending),
            FusionStrategy::Momentum
        );
        assert_eq!(
            FusionStrategy::for_regime(MarketRegime::Overbought),
            FusionStrategy::MeanReversion
        );
        assert_eq!(
            FusionStrategy::for_regime(MarketRegime::Oversold),
            FusionStrategy::MeanReversion
        );
        assert_eq!(
            FusionStrategy::for_regime(MarketRegime::Ranging),
            FusionStrategy::Ranging
        );
    }

    #[test]
    fn test_momentum_circuit_parameters_are_clamped() {
        let circuit = FusionStrategy::Momentum.circuit(&analysis(25.0, 0.08), &[]);
        assert_eq!(
            circuit,
            CircuitDescriptor::Momentum {
                trend: 1.0,
                volatility: 1.0
            }
        );
    }

    #[test]
    fn test_mean_reversion_circuit_uses_last_four_prices() {
        let circuit = FusionStrategy::MeanReversion
            .circuit(&analysis(0.0, 0.01), &[1.0, 50.0, 10.0, 20.0, 30.0, 40.0]);
        assert_eq!(
            circuit,
            CircuitDescriptor::PricePrediction {
                normalized_prices: normalize_prices(&[10.0, 20.0, 30.0, 40.0])
            }
        );
    }

    #[test]
    fn test_ranging_uses_bell_circuit() {
        assert_eq!(
            FusionStrategy::Ranging.circuit(&analysis(0.0, 0.01), &[]),
            CircuitDescriptor::Bell
        );
    }

    #[test]
    fn test_unnormalized_distribution_is_error() {
        let generator = SignalGenerator::default();
        let err = generator
            .generate(MarketRegime::Ranging, &outcome(&[("00", 0.4), ("11", 0.4)]))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::QuantumExecution(QuantumError::InvalidDistribution(_))
        ));
    }

    #[test]
    fn test_generate_dispatches_by_regime() {
        let generator = SignalGenerator::default();
        let dist = outcome(&[("11", 0.5), ("10", 0.3), ("00", 0.2)]);

        let trending = generator.generate(MarketRegime::Trending, &dist).unwrap();
        assert_eq!(trending.action, Action::Buy);

        let ranging = generator.generate(MarketRegime::Ranging, &dist).unwrap();
        assert_eq!(ranging.action, Action::Buy);
        assert!((ranging.buy - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_masses_sum_to_one_for_every_strategy() {
        let generator = SignalGenerator::default();
        let distributions: Vec<Distribution> = vec![
            outcome(&[("000", 0.1), ("011", 0.2), ("100", 0.3), ("111", 0.4)]).distribution,
            outcome(&[("0", 0.35), ("1", 0.65)]).distribution,
            outcome(&[("00", 0.25), ("01", 0.25), ("10", 0.25), ("11", 0.25)]).distribution,
        ];
        let regimes = [
            MarketRegime::Trending,
            MarketRegime::Overbought,
            MarketRegime::Oversold,
            MarketRegime::Ranging,
        ];

        for dist in &distributions {
            for regime in regimes {
                let o = QuantumOutcome {
                    distribution: dist.clone(),
                    ..outcome(&[])
                };
                let signal = generator.generate(regime, &o).unwrap();
                assert!((signal.total_mass() - 1.0).abs() < 1e-6);
                assert_eq!(signal.confidence, signal.buy.max(signal.sell).max(signal.hold));
            }
        }
    }
}
