//! Pair-level market analysis and pipeline output types

use serde::{Deserialize, Serialize};

use crate::strategies::FusionStrategy;
use crate::{Distribution, FeatureVector, MarketRegime, QuantumOutcome, TradeSignal};

/// Floor applied to the quote volatility when forming the volatility ratio
pub const MIN_VOLATILITY: f64 = 1e-4;

/// Features and last price of one side of a pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub symbol: String,
    pub price: f64,
    pub features: FeatureVector,
}

/// Relative view of base against quote; the regime comes from the base token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub base: TokenSnapshot,
    pub quote: TokenSnapshot,
    /// base RSI minus quote RSI
    pub relative_strength: f64,
    /// base momentum minus quote momentum, in percent points
    pub performance_diff: f64,
    pub volatility_ratio: f64,
    pub regime: MarketRegime,
}

impl MarketAnalysis {
    pub fn new(base: TokenSnapshot, quote: TokenSnapshot, regime: MarketRegime) -> Self {
        let relative_strength = base.features.rsi - quote.features.rsi;
        let performance_diff = base.features.momentum_pct - quote.features.momentum_pct;
        let volatility_ratio =
            base.features.volatility / quote.features.volatility.max(MIN_VOLATILITY);

        MarketAnalysis {
            base,
            quote,
            relative_strength,
            performance_diff,
            volatility_ratio,
            regime,
        }
    }
}

/// Quantum job details kept alongside the signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantumSummary {
    pub circuit: String,
    pub backend: String,
    pub job_id: String,
    pub execution_time_s: f64,
    pub distribution: Distribution,
}

impl QuantumSummary {
    pub fn from_outcome(circuit: &str, outcome: &QuantumOutcome) -> Self {
        QuantumSummary {
            circuit: circuit.to_string(),
            backend: outcome.backend_id.clone(),
            job_id: outcome.job_id.clone(),
            execution_time_s: outcome.execution_time_s,
            distribution: outcome.distribution.clone(),
        }
    }
}

/// Complete analysis for one (network, pair)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairAnalysis {
    pub market: MarketAnalysis,
    pub strategy: FusionStrategy,
    pub quantum: QuantumSummary,
    pub signal: TradeSignal,
}
