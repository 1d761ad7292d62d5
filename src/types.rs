//! Core data types used across the trading pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Single observation of a token price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        PricePoint { timestamp, price }
    }
}

/// Base/quote token pair traded on a network
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    pub base: String,
    pub quote: String,
}

impl TradingPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        TradingPair {
            base: base.into(),
            quote: quote.into(),
        }
    }
}

impl std::fmt::Display for TradingPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Statistical features of a price window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Population standard deviation of simple returns
    pub volatility: f64,
    /// Relative Strength Index, 0..=100
    pub rsi: f64,
    /// Change from first to last price, in percent
    pub momentum_pct: f64,
    /// Short-horizon change ending at the last price, in percent
    pub trend_pct: f64,
}

/// Discrete market regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    Overbought,
    Oversold,
    Trending,
    Ranging,
}

impl std::fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MarketRegime::Overbought => "overbought",
            MarketRegime::Oversold => "oversold",
            MarketRegime::Trending => "trending",
            MarketRegime::Ranging => "ranging",
        };
        f.write_str(s)
    }
}

/// Trade direction recommended by a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

/// Fused trading decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub action: Action,
    pub confidence: f64,
    pub buy: f64,
    pub sell: f64,
    pub hold: f64,
}

impl TradeSignal {
    /// Pick the action with strictly the largest mass. Any exact tie resolves
    /// to HOLD.
    pub fn from_masses(buy: f64, sell: f64, hold: f64) -> Self {
        let action = if buy > sell && buy > hold {
            Action::Buy
        } else if sell > buy && sell > hold {
            Action::Sell
        } else {
            Action::Hold
        };

        TradeSignal {
            action,
            confidence: buy.max(sell).max(hold),
            buy,
            sell,
            hold,
        }
    }

    pub fn total_mass(&self) -> f64 {
        self.buy + self.sell + self.hold
    }
}

/// Probability distribution over measured bitstrings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distribution(pub BTreeMap<String, f64>);

impl Distribution {
    /// Tolerance used when checking that probabilities sum to one
    pub const TOLERANCE: f64 = 1e-6;

    pub fn new(probabilities: BTreeMap<String, f64>) -> Self {
        Distribution(probabilities)
    }

    /// Probability of a bitstring, 0 when it was never observed
    pub fn probability(&self, bitstring: &str) -> f64 {
        self.0.get(bitstring).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn is_normalized(&self) -> bool {
        (self.total() - 1.0).abs() <= Self::TOLERANCE && self.0.values().all(|p| *p >= 0.0)
    }

    /// Outcomes ordered by descending probability, ties by bitstring
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut outcomes: Vec<(&str, f64)> =
            self.0.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        outcomes.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        outcomes
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }
}

impl FromIterator<(String, f64)> for Distribution {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Distribution(iter.into_iter().collect())
    }
}

/// Result of a completed quantum job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantumOutcome {
    pub distribution: Distribution,
    pub backend_id: String,
    pub job_id: String,
    pub execution_time_s: f64,
}

/// Executed trade, as persisted in the trade-history log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub network: String,
    pub pair: String,
    pub from_token: String,
    pub to_token: String,
    pub amount: f64,
    pub action: Action,
    pub confidence: f64,
    pub backend: String,
    pub job_id: String,
    pub execution_time_s: f64,
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub market_regime: Option<MarketRegime>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Aggregate statistics over the trade-history log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_trades: usize,
    pub successful_trades: usize,
    pub success_rate: f64,
    pub strategies: BTreeMap<String, usize>,
    pub networks: BTreeMap<String, usize>,
    pub quantum_backends: BTreeMap<String, usize>,
    pub first_trade: Option<DateTime<Utc>>,
    pub last_trade: Option<DateTime<Utc>>,
}
