//! Market feature extraction
//!
//! Turns a lookback window of prices into a [`FeatureVector`]:
//! - momentum: first-to-last change in percent
//! - trend: change over a short fixed lag ending at the last price
//! - volatility: population std of simple returns (not annualized)
//! - RSI: simple-average RSI over the trailing 14 returns
//!
//! A small TTL cache keyed by (network, symbol) can short-circuit repeated
//! computations within a cycle. It never changes the result.

use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::{FeatureVector, PricePoint};

/// Minimum number of prices needed to form one return
pub const MIN_PRICE_POINTS: usize = 2;

// =============================================================================
// Extractor
// =============================================================================

/// Feature extraction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// RSI lookback in returns
    pub rsi_period: usize,
    /// Number of steps back used for `trend_pct` (1 = previous point)
    pub trend_lag: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        FeatureConfig {
            rsi_period: 14,
            trend_lag: 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        FeatureExtractor { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Compute features for an ordered price window
    pub fn extract(&self, prices: &[PricePoint]) -> PipelineResult<FeatureVector> {
        validate_series(prices)?;

        let closes: Vec<f64> = prices.iter().map(|p| p.price).collect();
        let returns = simple_returns(&closes);

        let first = closes[0];
        let last = closes[closes.len() - 1];
        let lag = self.config.trend_lag.clamp(1, closes.len() - 1);
        let lagged = closes[closes.len() - 1 - lag];

        let features = FeatureVector {
            volatility: volatility(&returns),
            rsi: rsi(&returns, self.config.rsi_period),
            momentum_pct: (last / first - 1.0) * 100.0,
            trend_pct: (last / lagged - 1.0) * 100.0,
        };

        debug!(
            points = prices.len(),
            rsi = features.rsi,
            trend_pct = features.trend_pct,
            "Extracted features"
        );

        Ok(features)
    }
}

fn validate_series(prices: &[PricePoint]) -> PipelineResult<()> {
    if prices.len() < MIN_PRICE_POINTS {
        return Err(PipelineError::InsufficientData {
            required: MIN_PRICE_POINTS,
            actual: prices.len(),
        });
    }

    if let Some(bad) = prices.iter().find(|p| !p.price.is_finite() || p.price <= 0.0) {
        return Err(PipelineError::InvalidPriceSeries(format!(
            "non-positive price {} at {}",
            bad.price, bad.timestamp
        )));
    }

    if let Some((a, b)) = prices
        .iter()
        .tuple_windows()
        .find(|(a, b)| b.timestamp <= a.timestamp)
    {
        return Err(PipelineError::InvalidPriceSeries(format!(
            "timestamps not strictly increasing: {} then {}",
            a.timestamp, b.timestamp
        )));
    }

    Ok(())
}

// =============================================================================
// Indicator helpers
// =============================================================================

/// Simple returns `p[i] / p[i-1] - 1`
pub fn simple_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .iter()
        .tuple_windows()
        .map(|(prev, next)| next / prev - 1.0)
        .collect()
}

/// Population standard deviation of returns
pub fn volatility(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let std = returns.iter().population_std_dev();
    if std.is_finite() {
        std.max(0.0)
    } else {
        0.0
    }
}

/// RSI using arithmetic means of gains and losses over the trailing window
///
/// `avg_gain == 0` saturates to 0 (also covers a flat window);
/// `avg_loss == 0` with gains saturates to 100.
pub fn rsi(returns: &[f64], period: usize) -> f64 {
    let window = period.min(returns.len());
    if window == 0 {
        return 0.0;
    }

    let recent = &returns[returns.len() - window..];
    let avg_gain = recent.iter().map(|r| r.max(0.0)).sum::<f64>() / window as f64;
    let avg_loss = recent.iter().map(|r| (-r).max(0.0)).sum::<f64>() / window as f64;

    if avg_gain == 0.0 {
        return 0.0;
    }
    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

// =============================================================================
// TTL cache
// =============================================================================

/// Reuses features per (network, symbol) while they are younger than the TTL
#[derive(Debug, Clone)]
pub struct FeatureCache {
    ttl: Duration,
    entries: HashMap<(String, String), (DateTime<Utc>, FeatureVector)>,
}

impl FeatureCache {
    pub fn new(ttl: Duration) -> Self {
        FeatureCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn with_ttl_minutes(minutes: i64) -> Self {
        Self::new(Duration::minutes(minutes))
    }

    /// Cached features if computed less than `ttl` before `now`
    pub fn get(&self, network: &str, symbol: &str, now: DateTime<Utc>) -> Option<FeatureVector> {
        self.entries
            .get(&(network.to_string(), symbol.to_string()))
            .filter(|(at, _)| now.signed_duration_since(*at) < self.ttl)
            .map(|(_, features)| *features)
    }

    pub fn insert(
        &mut self,
        network: &str,
        symbol: &str,
        now: DateTime<Utc>,
        features: FeatureVector,
    ) {
        self.entries
            .insert((network.to_string(), symbol.to_string()), (now, features));
    }

    /// Return a fresh cached value or compute, store and return a new one
    pub fn get_or_compute<F>(
        &mut self,
        network: &str,
        symbol: &str,
        now: DateTime<Utc>,
        compute: F,
    ) -> PipelineResult<FeatureVector>
    where
        F: FnOnce() -> PipelineResult<FeatureVector>,
    {
        if let Some(features) = self.get(network, symbol, now) {
            debug!(network, symbol, "Feature cache hit");
            return Ok(features);
        }
        let features = compute()?;
        self.insert(network, symbol, now, features);
        Ok(features)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
