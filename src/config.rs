//! Configuration management
//!
//! Handles loading and validation of the JSON configuration file. Every
//! section has defaults, so a file only needs the parts it changes.
//! Storage paths and the wallet address can be overridden from the
//! environment (`QT_TRADE_HISTORY`, `QT_USAGE_FILE`, `QT_WALLET_ADDRESS`).

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::data::{CsvMarketData, MarketDataSource, SyntheticMarketData};
use crate::features::FeatureConfig;
use crate::quantum::{LocalSimulator, PollConfig, PollingExecutor};
use crate::regime::RegimeThresholds;
use crate::risk::PositionSizerConfig;
use crate::strategies::SignalConfig;
use crate::wallet::{NetworkWalletConfig, PaperWallet};
use crate::TradingPair;

/// Longest job timeout accepted, one day
pub const MAX_TIMEOUT_SECS: f64 = 86_400.0;
/// Largest poll backoff multiplier accepted
pub const MAX_POLL_BACKOFF: f64 = 10.0;

/// Seconds to `Duration`, saturating on values `Duration` cannot hold
fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub trading: TradingConfig,
    pub sizing: PositionSizerConfig,
    pub signal: SignalConfig,
    pub regime: RegimeThresholds,
    pub features: FeatureConfig,
    pub market_data: MarketDataConfig,
    pub quantum: QuantumConfig,
    pub wallet: WalletConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("QT_TRADE_HISTORY") {
            self.storage.trade_history = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("QT_USAGE_FILE") {
            self.storage.usage = PathBuf::from(path);
        }
        if let Ok(address) = std::env::var("QT_WALLET_ADDRESS") {
            self.wallet.address = Some(address);
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let sizing = &self.sizing;
        if !(sizing.base_trade_amount > 0.0) {
            bail!("sizing.base_trade_amount must be positive");
        }
        if !(0.0..=1.0).contains(&sizing.min_confidence) {
            bail!("sizing.min_confidence must be within [0, 1]");
        }
        if !(sizing.balance_clamp > 0.0 && sizing.balance_clamp <= 1.0) {
            bail!("sizing.balance_clamp must be within (0, 1]");
        }
        if !(0.0..1.0).contains(&self.trading.slippage) {
            bail!("trading.slippage must be within [0, 1)");
        }
        if !(0.0..=1.0).contains(&self.signal.reversion_threshold) {
            bail!("signal.reversion_threshold must be within [0, 1]");
        }
        if self.market_data.lookback_days < 2 {
            bail!("market_data.lookback_days must be at least 2");
        }
        if !(self.market_data.daily_volatility.is_finite()
            && self.market_data.daily_volatility >= 0.0)
        {
            bail!("market_data.daily_volatility must be a non-negative number");
        }
        let q = &self.quantum;
        if !(1.0..=MAX_POLL_BACKOFF).contains(&q.poll_backoff) {
            bail!("quantum.poll_backoff must be within [1, {}]", MAX_POLL_BACKOFF);
        }
        for (name, secs) in [
            ("poll_initial_secs", q.poll_initial_secs),
            ("poll_max_secs", q.poll_max_secs),
            ("timeout_secs", q.timeout_secs),
        ] {
            if !(secs > 0.0 && secs <= MAX_TIMEOUT_SECS) {
                bail!(
                    "quantum.{} must be within (0, {}] seconds",
                    name,
                    MAX_TIMEOUT_SECS
                );
            }
        }
        if q.poll_initial_secs > q.poll_max_secs || q.poll_max_secs > q.timeout_secs {
            bail!("quantum poll intervals must satisfy initial <= max <= timeout");
        }
        for (network, pairs) in &self.trading.pairs {
            if pairs.iter().any(|p| p.base == p.quote) {
                bail!("network {} has a pair trading a token against itself", network);
            }
        }
        Ok(())
    }

    /// Configured networks in order
    pub fn networks(&self) -> Vec<&str> {
        self.trading.pairs.keys().map(String::as_str).collect()
    }

    /// Short SHA-256 fingerprint of the effective configuration
    pub fn fingerprint(&self) -> Result<String> {
        let json = serde_json::to_string(self).context("Failed to serialize config")?;
        let digest = Sha256::digest(json.as_bytes());
        Ok(hex::encode(&digest[..8]))
    }

    pub fn poll_config(&self) -> PollConfig {
        let q = &self.quantum;
        PollConfig::default()
            .with_initial_interval(seconds(q.poll_initial_secs))
            .with_max_interval(seconds(q.poll_max_secs))
            .with_backoff_multiplier(q.poll_backoff)
            .with_timeout(seconds(q.timeout_secs))
    }

    /// Executor over the bundled local simulator
    pub fn build_executor(&self) -> PollingExecutor {
        PollingExecutor::new(self.poll_config())
            .with_backend(Box::new(LocalSimulator::new(self.quantum.seed)))
    }

    pub fn build_market_data(&self) -> Box<dyn MarketDataSource> {
        let md = &self.market_data;
        match md.source {
            MarketDataKind::Synthetic => Box::new(
                SyntheticMarketData::new(md.seed, md.daily_volatility)
                    .with_reference_prices(md.reference_prices.clone()),
            ),
            MarketDataKind::Csv => Box::new(CsvMarketData::new(&md.data_dir)),
        }
    }

    pub fn build_wallet(&self) -> PaperWallet {
        PaperWallet::new(self.wallet.address.clone(), self.wallet.networks.clone())
    }
}

/// Pairs to trade per network
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    /// Network name to ordered pair list
    pub pairs: BTreeMap<String, Vec<TradingPair>>,
    /// Maximum swap slippage as a fraction (0.01 = 1%)
    pub slippage: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        TradingConfig {
            pairs: BTreeMap::new(),
            slippage: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketDataKind {
    #[default]
    Synthetic,
    Csv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketDataConfig {
    pub source: MarketDataKind,
    pub lookback_days: usize,
    pub cache_ttl_minutes: i64,
    /// Daily return standard deviation of the synthetic walk
    pub daily_volatility: f64,
    pub seed: u64,
    /// Directory holding `{SYMBOL}.csv` files for the CSV source
    pub data_dir: PathBuf,
    /// Current prices the synthetic walk is anchored at
    pub reference_prices: BTreeMap<String, f64>,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        MarketDataConfig {
            source: MarketDataKind::Synthetic,
            lookback_days: 30,
            cache_ttl_minutes: 15,
            daily_volatility: 0.02,
            seed: 42,
            data_dir: PathBuf::from("data"),
            reference_prices: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantumConfig {
    pub shots: u32,
    pub allow_simulator: bool,
    pub poll_initial_secs: f64,
    pub poll_max_secs: f64,
    pub poll_backoff: f64,
    pub timeout_secs: f64,
    /// Seed for simulator shot sampling
    pub seed: u64,
    /// Credits charged per completed job in the usage file
    pub credits_per_job: f64,
}

impl Default for QuantumConfig {
    fn default() -> Self {
        QuantumConfig {
            shots: 1000,
            allow_simulator: true,
            poll_initial_secs: 5.0,
            poll_max_secs: 30.0,
            poll_backoff: 1.5,
            timeout_secs: 600.0,
            seed: 42,
            credits_per_job: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub networks: BTreeMap<String, NetworkWalletConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub trade_history: PathBuf,
    pub usage: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            trade_history: PathBuf::from("logs/trade_history.json"),
            usage: PathBuf::from("logs/quantum_usage.json"),
        }
    }
}
