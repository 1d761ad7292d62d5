//! Trading cycle runner
//!
//! One cycle walks every configured (network, pair) in order:
//!
//! 1. fetch base and quote histories, extract features (TTL cached)
//! 2. classify the base regime and build the pair analysis
//! 3. run the regime's circuit and fuse the outcome into a signal
//! 4. size the position, resolve tokens and check the address book
//! 5. swap through the wallet and append the trade to the history log
//!
//! A failure in any step is recorded in that pair's slot of the report and
//! the cycle moves on to the next pair.

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

use crate::analysis::{MarketAnalysis, PairAnalysis, QuantumSummary, TokenSnapshot};
use crate::config::Config;
use crate::data::MarketDataSource;
use crate::error::{PipelineError, PipelineResult};
use crate::features::{FeatureCache, FeatureExtractor};
use crate::history::TradeHistory;
use crate::quantum::{QuantumExecutor, UsageTracker};
use crate::regime::RegimeThresholds;
use crate::risk::{NoTradeReason, PositionSizer};
use crate::strategies::{FusionStrategy, SignalGenerator};
use crate::wallet::{SwapReceipt, WalletClient};
use crate::{Action, PricePoint, TradeRecord, TradingPair};

// =============================================================================
// Report types
// =============================================================================

/// What happened after a signal was generated
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TradeOutcome {
    NoTrade {
        reason: NoTradeReason,
        detail: String,
    },
    Executed {
        receipt: SwapReceipt,
        record: TradeRecord,
    },
}

/// Result slot for one pair in a cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PairOutcome {
    Completed {
        analysis: Box<PairAnalysis>,
        trade_result: TradeOutcome,
    },
    Failed {
        error: String,
    },
}

impl PairOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(
            self,
            PairOutcome::Completed {
                trade_result: TradeOutcome::Executed { .. },
                ..
            }
        )
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PairOutcome::Failed { error } => Some(error),
            PairOutcome::Completed { .. } => None,
        }
    }
}

/// Network to pair (`BASE/QUOTE`) to outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CycleReport {
    pub networks: BTreeMap<String, BTreeMap<String, PairOutcome>>,
}

impl CycleReport {
    pub fn pair(&self, network: &str, pair: &str) -> Option<&PairOutcome> {
        self.networks.get(network).and_then(|pairs| pairs.get(pair))
    }

    fn outcomes(&self) -> impl Iterator<Item = &PairOutcome> {
        self.networks.values().flat_map(|pairs| pairs.values())
    }

    pub fn pairs_processed(&self) -> usize {
        self.outcomes().count()
    }

    pub fn trades_executed(&self) -> usize {
        self.outcomes().filter(|o| o.is_executed()).count()
    }

    pub fn errors(&self) -> usize {
        self.outcomes().filter(|o| o.error().is_some()).count()
    }
}

// =============================================================================
// Runner
// =============================================================================

/// Execution settings taken from the configuration
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub lookback: usize,
    pub shots: u32,
    pub allow_simulator: bool,
    pub slippage: f64,
    pub credits_per_job: f64,
}

impl CycleSettings {
    pub fn from_config(config: &Config) -> Self {
        CycleSettings {
            lookback: config.market_data.lookback_days,
            shots: config.quantum.shots,
            allow_simulator: config.quantum.allow_simulator,
            slippage: config.trading.slippage,
            credits_per_job: config.quantum.credits_per_job,
        }
    }
}

pub struct CycleRunner {
    pairs: BTreeMap<String, Vec<TradingPair>>,
    settings: CycleSettings,
    extractor: FeatureExtractor,
    thresholds: RegimeThresholds,
    signals: SignalGenerator,
    sizer: PositionSizer,
    cache: FeatureCache,
    market_data: Box<dyn MarketDataSource>,
    executor: Box<dyn QuantumExecutor>,
    wallet: Box<dyn WalletClient>,
    history: TradeHistory,
}

impl CycleRunner {
    pub fn new(
        config: &Config,
        market_data: Box<dyn MarketDataSource>,
        executor: Box<dyn QuantumExecutor>,
        wallet: Box<dyn WalletClient>,
    ) -> Self {
        CycleRunner {
            pairs: config.trading.pairs.clone(),
            settings: CycleSettings::from_config(config),
            extractor: FeatureExtractor::new(config.features.clone()),
            thresholds: config.regime,
            signals: SignalGenerator::new(config.signal.clone()),
            sizer: PositionSizer::new(config.sizing.clone()),
            cache: FeatureCache::with_ttl_minutes(config.market_data.cache_ttl_minutes),
            market_data,
            executor,
            wallet,
            history: TradeHistory::new(&config.storage.trade_history),
        }
    }

    pub fn history(&self) -> &TradeHistory {
        &self.history
    }

    pub fn wallet(&self) -> &dyn WalletClient {
        self.wallet.as_ref()
    }

    /// Run one cycle over a single network, or all configured networks
    pub fn run_cycle(
        &mut self,
        network: Option<&str>,
        usage: &mut UsageTracker,
    ) -> PipelineResult<CycleReport> {
        let networks: Vec<String> = match network {
            Some(name) => {
                if !self.pairs.contains_key(name) {
                    return Err(PipelineError::Configuration(format!(
                        "network '{}' has no configured pairs",
                        name
                    )));
                }
                vec![name.to_string()]
            }
            None => self.pairs.keys().cloned().collect(),
        };

        let mut report = CycleReport::default();
        for network in networks {
            let pairs = self.pairs.get(&network).cloned().unwrap_or_default();
            info!("Running trading cycle on {} ({} pairs)", network, pairs.len());

            let mut results = BTreeMap::new();
            for pair in pairs {
                let outcome = match self.execute_pair(&network, &pair, usage) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("{} on {} failed: {}", pair, network, e);
                        PairOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                };
                results.insert(pair.to_string(), outcome);
            }
            report.networks.insert(network, results);
        }

        info!(
            "Cycle complete: {} pairs, {} trades, {} errors",
            report.pairs_processed(),
            report.trades_executed(),
            report.errors()
        );
        Ok(report)
    }

    fn history_for(&self, network: &str, symbol: &str) -> PipelineResult<Vec<PricePoint>> {
        self.market_data
            .price_history(network, symbol, self.settings.lookback)
    }

    fn snapshot(
        &mut self,
        network: &str,
        symbol: &str,
        history: &[PricePoint],
    ) -> PipelineResult<TokenSnapshot> {
        let extractor = &self.extractor;
        let features = self
            .cache
            .get_or_compute(network, symbol, Utc::now(), || extractor.extract(history))?;
        let price = history.last().map(|p| p.price).ok_or(PipelineError::InsufficientData {
            required: crate::features::MIN_PRICE_POINTS,
            actual: 0,
        })?;

        Ok(TokenSnapshot {
            symbol: symbol.to_string(),
            price,
            features,
        })
    }

    /// Analysis and signal for a pair without trading
    pub fn analyze_pair(
        &mut self,
        network: &str,
        pair: &TradingPair,
        usage: &mut UsageTracker,
    ) -> PipelineResult<PairAnalysis> {
        info!("Analyzing {} on {}", pair, network);

        let base_history = self.history_for(network, &pair.base)?;
        let quote_history = self.history_for(network, &pair.quote)?;
        let base = self.snapshot(network, &pair.base, &base_history)?;
        let quote = self.snapshot(network, &pair.quote, &quote_history)?;

        let regime = self.thresholds.classify(&base.features);
        let market = MarketAnalysis::new(base, quote, regime);
        info!(
            "Market regime: {}, RSI: {:.2}, trend: {:.2}%",
            regime, market.base.features.rsi, market.base.features.trend_pct
        );

        let strategy = FusionStrategy::for_regime(regime);
        let base_prices: Vec<f64> = base_history.iter().map(|p| p.price).collect();
        let circuit = strategy.circuit(&market, &base_prices);

        let outcome = self.executor.execute(
            &circuit,
            self.settings.shots,
            self.settings.allow_simulator,
        )?;
        usage.record_job(&outcome.backend_id, self.settings.credits_per_job);

        let signal = self.signals.generate(regime, &outcome)?;
        info!(
            "{} signal for {}: {} (confidence {:.3})",
            strategy, pair, signal.action, signal.confidence
        );

        Ok(PairAnalysis {
            market,
            strategy,
            quantum: QuantumSummary::from_outcome(circuit.name(), &outcome),
            signal,
        })
    }

    /// Analyze a pair and, if the signal qualifies, trade it
    pub fn execute_pair(
        &mut self,
        network: &str,
        pair: &TradingPair,
        usage: &mut UsageTracker,
    ) -> PipelineResult<PairOutcome> {
        self.trade_pair(network, pair, None, usage)
    }

    /// Like [`execute_pair`](Self::execute_pair), with `amount` replacing the
    /// confidence-scaled size. HOLD, low confidence and short balances still
    /// end as no-trade outcomes.
    pub fn trade_pair(
        &mut self,
        network: &str,
        pair: &TradingPair,
        amount: Option<f64>,
        usage: &mut UsageTracker,
    ) -> PipelineResult<PairOutcome> {
        if let Some(fixed) = amount {
            if !(fixed.is_finite() && fixed > 0.0) {
                return Err(PipelineError::Configuration(format!(
                    "trade amount must be positive, got {}",
                    fixed
                )));
            }
        }

        let analysis = self.analyze_pair(network, pair, usage)?;
        let signal = analysis.signal;

        let target = match self.sizer.target_size_or(&signal, amount) {
            Ok(size) => size,
            Err(reason) => {
                let detail = match reason {
                    NoTradeReason::HoldSignal => "signal is HOLD".to_string(),
                    _ => format!(
                        "confidence {:.3} below minimum {:.3}",
                        signal.confidence,
                        self.sizer.config().min_confidence
                    ),
                };
                return Ok(no_trade(network, pair, analysis, reason, detail));
            }
        };

        let (from_token, to_token) = match signal.action {
            Action::Buy => (pair.quote.as_str(), pair.base.as_str()),
            Action::Sell => (pair.base.as_str(), pair.quote.as_str()),
            Action::Hold => {
                return Ok(no_trade(
                    network,
                    pair,
                    analysis,
                    NoTradeReason::HoldSignal,
                    "signal is HOLD".to_string(),
                ))
            }
        };

        let specs = self.wallet.get_network_specs(network)?;
        for token in [from_token, to_token] {
            if !specs.tokens.contains_key(token) {
                return Err(PipelineError::Configuration(format!(
                    "token {} has no address on {}",
                    token, network
                )));
            }
        }

        let balances = self.wallet.get_balances(network)?;
        let available = balances.get(from_token).map(|b| b.balance).unwrap_or(0.0);
        let amount = match self.sizer.clamp_to_balance(target, available) {
            Ok(amount) => amount,
            Err(reason) => {
                let detail = format!("available {} balance is {}", from_token, available);
                return Ok(no_trade(network, pair, analysis, reason, detail));
            }
        };
        if amount < target {
            warn!(
                "Clamped {} trade from {:.6} to {:.6} {} by balance",
                pair, target, amount, from_token
            );
        }

        info!(
            "Executing {} {} -> {} amount {:.6} on {}",
            signal.action, from_token, to_token, amount, network
        );
        let receipt = self.wallet.execute_swap(
            network,
            from_token,
            to_token,
            amount,
            self.settings.slippage,
        )?;

        let record = TradeRecord {
            timestamp: Utc::now(),
            network: network.to_string(),
            pair: pair.to_string(),
            from_token: from_token.to_string(),
            to_token: to_token.to_string(),
            amount,
            action: signal.action,
            confidence: signal.confidence,
            backend: analysis.quantum.backend.clone(),
            job_id: analysis.quantum.job_id.clone(),
            execution_time_s: analysis.quantum.execution_time_s,
            tx_hash: receipt.tx_hash.clone(),
            strategy: Some(analysis.strategy.name().to_string()),
            market_regime: Some(analysis.market.regime),
            status: Some(receipt.status.to_string()),
        };
        if let Err(e) = self.history.append(std::slice::from_ref(&record)) {
            error!(
                "Swap {} -> {} on {} went through but was not recorded: {:?}",
                from_token, to_token, network, receipt
            );
            return Err(PipelineError::Persistence(format!(
                "{:#} (unrecorded swap: {} {} {} -> {} on {}, tx {})",
                e,
                receipt.status,
                receipt.amount,
                receipt.from_token,
                receipt.to_token,
                receipt.network,
                receipt.tx_hash.as_deref().unwrap_or("none")
            )));
        }

        Ok(PairOutcome::Completed {
            analysis: Box::new(analysis),
            trade_result: TradeOutcome::Executed { receipt, record },
        })
    }
}

fn no_trade(
    network: &str,
    pair: &TradingPair,
    analysis: PairAnalysis,
    reason: NoTradeReason,
    detail: String,
) -> PairOutcome {
    info!("No trade for {} on {}: {} ({})", pair, network, reason, detail);
    PairOutcome::Completed {
        analysis: Box::new(analysis),
        trade_result: TradeOutcome::NoTrade { reason, detail },
    }
}
