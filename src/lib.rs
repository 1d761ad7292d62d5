//! Quantum Trader
//!
//! Regime-aware signal pipeline for on-chain token pairs: price features,
//! market regime classification, quantum-circuit signal fusion, confidence
//! scaled position sizing and an append-only trade-history log.

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod history;
pub mod quantum;
pub mod regime;
pub mod risk;
pub mod runner;
pub mod strategies;
pub mod types;
pub mod wallet;

pub use config::Config;
pub use error::{PipelineError, PipelineResult};
pub use runner::{CycleReport, CycleRunner, PairOutcome, TradeOutcome};
pub use types::*;
