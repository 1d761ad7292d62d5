//! Error types for the signal pipeline

use thiserror::Error;

use crate::quantum::QuantumError;
use crate::wallet::WalletError;

/// Failure of a single (network, pair) pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("insufficient data: need at least {required} price points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("invalid price series: {0}")]
    InvalidPriceSeries(String),

    #[error("quantum execution failed: {0}")]
    QuantumExecution(#[from] QuantumError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("market data error: {0}")]
    MarketData(String),

    #[error("trade history error: {0}")]
    Persistence(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
