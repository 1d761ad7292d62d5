//! Wallet / exchange port
//!
//! Balance queries, per-network token address books and swap execution.
//! The bundled [`PaperWallet`] serves everything from configuration and
//! only logs swaps; it never signs or broadcasts anything.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WalletError {
    #[error("network '{0}' is not configured")]
    UnknownNetwork(String),

    #[error("swap rejected: {0}")]
    SwapRejected(String),

    #[error("provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub balance: f64,
}

/// Static network information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpecs {
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Token symbol to contract address
    pub tokens: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    Success,
    Simulated,
}

impl std::fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwapStatus::Success => f.write_str("success"),
            SwapStatus::Simulated => f.write_str("simulated"),
        }
    }
}

/// Result of an accepted swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub status: SwapStatus,
    pub tx_hash: Option<String>,
    pub network: String,
    pub from_token: String,
    pub to_token: String,
    pub amount: f64,
    pub slippage: f64,
}

pub trait WalletClient {
    /// Token balances held on a network
    fn get_balances(&self, network: &str) -> Result<BTreeMap<String, TokenBalance>, WalletError>;

    fn get_network_specs(&self, network: &str) -> Result<NetworkSpecs, WalletError>;

    fn execute_swap(
        &mut self,
        network: &str,
        from_token: &str,
        to_token: &str,
        amount: f64,
        slippage: f64,
    ) -> Result<SwapReceipt, WalletError>;
}

// =============================================================================
// Paper wallet
// =============================================================================

/// Per-network wallet section of the configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkWalletConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Token symbol to contract address
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,
    /// Paper balances by token symbol
    #[serde(default)]
    pub balances: BTreeMap<String, f64>,
}

/// Configuration-backed wallet that simulates swaps
#[derive(Debug, Clone, Default)]
pub struct PaperWallet {
    address: Option<String>,
    networks: BTreeMap<String, NetworkWalletConfig>,
    swaps_simulated: usize,
}

impl PaperWallet {
    pub fn new(address: Option<String>, networks: BTreeMap<String, NetworkWalletConfig>) -> Self {
        PaperWallet {
            address,
            networks,
            swaps_simulated: 0,
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn swaps_simulated(&self) -> usize {
        self.swaps_simulated
    }

    fn network(&self, network: &str) -> Result<&NetworkWalletConfig, WalletError> {
        self.networks
            .get(network)
            .ok_or_else(|| WalletError::UnknownNetwork(network.to_string()))
    }
}

impl WalletClient for PaperWallet {
    fn get_balances(&self, network: &str) -> Result<BTreeMap<String, TokenBalance>, WalletError> {
        Ok(self
            .network(network)?
            .balances
            .iter()
            .map(|(token, balance)| (token.clone(), TokenBalance { balance: *balance }))
            .collect())
    }

    fn get_network_specs(&self, network: &str) -> Result<NetworkSpecs, WalletError> {
        let cfg = self.network(network)?;
        Ok(NetworkSpecs {
            network: network.to_string(),
            chain_id: cfg.chain_id,
            tokens: cfg.tokens.clone(),
        })
    }

    fn execute_swap(
        &mut self,
        network: &str,
        from_token: &str,
        to_token: &str,
        amount: f64,
        slippage: f64,
    ) -> Result<SwapReceipt, WalletError> {
        self.network(network)?;
        if !(amount.is_finite() && amount > 0.0) {
            return Err(WalletError::SwapRejected(format!(
                "amount must be positive, got {}",
                amount
            )));
        }

        info!(
            "SIMULATION: would swap {:.6} {} -> {} on {} (slippage {:.2}%)",
            amount,
            from_token,
            to_token,
            network,
            slippage * 100.0
        );
        self.swaps_simulated += 1;

        Ok(SwapReceipt {
            status: SwapStatus::Simulated,
            tx_hash: None,
            network: network.to_string(),
            from_token: from_token.to_string(),
            to_token: to_token.to_string(),
            amount,
            slippage,
        })
    }
}
