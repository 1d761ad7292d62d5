//! Append-only trade-history log
//!
//! The log is a single pretty-printed JSON array of [`TradeRecord`]s. Every
//! append re-reads the file, extends the array and atomically replaces the
//! file, so entries written by earlier runs are never touched.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{PerformanceMetrics, TradeRecord};

/// Record statuses counted as successful trades
pub const SUCCESS_STATUSES: &[&str] = &["success", "simulated"];

/// Handle on the trade-history file
#[derive(Debug, Clone)]
pub struct TradeHistory {
    path: PathBuf,
}

impl TradeHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TradeHistory { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records, oldest first. A missing file is an empty log; a file
    /// that does not parse is an error rather than being overwritten later.
    pub fn records(&self) -> Result<Vec<TradeRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read trade history {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse trade history {}", self.path.display()))
    }

    /// Append records after everything already in the file
    pub fn append(&self, new_records: &[TradeRecord]) -> Result<usize> {
        let mut records = self.records()?;
        records.extend_from_slice(new_records);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("Failed to create trade history directory")?;
            }
        }

        let content =
            serde_json::to_string_pretty(&records).context("Failed to serialize trade history")?;

        // Atomic write: write to temp file then rename
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content).context("Failed to write temp file")?;
        fs::rename(&temp_path, &self.path).context("Failed to rename temp file")?;

        debug!(
            "Appended {} trade record(s) to {}",
            new_records.len(),
            self.path.display()
        );
        Ok(records.len())
    }

    pub fn performance_metrics(&self) -> Result<PerformanceMetrics> {
        let records = self.records()?;
        info!("Computing metrics over {} trade(s)", records.len());
        Ok(performance_metrics(&records))
    }
}

/// Aggregate counts over a slice of records in log order
pub fn performance_metrics(records: &[TradeRecord]) -> PerformanceMetrics {
    let mut metrics = PerformanceMetrics {
        total_trades: records.len(),
        ..Default::default()
    };

    for record in records {
        let successful = record
            .status
            .as_deref()
            .is_some_and(|s| SUCCESS_STATUSES.contains(&s));
        if successful {
            metrics.successful_trades += 1;
        }

        let strategy = record.strategy.clone().unwrap_or_else(|| "unknown".to_string());
        *metrics.strategies.entry(strategy).or_default() += 1;
        *metrics.networks.entry(record.network.clone()).or_default() += 1;
        *metrics
            .quantum_backends
            .entry(record.backend.clone())
            .or_default() += 1;
    }

    if metrics.total_trades > 0 {
        metrics.success_rate = metrics.successful_trades as f64 / metrics.total_trades as f64;
    }
    metrics.first_trade = records.first().map(|r| r.timestamp);
    metrics.last_trade = records.last().map(|r| r.timestamp);
    metrics
}
