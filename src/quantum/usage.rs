//! Per-backend job and credit accounting
//!
//! Loaded once at startup, mutated by the cycle runner, saved on exit.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderUsage {
    pub credits: f64,
    pub jobs: u64,
}

/// Usage counters keyed by backend id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageTracker {
    providers: BTreeMap<String, ProviderUsage>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; a missing file yields empty counters
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read usage file {}", path.display()))?;
        let tracker: UsageTracker =
            serde_json::from_str(&contents).context("Failed to parse usage JSON")?;
        info!("Loaded usage data from {}", path.display());
        Ok(tracker)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize usage")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write usage file {}", path.display()))?;
        Ok(())
    }

    /// Count one completed job against a backend
    pub fn record_job(&mut self, backend: &str, credits: f64) {
        let entry = self.providers.entry(backend.to_string()).or_default();
        entry.jobs += 1;
        entry.credits += credits;
    }

    pub fn usage(&self, backend: &str) -> ProviderUsage {
        self.providers.get(backend).copied().unwrap_or_default()
    }

    pub fn total_jobs(&self) -> u64 {
        self.providers.values().map(|u| u.jobs).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_persist() {
        let dir = std::env::temp_dir().join(format!("qt_usage_{}", std::process::id()));
        let path = dir.join("usage.json");

        let mut tracker = UsageTracker::load(&path).unwrap();
        assert_eq!(tracker.total_jobs(), 0);

        tracker.record_job("sim", 0.0);
        tracker.record_job("sim", 0.0);
        tracker.record_job("ibm_brisbane", 1.5);
        tracker.save(&path).unwrap();

        let loaded = UsageTracker::load(&path).unwrap();
        assert_eq!(loaded, tracker);
        assert_eq!(loaded.usage("sim").jobs, 2);
        assert_eq!(loaded.usage("ibm_brisbane").credits, 1.5);
        assert_eq!(loaded.total_jobs(), 3);

        fs::remove_dir_all(dir).ok();
    }
}
