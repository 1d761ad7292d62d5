//! Quantum execution port
//!
//! The pipeline treats circuit execution as an opaque collaborator: it
//! hands over a [`CircuitDescriptor`] and gets back a probability
//! distribution over bitstrings, or an error.

pub mod circuit;
pub mod executor;
pub mod simulator;
pub mod usage;

pub use circuit::{normalize_prices, Circuit, CircuitDescriptor, Gate};
pub use executor::{JobBackend, JobStatus, PollConfig, PollingExecutor};
pub use simulator::LocalSimulator;
pub use usage::{ProviderUsage, UsageTracker};

use thiserror::Error;

use crate::QuantumOutcome;

/// Failure reported by, or while waiting on, a quantum backend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantumError {
    #[error("no quantum backend available")]
    NoBackend,

    #[error("job {job_id} finished with status {status}")]
    JobFailed { job_id: String, status: JobStatus },

    #[error("job {job_id} timed out after {elapsed_s:.1}s")]
    Timeout { job_id: String, elapsed_s: f64 },

    #[error("invalid distribution: {0}")]
    InvalidDistribution(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Runs circuits and returns measured distributions
pub trait QuantumExecutor {
    fn execute(
        &mut self,
        circuit: &CircuitDescriptor,
        shots: u32,
        allow_simulator: bool,
    ) -> Result<QuantumOutcome, QuantumError>;
}
