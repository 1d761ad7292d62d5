//! Job submission and status polling
//!
//! Backends expose a submit/status/result job interface. The
//! [`PollingExecutor`] picks a backend, submits the circuit and polls with
//! bounded exponential backoff under a hard timeout. A timeout fails only
//! the current request.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::circuit::{Circuit, CircuitDescriptor};
use super::{QuantumError, QuantumExecutor};
use crate::{Distribution, QuantumOutcome};

/// Remote job state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// A quantum backend reachable through a job API
pub trait JobBackend {
    fn name(&self) -> &str;

    fn is_simulator(&self) -> bool;

    /// Submit a circuit, returning the job id
    fn submit(&mut self, circuit: &Circuit, shots: u32) -> Result<String, QuantumError>;

    fn status(&mut self, job_id: &str) -> Result<JobStatus, QuantumError>;

    /// Fetch the measured distribution of a completed job
    fn result(&mut self, job_id: &str) -> Result<Distribution, QuantumError>;
}

// =============================================================================
// Poll configuration
// =============================================================================

/// Backoff and timeout settings for status polling
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub backoff_multiplier: f64,
    /// Hard ceiling on total wait time
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(30),
            backoff_multiplier: 1.5,
            timeout: Duration::from_secs(600),
        }
    }
}

impl PollConfig {
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Interval following `current`, capped at `max_interval`
    pub fn next_interval(&self, current: Duration) -> Duration {
        let scaled = current.as_secs_f64() * self.backoff_multiplier.max(1.0);
        Duration::try_from_secs_f64(scaled)
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
    }
}

// =============================================================================
// Executor
// =============================================================================

/// Executes circuits on the first suitable backend and waits for completion
pub struct PollingExecutor {
    backends: Vec<Box<dyn JobBackend>>,
    poll: PollConfig,
}

impl PollingExecutor {
    pub fn new(poll: PollConfig) -> Self {
        PollingExecutor {
            backends: Vec::new(),
            poll,
        }
    }

    pub fn with_backend(mut self, backend: Box<dyn JobBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Index of the backend to use. Falls back to simulators when no
    /// hardware backend is registered.
    fn select_backend(&self, allow_simulator: bool) -> Result<usize, QuantumError> {
        if self.backends.is_empty() {
            return Err(QuantumError::NoBackend);
        }
        if let Some(index) = self
            .backends
            .iter()
            .position(|b| allow_simulator || !b.is_simulator())
        {
            return Ok(index);
        }
        warn!("No hardware backend available, falling back to simulator");
        Ok(0)
    }

    fn wait_for_completion(
        backend: &mut dyn JobBackend,
        job_id: &str,
        poll: PollConfig,
        started: Instant,
    ) -> Result<(), QuantumError> {
        let mut interval = poll.initial_interval;
        loop {
            let status = backend.status(job_id)?;
            let elapsed = started.elapsed();
            debug!(job_id, %status, elapsed_s = elapsed.as_secs_f64(), "Job status");

            match status {
                JobStatus::Completed => return Ok(()),
                JobStatus::Failed | JobStatus::Cancelled => {
                    return Err(QuantumError::JobFailed {
                        job_id: job_id.to_string(),
                        status,
                    })
                }
                JobStatus::Queued | JobStatus::Running => {}
            }

            if elapsed >= poll.timeout {
                warn!(job_id, "Job timed out after {:.1}s", elapsed.as_secs_f64());
                return Err(QuantumError::Timeout {
                    job_id: job_id.to_string(),
                    elapsed_s: elapsed.as_secs_f64(),
                });
            }

            let remaining = poll.timeout - elapsed;
            std::thread::sleep(interval.min(remaining));
            interval = poll.next_interval(interval);
        }
    }
}

impl QuantumExecutor for PollingExecutor {
    fn execute(
        &mut self,
        circuit: &CircuitDescriptor,
        shots: u32,
        allow_simulator: bool,
    ) -> Result<QuantumOutcome, QuantumError> {
        let index = self.select_backend(allow_simulator)?;
        let poll = self.poll;
        let backend = self.backends[index].as_mut();
        let backend_id = backend.name().to_string();

        let started = Instant::now();
        let job_id = backend.submit(&circuit.build(), shots)?;
        info!(
            "Submitted {} circuit as job {} to {}",
            circuit.name(),
            job_id,
            backend_id
        );

        Self::wait_for_completion(backend, &job_id, poll, started)?;

        let distribution = backend.result(&job_id)?;
        if !distribution.is_normalized() {
            return Err(QuantumError::InvalidDistribution(format!(
                "probabilities of job {} sum to {:.6}",
                job_id,
                distribution.total()
            )));
        }

        Ok(QuantumOutcome {
            distribution,
            backend_id,
            job_id,
            execution_time_s: started.elapsed().as_secs_f64(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantum::LocalSimulator;
    use std::collections::BTreeMap;

    /// Backend whose jobs never leave the given status
    struct StuckBackend {
        status: JobStatus,
        polls: usize,
    }

    impl JobBackend for StuckBackend {
        fn name(&self) -> &str {
            "stuck"
        }
        fn is_simulator(&self) -> bool {
            false
        }
        fn submit(&mut self, _circuit: &Circuit, _shots: u32) -> Result<String, QuantumError> {
            Ok("job-1".to_string())
        }
        fn status(&mut self, _job_id: &str) -> Result<JobStatus, QuantumError> {
            self.polls += 1;
            Ok(self.status)
        }
        fn result(&mut self, _job_id: &str) -> Result<Distribution, QuantumError> {
            Ok(Distribution::new(BTreeMap::from([("0".to_string(), 0.7)])))
        }
    }

    fn fast_poll() -> PollConfig {
        PollConfig::default()
            .with_initial_interval(Duration::from_millis(1))
            .with_max_interval(Duration::from_millis(2))
            .with_timeout(Duration::from_millis(20))
    }

    #[test]
    fn test_backoff_is_capped() {
        let poll = PollConfig::default();
        let mut interval = poll.initial_interval;
        for _ in 0..20 {
            interval = poll.next_interval(interval);
        }
        assert_eq!(interval, poll.max_interval);
    }

    #[test]
    fn test_huge_backoff_saturates_at_max_interval() {
        let poll = PollConfig::default().with_backoff_multiplier(1e300);
        assert_eq!(
            poll.next_interval(Duration::from_secs(5)),
            poll.max_interval
        );
    }

    #[test]
    fn test_times_out_running_job() {
        let mut executor = PollingExecutor::new(fast_poll()).with_backend(Box::new(StuckBackend {
            status: JobStatus::Running,
            polls: 0,
        }));

        let err = executor
            .execute(&CircuitDescriptor::Bell, 10, true)
            .unwrap_err();
        assert!(matches!(err, QuantumError::Timeout { .. }));
    }

    #[test]
    fn test_failed_job_is_reported() {
        let mut executor = PollingExecutor::new(fast_poll()).with_backend(Box::new(StuckBackend {
            status: JobStatus::Cancelled,
            polls: 0,
        }));

        let err = executor
            .execute(&CircuitDescriptor::Bell, 10, true)
            .unwrap_err();
        assert_eq!(
            err,
            QuantumError::JobFailed {
                job_id: "job-1".to_string(),
                status: JobStatus::Cancelled
            }
        );
    }

    #[test]
    fn test_unnormalized_result_is_rejected() {
        let mut executor = PollingExecutor::new(fast_poll()).with_backend(Box::new(StuckBackend {
            status: JobStatus::Completed,
            polls: 0,
        }));

        let err = executor
            .execute(&CircuitDescriptor::Bell, 10, true)
            .unwrap_err();
        assert!(matches!(err, QuantumError::InvalidDistribution(_)));
    }

    #[test]
    fn test_no_backend() {
        let mut executor = PollingExecutor::new(fast_poll());
        assert_eq!(
            executor.execute(&CircuitDescriptor::Bell, 10, true),
            Err(QuantumError::NoBackend)
        );
    }

    #[test]
    fn test_hardware_preferred_when_simulators_disallowed() {
        let executor = PollingExecutor::new(fast_poll())
            .with_backend(Box::new(LocalSimulator::new(1)))
            .with_backend(Box::new(StuckBackend {
                status: JobStatus::Completed,
                polls: 0,
            }));

        assert_eq!(executor.select_backend(false).unwrap(), 1);
        assert_eq!(executor.select_backend(true).unwrap(), 0);
    }

    #[test]
    fn test_simulator_fallback() {
        let mut executor =
            PollingExecutor::new(fast_poll()).with_backend(Box::new(LocalSimulator::new(3)));

        let outcome = executor
            .execute(&CircuitDescriptor::Bell, 200, false)
            .unwrap();
        assert_eq!(outcome.backend_id, LocalSimulator::DEFAULT_NAME);
        assert!(outcome.distribution.is_normalized());
        assert!(outcome.execution_time_s >= 0.0);
    }
}
