//! Local state-vector simulator backend
//!
//! Small dense simulator (a handful of qubits) used as the default
//! backend. Jobs complete synchronously on submit; results are sampled with
//! a seeded RNG so runs are reproducible.

use num_complex::Complex64;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution as _;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::circuit::{Circuit, Gate};
use super::executor::{JobBackend, JobStatus};
use super::QuantumError;
use crate::Distribution;

/// Largest circuit the dense simulator accepts
pub const MAX_QUBITS: usize = 12;

// =============================================================================
// State vector
// =============================================================================

/// Dense state vector, qubit 0 is the least significant index bit
#[derive(Debug, Clone)]
pub struct StateVector {
    num_qubits: usize,
    amplitudes: Vec<Complex64>,
}

impl StateVector {
    /// |0...0>
    pub fn new(num_qubits: usize) -> Self {
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        StateVector {
            num_qubits,
            amplitudes,
        }
    }

    pub fn apply(&mut self, gate: Gate) {
        match gate {
            Gate::H(q) => {
                let s = std::f64::consts::FRAC_1_SQRT_2;
                self.single_qubit(q, |a, b| ((a + b) * s, (a - b) * s));
            }
            Gate::Rx(q, theta) => {
                let (c, s) = ((theta / 2.0).cos(), (theta / 2.0).sin());
                let neg_i_s = -Complex64::i() * s;
                self.single_qubit(q, |a, b| (a * c + b * neg_i_s, a * neg_i_s + b * c));
            }
            Gate::Ry(q, theta) => {
                let (c, s) = ((theta / 2.0).cos(), (theta / 2.0).sin());
                self.single_qubit(q, |a, b| (a * c - b * s, a * s + b * c));
            }
            Gate::Cx(control, target) => {
                let cbit = 1 << control;
                let tbit = 1 << target;
                for i in 0..self.amplitudes.len() {
                    if i & cbit != 0 && i & tbit == 0 {
                        self.amplitudes.swap(i, i | tbit);
                    }
                }
            }
        }
    }

    fn single_qubit<F>(&mut self, q: usize, f: F)
    where
        F: Fn(Complex64, Complex64) -> (Complex64, Complex64),
    {
        let bit = 1 << q;
        for i in 0..self.amplitudes.len() {
            if i & bit == 0 {
                let j = i | bit;
                let (a, b) = f(self.amplitudes[i], self.amplitudes[j]);
                self.amplitudes[i] = a;
                self.amplitudes[j] = b;
            }
        }
    }

    /// Exact outcome probabilities over the measured qubits
    ///
    /// Bitstrings print classical bit 0 rightmost.
    pub fn probabilities(&self, measured: &[usize]) -> BTreeMap<String, f64> {
        let mut out = BTreeMap::new();
        for (index, amp) in self.amplitudes.iter().enumerate() {
            let p = amp.norm_sqr();
            if p <= 1e-15 {
                continue;
            }
            let key: String = measured
                .iter()
                .rev()
                .map(|q| if index & (1 << q) != 0 { '1' } else { '0' })
                .collect();
            *out.entry(key).or_insert(0.0) += p;
        }
        out
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }
}

/// Run a circuit and return exact probabilities over its measured qubits
pub fn simulate(circuit: &Circuit) -> Result<BTreeMap<String, f64>, QuantumError> {
    if circuit.num_qubits == 0 || circuit.num_qubits > MAX_QUBITS {
        return Err(QuantumError::Backend(format!(
            "circuit with {} qubits is outside simulator range 1..={}",
            circuit.num_qubits, MAX_QUBITS
        )));
    }
    let in_range = |q: usize| q < circuit.num_qubits;
    let gates_ok = circuit.gates.iter().all(|g| match *g {
        Gate::H(q) | Gate::Rx(q, _) | Gate::Ry(q, _) => in_range(q),
        Gate::Cx(c, t) => in_range(c) && in_range(t) && c != t,
    });
    if !gates_ok || !circuit.measured.iter().all(|q| in_range(*q)) {
        return Err(QuantumError::Backend(
            "circuit references a qubit out of range".to_string(),
        ));
    }

    let mut state = StateVector::new(circuit.num_qubits);
    for gate in &circuit.gates {
        state.apply(*gate);
    }
    Ok(state.probabilities(&circuit.measured))
}

/// Draw `shots` samples from exact probabilities and return frequencies
pub fn sample<R: Rng>(
    probabilities: &BTreeMap<String, f64>,
    shots: u32,
    rng: &mut R,
) -> Result<BTreeMap<String, f64>, QuantumError> {
    if shots == 0 {
        return Ok(probabilities.clone());
    }

    let (outcomes, weights): (Vec<&String>, Vec<f64>) = probabilities.iter().map(|(k, v)| (k, *v)).unzip();
    let index = WeightedIndex::new(&weights)
        .map_err(|e| QuantumError::Backend(format!("cannot sample outcomes: {}", e)))?;

    let mut counts = vec![0u32; outcomes.len()];
    for _ in 0..shots {
        counts[index.sample(rng)] += 1;
    }

    Ok(outcomes
        .into_iter()
        .zip(counts)
        .filter(|(_, c)| *c > 0)
        .map(|(k, c)| (k.clone(), c as f64 / shots as f64))
        .collect())
}

// =============================================================================
// Backend
// =============================================================================

/// In-process simulator exposed through the job interface
pub struct LocalSimulator {
    name: String,
    seed: u64,
    rng: StdRng,
    submitted: u64,
    results: HashMap<String, Distribution>,
}

impl LocalSimulator {
    pub const DEFAULT_NAME: &'static str = "local_statevector_simulator";

    pub fn new(seed: u64) -> Self {
        Self::with_name(Self::DEFAULT_NAME, seed)
    }

    pub fn with_name(name: impl Into<String>, seed: u64) -> Self {
        LocalSimulator {
            name: name.into(),
            seed,
            rng: StdRng::seed_from_u64(seed),
            submitted: 0,
            results: HashMap::new(),
        }
    }

    fn next_job_id(&mut self, circuit: &Circuit) -> String {
        self.submitted += 1;
        let mut hasher = Sha256::new();
        hasher.update(self.name.as_bytes());
        hasher.update(self.seed.to_le_bytes());
        hasher.update(self.submitted.to_le_bytes());
        hasher.update(format!("{:?}", circuit.gates).as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("local-{}", &digest[..16])
    }
}

impl JobBackend for LocalSimulator {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_simulator(&self) -> bool {
        true
    }

    fn submit(&mut self, circuit: &Circuit, shots: u32) -> Result<String, QuantumError> {
        let exact = simulate(circuit)?;
        let sampled = sample(&exact, shots, &mut self.rng)?;
        let job_id = self.next_job_id(circuit);
        debug!(job_id, shots, outcomes = sampled.len(), "Simulated job");
        self.results.insert(job_id.clone(), Distribution::new(sampled));
        Ok(job_id)
    }

    fn status(&mut self, job_id: &str) -> Result<JobStatus, QuantumError> {
        if self.results.contains_key(job_id) {
            Ok(JobStatus::Completed)
        } else {
            Err(QuantumError::Backend(format!("unknown job {}", job_id)))
        }
    }

    fn result(&mut self, job_id: &str) -> Result<Distribution, QuantumError> {
        self.results
            .remove(job_id)
            .ok_or_else(|| QuantumError::Backend(format!("no result for job {}", job_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantum::CircuitDescriptor;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_bell_state_probabilities() {
        let probs = simulate(&CircuitDescriptor::Bell.build()).unwrap();
        assert_eq!(probs.len(), 2);
        assert_abs_diff_eq!(probs["00"], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(probs["11"], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_rx_pi_flips_qubit() {
        let circuit = Circuit {
            num_qubits: 1,
            gates: vec![Gate::Rx(0, std::f64::consts::PI)],
            measured: vec![0],
        };
        let probs = simulate(&circuit).unwrap();
        assert_abs_diff_eq!(probs["1"], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bitstring_order_puts_qubit_zero_last() {
        // Only qubit 0 flipped -> "01" with two measured qubits
        let circuit = Circuit {
            num_qubits: 2,
            gates: vec![Gate::Ry(0, std::f64::consts::PI)],
            measured: vec![0, 1],
        };
        let probs = simulate(&circuit).unwrap();
        assert_abs_diff_eq!(probs["01"], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_momentum_probabilities_sum_to_one() {
        let descriptor = CircuitDescriptor::Momentum {
            trend: 0.7,
            volatility: 0.3,
        };
        let probs = simulate(&descriptor.build()).unwrap();
        let total: f64 = probs.values().sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
        assert!(probs.keys().all(|k| k.len() == 3));
    }

    #[test]
    fn test_sampling_is_seeded() {
        let probs = simulate(&CircuitDescriptor::Bell.build()).unwrap();
        let a = sample(&probs, 500, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = sample(&probs, 500, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
        let total: f64 = a.values().sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sampling_never_draws_zero_weight_outcome() {
        let probs: BTreeMap<String, f64> =
            [("0".to_string(), 1.0), ("1".to_string(), 0.0)].into_iter().collect();
        let freq = sample(&probs, 200, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(freq.len(), 1);
        assert_abs_diff_eq!(freq["0"], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sampling_rejects_empty_distribution() {
        let err = sample(&BTreeMap::new(), 10, &mut StdRng::seed_from_u64(3)).unwrap_err();
        assert!(matches!(err, QuantumError::Backend(_)));
    }

    #[test]
    fn test_rejects_out_of_range_qubits() {
        let circuit = Circuit {
            num_qubits: 1,
            gates: vec![Gate::Cx(0, 1)],
            measured: vec![0],
        };
        assert!(simulate(&circuit).is_err());
    }

    #[test]
    fn test_backend_job_lifecycle() {
        let mut backend = LocalSimulator::new(1);
        let job_id = backend
            .submit(&CircuitDescriptor::Bell.build(), 100)
            .unwrap();

        assert!(job_id.starts_with("local-"));
        assert_eq!(backend.status(&job_id).unwrap(), JobStatus::Completed);
        let dist = backend.result(&job_id).unwrap();
        assert!(dist.is_normalized());
        assert!(backend.result(&job_id).is_err());
    }
}
