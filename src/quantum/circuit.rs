//! Circuit descriptors handed to the quantum executor
//!
//! The pipeline only chooses *which* circuit to run and with what
//! parameters. `build` lowers a descriptor into a gate list that a backend
//! can execute.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Maximum number of recent prices encoded by the price prediction circuit
pub const MAX_PREDICTION_POINTS: usize = 4;

/// Regime-specific circuit request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CircuitDescriptor {
    /// Two-qubit Bell pair, measured on both qubits
    Bell,
    /// Three qubits: trend on q0 (RX), volatility on q1 (RY), prediction on q2
    Momentum { trend: f64, volatility: f64 },
    /// One qubit per recent price (RY) entangled into a single prediction qubit
    PricePrediction { normalized_prices: Vec<f64> },
}

impl CircuitDescriptor {
    pub fn name(&self) -> &'static str {
        match self {
            CircuitDescriptor::Bell => "bell",
            CircuitDescriptor::Momentum { .. } => "momentum",
            CircuitDescriptor::PricePrediction { .. } => "price_prediction",
        }
    }

    pub fn num_qubits(&self) -> usize {
        match self {
            CircuitDescriptor::Bell => 2,
            CircuitDescriptor::Momentum { .. } => 3,
            CircuitDescriptor::PricePrediction { normalized_prices } => {
                normalized_prices.len().min(MAX_PREDICTION_POINTS) + 1
            }
        }
    }

    /// Lower to an executable gate list
    pub fn build(&self) -> Circuit {
        match self {
            CircuitDescriptor::Bell => Circuit {
                num_qubits: 2,
                gates: vec![Gate::H(0), Gate::Cx(0, 1)],
                measured: vec![0, 1],
            },
            CircuitDescriptor::Momentum { trend, volatility } => Circuit {
                num_qubits: 3,
                gates: vec![
                    Gate::Rx(0, PI * trend),
                    Gate::Ry(1, PI * volatility),
                    Gate::Cx(0, 1),
                    Gate::Cx(1, 2),
                    Gate::H(2),
                ],
                measured: vec![0, 1, 2],
            },
            CircuitDescriptor::PricePrediction { normalized_prices } => {
                let n_points = normalized_prices.len().min(MAX_PREDICTION_POINTS);
                let data = &normalized_prices[normalized_prices.len() - n_points..];
                let output = n_points;

                let mut gates: Vec<Gate> = data
                    .iter()
                    .enumerate()
                    // -1..1 onto 0..PI
                    .map(|(i, v)| Gate::Ry(i, PI * (v + 1.0) / 2.0))
                    .collect();
                gates.extend((0..n_points).map(|i| Gate::Cx(i, output)));
                gates.push(Gate::H(output));

                Circuit {
                    num_qubits: n_points + 1,
                    gates,
                    measured: vec![output],
                }
            }
        }
    }
}

/// Supported gate set
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gate {
    H(usize),
    Rx(usize, f64),
    Ry(usize, f64),
    /// Controlled NOT (control, target)
    Cx(usize, usize),
}

/// Executable circuit
#[derive(Debug, Clone, PartialEq)]
pub struct Circuit {
    pub num_qubits: usize,
    pub gates: Vec<Gate>,
    /// Qubits read into classical bits 0, 1, ... in this order
    pub measured: Vec<usize>,
}

/// Min-max normalise prices onto [-1, 1]; a flat window maps to -1
pub fn normalize_prices(prices: &[f64]) -> Vec<f64> {
    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max > min { max - min } else { 1.0 };
    prices.iter().map(|p| (p - min) / range * 2.0 - 1.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_prediction_uses_last_points() {
        let descriptor = CircuitDescriptor::PricePrediction {
            normalized_prices: vec![-1.0, -0.5, 0.0, 0.5, 1.0, 0.2],
        };
        let circuit = descriptor.build();

        assert_eq!(circuit.num_qubits, 5);
        assert_eq!(descriptor.num_qubits(), 5);
        assert_eq!(circuit.measured, vec![4]);
        // 4 encodings + 4 entanglers + 1 hadamard
        assert_eq!(circuit.gates.len(), 9);
        assert_eq!(circuit.gates[3], Gate::Ry(3, PI * 1.2 / 2.0));
    }

    #[test]
    fn test_normalize_prices() {
        assert_eq!(normalize_prices(&[10.0, 15.0, 20.0]), vec![-1.0, 0.0, 1.0]);
        assert_eq!(normalize_prices(&[5.0, 5.0]), vec![-1.0, -1.0]);
    }

    #[test]
    fn test_descriptor_serializes_with_kind_tag() {
        let json = serde_json::to_value(CircuitDescriptor::Momentum {
            trend: 0.5,
            volatility: 0.2,
        })
        .unwrap();
        assert_eq!(json["kind"], "momentum");
        assert_eq!(json["trend"], 0.5);
    }
}
