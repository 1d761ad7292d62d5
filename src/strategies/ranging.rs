//! Ranging-market fusion over the two-qubit Bell outcomes
//!
//! `00` is sell mass, `10` and `11` are buy mass, `01` and anything else
//! is hold.

use crate::{Distribution, TradeSignal};

pub fn fuse(distribution: &Distribution) -> TradeSignal {
    let buy = distribution.probability("10") + distribution.probability("11");
    let sell = distribution.probability("00");
    let hold = (1.0 - buy - sell).max(0.0);
    TradeSignal::from_masses(buy, sell, hold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Action;

    fn dist(pairs: &[(&str, f64)]) -> Distribution {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_ideal_bell_pair_holds() {
        // Equal buy and sell mass is a tie
        let signal = fuse(&dist(&[("00", 0.5), ("11", 0.5)]));
        assert_eq!(signal.action, Action::Hold);
        assert_eq!(signal.confidence, 0.5);
        assert_eq!(signal.hold, 0.0);
    }

    #[test]
    fn test_sell_mass_from_zero_state() {
        let signal = fuse(&dist(&[("00", 0.62), ("11", 0.38)]));
        assert_eq!(signal.action, Action::Sell);
        assert_eq!(signal.confidence, 0.62);
    }

    #[test]
    fn test_hold_lean_state() {
        let signal = fuse(&dist(&[("01", 0.6), ("10", 0.2), ("00", 0.2)]));
        assert_eq!(signal.action, Action::Hold);
        assert!((signal.hold - 0.6).abs() < 1e-12);
    }
}
