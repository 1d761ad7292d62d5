//! Momentum fusion for trending markets
//!
//! Only the two most likely outcomes vote: a leading `1` counts as buy
//! mass, a leading `0` as sell mass. Everything else is hold.

use crate::{Distribution, TradeSignal};

/// Number of top-ranked outcomes that carry directional mass
pub const TOP_OUTCOMES: usize = 2;

pub fn fuse(distribution: &Distribution) -> TradeSignal {
    let mut buy = 0.0;
    let mut sell = 0.0;

    for (bits, p) in distribution.ranked().into_iter().take(TOP_OUTCOMES) {
        match bits.chars().next() {
            Some('1') => buy += p,
            Some('0') => sell += p,
            _ => {}
        }
    }

    let hold = (1.0 - buy - sell).max(0.0);
    TradeSignal::from_masses(buy, sell, hold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Action;
    use approx::assert_abs_diff_eq;

    fn dist(pairs: &[(&str, f64)]) -> Distribution {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_buy_leaning_top_outcomes() {
        let signal = fuse(&dist(&[("11", 0.45), ("10", 0.35), ("00", 0.1), ("01", 0.1)]));
        assert_eq!(signal.action, Action::Buy);
        assert_abs_diff_eq!(signal.buy, 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(signal.confidence, 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(signal.hold, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_only_top_two_outcomes_vote() {
        // Third-ranked "100" would add buy mass but is ignored
        let signal = fuse(&dist(&[("011", 0.4), ("001", 0.3), ("100", 0.2), ("111", 0.1)]));
        assert_eq!(signal.action, Action::Sell);
        assert_abs_diff_eq!(signal.sell, 0.7, epsilon = 1e-12);
        assert_eq!(signal.buy, 0.0);
    }

    #[test]
    fn test_split_top_outcomes_hold_on_tie() {
        let third = 1.0 / 3.0;
        let signal = fuse(&dist(&[
            ("10", third),
            ("00", third),
            ("01", third / 2.0),
            ("11", third / 2.0),
        ]));
        assert_eq!(signal.action, Action::Hold);
        assert_abs_diff_eq!(signal.total_mass(), 1.0, epsilon = 1e-9);
    }
}
