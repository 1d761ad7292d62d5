//! Position sizing
//!
//! Converts a fused signal into a bounded trade amount. Exposure scales
//! linearly with confidence:
//!
//! ```text
//! size = base_trade_amount * risk_multiplier * (scale_floor + confidence)
//! ```
//!
//! With the defaults that is 0.5x to 1.5x the base amount. Signals below the
//! confidence threshold, HOLD signals and trades the wallet cannot fund end
//! as no-trade decisions, which are normal outcomes and not errors.

use serde::{Deserialize, Serialize};

use crate::{Action, TradeSignal};

/// Exposure appetite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    pub fn multiplier(&self) -> f64 {
        match self {
            RiskLevel::Low => 0.5,
            RiskLevel::Medium => 1.0,
            RiskLevel::High => 1.5,
        }
    }
}

/// Why a signal did not turn into a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoTradeReason {
    LowConfidence,
    HoldSignal,
    InsufficientBalance,
}

impl std::fmt::Display for NoTradeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NoTradeReason::LowConfidence => "low_confidence",
            NoTradeReason::HoldSignal => "hold_signal",
            NoTradeReason::InsufficientBalance => "insufficient_balance",
        };
        f.write_str(s)
    }
}

/// Configuration for PositionSizer using builder pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionSizerConfig {
    pub base_trade_amount: f64,
    pub risk_level: RiskLevel,
    /// Minimum confidence eligible for a trade (inclusive)
    pub min_confidence: f64,
    /// Added to confidence before scaling the base amount
    pub scale_floor: f64,
    /// Fraction of the available balance used when the wallet is short
    pub balance_clamp: f64,
}

impl Default for PositionSizerConfig {
    fn default() -> Self {
        Self {
            base_trade_amount: 0.01,
            risk_level: RiskLevel::Medium,
            min_confidence: 0.6,
            scale_floor: 0.5,
            balance_clamp: 0.7,
        }
    }
}

impl PositionSizerConfig {
    pub fn with_base_amount(mut self, amount: f64) -> Self {
        self.base_trade_amount = amount;
        self
    }

    pub fn with_risk_level(mut self, level: RiskLevel) -> Self {
        self.risk_level = level;
        self
    }

    pub fn with_min_confidence(mut self, confidence: f64) -> Self {
        self.min_confidence = confidence;
        self
    }

    pub fn with_scale_floor(mut self, floor: f64) -> Self {
        self.scale_floor = floor;
        self
    }

    pub fn with_balance_clamp(mut self, clamp: f64) -> Self {
        self.balance_clamp = clamp;
        self
    }

    pub fn build(self) -> PositionSizer {
        PositionSizer { config: self }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PositionSizer {
    config: PositionSizerConfig,
}

impl PositionSizer {
    pub fn new(config: PositionSizerConfig) -> Self {
        PositionSizer { config }
    }

    pub fn config(&self) -> &PositionSizerConfig {
        &self.config
    }

    /// Confidence-scaled size before any balance check
    pub fn target_size(&self, signal: &TradeSignal) -> Result<f64, NoTradeReason> {
        if signal.action == Action::Hold {
            return Err(NoTradeReason::HoldSignal);
        }
        if signal.confidence < self.config.min_confidence {
            return Err(NoTradeReason::LowConfidence);
        }

        Ok(self.config.base_trade_amount
            * self.config.risk_level.multiplier()
            * (self.config.scale_floor + signal.confidence))
    }

    /// Target size with an optional fixed amount replacing the confidence
    /// scaled one. The HOLD and confidence gates still apply.
    pub fn target_size_or(
        &self,
        signal: &TradeSignal,
        amount: Option<f64>,
    ) -> Result<f64, NoTradeReason> {
        let scaled = self.target_size(signal)?;
        Ok(amount.unwrap_or(scaled))
    }

    /// Shrink to `balance_clamp * available` when the balance covers less
    /// than `balance_clamp` of the target
    pub fn clamp_to_balance(&self, size: f64, available: f64) -> Result<f64, NoTradeReason> {
        let clamp = self.config.balance_clamp;
        let size = if available < clamp * size {
            clamp * available
        } else {
            size
        };

        if size <= 0.0 {
            Err(NoTradeReason::InsufficientBalance)
        } else {
            Ok(size)
        }
    }

    /// Full sizing decision for a signal against an available balance
    pub fn size(&self, signal: &TradeSignal, available: f64) -> Result<f64, NoTradeReason> {
        let target = self.target_size(signal)?;
        self.clamp_to_balance(target, available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn signal(action: Action, confidence: f64) -> TradeSignal {
        TradeSignal {
            action,
            confidence,
            buy: confidence,
            sell: 0.0,
            hold: 1.0 - confidence,
        }
    }

    fn sizer(base: f64) -> PositionSizer {
        PositionSizerConfig::default().with_base_amount(base).build()
    }

    #[test]
    fn test_confidence_scales_between_half_and_one_and_a_half() {
        let sizer = sizer(100.0);
        assert_abs_diff_eq!(
            sizer.target_size(&signal(Action::Buy, 1.0)).unwrap(),
            150.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            sizer.target_size(&signal(Action::Sell, 0.6)).unwrap(),
            110.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_confidence_boundary() {
        let sizer = sizer(100.0);
        assert_eq!(
            sizer.size(&signal(Action::Buy, 0.59), 1_000.0),
            Err(NoTradeReason::LowConfidence)
        );
        assert!(sizer.size(&signal(Action::Buy, 0.60), 1_000.0).is_ok());
    }

    #[test]
    fn test_hold_never_trades() {
        assert_eq!(
            sizer(100.0).size(&signal(Action::Hold, 0.95), 1_000.0),
            Err(NoTradeReason::HoldSignal)
        );
    }

    #[test]
    fn test_balance_clamp() {
        let size = sizer(100.0).size(&signal(Action::Buy, 1.0), 90.0).unwrap();
        assert_abs_diff_eq!(size, 63.0, epsilon = 1e-9);
    }

    #[test]
    fn test_balance_above_clamp_threshold_keeps_size() {
        // 110 >= 0.7 * 150
        let size = sizer(100.0).size(&signal(Action::Buy, 1.0), 110.0).unwrap();
        assert_abs_diff_eq!(size, 150.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_balance_is_no_trade() {
        assert_eq!(
            sizer(100.0).size(&signal(Action::Buy, 0.9), 0.0),
            Err(NoTradeReason::InsufficientBalance)
        );
    }

    #[test]
    fn test_scale_floor_shifts_size() {
        let sizer = PositionSizerConfig::default()
            .with_base_amount(100.0)
            .with_scale_floor(0.0)
            .build();
        assert_abs_diff_eq!(
            sizer.target_size(&signal(Action::Buy, 0.8)).unwrap(),
            80.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_fixed_amount_still_gated() {
        let sizer = sizer(100.0);
        assert_eq!(
            sizer.target_size_or(&signal(Action::Buy, 0.9), Some(42.0)),
            Ok(42.0)
        );
        assert_eq!(
            sizer.target_size_or(&signal(Action::Hold, 0.9), Some(42.0)),
            Err(NoTradeReason::HoldSignal)
        );
        assert_eq!(
            sizer.target_size_or(&signal(Action::Sell, 0.3), Some(42.0)),
            Err(NoTradeReason::LowConfidence)
        );
    }

    #[test]
    fn test_risk_level_scales_exposure() {
        let sizer = PositionSizerConfig::default()
            .with_base_amount(100.0)
            .with_risk_level(RiskLevel::High)
            .build();
        assert_abs_diff_eq!(
            sizer.target_size(&signal(Action::Buy, 1.0)).unwrap(),
            225.0,
            epsilon = 1e-9
        );
    }
}
