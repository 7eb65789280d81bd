//! Tunable negotiation settings
//!
//! Every field has a default, so a settings file only needs the values it
//! overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{NegotiatorError, Result};

/// When the loop declares convergence.
///
/// The gap is an absolute price distance while the fairness threshold is
/// relative, so the pair is not scale-invariant across differently priced
/// goods. Both stay configurable.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopPolicy {
    pub max_price_gap: f64,
    pub fairness_threshold: f64,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            max_price_gap: 1.0,
            fairness_threshold: 0.9,
        }
    }
}

impl StopPolicy {
    pub fn is_met(&self, buyer_offer: f64, seller_offer: f64, simple_fairness: f64) -> bool {
        (buyer_offer - seller_offer).abs() <= self.max_price_gap
            || simple_fairness >= self.fairness_threshold
    }
}

/// Objective weights for the multi-objective optimizer
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerWeights {
    pub utility: f64,
    pub fairness: f64,
    pub risk: f64,
    pub stubbornness: f64,
}

impl Default for OptimizerWeights {
    fn default() -> Self {
        Self {
            utility: 0.4,
            fairness: 0.3,
            risk: 0.2,
            stubbornness: 0.1,
        }
    }
}

/// Coefficients of the logistic risk score
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub amount: f64,
    /// Negative: older accounts are safer
    pub age_days: f64,
    pub tx_count: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            amount: 0.001,
            age_days: -0.01,
            tx_count: 0.0001,
        }
    }
}

/// Q-learning parameters for the exploratory strategy
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationSettings {
    pub epsilon: f64,
    pub alpha: f64,
    pub gamma: f64,
    /// Fixed seed for reproducible exploration
    pub seed: Option<u64>,
}

impl Default for ExplorationSettings {
    fn default() -> Self {
        Self {
            epsilon: 0.1,
            alpha: 0.5,
            gamma: 0.9,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiationSettings {
    pub stop: StopPolicy,
    pub optimizer: OptimizerWeights,
    pub risk: RiskWeights,
    pub exploration: ExplorationSettings,
}

impl NegotiationSettings {
    /// Parse settings from JSON text and validate them
    pub fn from_json(text: &str) -> Result<Self> {
        let settings: NegotiationSettings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.stop.max_price_gap.is_finite() && self.stop.max_price_gap >= 0.0) {
            return Err(NegotiatorError::InvalidConfig(format!(
                "stop.max_price_gap must be a non-negative number, got {}",
                self.stop.max_price_gap
            )));
        }

        let unit_fields = [
            ("stop.fairness_threshold", self.stop.fairness_threshold),
            ("exploration.epsilon", self.exploration.epsilon),
            ("exploration.alpha", self.exploration.alpha),
            ("exploration.gamma", self.exploration.gamma),
        ];
        for (name, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(NegotiatorError::WeightOutOfRange { name, value });
            }
        }

        let finite_fields = [
            ("optimizer.utility", self.optimizer.utility),
            ("optimizer.fairness", self.optimizer.fairness),
            ("optimizer.risk", self.optimizer.risk),
            ("optimizer.stubbornness", self.optimizer.stubbornness),
            ("risk.amount", self.risk.amount),
            ("risk.age_days", self.risk.age_days),
            ("risk.tx_count", self.risk.tx_count),
        ];
        for (name, value) in finite_fields {
            if !value.is_finite() {
                return Err(NegotiatorError::InvalidConfig(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = NegotiationSettings::default();
        assert_eq!(settings.stop.max_price_gap, 1.0);
        assert_eq!(settings.stop.fairness_threshold, 0.9);
        assert_eq!(settings.optimizer.utility, 0.4);
        assert_eq!(settings.risk.age_days, -0.01);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let settings =
            NegotiationSettings::from_json(r#"{"stop": {"fairness_threshold": 0.95}}"#).unwrap();
        assert_eq!(settings.stop.fairness_threshold, 0.95);
        assert_eq!(settings.stop.max_price_gap, 1.0);
        assert_eq!(settings.optimizer, OptimizerWeights::default());
    }

    #[test]
    fn test_rejects_out_of_range() {
        let result = NegotiationSettings::from_json(r#"{"exploration": {"epsilon": 2.0}}"#);
        assert!(matches!(
            result,
            Err(NegotiatorError::WeightOutOfRange {
                name: "exploration.epsilon",
                ..
            })
        ));

        let result = NegotiationSettings::from_json(r#"{"stop": {"max_price_gap": -1.0}}"#);
        assert!(matches!(result, Err(NegotiatorError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = NegotiationSettings::from_json("{not json");
        assert!(matches!(result, Err(NegotiatorError::Json(_))));
    }

    #[test]
    fn test_stop_policy() {
        let stop = StopPolicy::default();
        assert!(stop.is_met(90.0, 90.8, 0.1));
        assert!(stop.is_met(80.0, 95.0, 0.92));
        assert!(!stop.is_met(80.0, 95.0, 0.5));
    }
}
