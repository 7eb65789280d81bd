//! Logistic transaction risk scoring

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::RiskWeights;
use crate::negotiation::metrics::logistic;

/// Features describing the counterparty transaction
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionFeatures {
    pub amount: f64,
    pub age_days: f64,
    pub tx_count: f64,
}

impl TransactionFeatures {
    /// Stand-in features when no account history is available
    pub fn synthetic(target_price: f64, quantity: u32) -> Self {
        Self {
            amount: (target_price * quantity as f64).abs(),
            age_days: 30.0,
            tx_count: 10.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 0.33 {
            RiskLevel::Low
        } else if score < 0.67 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub risk_label: RiskLevel,
}

pub fn evaluate_risk(weights: &RiskWeights, features: &TransactionFeatures) -> RiskAssessment {
    let linear = weights.amount * features.amount
        + weights.age_days * features.age_days
        + weights.tx_count * features.tx_count;

    let risk_score = logistic(linear);
    RiskAssessment {
        risk_score,
        risk_label: RiskLevel::from_score(risk_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_risk_established_account() {
        let features = TransactionFeatures {
            amount: 100.0,
            age_days: 365.0,
            tx_count: 50.0,
        };
        let result = evaluate_risk(&RiskWeights::default(), &features);
        assert!(result.risk_score < 0.5);
        assert_eq!(result.risk_label, RiskLevel::Low);
    }

    #[test]
    fn test_high_risk_large_amount() {
        let features = TransactionFeatures {
            amount: 100_000.0,
            age_days: 1.0,
            tx_count: 1.0,
        };
        let result = evaluate_risk(&RiskWeights::default(), &features);
        assert!(result.risk_score > 0.3);
        assert_eq!(result.risk_label, RiskLevel::High);
    }

    #[test]
    fn test_extreme_inputs_stay_bounded() {
        let features = TransactionFeatures {
            amount: f64::MAX,
            age_days: 0.0,
            tx_count: 0.0,
        };
        let result = evaluate_risk(&RiskWeights::default(), &features);
        assert!((0.0..=1.0).contains(&result.risk_score));
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(RiskLevel::from_score(0.1), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.33), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.67), RiskLevel::High);
    }

    #[test]
    fn test_synthetic_features() {
        let features = TransactionFeatures::synthetic(-20.0, 3);
        assert_eq!(features.amount, 60.0);
        assert_eq!(features.age_days, 30.0);
    }
}
