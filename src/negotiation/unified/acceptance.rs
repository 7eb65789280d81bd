//! Threshold-based acceptance prediction

use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-width of the fair band around the target
const FAIR_BAND: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceOutcome {
    Reject,
    LikelyAccept,
    OverpayAccept,
    /// No target estimate to test against yet
    Unknown,
}

impl fmt::Display for AcceptanceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AcceptanceOutcome::Reject => "reject",
            AcceptanceOutcome::LikelyAccept => "likely_accept",
            AcceptanceOutcome::OverpayAccept => "overpay_accept",
            AcceptanceOutcome::Unknown => "unknown",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcceptancePrediction {
    pub prediction: AcceptanceOutcome,
    pub acceptance_probability: f64,
    pub fair_low: f64,
    pub fair_high: f64,
}

impl AcceptancePrediction {
    /// Placeholder used before any opponent target is known
    pub fn unknown(min_price: f64, max_price: f64) -> Self {
        Self {
            prediction: AcceptanceOutcome::Unknown,
            acceptance_probability: 0.5,
            fair_low: min_price,
            fair_high: max_price,
        }
    }
}

/// Predict whether an `offer` lands inside the ±5% band around `target_price`
pub fn predict_acceptance(offer: f64, target_price: f64) -> AcceptancePrediction {
    let fair_low = target_price * (1.0 - FAIR_BAND);
    let fair_high = target_price * (1.0 + FAIR_BAND);

    let (prediction, acceptance_probability) = if offer < fair_low {
        (AcceptanceOutcome::Reject, 0.2)
    } else if offer <= fair_high {
        (AcceptanceOutcome::LikelyAccept, 0.8)
    } else {
        (AcceptanceOutcome::OverpayAccept, 0.95)
    };

    AcceptancePrediction {
        prediction,
        acceptance_probability,
        fair_low,
        fair_high,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_bands() {
        assert_eq!(predict_acceptance(90.0, 100.0).prediction, AcceptanceOutcome::Reject);
        assert_eq!(
            predict_acceptance(100.0, 100.0).prediction,
            AcceptanceOutcome::LikelyAccept
        );
        assert_eq!(
            predict_acceptance(110.0, 100.0).prediction,
            AcceptanceOutcome::OverpayAccept
        );
    }

    #[test]
    fn test_band_edges_inclusive() {
        let low = predict_acceptance(95.0, 100.0);
        assert_eq!(low.prediction, AcceptanceOutcome::LikelyAccept);
        assert_eq!(low.acceptance_probability, 0.8);
        assert!((low.fair_low - 95.0).abs() < 1e-9);
        assert!((low.fair_high - 105.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_placeholder() {
        let unknown = AcceptancePrediction::unknown(50.0, 100.0);
        assert_eq!(unknown.prediction.to_string(), "unknown");
        assert_eq!(unknown.acceptance_probability, 0.5);
    }
}
