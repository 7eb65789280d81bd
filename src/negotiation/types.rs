//! Negotiation records

use serde::{Deserialize, Serialize};

use super::belief::BeliefSnapshot;

/// One round of offers, appended to the timeline and never mutated
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub buyer_offer: f64,
    pub seller_offer: f64,
    pub buyer_utility: f64,
    pub seller_utility: f64,
    pub simple_fairness: f64,
    pub proportional_fairness: f64,
    pub buyer_explanation: String,
    pub seller_explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_beliefs: Option<BeliefSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_beliefs: Option<BeliefSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_price: Option<f64>,
}

impl RoundRecord {
    pub fn price_gap(&self) -> f64 {
        (self.buyer_offer - self.seller_offer).abs()
    }

    pub fn midpoint(&self) -> f64 {
        (self.buyer_offer + self.seller_offer) / 2.0
    }
}

/// Terms settled at convergence or at the round limit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
    pub final_price: f64,
    pub quantity: u32,
    pub final_simple_fairness: f64,
    pub final_proportional_fairness: f64,
    pub buyer_utility: f64,
    pub seller_utility: f64,
    pub round_count: u32,
    /// False when the round limit ran out before the stop policy held
    pub converged: bool,
}

/// Full result of one negotiation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub timeline: Vec<RoundRecord>,
    pub agreement: Agreement,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RoundRecord {
        RoundRecord {
            round: 1,
            buyer_offer: 85.0,
            seller_offer: 95.0,
            buyer_utility: 1.0,
            seller_utility: 1.0,
            simple_fairness: 1.0,
            proportional_fairness: 0.0,
            buyer_explanation: String::new(),
            seller_explanation: String::new(),
            buyer_beliefs: None,
            seller_beliefs: None,
            market_price: None,
        }
    }

    #[test]
    fn test_record_helpers() {
        let record = record();
        assert_eq!(record.price_gap(), 10.0);
        assert_eq!(record.midpoint(), 90.0);
    }

    #[test]
    fn test_record_omits_empty_beliefs() {
        let json = serde_json::to_string(&record()).unwrap();
        assert!(!json.contains("buyer_beliefs"));
        assert!(!json.contains("market_price"));

        let parsed: RoundRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record());
    }
}
