//! Timeline question answering port
//!
//! An advisor reads a finished timeline and answers a free-text question.
//! [`OfflineAdvisor`] matches the question to an intent by keyword and
//! answers from the timeline alone.

use crate::negotiation::RoundRecord;
use serde::{Deserialize, Serialize};

/// Answer to one question
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorReply {
    pub reply: String,
    pub source: String,
}

pub trait TimelineAdvisor: Send + Sync {
    fn advise(&self, timeline: &[RoundRecord], question: &str) -> AdvisorReply;
}

/// What the question is after
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Assessment,
    Counteroffer,
    Explanation,
    Fairness,
    Other,
}

const INTENT_KEYWORDS: &[(Intent, &[&str])] = &[
    (Intent::Assessment, &["good", "fair", "reasonable", "acceptable"]),
    (Intent::Counteroffer, &["counteroffer", "counter", "suggest", "should"]),
    (Intent::Explanation, &["explain", "why", "how", "reason"]),
    (Intent::Fairness, &["fairness"]),
];

/// Gap above which offers are still considered far apart
const CLOSE_GAP: f64 = 5.0;

/// Classify by whole words, first matching intent wins
pub fn classify(question: &str) -> Intent {
    let lowered = question.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    INTENT_KEYWORDS
        .iter()
        .find(|(_, keywords)| words.iter().any(|w| keywords.contains(w)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Other)
}

/// Keyword advisor that needs no network access
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineAdvisor;

impl OfflineAdvisor {
    fn assessment(timeline: &[RoundRecord]) -> String {
        let Some(last) = timeline.last() else {
            return "I'd need to see the current negotiation state to assess the offer. Run a negotiation first.".to_string();
        };

        let mut lines = vec![
            format!("Current negotiation state (round {}):", last.round),
            format!(
                "- Buyer offer: ${:.2} (utility: {:.2})",
                last.buyer_offer, last.buyer_utility
            ),
            format!(
                "- Seller offer: ${:.2} (utility: {:.2})",
                last.seller_offer, last.seller_utility
            ),
            format!("- Simple fairness: {:.1}%", last.simple_fairness * 100.0),
            format!("- Proportional fairness: {:.3}", last.proportional_fairness),
        ];

        if last.simple_fairness > 0.7 {
            lines.push(format!(
                "This offer looks good. Fairness of {:.1}% indicates a balanced negotiation.",
                last.simple_fairness * 100.0
            ));
        } else {
            lines.push(format!(
                "Fairness of {:.1}% is below ideal. A small concession would improve the balance.",
                last.simple_fairness * 100.0
            ));
        }

        if timeline.len() > 1 {
            lines.push("Recent rounds:".to_string());
            let start = timeline.len().saturating_sub(3);
            for record in &timeline[start..] {
                lines.push(format!(
                    "Round {}: buyer ${:.2} / seller ${:.2} (fairness {:.1}%)",
                    record.round,
                    record.buyer_offer,
                    record.seller_offer,
                    record.simple_fairness * 100.0
                ));
            }
        }

        lines.join("\n")
    }

    fn counteroffer(timeline: &[RoundRecord]) -> String {
        let Some(last) = timeline.last() else {
            return "To suggest a counteroffer I need the current negotiation state. Run the negotiation first.".to_string();
        };

        let gap = last.price_gap();
        let midpoint = last.midpoint();
        if gap > CLOSE_GAP {
            format!(
                "The offers are still {:.2} apart. Propose ${:.2}, the midpoint, to improve fairness, conceding about 10-15% toward the other side.",
                gap, midpoint
            )
        } else {
            format!(
                "The offers are close (${:.2} apart). A counteroffer around ${:.2} would likely close the deal.",
                gap, midpoint
            )
        }
    }

    fn explanation(timeline: &[RoundRecord]) -> String {
        if timeline.is_empty() {
            return "Agents balance their own utility against fairness, conceding toward the other side each round and adjusting to opponent behavior and market conditions.".to_string();
        }
        format!(
            "The negotiation ran {} rounds. Each side moved toward the other's position while weighing its own utility. The per-round explanations give the reasoning behind each move.",
            timeline.len()
        )
    }

    fn fairness(timeline: &[RoundRecord]) -> String {
        let definition = "Simple fairness is one minus the utility gap between the parties; proportional fairness is the sum of their log utilities.";
        match timeline.last() {
            Some(last) => format!(
                "Current fairness is {:.1}%. {}",
                last.simple_fairness * 100.0,
                definition
            ),
            None => definition.to_string(),
        }
    }
}

impl TimelineAdvisor for OfflineAdvisor {
    fn advise(&self, timeline: &[RoundRecord], question: &str) -> AdvisorReply {
        let reply = match classify(question) {
            Intent::Assessment => Self::assessment(timeline),
            Intent::Counteroffer => Self::counteroffer(timeline),
            Intent::Explanation => Self::explanation(timeline),
            Intent::Fairness => Self::fairness(timeline),
            Intent::Other => format!(
                "You asked: '{}'. I can assess the current offer, suggest a counteroffer, explain the process or discuss fairness.",
                question
            ),
        };

        AdvisorReply {
            reply,
            source: "offline".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(round: u32, buyer_offer: f64, seller_offer: f64, fairness: f64) -> RoundRecord {
        RoundRecord {
            round,
            buyer_offer,
            seller_offer,
            buyer_utility: 0.9,
            seller_utility: 0.8,
            simple_fairness: fairness,
            proportional_fairness: -0.33,
            buyer_explanation: String::new(),
            seller_explanation: String::new(),
            buyer_beliefs: None,
            seller_beliefs: None,
            market_price: None,
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("Is this a fair deal?"), Intent::Assessment);
        assert_eq!(classify("What should I counter with"), Intent::Counteroffer);
        assert_eq!(classify("Why did the seller move?"), Intent::Explanation);
        assert_eq!(classify("Tell me about fairness"), Intent::Fairness);
        assert_eq!(classify("hello"), Intent::Other);
        // Whole words only
        assert_eq!(classify("goodbye"), Intent::Other);
    }

    #[test]
    fn test_counteroffer_gap() {
        let advisor = OfflineAdvisor;
        let far = advisor.advise(&[record(1, 80.0, 92.0, 0.6)], "suggest something");
        assert!(far.reply.contains("still 12.00 apart"));
        assert!(far.reply.contains("$86.00"));

        let close = advisor.advise(&[record(2, 88.0, 90.0, 0.95)], "suggest something");
        assert!(close.reply.contains("close ($2.00 apart)"));
        assert_eq!(close.source, "offline");
    }

    #[test]
    fn test_assessment() {
        let advisor = OfflineAdvisor;
        let timeline = [record(1, 80.0, 92.0, 0.6), record(2, 85.0, 90.0, 0.92)];
        let reply = advisor.advise(&timeline, "is this good?").reply;
        assert!(reply.starts_with("Current negotiation state (round 2)"));
        assert!(reply.contains("looks good"));
        assert!(reply.contains("Recent rounds:"));

        let empty = advisor.advise(&[], "is this good?").reply;
        assert!(empty.contains("Run a negotiation first"));
    }

    #[test]
    fn test_fairness_and_default() {
        let advisor = OfflineAdvisor;
        let reply = advisor.advise(&[record(1, 80.0, 92.0, 0.6)], "fairness?").reply;
        assert!(reply.starts_with("Current fairness is 60.0%"));

        let other = advisor.advise(&[], "weather").reply;
        assert!(other.contains("'weather'"));
    }
}
