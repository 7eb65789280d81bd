//! Opponent-modeling strategy

use super::concession::ConcessionStrategy;
use super::{Strategy, StrategyKind};
use crate::negotiation::belief::{BeliefEngine, BeliefModel, BeliefSnapshot, OpponentStance};
use crate::types::PartyConfig;

/// Below this confidence the model is ignored
const MIN_CONFIDENCE: f64 = 0.3;

/// Blends base concession with a belief-informed fair split
#[derive(Clone, Debug)]
pub struct OpponentModelStrategy {
    config: PartyConfig,
    beliefs: BeliefEngine,
}

impl OpponentModelStrategy {
    pub fn new(config: PartyConfig) -> Self {
        let beliefs = BeliefEngine::new(BeliefModel::TrendFit, &config);
        Self { config, beliefs }
    }

    pub fn belief_engine(&self) -> &BeliefEngine {
        &self.beliefs
    }

    fn informed_offer(&self, last: f64) -> f64 {
        let state = self.beliefs.state();
        let target = self.config.target_price();
        let delta = last - target;

        if state.belief_confidence() < MIN_CONFIDENCE {
            return target + delta * 0.5;
        }

        let factor = match state.strategy_type() {
            Some(OpponentStance::Cooperative) => 0.4,
            Some(OpponentStance::Stubborn) => 0.7,
            Some(OpponentStance::Moderate) | None => 0.5,
        };
        let mut proposed = target + delta * factor;

        let fairness_weight = self.config.fairness_weight();
        if let Some(opponent_target) = state.belief_target_price() {
            if fairness_weight > 0.5 {
                let midpoint = (target + opponent_target) / 2.0;
                proposed = (1.0 - fairness_weight) * proposed + fairness_weight * midpoint;
            }
        }

        let patience = state.belief_patience();
        if patience > 0.7 {
            proposed = 0.7 * proposed + 0.3 * target;
        } else if patience < 0.3 {
            proposed = 0.9 * proposed + 0.1 * target;
        }

        proposed
    }
}

impl Strategy for OpponentModelStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::OpponentModel
    }

    fn config(&self) -> &PartyConfig {
        &self.config
    }

    fn propose(&mut self, last_opponent_offer: Option<f64>) -> f64 {
        let offer = match last_opponent_offer {
            None => ConcessionStrategy::opening_offer(&self.config),
            Some(last) => {
                self.beliefs.observe(last);
                self.config.clamp(self.informed_offer(last))
            }
        };

        self.beliefs.record_own_offer(offer);
        offer
    }

    fn beliefs(&self) -> Option<BeliefSnapshot> {
        Some(self.beliefs.state().snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buyer(fairness_weight: f64) -> OpponentModelStrategy {
        let config = PartyConfig::builder(85.0, 50.0, 100.0)
            .fairness_weight(fairness_weight)
            .build()
            .unwrap();
        OpponentModelStrategy::new(config)
    }

    #[test]
    fn test_opening_at_target() {
        let mut strategy = buyer(0.5);
        assert_eq!(strategy.propose(None), 85.0);
        assert_eq!(strategy.belief_engine().state().own_offer_history(), &[85.0]);
    }

    #[test]
    fn test_low_confidence_falls_back_to_half_split() {
        let mut strategy = buyer(0.5);
        strategy.propose(None);
        // One observation: confidence 0.1
        let offer = strategy.propose(Some(95.0));
        assert!((offer - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_confident_cooperative_read() {
        let mut strategy = buyer(0.5);
        strategy.propose(None);
        strategy.propose(Some(95.0));
        strategy.propose(Some(93.0));
        let offer = strategy.propose(Some(91.0));

        let beliefs = strategy.beliefs().unwrap();
        assert_eq!(beliefs.strategy_type, Some(OpponentStance::Cooperative));
        assert!(beliefs.confidence >= 0.3);
        assert_eq!(beliefs.rounds_observed, 3);

        // 85 + 6 * 0.4 = 87.4, then held toward target: patience was set to
        // 0.8 after the second observation (movement 2 against baseline 5)
        assert_eq!(beliefs.patience, 0.8);
        assert!((offer - (0.7 * 87.4 + 0.3 * 85.0)).abs() < 1e-9);
    }

    #[test]
    fn test_fairness_weight_pulls_toward_midpoint() {
        let mut fair = buyer(0.9);
        let mut selfish = buyer(0.5);
        for strategy in [&mut fair, &mut selfish] {
            strategy.propose(None);
            strategy.propose(Some(95.0));
            strategy.propose(Some(93.0));
        }
        let fair_offer = fair.propose(Some(91.0));
        let selfish_offer = selfish.propose(Some(91.0));
        assert!((fair_offer - selfish_offer).abs() > 1e-6);
        assert!((50.0..=100.0).contains(&fair_offer));
    }

    #[test]
    fn test_offers_stay_in_band() {
        let mut strategy = buyer(0.8);
        let mut last = None;
        for step in 0..10 {
            let offer = strategy.propose(last);
            assert!((50.0..=100.0).contains(&offer));
            last = Some(150.0 - step as f64);
        }
    }
}
