//! Base concession strategy

use super::{Strategy, StrategyKind};
use crate::types::{PartyConfig, Role};

/// Share of the target-to-market distance covered by a fully generous opening
const MARKET_ANCHOR_SHARE: f64 = 0.3;

/// Anchors to the target and concedes a fixed share of the gap each round
#[derive(Clone, Debug)]
pub struct ConcessionStrategy {
    config: PartyConfig,
}

impl ConcessionStrategy {
    pub fn new(config: PartyConfig) -> Self {
        Self { config }
    }

    /// Opening move: target, pulled toward a known market price
    pub fn opening_offer(config: &PartyConfig) -> f64 {
        let Some(market) = config.market_price() else {
            return config.target_price();
        };

        let target = config.target_price();
        let pull = (1.0 - config.aggressiveness()) * MARKET_ANCHOR_SHARE;
        let proposed = match config.role() {
            Role::Buyer => target - (target - market) * pull,
            Role::Seller => target + (market - target) * pull,
        };
        config.clamp(proposed)
    }

    /// Share of the gap conceded this round
    pub fn concession_factor(config: &PartyConfig, last_opponent_offer: f64) -> f64 {
        let mut factor = 0.5 + (1.0 - config.aggressiveness()) * 0.3;

        // Opponent already sits on our favorable side of market
        if let Some(market) = config.market_price() {
            let favorable = match config.role() {
                Role::Buyer => market < last_opponent_offer,
                Role::Seller => market > last_opponent_offer,
            };
            if favorable {
                factor *= 0.9;
            }
        }

        factor
    }
}

impl Strategy for ConcessionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Concession
    }

    fn config(&self) -> &PartyConfig {
        &self.config
    }

    fn propose(&mut self, last_opponent_offer: Option<f64>) -> f64 {
        let Some(last) = last_opponent_offer else {
            return Self::opening_offer(&self.config);
        };

        let target = self.config.target_price();
        let delta = last - target;
        let factor = Self::concession_factor(&self.config, last);
        self.config.clamp(target + delta * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buyer() -> PartyConfig {
        PartyConfig::builder(60.0, 50.0, 100.0).build().unwrap()
    }

    #[test]
    fn test_opening_at_target_without_market() {
        let mut strategy = ConcessionStrategy::new(buyer());
        assert_eq!(strategy.propose(None), 60.0);
    }

    #[test]
    fn test_opening_anchors_toward_market() {
        let config = PartyConfig::builder(60.0, 50.0, 100.0)
            .market_price(70.0)
            .build()
            .unwrap();
        let mut strategy = ConcessionStrategy::new(config);
        // 60 - (60 - 70) * 0.5 * 0.3
        assert!((strategy.propose(None) - 61.5).abs() < 1e-9);

        let seller = PartyConfig::builder(90.0, 50.0, 100.0)
            .market_price(80.0)
            .aggressiveness(0.0)
            .build()
            .unwrap();
        let mut strategy = ConcessionStrategy::new(seller);
        // 90 + (80 - 90) * 1.0 * 0.3
        assert!((strategy.propose(None) - 87.0).abs() < 1e-9);
    }

    #[test]
    fn test_concession_toward_opponent() {
        let mut strategy = ConcessionStrategy::new(buyer());
        // factor 0.5 + 0.5 * 0.3 = 0.65
        let offer = strategy.propose(Some(80.0));
        assert!((offer - 73.0).abs() < 1e-9);
    }

    #[test]
    fn test_market_shrinks_concession() {
        let config = PartyConfig::builder(60.0, 50.0, 100.0)
            .market_price(70.0)
            .build()
            .unwrap();
        assert!((ConcessionStrategy::concession_factor(&config, 80.0) - 0.585).abs() < 1e-9);
        assert!((ConcessionStrategy::concession_factor(&config, 65.0) - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_offers_clamped_to_band() {
        let mut strategy = ConcessionStrategy::new(buyer());
        let offer = strategy.propose(Some(500.0));
        assert_eq!(offer, 100.0);
        let offer = strategy.propose(Some(-500.0));
        assert_eq!(offer, 50.0);
    }

    #[test]
    fn test_utility() {
        let strategy = ConcessionStrategy::new(buyer());
        assert_eq!(strategy.utility(60.0), 1.0);
        assert!((strategy.utility(70.0) - 0.8).abs() < 1e-9);
    }
}
