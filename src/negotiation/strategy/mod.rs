//! Decision strategies
//!
//! Each variant implements [`Strategy`] once and is selected explicitly by
//! [`StrategyKind`]. A strategy owns all of its per-party state.

pub mod adaptive;
pub mod concession;
pub mod modeling;

use serde::{Deserialize, Serialize};
use std::fmt;

use super::belief::BeliefSnapshot;
use super::metrics;
use super::unified::UnifiedStrategy;
use crate::config::NegotiationSettings;
use crate::types::PartyConfig;

pub use adaptive::AdaptiveStrategy;
pub use concession::ConcessionStrategy;
pub use modeling::OpponentModelStrategy;

/// Available strategy variants
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Anchor to target and concede a fixed share of the gap
    #[default]
    Concession,
    /// Concession informed by a trend-fit opponent model
    OpponentModel,
    /// Risk, clustering, acceptance, beliefs and optimizer combined
    Unified,
    /// Epsilon-greedy Q-learning over concession factors
    Adaptive,
}

impl StrategyKind {
    /// Variants whose runs are reproducible from their inputs alone
    pub const DETERMINISTIC: [StrategyKind; 3] = [
        StrategyKind::Concession,
        StrategyKind::OpponentModel,
        StrategyKind::Unified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Concession => "concession",
            StrategyKind::OpponentModel => "opponent_model",
            StrategyKind::Unified => "unified",
            StrategyKind::Adaptive => "adaptive",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared capability of every strategy variant
pub trait Strategy: Send {
    fn kind(&self) -> StrategyKind;

    fn config(&self) -> &PartyConfig;

    /// Next offer given the opponent's previous one (`None` opens).
    ///
    /// The result always lies within the party's `[min, max]`.
    fn propose(&mut self, last_opponent_offer: Option<f64>) -> f64;

    fn utility(&self, price: f64) -> f64 {
        metrics::utility(self.config(), price)
    }

    /// Current opponent model, for strategies that keep one
    fn beliefs(&self) -> Option<BeliefSnapshot> {
        None
    }
}

/// Build a strategy of the requested kind for one party in one session
pub fn build_strategy(
    kind: StrategyKind,
    config: PartyConfig,
    settings: &NegotiationSettings,
) -> Box<dyn Strategy> {
    match kind {
        StrategyKind::Concession => Box::new(ConcessionStrategy::new(config)),
        StrategyKind::OpponentModel => Box::new(OpponentModelStrategy::new(config)),
        StrategyKind::Unified => Box::new(UnifiedStrategy::new(
            config,
            settings.optimizer,
            settings.risk,
        )),
        StrategyKind::Adaptive => Box::new(AdaptiveStrategy::new(config, settings.exploration)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_every_kind() {
        let settings = NegotiationSettings::default();
        for kind in [
            StrategyKind::Concession,
            StrategyKind::OpponentModel,
            StrategyKind::Unified,
            StrategyKind::Adaptive,
        ] {
            let config = PartyConfig::builder(85.0, 50.0, 100.0).build().unwrap();
            let mut strategy = build_strategy(kind, config, &settings);
            assert_eq!(strategy.kind(), kind);

            let mut last = None;
            for _ in 0..6 {
                let offer = strategy.propose(last);
                assert!((50.0..=100.0).contains(&offer), "{} offered {}", kind, offer);
                last = Some(offer + 7.0);
            }
        }
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&StrategyKind::OpponentModel).unwrap();
        assert_eq!(json, "\"opponent_model\"");
        assert_eq!(StrategyKind::default(), StrategyKind::Concession);
    }
}
