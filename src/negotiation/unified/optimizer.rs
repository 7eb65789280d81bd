//! Discretized multi-objective price search

use serde::{Deserialize, Serialize};

use crate::config::OptimizerWeights;
use crate::negotiation::metrics::{simple_fairness, utility, utility_within};
use crate::types::PartyConfig;

/// Evenly spaced candidates over `[min, max]`.
///
/// The first strictly greater objective wins, so ties resolve to the lowest
/// candidate price. The choice depends on this granularity.
pub const CANDIDATE_COUNT: usize = 20;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub utility: f64,
    pub fairness: f64,
    pub risk_penalty: f64,
    pub stubbornness_penalty: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub best_price: f64,
    pub max_score: f64,
    pub opponent_target: f64,
    pub score_details: ScoreBreakdown,
}

/// Opponent target assumed when no belief exists: our own target reflected
/// across the midpoint of the band.
pub fn reflected_target(config: &PartyConfig) -> f64 {
    let midpoint = config.midpoint();
    midpoint + (midpoint - config.target_price())
}

pub fn candidate_prices(min_price: f64, max_price: f64) -> impl Iterator<Item = f64> {
    let step = (max_price - min_price) / (CANDIDATE_COUNT - 1) as f64;
    (0..CANDIDATE_COUNT).map(move |i| min_price + step * i as f64)
}

pub fn optimize_offer(
    config: &PartyConfig,
    weights: &OptimizerWeights,
    belief_target: Option<f64>,
    risk_score: f64,
    stubbornness: f64,
) -> OptimizationResult {
    let opponent_target = belief_target.unwrap_or_else(|| reflected_target(config));
    let risk_penalty = weights.risk * risk_score;
    let stubbornness_penalty = weights.stubbornness * stubbornness;

    let mut best = OptimizationResult {
        best_price: config.target_price(),
        max_score: f64::NEG_INFINITY,
        opponent_target,
        score_details: ScoreBreakdown::default(),
    };

    for price in candidate_prices(config.min_price(), config.max_price()) {
        let own = utility(config, price);
        let opponent = utility_within(
            opponent_target,
            config.min_price(),
            config.max_price(),
            price,
        );
        let fairness = simple_fairness(own, opponent);

        let score = weights.utility * own + weights.fairness * fairness
            - risk_penalty
            - stubbornness_penalty;

        if score > best.max_score {
            best.best_price = price;
            best.max_score = score;
            best.score_details = ScoreBreakdown {
                utility: own,
                fairness,
                risk_penalty,
                stubbornness_penalty,
            };
        }
    }

    best
}
