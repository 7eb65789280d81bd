//! Opponent belief tracking
//!
//! A [`BeliefEngine`] is owned by exactly one strategy instance and is the
//! only writer of its [`BeliefState`]. It estimates the counterpart's hidden
//! target price, stubbornness and patience from observed offers alone.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::metrics::mean;
use super::unified::cluster::cluster_behavior;
use crate::types::PartyConfig;

/// Offers considered by the trend fit
const TREND_WINDOW: usize = 5;
/// Observations needed for full confidence
const CONFIDENCE_HORIZON: f64 = 10.0;
/// Weight kept on the previous estimate by the moving average
const EMA_RETAIN: f64 = 0.7;
/// Expected movement per round as a share of the price band
const PATIENCE_BASELINE_SHARE: f64 = 0.05;

/// Categorical read of how an opponent concedes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpponentStance {
    Cooperative,
    Stubborn,
    Moderate,
}

impl OpponentStance {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpponentStance::Cooperative => "cooperative",
            OpponentStance::Stubborn => "stubborn",
            OpponentStance::Moderate => "moderate",
        }
    }

    /// Stubbornness score associated with the stance
    pub fn stubbornness(&self) -> f64 {
        match self {
            OpponentStance::Stubborn => 0.9,
            OpponentStance::Moderate => 0.5,
            OpponentStance::Cooperative => 0.1,
        }
    }
}

impl fmt::Display for OpponentStance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the engine turns offers into beliefs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeliefModel {
    /// Least-squares trend over recent offers, stance from absolute moves
    TrendFit,
    /// Exponential moving average, stance from the behavior clusterer
    MovingAverage,
}

/// Running estimate of the counterpart's hidden preferences
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeliefState {
    belief_target_price: Option<f64>,
    belief_stubbornness: f64,
    belief_patience: f64,
    belief_confidence: f64,
    strategy_type: Option<OpponentStance>,
    concession_estimate: f64,
    opponent_offer_history: Vec<f64>,
    own_offer_history: Vec<f64>,
}

impl Default for BeliefState {
    fn default() -> Self {
        Self {
            belief_target_price: None,
            belief_stubbornness: 0.5,
            belief_patience: 0.5,
            belief_confidence: 0.0,
            strategy_type: None,
            concession_estimate: 0.05,
            opponent_offer_history: Vec::new(),
            own_offer_history: Vec::new(),
        }
    }
}

impl BeliefState {
    pub fn belief_target_price(&self) -> Option<f64> {
        self.belief_target_price
    }

    pub fn belief_stubbornness(&self) -> f64 {
        self.belief_stubbornness
    }

    pub fn belief_patience(&self) -> f64 {
        self.belief_patience
    }

    pub fn belief_confidence(&self) -> f64 {
        self.belief_confidence
    }

    pub fn strategy_type(&self) -> Option<OpponentStance> {
        self.strategy_type
    }

    pub fn concession_estimate(&self) -> f64 {
        self.concession_estimate
    }

    pub fn opponent_offer_history(&self) -> &[f64] {
        &self.opponent_offer_history
    }

    pub fn own_offer_history(&self) -> &[f64] {
        &self.own_offer_history
    }

    pub fn snapshot(&self) -> BeliefSnapshot {
        BeliefSnapshot {
            target_price_estimate: self.belief_target_price,
            strategy_type: self.strategy_type,
            concession_rate_estimate: self.concession_estimate,
            stubbornness: self.belief_stubbornness,
            patience: self.belief_patience,
            confidence: self.belief_confidence,
            rounds_observed: self.opponent_offer_history.len(),
        }
    }
}

/// Copy of the belief state attached to a round record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeliefSnapshot {
    pub target_price_estimate: Option<f64>,
    pub strategy_type: Option<OpponentStance>,
    pub concession_rate_estimate: f64,
    pub stubbornness: f64,
    pub patience: f64,
    pub confidence: f64,
    pub rounds_observed: usize,
}

/// Sole writer of one party's [`BeliefState`]
#[derive(Clone, Debug)]
pub struct BeliefEngine {
    model: BeliefModel,
    band: f64,
    state: BeliefState,
}

impl BeliefEngine {
    pub fn new(model: BeliefModel, config: &PartyConfig) -> Self {
        Self {
            model,
            band: config.max_price() - config.min_price(),
            state: BeliefState::default(),
        }
    }

    pub fn model(&self) -> BeliefModel {
        self.model
    }

    pub fn state(&self) -> &BeliefState {
        &self.state
    }

    /// Append one of our own offers to the history
    pub fn record_own_offer(&mut self, price: f64) {
        self.state.own_offer_history.push(price);
    }

    /// Fold the opponent's latest offer into the beliefs
    pub fn observe(&mut self, opponent_offer: f64) {
        self.state.opponent_offer_history.push(opponent_offer);

        self.update_stance();
        self.update_target(opponent_offer);
        self.update_patience();

        tracing::debug!(
            model = ?self.model,
            target = ?self.state.belief_target_price,
            stance = ?self.state.strategy_type,
            patience = self.state.belief_patience,
            confidence = self.state.belief_confidence,
            "beliefs updated"
        );
    }

    fn update_stance(&mut self) {
        let history = &self.state.opponent_offer_history;
        if history.len() < 2 {
            return;
        }

        match self.model {
            BeliefModel::TrendFit => {
                let moves: Vec<f64> = history.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
                let Some(avg) = mean(&moves) else {
                    return;
                };
                let stance = if avg > 0.1 {
                    OpponentStance::Cooperative
                } else if avg < 0.02 {
                    OpponentStance::Stubborn
                } else {
                    OpponentStance::Moderate
                };
                self.state.concession_estimate = avg;
                self.state.strategy_type = Some(stance);
                self.state.belief_stubbornness = stance.stubbornness();
            }
            BeliefModel::MovingAverage => {
                let cluster = cluster_behavior(history);
                self.state.concession_estimate = cluster.avg_concession_pct / 100.0;
                self.state.strategy_type = Some(cluster.cluster);
                self.state.belief_stubbornness = cluster.cluster_score;
            }
        }
    }

    fn update_target(&mut self, latest: f64) {
        let history = &self.state.opponent_offer_history;
        let window = &history[history.len().saturating_sub(TREND_WINDOW)..];

        let observed = match self.model {
            BeliefModel::TrendFit => window.len(),
            BeliefModel::MovingAverage => history.len(),
        };
        let confidence = (observed as f64 / CONFIDENCE_HORIZON).min(1.0);

        let (estimate, blend) = match self.model {
            BeliefModel::TrendFit => (trend_intercept(window), confidence),
            BeliefModel::MovingAverage => (latest, 1.0 - EMA_RETAIN),
        };

        self.state.belief_target_price = Some(match self.state.belief_target_price {
            None => estimate,
            Some(prior) => blend * estimate + (1.0 - blend) * prior,
        });
        self.state.belief_confidence = confidence;
    }

    fn update_patience(&mut self) {
        let history = &self.state.opponent_offer_history;
        if history.len() < 2 {
            return;
        }

        let movement = (history[0] - history[history.len() - 1]).abs();
        let baseline = history.len() as f64 * PATIENCE_BASELINE_SHARE * self.band;

        if movement < baseline * 0.5 {
            self.state.belief_patience = 0.8;
        } else if movement > baseline * 1.5 {
            self.state.belief_patience = 0.2;
        }
    }
}

/// Intercept of the least-squares line through `offers` indexed 0..n.
///
/// A single offer is its own intercept.
fn trend_intercept(offers: &[f64]) -> f64 {
    let n = offers.len() as f64;
    if offers.len() < 2 {
        return offers.first().copied().unwrap_or_default();
    }

    let x_mean = (n - 1.0) / 2.0;
    let y_mean = offers.iter().sum::<f64>() / n;

    let (num, den) = offers
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });

    y_mean - (num / den) * x_mean
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(model: BeliefModel) -> BeliefEngine {
        let config = PartyConfig::builder(85.0, 50.0, 100.0).build().unwrap();
        BeliefEngine::new(model, &config)
    }

    #[test]
    fn test_initial_state() {
        let engine = engine(BeliefModel::TrendFit);
        let state = engine.state();
        assert_eq!(state.belief_target_price(), None);
        assert_eq!(state.belief_patience(), 0.5);
        assert_eq!(state.belief_confidence(), 0.0);
        assert_eq!(state.strategy_type(), None);
    }

    #[test]
    fn test_moving_average_target() {
        let mut engine = engine(BeliefModel::MovingAverage);
        engine.observe(95.0);
        assert_eq!(engine.state().belief_target_price(), Some(95.0));

        engine.observe(93.0);
        engine.observe(91.0);
        let target = engine.state().belief_target_price().unwrap();
        assert!(target > 90.0 && target < 96.0);
        assert!((target - 93.38).abs() < 1e-9);
    }

    #[test]
    fn test_trend_fit_first_observation_initializes() {
        let mut engine = engine(BeliefModel::TrendFit);
        engine.observe(92.0);
        assert_eq!(engine.state().belief_target_price(), Some(92.0));
        assert!((engine.state().belief_confidence() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_trend_fit_blends_with_prior() {
        let mut engine = engine(BeliefModel::TrendFit);
        engine.observe(95.0);
        engine.observe(93.0);
        // Line through (0, 95), (1, 93) has intercept 95; blended 0.2 * 95 + 0.8 * 95
        assert!((engine.state().belief_target_price().unwrap() - 95.0).abs() < 1e-9);
        assert!((engine.state().belief_confidence() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_trend_intercept() {
        assert_eq!(trend_intercept(&[]), 0.0);
        assert_eq!(trend_intercept(&[7.0]), 7.0);
        assert!((trend_intercept(&[10.0, 12.0, 14.0]) - 10.0).abs() < 1e-12);
        assert!((trend_intercept(&[5.0, 5.0, 5.0, 5.0]) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_stance_classification() {
        let mut cooperative = engine(BeliefModel::TrendFit);
        for offer in [95.0, 93.0, 91.0] {
            cooperative.observe(offer);
        }
        assert_eq!(
            cooperative.state().strategy_type(),
            Some(OpponentStance::Cooperative)
        );
        assert_eq!(cooperative.state().belief_stubbornness(), 0.1);

        let mut stubborn = engine(BeliefModel::TrendFit);
        for offer in [95.0, 95.01, 95.0] {
            stubborn.observe(offer);
        }
        assert_eq!(stubborn.state().strategy_type(), Some(OpponentStance::Stubborn));

        let mut moderate = engine(BeliefModel::TrendFit);
        for offer in [95.0, 94.95, 94.9] {
            moderate.observe(offer);
        }
        assert_eq!(moderate.state().strategy_type(), Some(OpponentStance::Moderate));
    }

    #[test]
    fn test_patience() {
        // Band 50, baseline per round 2.5
        let mut patient = engine(BeliefModel::TrendFit);
        patient.observe(95.0);
        patient.observe(94.0);
        assert_eq!(patient.state().belief_patience(), 0.8);

        let mut impatient = engine(BeliefModel::TrendFit);
        impatient.observe(95.0);
        impatient.observe(85.0);
        assert_eq!(impatient.state().belief_patience(), 0.2);

        let mut steady = engine(BeliefModel::TrendFit);
        steady.observe(95.0);
        steady.observe(90.0);
        assert_eq!(steady.state().belief_patience(), 0.5);
    }

    #[test]
    fn test_moving_average_uses_cluster_score() {
        let mut engine = engine(BeliefModel::MovingAverage);
        for offer in [100.0, 92.0, 85.0] {
            engine.observe(offer);
        }
        assert_eq!(
            engine.state().strategy_type(),
            Some(OpponentStance::Cooperative)
        );
        assert_eq!(engine.state().belief_stubbornness(), 0.1);
    }

    #[test]
    fn test_histories_are_append_only() {
        let mut engine = engine(BeliefModel::TrendFit);
        engine.record_own_offer(85.0);
        engine.observe(95.0);
        engine.record_own_offer(87.0);
        assert_eq!(engine.state().own_offer_history(), &[85.0, 87.0]);
        assert_eq!(engine.state().opponent_offer_history(), &[95.0]);

        let snapshot = engine.state().snapshot();
        assert_eq!(snapshot.rounds_observed, 1);
    }
}
