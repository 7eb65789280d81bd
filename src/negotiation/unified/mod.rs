//! Multi-module strategy
//!
//! Each round runs, in order: risk scoring, behavior clustering, belief
//! update, acceptance prediction and the multi-objective optimizer. The
//! full structured [`UnifiedDecision`] is returned by
//! [`UnifiedStrategy::decide`]; [`Strategy::propose`] keeps only the price.

pub mod acceptance;
pub mod cluster;
pub mod optimizer;
pub mod risk;

use serde::{Deserialize, Serialize};

use crate::config::{OptimizerWeights, RiskWeights};
use crate::negotiation::belief::{BeliefEngine, BeliefModel, BeliefSnapshot};
use crate::negotiation::strategy::{Strategy, StrategyKind};
use crate::types::PartyConfig;

pub use acceptance::{predict_acceptance, AcceptanceOutcome, AcceptancePrediction};
pub use cluster::{cluster_behavior, BehaviorCluster};
pub use optimizer::{optimize_offer, OptimizationResult, ScoreBreakdown};
pub use risk::{evaluate_risk, RiskAssessment, RiskLevel, TransactionFeatures};

/// Everything the pipeline produced for one proposal
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnifiedDecision {
    pub price: f64,
    pub risk_evaluation: RiskAssessment,
    pub behavior_cluster: BehaviorCluster,
    pub acceptance_prediction: AcceptancePrediction,
    pub beliefs: BeliefSnapshot,
    pub optimization: OptimizationResult,
    pub explanation: String,
}

#[derive(Clone, Debug)]
pub struct UnifiedStrategy {
    config: PartyConfig,
    optimizer_weights: OptimizerWeights,
    risk_weights: RiskWeights,
    transaction: TransactionFeatures,
    beliefs: BeliefEngine,
    last_decision: Option<UnifiedDecision>,
}

impl UnifiedStrategy {
    pub fn new(
        config: PartyConfig,
        optimizer_weights: OptimizerWeights,
        risk_weights: RiskWeights,
    ) -> Self {
        let transaction = TransactionFeatures::synthetic(config.target_price(), config.quantity());
        let beliefs = BeliefEngine::new(BeliefModel::MovingAverage, &config);
        Self {
            config,
            optimizer_weights,
            risk_weights,
            transaction,
            beliefs,
            last_decision: None,
        }
    }

    /// Replace the synthetic transaction features with observed ones
    pub fn with_transaction(mut self, transaction: TransactionFeatures) -> Self {
        self.transaction = transaction;
        self
    }

    pub fn belief_engine(&self) -> &BeliefEngine {
        &self.beliefs
    }

    pub fn last_decision(&self) -> Option<&UnifiedDecision> {
        self.last_decision.as_ref()
    }

    /// Run the full pipeline and return the structured result
    pub fn decide(&mut self, last_opponent_offer: Option<f64>) -> UnifiedDecision {
        let risk_evaluation = evaluate_risk(&self.risk_weights, &self.transaction);

        // Clustered on history before this round's offer is folded in
        let history = self.beliefs.state().opponent_offer_history();
        let behavior_cluster = if last_opponent_offer.is_some() && !history.is_empty() {
            cluster_behavior(history)
        } else {
            BehaviorCluster::default()
        };

        if let Some(offer) = last_opponent_offer {
            self.beliefs.observe(offer);
        }
        let beliefs = self.beliefs.state().snapshot();

        let acceptance_prediction = match beliefs.target_price_estimate {
            Some(estimate) => predict_acceptance(self.config.target_price(), estimate),
            None => AcceptancePrediction::unknown(self.config.min_price(), self.config.max_price()),
        };

        let optimization = optimize_offer(
            &self.config,
            &self.optimizer_weights,
            beliefs.target_price_estimate,
            risk_evaluation.risk_score,
            beliefs.stubbornness,
        );
        let price = self.config.clamp(optimization.best_price);
        self.beliefs.record_own_offer(price);

        let explanation = summarize(
            price,
            &risk_evaluation,
            &behavior_cluster,
            &acceptance_prediction,
            &beliefs,
            &optimization,
        );

        tracing::debug!(
            price,
            risk = risk_evaluation.risk_score,
            cluster = %behavior_cluster.cluster,
            prediction = %acceptance_prediction.prediction,
            score = optimization.max_score,
            "unified decision"
        );

        let decision = UnifiedDecision {
            price,
            risk_evaluation,
            behavior_cluster,
            acceptance_prediction,
            beliefs,
            optimization,
            explanation,
        };
        self.last_decision = Some(decision.clone());
        decision
    }
}

impl Strategy for UnifiedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Unified
    }

    fn config(&self) -> &PartyConfig {
        &self.config
    }

    fn propose(&mut self, last_opponent_offer: Option<f64>) -> f64 {
        self.decide(last_opponent_offer).price
    }

    fn beliefs(&self) -> Option<BeliefSnapshot> {
        Some(self.beliefs.state().snapshot())
    }
}

fn summarize(
    price: f64,
    risk: &RiskAssessment,
    cluster: &BehaviorCluster,
    acceptance: &AcceptancePrediction,
    beliefs: &BeliefSnapshot,
    optimization: &OptimizationResult,
) -> String {
    let mut parts = vec![
        format!("Proposed price: ${:.2}", price),
        format!("Risk: {} ({:.2}%)", risk.risk_label, risk.risk_score * 100.0),
        format!("Opponent behavior: {}", cluster.cluster),
    ];
    if let Some(target) = beliefs.target_price_estimate {
        parts.push(format!("Estimated opponent target: ${:.2}", target));
    }
    parts.push(format!(
        "Acceptance probability: {:.1}%",
        acceptance.acceptance_probability * 100.0
    ));
    parts.push(format!("Optimization score: {:.3}", optimization.max_score));
    parts.join(" | ")
}
