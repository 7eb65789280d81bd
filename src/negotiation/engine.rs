//! Negotiation engine drives two strategies round by round

use crate::config::NegotiationSettings;
use crate::error::{NegotiatorError, Result};
use crate::types::{PartyConfig, Role};

use super::belief::BeliefSnapshot;
use super::explain::{explain_offer, ExplanationContext};
use super::metrics::{proportional_fairness, simple_fairness};
use super::strategy::{build_strategy, Strategy, StrategyKind};
use super::types::{Agreement, Outcome, RoundRecord};

/// Runs negotiations under one set of settings.
///
/// Holds no per-session state, so one engine may run any number of
/// independent negotiations.
#[derive(Clone, Debug, Default)]
pub struct NegotiationEngine {
    settings: NegotiationSettings,
}

impl NegotiationEngine {
    /// Create new negotiation engine
    pub fn new(settings: NegotiationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &NegotiationSettings {
        &self.settings
    }

    /// Build both strategies of `kind` and negotiate
    pub fn run(
        &self,
        buyer: &PartyConfig,
        seller: &PartyConfig,
        max_rounds: u32,
        kind: StrategyKind,
    ) -> Result<Outcome> {
        if max_rounds == 0 {
            return Err(NegotiatorError::InvalidRounds(max_rounds));
        }

        let mut buyer_strategy = build_strategy(kind, buyer.clone(), &self.settings);
        let mut seller_strategy = build_strategy(kind, seller.clone(), &self.settings);
        self.negotiate(buyer_strategy.as_mut(), seller_strategy.as_mut(), max_rounds)
    }

    /// Negotiate between two already-built strategies.
    ///
    /// The buyer always proposes first; the seller answers the buyer's offer
    /// from the same round.
    pub fn negotiate(
        &self,
        buyer: &mut dyn Strategy,
        seller: &mut dyn Strategy,
        max_rounds: u32,
    ) -> Result<Outcome> {
        if max_rounds == 0 {
            return Err(NegotiatorError::InvalidRounds(max_rounds));
        }

        let market_price = buyer
            .config()
            .market_price()
            .or_else(|| seller.config().market_price());
        let mut timeline: Vec<RoundRecord> = Vec::with_capacity(max_rounds as usize);
        let mut last_seller_offer = None;

        for round in 1..=max_rounds {
            let buyer_offer = buyer.propose(last_seller_offer);
            let buyer_utility = buyer.utility(buyer_offer);

            let seller_offer = seller.propose(Some(buyer_offer));
            let seller_utility = seller.utility(seller_offer);

            let fairness = simple_fairness(buyer_utility, seller_utility);
            let buyer_beliefs = buyer.beliefs();
            let seller_beliefs = seller.beliefs();

            let buyer_explanation = explain_offer(&explanation_context(
                Role::Buyer,
                buyer.config(),
                buyer_offer,
                last_seller_offer,
                fairness,
                buyer_beliefs.as_ref(),
            ));
            let seller_explanation = explain_offer(&explanation_context(
                Role::Seller,
                seller.config(),
                seller_offer,
                Some(buyer_offer),
                fairness,
                seller_beliefs.as_ref(),
            ));

            let record = RoundRecord {
                round,
                buyer_offer,
                seller_offer,
                buyer_utility,
                seller_utility,
                simple_fairness: fairness,
                proportional_fairness: proportional_fairness(buyer_utility, seller_utility),
                buyer_explanation,
                seller_explanation,
                buyer_beliefs,
                seller_beliefs,
                market_price,
            };

            tracing::debug!(
                round,
                buyer_offer,
                seller_offer,
                fairness,
                "round complete"
            );

            let converged = self.settings.stop.is_met(buyer_offer, seller_offer, fairness);
            let midpoint = record.midpoint();
            timeline.push(record);

            if converged {
                let agreement = settle_at(buyer, seller, midpoint, round);
                tracing::info!(
                    round,
                    price = agreement.final_price,
                    fairness = agreement.final_simple_fairness,
                    "negotiation converged"
                );
                return Ok(Outcome { timeline, agreement });
            }

            last_seller_offer = Some(seller_offer);
        }

        let last = timeline
            .last()
            .ok_or(NegotiatorError::InvalidRounds(max_rounds))?;
        let final_price = last.midpoint();
        let agreement = Agreement {
            final_price,
            quantity: buyer.config().quantity(),
            final_simple_fairness: last.simple_fairness,
            final_proportional_fairness: last.proportional_fairness,
            buyer_utility: buyer.utility(final_price),
            seller_utility: seller.utility(final_price),
            round_count: last.round,
            converged: false,
        };

        tracing::info!(
            rounds = max_rounds,
            price = final_price,
            "round limit reached, settling at last midpoint"
        );
        Ok(Outcome { timeline, agreement })
    }
}

/// Run one negotiation with default settings
pub fn run_negotiation(
    buyer: &PartyConfig,
    seller: &PartyConfig,
    max_rounds: u32,
    kind: StrategyKind,
) -> Result<Outcome> {
    NegotiationEngine::default().run(buyer, seller, max_rounds, kind)
}

fn settle_at(buyer: &dyn Strategy, seller: &dyn Strategy, price: f64, round: u32) -> Agreement {
    let buyer_utility = buyer.utility(price);
    let seller_utility = seller.utility(price);
    Agreement {
        final_price: price,
        quantity: buyer.config().quantity(),
        final_simple_fairness: simple_fairness(buyer_utility, seller_utility),
        final_proportional_fairness: proportional_fairness(buyer_utility, seller_utility),
        buyer_utility,
        seller_utility,
        round_count: round,
        converged: true,
    }
}

fn explanation_context(
    side: Role,
    config: &PartyConfig,
    price: f64,
    last_opponent_offer: Option<f64>,
    fairness: f64,
    beliefs: Option<&BeliefSnapshot>,
) -> ExplanationContext {
    ExplanationContext {
        side,
        price,
        last_opponent_offer,
        target_price: config.target_price(),
        concession_rate: config.concession_rate(),
        aggressiveness: config.aggressiveness(),
        fairness,
        market_price: config.market_price(),
        opponent_stance: beliefs.and_then(|b| b.strategy_type),
    }
}
