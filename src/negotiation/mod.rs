//! Negotiation module: strategies, beliefs, scoring and the round loop

pub mod belief;
pub mod engine;
pub mod explain;
pub mod metrics;
pub mod session;
pub mod strategy;
pub mod types;
pub mod unified;

pub use belief::{BeliefEngine, BeliefModel, BeliefSnapshot, BeliefState, OpponentStance};
pub use engine::{run_negotiation, NegotiationEngine};
pub use explain::{explain_offer, ExplanationContext};
pub use session::{
    FinalizedAgreement, LedgerEntry, NegotiationSession, SessionRequest, SessionStatus,
    DEFAULT_SELLER_ADDRESS,
};
pub use strategy::{build_strategy, Strategy, StrategyKind};
pub use types::{Agreement, Outcome, RoundRecord};
pub use unified::{UnifiedDecision, UnifiedStrategy};
