//! fairdeal
//!
//! Bilateral buyer/seller price negotiation between automated agents.
//!
//! - Concession, opponent-modeling, multi-module and exploratory strategies
//! - Utility and fairness scoring with a rule-table explanation per offer
//! - A round-by-round engine producing a timeline and final agreement
//! - Session lifecycle with agreement receipts, plus market, storage and
//!   advisor ports

pub mod advisor;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod market;
pub mod negotiation;
pub mod store;
pub mod types;

pub use config::NegotiationSettings;
pub use error::{NegotiatorError, Result};
pub use negotiation::{
    run_negotiation, Agreement, NegotiationEngine, Outcome, RoundRecord, Strategy, StrategyKind,
};
pub use types::{Hash, PartyConfig, Role, SessionId};
