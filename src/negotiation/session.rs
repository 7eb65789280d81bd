//! Negotiation session lifecycle

use crate::crypto::{agreement_hash, AgreementTerms};
use crate::error::{NegotiatorError, Result};
use crate::types::{Hash, PartyConfig, Role, SessionId, ZERO_ADDRESS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::strategy::StrategyKind;
use super::types::{Agreement, RoundRecord};

/// Seller address assigned when the request leaves it empty
pub const DEFAULT_SELLER_ADDRESS: &str = "0x1111111111111111111111111111111111111111";

/// Session status state machine: `Open → Negotiated → Finalized → Recorded`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Negotiated,
    Finalized,
    Recorded,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Open => "open",
            SessionStatus::Negotiated => "negotiated",
            SessionStatus::Finalized => "finalized",
            SessionStatus::Recorded => "recorded",
        }
    }

    /// Check if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Recorded)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = NegotiatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(SessionStatus::Open),
            "negotiated" => Ok(SessionStatus::Negotiated),
            "finalized" => Ok(SessionStatus::Finalized),
            "recorded" => Ok(SessionStatus::Recorded),
            other => Err(NegotiatorError::InvalidConfig(format!(
                "unknown session status: {}",
                other
            ))),
        }
    }
}

/// What a human party asks for when opening a session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub role: Role,
    pub buyer_address: Option<String>,
    pub seller_address: Option<String>,
    pub target_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub quantity: u32,
    pub fairness_weight: f64,
    pub concession_rate: f64,
    pub aggressiveness: f64,
    pub market_symbol: Option<String>,
    pub market_asset_type: Option<String>,
    pub max_rounds: u32,
    pub strategy: StrategyKind,
    pub delivery_days: u32,
    pub escrow: bool,
}

impl SessionRequest {
    pub fn new(role: Role, target_price: f64, min_price: f64, max_price: f64) -> Self {
        Self {
            role,
            buyer_address: None,
            seller_address: None,
            target_price,
            min_price,
            max_price,
            quantity: 1,
            fairness_weight: 0.5,
            concession_rate: 0.05,
            aggressiveness: 0.5,
            market_symbol: None,
            market_asset_type: None,
            max_rounds: 8,
            strategy: StrategyKind::default(),
            delivery_days: 0,
            escrow: true,
        }
    }

    pub fn buyer_address(&self) -> &str {
        self.buyer_address.as_deref().unwrap_or(ZERO_ADDRESS)
    }

    pub fn seller_address(&self) -> &str {
        self.seller_address.as_deref().unwrap_or(DEFAULT_SELLER_ADDRESS)
    }

    /// Market symbol and asset type, when both were given
    pub fn market(&self) -> Option<(&str, &str)> {
        match (&self.market_symbol, &self.market_asset_type) {
            (Some(symbol), Some(asset_type)) => Some((symbol.as_str(), asset_type.as_str())),
            _ => None,
        }
    }

    /// Configuration of the requesting party
    pub fn user_party(&self, market_price: Option<f64>) -> Result<PartyConfig> {
        let address = match self.role {
            Role::Buyer => self.buyer_address(),
            Role::Seller => self.seller_address(),
        };
        PartyConfig::builder(self.target_price, self.min_price, self.max_price)
            .address(address)
            .quantity(self.quantity)
            .fairness_weight(self.fairness_weight)
            .concession_rate(self.concession_rate)
            .aggressiveness(self.aggressiveness)
            .maybe_market_price(market_price)
            .build()
    }

    /// Buyer and seller configurations: the user plus a derived counterpart
    pub fn parties(&self, market_price: Option<f64>) -> Result<(PartyConfig, PartyConfig)> {
        let user = self.user_party(market_price)?;
        match self.role {
            Role::Buyer => {
                let seller = user.counterpart(Role::Seller, self.seller_address())?;
                Ok((user, seller))
            }
            Role::Seller => {
                let buyer = user.counterpart(Role::Buyer, self.buyer_address())?;
                Ok((buyer, user))
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            return Err(NegotiatorError::InvalidRounds(self.max_rounds));
        }
        self.user_party(None).map(|_| ())
    }
}

/// Ledger transaction recorded against a finalized session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub tx_hash: String,
    pub block_number: Option<u64>,
}

/// Agreement plus its receipt, returned by [`NegotiationSession::finalize`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalizedAgreement {
    pub agreement: Agreement,
    pub receipt: Hash,
    pub buyer_address: String,
    pub seller_address: String,
}

/// A negotiation session owned by the application layer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NegotiationSession {
    id: SessionId,
    request: SessionRequest,
    status: SessionStatus,
    market_price: Option<f64>,
    agreement: Option<Agreement>,
    finalized: Option<FinalizedAgreement>,
    ledger: Option<LedgerEntry>,
}

impl NegotiationSession {
    /// Open a session, rejecting an invalid request up front
    pub fn new(id: SessionId, request: SessionRequest) -> Result<Self> {
        request.validate()?;
        Ok(Self {
            id,
            request,
            status: SessionStatus::Open,
            market_price: None,
            agreement: None,
            finalized: None,
            ledger: None,
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn request(&self) -> &SessionRequest {
        &self.request
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn market_price(&self) -> Option<f64> {
        self.market_price
    }

    pub fn agreement(&self) -> Option<&Agreement> {
        self.agreement.as_ref()
    }

    pub fn finalized(&self) -> Option<&FinalizedAgreement> {
        self.finalized.as_ref()
    }

    pub fn ledger(&self) -> Option<&LedgerEntry> {
        self.ledger.as_ref()
    }

    /// Store the outcome of an automated run. Re-running replaces it.
    pub fn mark_negotiated(&mut self, agreement: Agreement, market_price: Option<f64>) -> Result<()> {
        if !matches!(self.status, SessionStatus::Open | SessionStatus::Negotiated) {
            return Err(NegotiatorError::InvalidStateTransition(format!(
                "cannot negotiate a {} session",
                self.status
            )));
        }

        self.agreement = Some(agreement);
        self.market_price = market_price;
        self.status = SessionStatus::Negotiated;
        Ok(())
    }

    /// Settle terms and compute the receipt.
    ///
    /// Uses the stored agreement; without one, falls back to the midpoint of
    /// `latest_round` and that round's fairness and utilities.
    pub fn finalize(&mut self, latest_round: Option<&RoundRecord>) -> Result<FinalizedAgreement> {
        if !matches!(self.status, SessionStatus::Open | SessionStatus::Negotiated) {
            return Err(NegotiatorError::InvalidStateTransition(format!(
                "cannot finalize a {} session",
                self.status
            )));
        }

        let agreement = match (&self.agreement, latest_round) {
            (Some(agreement), _) => agreement.clone(),
            (None, Some(round)) => Agreement {
                final_price: round.midpoint(),
                quantity: self.request.quantity,
                final_simple_fairness: round.simple_fairness,
                final_proportional_fairness: round.proportional_fairness,
                buyer_utility: round.buyer_utility,
                seller_utility: round.seller_utility,
                round_count: round.round,
                converged: false,
            },
            (None, None) => return Err(NegotiatorError::NoOffers(self.id.to_string())),
        };

        let mut terms = AgreementTerms::new(
            self.request.buyer_address(),
            self.request.seller_address(),
            agreement.final_price,
            agreement.quantity,
        );
        terms.delivery_days = self.request.delivery_days;
        terms.escrow = self.request.escrow;

        let finalized = FinalizedAgreement {
            receipt: agreement_hash(&terms),
            agreement,
            buyer_address: terms.buyer_address,
            seller_address: terms.seller_address,
        };

        tracing::info!(
            session = %self.id,
            price = finalized.agreement.final_price,
            receipt = %finalized.receipt,
            "session finalized"
        );

        self.finalized = Some(finalized.clone());
        self.status = SessionStatus::Finalized;
        Ok(finalized)
    }

    /// Attach a ledger transaction to a finalized session
    pub fn record_ledger(&mut self, tx_hash: &str, block_number: Option<u64>) -> Result<()> {
        if tx_hash.trim().is_empty() {
            return Err(NegotiatorError::MissingTxHash);
        }
        if self.status != SessionStatus::Finalized {
            return Err(NegotiatorError::InvalidStateTransition(format!(
                "cannot record a {} session",
                self.status
            )));
        }

        self.ledger = Some(LedgerEntry {
            tx_hash: tx_hash.to_string(),
            block_number,
        });
        self.status = SessionStatus::Recorded;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::verify_receipt;

    fn request() -> SessionRequest {
        let mut request = SessionRequest::new(Role::Buyer, 85.0, 50.0, 100.0);
        request.quantity = 10;
        request
    }

    fn agreement() -> Agreement {
        Agreement {
            final_price: 88.6,
            quantity: 10,
            final_simple_fairness: 0.95,
            final_proportional_fairness: -0.1,
            buyer_utility: 0.93,
            seller_utility: 0.87,
            round_count: 2,
            converged: true,
        }
    }

    fn session() -> NegotiationSession {
        NegotiationSession::new(SessionId::from_sequence(1), request()).unwrap()
    }

    #[test]
    fn test_session_creation() {
        let session = session();
        assert_eq!(session.status(), SessionStatus::Open);
        assert_eq!(session.id().to_string(), "session_1");
        assert_eq!(session.request().seller_address(), DEFAULT_SELLER_ADDRESS);
        assert_eq!(session.request().buyer_address(), ZERO_ADDRESS);
    }

    #[test]
    fn test_invalid_request_rejected() {
        let mut bad = request();
        bad.max_rounds = 0;
        assert!(matches!(
            NegotiationSession::new(SessionId::from_sequence(2), bad),
            Err(NegotiatorError::InvalidRounds(0))
        ));

        let mut bad = request();
        bad.min_price = 120.0;
        assert!(NegotiationSession::new(SessionId::from_sequence(3), bad).is_err());
    }

    #[test]
    fn test_parties_for_buyer() {
        let (buyer, seller) = request().parties(Some(90.0)).unwrap();
        assert_eq!(buyer.target_price(), 85.0);
        assert_eq!(seller.target_price(), 90.0);
        assert_eq!(seller.address(), DEFAULT_SELLER_ADDRESS);
        assert_eq!(seller.market_price(), Some(90.0));
        assert_eq!(seller.quantity(), 10);
    }

    #[test]
    fn test_parties_for_seller() {
        let request = SessionRequest::new(Role::Seller, 95.0, 50.0, 100.0);
        let (buyer, seller) = request.parties(None).unwrap();
        assert_eq!(seller.target_price(), 95.0);
        assert_eq!(buyer.target_price(), 60.0);
        assert_eq!(buyer.address(), ZERO_ADDRESS);
    }

    #[test]
    fn test_full_lifecycle() {
        let mut session = session();
        session.mark_negotiated(agreement(), Some(90.0)).unwrap();
        assert_eq!(session.status(), SessionStatus::Negotiated);

        let finalized = session.finalize(None).unwrap();
        assert_eq!(finalized.agreement, agreement());
        assert_eq!(session.status(), SessionStatus::Finalized);

        let terms = AgreementTerms::new(ZERO_ADDRESS, DEFAULT_SELLER_ADDRESS, 88.6, 10);
        assert!(verify_receipt(&finalized.receipt.to_string(), &terms).unwrap());

        session.record_ledger("0xdeadbeef", Some(42)).unwrap();
        assert_eq!(session.status(), SessionStatus::Recorded);
        assert!(session.status().is_terminal());
        assert_eq!(session.ledger().unwrap().block_number, Some(42));
    }

    #[test]
    fn test_finalize_from_latest_round() {
        let mut session = session();
        let round = RoundRecord {
            round: 3,
            buyer_offer: 87.0,
            seller_offer: 91.0,
            buyer_utility: 0.96,
            seller_utility: 0.88,
            simple_fairness: 0.92,
            proportional_fairness: -0.17,
            buyer_explanation: String::new(),
            seller_explanation: String::new(),
            buyer_beliefs: None,
            seller_beliefs: None,
            market_price: None,
        };
        let finalized = session.finalize(Some(&round)).unwrap();
        assert_eq!(finalized.agreement.final_price, 89.0);
        assert_eq!(finalized.agreement.round_count, 3);
        assert!(!finalized.agreement.converged);
    }

    #[test]
    fn test_finalize_without_offers() {
        let mut session = session();
        assert!(matches!(
            session.finalize(None),
            Err(NegotiatorError::NoOffers(_))
        ));
        assert_eq!(session.status(), SessionStatus::Open);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut session = session();
        assert!(matches!(
            session.record_ledger("0xabc", None),
            Err(NegotiatorError::InvalidStateTransition(_))
        ));

        session.mark_negotiated(agreement(), None).unwrap();
        session.finalize(None).unwrap();
        assert!(session.finalize(None).is_err());
        assert!(session.mark_negotiated(agreement(), None).is_err());

        assert!(matches!(
            session.record_ledger("  ", None),
            Err(NegotiatorError::MissingTxHash)
        ));
        session.record_ledger("0xabc", None).unwrap();
        assert!(session.record_ledger("0xabc", None).is_err());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Finalized".parse::<SessionStatus>().unwrap(), SessionStatus::Finalized);
        assert!("closed".parse::<SessionStatus>().is_err());
    }
}
