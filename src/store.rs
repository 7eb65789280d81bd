//! Session persistence port
//!
//! The negotiation core emits plain records; a [`SessionStore`] keeps them
//! keyed by session id. [`MemoryStore`] is the in-process implementation.

use crate::error::{NegotiatorError, Result};
use crate::negotiation::{
    BeliefSnapshot, NegotiationSession, RoundRecord, SessionRequest, SessionStatus,
};
use crate::types::{Role, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One party's offer in one round, as persisted
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfferRow {
    pub session: SessionId,
    pub round: u32,
    pub made_by: Role,
    pub price: f64,
    pub quantity: u32,
    pub fairness: f64,
    pub proportional_fairness: f64,
    pub utility: f64,
    pub explanation: String,
    /// Opponent model of the party that made the offer, if it keeps one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beliefs: Option<BeliefSnapshot>,
}

/// Storage for sessions and their offers
pub trait SessionStore: Send {
    /// Assign an id and store a new open session
    fn create_session(&mut self, request: SessionRequest) -> Result<NegotiationSession>;

    fn session(&self, id: &SessionId) -> Result<NegotiationSession>;

    /// Replace a stored session with its updated state
    fn save_session(&mut self, session: NegotiationSession) -> Result<()>;

    /// Replace all offers of a session
    fn save_offers(&mut self, id: &SessionId, rows: Vec<OfferRow>) -> Result<()>;

    /// Offers of a session ordered by round, buyer first
    fn offers(&self, id: &SessionId) -> Result<Vec<OfferRow>>;

    fn list_sessions(&self, status: Option<SessionStatus>) -> Vec<NegotiationSession>;
}

/// Split a timeline into per-party rows
pub fn offer_rows(session: &SessionId, quantity: u32, timeline: &[RoundRecord]) -> Vec<OfferRow> {
    timeline
        .iter()
        .flat_map(|record| {
            [
                OfferRow {
                    session: session.clone(),
                    round: record.round,
                    made_by: Role::Buyer,
                    price: record.buyer_offer,
                    quantity,
                    fairness: record.simple_fairness,
                    proportional_fairness: record.proportional_fairness,
                    utility: record.buyer_utility,
                    explanation: record.buyer_explanation.clone(),
                    beliefs: record.buyer_beliefs.clone(),
                },
                OfferRow {
                    session: session.clone(),
                    round: record.round,
                    made_by: Role::Seller,
                    price: record.seller_offer,
                    quantity,
                    fairness: record.simple_fairness,
                    proportional_fairness: record.proportional_fairness,
                    utility: record.seller_utility,
                    explanation: record.seller_explanation.clone(),
                    beliefs: record.seller_beliefs.clone(),
                },
            ]
        })
        .collect()
}

/// Rebuild the timeline by grouping rows on their round.
///
/// Rounds missing either party's offer are left out.
pub fn timeline_from_rows(rows: &[OfferRow], market_price: Option<f64>) -> Vec<RoundRecord> {
    let mut rounds: BTreeMap<u32, (Option<&OfferRow>, Option<&OfferRow>)> = BTreeMap::new();
    for row in rows {
        let entry = rounds.entry(row.round).or_default();
        match row.made_by {
            Role::Buyer => entry.0 = Some(row),
            Role::Seller => entry.1 = Some(row),
        }
    }

    rounds
        .into_iter()
        .filter_map(|(round, pair)| match pair {
            (Some(buyer), Some(seller)) => Some(RoundRecord {
                round,
                buyer_offer: buyer.price,
                seller_offer: seller.price,
                buyer_utility: buyer.utility,
                seller_utility: seller.utility,
                simple_fairness: buyer.fairness,
                proportional_fairness: buyer.proportional_fairness,
                buyer_explanation: buyer.explanation.clone(),
                seller_explanation: seller.explanation.clone(),
                buyer_beliefs: buyer.beliefs.clone(),
                seller_beliefs: seller.beliefs.clone(),
                market_price,
            }),
            _ => None,
        })
        .collect()
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: u64,
    sessions: HashMap<SessionId, NegotiationSession>,
    offers: HashMap<SessionId, Vec<OfferRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn create_session(&mut self, request: SessionRequest) -> Result<NegotiationSession> {
        self.next_id += 1;
        let session = NegotiationSession::new(SessionId::from_sequence(self.next_id), request)?;
        self.sessions.insert(session.id().clone(), session.clone());
        Ok(session)
    }

    fn session(&self, id: &SessionId) -> Result<NegotiationSession> {
        self.sessions
            .get(id)
            .cloned()
            .ok_or_else(|| NegotiatorError::SessionNotFound(id.to_string()))
    }

    fn save_session(&mut self, session: NegotiationSession) -> Result<()> {
        let slot = self
            .sessions
            .get_mut(session.id())
            .ok_or_else(|| NegotiatorError::SessionNotFound(session.id().to_string()))?;
        *slot = session;
        Ok(())
    }

    fn save_offers(&mut self, id: &SessionId, mut rows: Vec<OfferRow>) -> Result<()> {
        if !self.sessions.contains_key(id) {
            return Err(NegotiatorError::SessionNotFound(id.to_string()));
        }
        rows.sort_by_key(|row| (row.round, row.made_by == Role::Seller));
        self.offers.insert(id.clone(), rows);
        Ok(())
    }

    fn offers(&self, id: &SessionId) -> Result<Vec<OfferRow>> {
        if !self.sessions.contains_key(id) {
            return Err(NegotiatorError::SessionNotFound(id.to_string()));
        }
        Ok(self.offers.get(id).cloned().unwrap_or_default())
    }

    fn list_sessions(&self, status: Option<SessionStatus>) -> Vec<NegotiationSession> {
        let mut sessions: Vec<NegotiationSession> = self
            .sessions
            .values()
            .filter(|s| status.map_or(true, |wanted| s.status() == wanted))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.id().sequence(), s.id().clone()));
        sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::{run_negotiation, StrategyKind};

    fn request() -> SessionRequest {
        SessionRequest::new(Role::Buyer, 85.0, 50.0, 100.0)
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let mut store = MemoryStore::new();
        let first = store.create_session(request()).unwrap();
        let second = store.create_session(request()).unwrap();
        assert_eq!(first.id().0, "session_1");
        assert_eq!(second.id().0, "session_2");
        assert_eq!(store.list_sessions(None).len(), 2);
    }

    #[test]
    fn test_missing_session() {
        let store = MemoryStore::new();
        let id = SessionId::from_sequence(9);
        assert!(matches!(
            store.session(&id),
            Err(NegotiatorError::SessionNotFound(_))
        ));
        assert!(store.offers(&id).is_err());
    }

    #[test]
    fn test_rows_round_trip_timeline() {
        for kind in [StrategyKind::Concession, StrategyKind::OpponentModel] {
            let mut store = MemoryStore::new();
            let session = store.create_session(request()).unwrap();
            let (buyer, seller) = session.request().parties(None).unwrap();
            let outcome = run_negotiation(&buyer, &seller, 8, kind).unwrap();

            let rows = offer_rows(session.id(), 1, &outcome.timeline);
            assert_eq!(rows.len(), outcome.timeline.len() * 2);
            store.save_offers(session.id(), rows).unwrap();

            let stored = store.offers(session.id()).unwrap();
            assert_eq!(stored[0].made_by, Role::Buyer);
            assert_eq!(stored[1].made_by, Role::Seller);

            let rebuilt = timeline_from_rows(&stored, None);
            assert_eq!(rebuilt, outcome.timeline, "{} timeline", kind);
        }
    }

    #[test]
    fn test_rows_carry_beliefs() {
        let session = SessionId::from_sequence(1);
        let (buyer, seller) = request().parties(None).unwrap();
        let outcome = run_negotiation(&buyer, &seller, 8, StrategyKind::OpponentModel).unwrap();

        let rows = offer_rows(&session, 1, &outcome.timeline);
        assert!(rows.iter().all(|row| row.beliefs.is_some()));
        assert_eq!(rows[1].beliefs, outcome.timeline[0].seller_beliefs);

        let json = serde_json::to_string(&rows[0]).unwrap();
        let parsed: OfferRow = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rows[0]);
    }

    #[test]
    fn test_incomplete_round_dropped() {
        let id = SessionId::from_sequence(1);
        let row = OfferRow {
            session: id,
            round: 1,
            made_by: Role::Buyer,
            price: 85.0,
            quantity: 1,
            fairness: 0.9,
            proportional_fairness: -0.1,
            utility: 1.0,
            explanation: String::new(),
            beliefs: None,
        };
        assert!(timeline_from_rows(&[row], None).is_empty());
    }

    #[test]
    fn test_list_in_creation_order() {
        let mut store = MemoryStore::new();
        for _ in 0..12 {
            store.create_session(request()).unwrap();
        }
        let ids: Vec<String> = store
            .list_sessions(None)
            .iter()
            .map(|s| s.id().to_string())
            .collect();
        assert_eq!(ids[1], "session_2");
        assert_eq!(ids[9], "session_10");
        assert_eq!(ids.last().map(String::as_str), Some("session_12"));
    }

    #[test]
    fn test_list_filters_by_status() {
        let mut store = MemoryStore::new();
        let mut session = store.create_session(request()).unwrap();
        store.create_session(request()).unwrap();

        let (buyer, seller) = session.request().parties(None).unwrap();
        let outcome = run_negotiation(&buyer, &seller, 8, StrategyKind::Concession).unwrap();
        session.mark_negotiated(outcome.agreement, None).unwrap();
        store.save_session(session).unwrap();

        assert_eq!(store.list_sessions(Some(SessionStatus::Open)).len(), 1);
        assert_eq!(store.list_sessions(Some(SessionStatus::Negotiated)).len(), 1);
        assert!(store.list_sessions(Some(SessionStatus::Recorded)).is_empty());
    }
}
