//! Negotiation application wiring the engine to its ports

use crate::advisor::{AdvisorReply, OfflineAdvisor, TimelineAdvisor};
use crate::config::NegotiationSettings;
use crate::error::{NegotiatorError, Result};
use crate::market::{lookup, MarketPriceSource, MarketQuote};
use crate::negotiation::{
    FinalizedAgreement, NegotiationEngine, NegotiationSession, Outcome, RoundRecord,
    SessionRequest, SessionStatus,
};
use crate::store::{offer_rows, timeline_from_rows, MemoryStore, SessionStore};
use crate::types::SessionId;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Result of one automated run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutoRun {
    pub session: SessionId,
    pub outcome: Outcome,
    pub market: Option<MarketQuote>,
}

/// Main negotiation application
#[derive(Clone)]
pub struct NegotiatorApp {
    engine: Arc<NegotiationEngine>,
    store: Arc<Mutex<Box<dyn SessionStore>>>,
    market: Option<Arc<dyn MarketPriceSource>>,
    advisor: Arc<dyn TimelineAdvisor>,
}

impl NegotiatorApp {
    /// Create an application backed by an in-memory store
    pub fn new(settings: NegotiationSettings) -> Self {
        Self {
            engine: Arc::new(NegotiationEngine::new(settings)),
            store: Arc::new(Mutex::new(Box::new(MemoryStore::new()))),
            market: None,
            advisor: Arc::new(OfflineAdvisor),
        }
    }

    pub fn with_store(mut self, store: impl SessionStore + 'static) -> Self {
        self.store = Arc::new(Mutex::new(Box::new(store)));
        self
    }

    pub fn with_market(mut self, market: Arc<dyn MarketPriceSource>) -> Self {
        self.market = Some(market);
        self
    }

    pub fn with_advisor(mut self, advisor: Arc<dyn TimelineAdvisor>) -> Self {
        self.advisor = advisor;
        self
    }

    pub fn settings(&self) -> &NegotiationSettings {
        self.engine.settings()
    }

    /// Open a new session
    pub async fn create_session(&self, request: SessionRequest) -> Result<NegotiationSession> {
        let session = self.store.lock().await.create_session(request)?;
        tracing::info!(
            session = %session.id(),
            role = %session.request().role,
            strategy = %session.request().strategy,
            "session created"
        );
        Ok(session)
    }

    /// Resolve the market anchor, negotiate against a derived counterpart
    /// and persist every offer.
    ///
    /// Only open or negotiated sessions run. The status is checked again
    /// before anything is written, so a session finalized meanwhile keeps
    /// its stored offers.
    pub async fn run_auto(&self, id: &SessionId) -> Result<AutoRun> {
        let request = {
            let session = self.store.lock().await.session(id)?;
            ensure_runnable(&session)?;
            session.request().clone()
        };

        let market = match request.market() {
            Some((symbol, asset_type)) => self.quote(symbol, asset_type).await,
            None => None,
        };
        let market_price = market.as_ref().and_then(|q| q.price);

        let (buyer, seller) = request.parties(market_price)?;
        let outcome = self
            .engine
            .run(&buyer, &seller, request.max_rounds, request.strategy)?;

        {
            let mut store = self.store.lock().await;
            let mut session = store.session(id)?;
            session.mark_negotiated(outcome.agreement.clone(), market_price)?;
            store.save_offers(id, offer_rows(id, request.quantity, &outcome.timeline))?;
            store.save_session(session)?;
        }

        tracing::info!(
            session = %id,
            rounds = outcome.agreement.round_count,
            price = outcome.agreement.final_price,
            "automated negotiation stored"
        );

        Ok(AutoRun {
            session: id.clone(),
            outcome,
            market,
        })
    }

    /// Timeline rebuilt from stored offers
    pub async fn timeline(&self, id: &SessionId) -> Result<Vec<RoundRecord>> {
        let store = self.store.lock().await;
        let session = store.session(id)?;
        let rows = store.offers(id)?;
        Ok(timeline_from_rows(&rows, session.market_price()))
    }

    /// Settle the session and compute its receipt
    pub async fn finalize(&self, id: &SessionId) -> Result<FinalizedAgreement> {
        let mut store = self.store.lock().await;
        let mut session = store.session(id)?;
        let rows = store.offers(id)?;
        let timeline = timeline_from_rows(&rows, session.market_price());

        let finalized = session.finalize(timeline.last())?;
        store.save_session(session)?;
        Ok(finalized)
    }

    /// Attach a ledger transaction to a finalized session
    pub async fn record_ledger(
        &self,
        id: &SessionId,
        tx_hash: &str,
        block_number: Option<u64>,
    ) -> Result<NegotiationSession> {
        let mut store = self.store.lock().await;
        let mut session = store.session(id)?;
        session.record_ledger(tx_hash, block_number)?;
        store.save_session(session.clone())?;
        tracing::info!(session = %id, tx_hash, "ledger transaction recorded");
        Ok(session)
    }

    pub async fn list_sessions(&self, status: Option<SessionStatus>) -> Vec<NegotiationSession> {
        self.store.lock().await.list_sessions(status)
    }

    /// Ask the advisor about a session's timeline
    pub async fn advise(&self, id: &SessionId, question: &str) -> Result<AdvisorReply> {
        let timeline = self.timeline(id).await?;
        Ok(self.advisor.advise(&timeline, question))
    }

    /// Create and run independent sessions concurrently
    pub async fn run_many(&self, requests: Vec<SessionRequest>) -> Vec<Result<AutoRun>> {
        let runs = requests.into_iter().map(|request| {
            let app = self.clone();
            async move {
                let session = app.create_session(request).await?;
                app.run_auto(session.id()).await
            }
        });
        join_all(runs).await
    }

    async fn quote(&self, symbol: &str, asset_type: &str) -> Option<MarketQuote> {
        let market = self.market.clone()?;
        let symbol = symbol.to_string();
        let asset_type = asset_type.to_string();

        match tokio::task::spawn_blocking(move || lookup(market.as_ref(), &symbol, &asset_type))
            .await
        {
            Ok(quote) => Some(quote),
            Err(e) => {
                tracing::warn!("market lookup task failed: {}", e);
                None
            }
        }
    }
}

fn ensure_runnable(session: &NegotiationSession) -> Result<()> {
    match session.status() {
        SessionStatus::Open | SessionStatus::Negotiated => Ok(()),
        status => Err(NegotiatorError::InvalidStateTransition(format!(
            "cannot negotiate a {} session",
            status
        ))),
    }
}

impl Default for NegotiatorApp {
    fn default() -> Self {
        Self::new(NegotiationSettings::default())
    }
}
