//! Market price lookup port
//!
//! The negotiation core never calls a market source itself. Callers resolve a
//! quote before the loop starts and inject the price into the party
//! configurations; a missing price simply means no market anchor.

use crate::error::{NegotiatorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// How long [`CachedMarket`] keeps a quote by default
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Asset classes a market source can price
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Stock,
    Crypto,
    Forex,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Stock => "stock",
            AssetType::Crypto => "crypto",
            AssetType::Forex => "forex",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = NegotiatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "stock" => Ok(AssetType::Stock),
            "crypto" => Ok(AssetType::Crypto),
            "forex" => Ok(AssetType::Forex),
            other => Err(NegotiatorError::MarketLookup(format!(
                "Unsupported asset type: {}",
                other
            ))),
        }
    }
}

/// Result of one market lookup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub symbol: String,
    pub asset_type: String,
    pub price: Option<f64>,
    pub source: String,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
}

impl MarketQuote {
    /// Quote for an asset type no source supports
    pub fn unsupported(symbol: &str, asset_type: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            asset_type: asset_type.to_string(),
            price: None,
            source: "none".to_string(),
            timestamp: unix_now(),
        }
    }
}

/// Anything that can price a symbol.
///
/// Implementors only handle supported asset types; [`lookup`] routes
/// unsupported ones to a priceless quote.
pub trait MarketPriceSource: Send + Sync {
    fn price(&self, symbol: &str, asset_type: AssetType) -> Result<f64>;

    /// Name reported as the quote source
    fn source_name(&self) -> &str;

    fn quote(&self, symbol: &str, asset_type: &str) -> Result<MarketQuote> {
        let Ok(kind) = asset_type.parse::<AssetType>() else {
            return Ok(MarketQuote::unsupported(symbol, asset_type));
        };
        let price = self.price(symbol, kind)?;
        Ok(MarketQuote {
            symbol: symbol.to_string(),
            asset_type: kind.to_string(),
            price: Some(price),
            source: self.source_name().to_string(),
            timestamp: unix_now(),
        })
    }
}

/// Quote from `source`, degrading any lookup failure to a priceless quote
pub fn lookup(source: &dyn MarketPriceSource, symbol: &str, asset_type: &str) -> MarketQuote {
    match source.quote(symbol, asset_type) {
        Ok(quote) => quote,
        Err(e) => {
            tracing::warn!(symbol, asset_type, "market lookup failed, dropping anchor: {}", e);
            MarketQuote {
                source: "error".to_string(),
                ..MarketQuote::unsupported(symbol, asset_type)
            }
        }
    }
}

/// Fixed price table, keyed by upper-cased symbol
#[derive(Clone, Debug, Default)]
pub struct StaticMarket {
    prices: HashMap<(String, AssetType), f64>,
}

impl StaticMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, symbol: &str, asset_type: AssetType, price: f64) -> Self {
        self.prices.insert((symbol.to_uppercase(), asset_type), price);
        self
    }
}

impl MarketPriceSource for StaticMarket {
    fn price(&self, symbol: &str, asset_type: AssetType) -> Result<f64> {
        self.prices
            .get(&(symbol.to_uppercase(), asset_type))
            .copied()
            .ok_or_else(|| {
                NegotiatorError::MarketLookup(format!("no {} price for {}", asset_type, symbol))
            })
    }

    fn source_name(&self) -> &str {
        "static"
    }
}

/// Adapter around a closure
pub struct FnMarket<F> {
    name: String,
    lookup: F,
}

impl<F> FnMarket<F>
where
    F: Fn(&str, AssetType) -> Result<f64> + Send + Sync,
{
    pub fn new(name: impl Into<String>, lookup: F) -> Self {
        Self {
            name: name.into(),
            lookup,
        }
    }
}

impl<F> MarketPriceSource for FnMarket<F>
where
    F: Fn(&str, AssetType) -> Result<f64> + Send + Sync,
{
    fn price(&self, symbol: &str, asset_type: AssetType) -> Result<f64> {
        (self.lookup)(symbol, asset_type)
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

/// TTL cache in front of another source. Failures are not cached.
pub struct CachedMarket<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<String, (f64, Instant)>>,
}

impl<S: MarketPriceSource> CachedMarket<S> {
    pub fn new(inner: S) -> Self {
        Self::with_ttl(inner, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, key: &str) -> Option<f64> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(key)
            .filter(|(_, stored_at)| stored_at.elapsed() < self.ttl)
            .map(|(price, _)| *price)
    }
}

impl<S: MarketPriceSource> MarketPriceSource for CachedMarket<S> {
    fn price(&self, symbol: &str, asset_type: AssetType) -> Result<f64> {
        let key = format!("{}_{}", symbol, asset_type);
        if let Some(price) = self.cached(&key) {
            tracing::debug!(%key, "market cache hit");
            return Ok(price);
        }

        let price = self.inner.price(symbol, asset_type)?;
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, (price, Instant::now()));
        }
        Ok(price)
    }

    fn source_name(&self) -> &str {
        self.inner.source_name()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
