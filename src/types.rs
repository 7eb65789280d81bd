//! Core types used throughout fairdeal

use crate::error::{NegotiatorError, Result};
use blake2::{Blake2b512, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address used when a party does not supply one.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Unique identifier for a negotiation session
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Build an id from a store-assigned sequence number
    pub fn from_sequence(seq: u64) -> Self {
        Self(format!("session_{}", seq))
    }

    /// Sequence number of a store-assigned id
    pub fn sequence(&self) -> Option<u64> {
        self.0.strip_prefix("session_")?.parse().ok()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Blake2b 256-bit hash wrapper
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// Create hash from bytes using Blake2b
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Blake2b512::new();
        hasher.update(data);
        let result = hasher.finalize();

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result[..32]);
        Hash(hash)
    }

    /// Get hash as hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create hash from hex string, with or without a `0x` prefix
    pub fn from_hex(hex_str: &str) -> std::result::Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex_str.trim_start_matches("0x"))?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes);
        Ok(Hash(hash))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// Side of the table a party negotiates from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Buyer,
    Seller,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
        }
    }

    pub fn opposite(&self) -> Role {
        match self {
            Role::Buyer => Role::Seller,
            Role::Seller => Role::Buyer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable negotiation parameters for one party.
///
/// Construct through [`PartyConfig::builder`]; `build()` rejects invalid
/// ranges before any round runs. The role is derived: a target below the
/// midpoint of `[min, max]` marks a buyer, anything else a seller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartyConfig {
    address: String,
    role: Role,
    target_price: f64,
    min_price: f64,
    max_price: f64,
    quantity: u32,
    fairness_weight: f64,
    concession_rate: f64,
    aggressiveness: f64,
    market_price: Option<f64>,
}

impl PartyConfig {
    pub fn builder(target_price: f64, min_price: f64, max_price: f64) -> PartyConfigBuilder {
        PartyConfigBuilder {
            address: ZERO_ADDRESS.to_string(),
            target_price,
            min_price,
            max_price,
            quantity: 1,
            fairness_weight: 0.5,
            concession_rate: 0.05,
            aggressiveness: 0.5,
            market_price: None,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn target_price(&self) -> f64 {
        self.target_price
    }

    pub fn min_price(&self) -> f64 {
        self.min_price
    }

    pub fn max_price(&self) -> f64 {
        self.max_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn fairness_weight(&self) -> f64 {
        self.fairness_weight
    }

    pub fn concession_rate(&self) -> f64 {
        self.concession_rate
    }

    pub fn aggressiveness(&self) -> f64 {
        self.aggressiveness
    }

    pub fn market_price(&self) -> Option<f64> {
        self.market_price
    }

    /// Width of the tolerance band, floored at 1.0 so a degenerate range
    /// never divides by zero.
    pub fn band_width(&self) -> f64 {
        (self.max_price - self.min_price).abs().max(1.0)
    }

    pub fn midpoint(&self) -> f64 {
        (self.min_price + self.max_price) / 2.0
    }

    pub fn clamp(&self, price: f64) -> f64 {
        price.max(self.min_price).min(self.max_price)
    }

    /// Copy of this configuration with a different market anchor.
    pub fn with_market_price(&self, market_price: Option<f64>) -> Self {
        Self {
            market_price: market_price.filter(|p| p.is_finite()),
            ..self.clone()
        }
    }

    /// Derive an automated counterpart sharing this party's band and dials.
    ///
    /// A seller counterpart targets 80% of the way up the band, a buyer
    /// counterpart 20%.
    pub fn counterpart(&self, role: Role, address: impl Into<String>) -> Result<PartyConfig> {
        let share = match role {
            Role::Seller => 0.8,
            Role::Buyer => 0.2,
        };
        let target = self.min_price + (self.max_price - self.min_price) * share;

        let mut builder = PartyConfig::builder(target, self.min_price, self.max_price)
            .address(address)
            .quantity(self.quantity)
            .fairness_weight(self.fairness_weight)
            .concession_rate(self.concession_rate)
            .aggressiveness(self.aggressiveness);
        if let Some(market) = self.market_price {
            builder = builder.market_price(market);
        }
        builder.build()
    }
}

/// Builder for [`PartyConfig`]
#[derive(Clone, Debug)]
pub struct PartyConfigBuilder {
    address: String,
    target_price: f64,
    min_price: f64,
    max_price: f64,
    quantity: u32,
    fairness_weight: f64,
    concession_rate: f64,
    aggressiveness: f64,
    market_price: Option<f64>,
}

impl PartyConfigBuilder {
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn fairness_weight(mut self, weight: f64) -> Self {
        self.fairness_weight = weight;
        self
    }

    pub fn concession_rate(mut self, rate: f64) -> Self {
        self.concession_rate = rate;
        self
    }

    pub fn aggressiveness(mut self, aggressiveness: f64) -> Self {
        self.aggressiveness = aggressiveness;
        self
    }

    pub fn market_price(mut self, price: f64) -> Self {
        self.market_price = Some(price);
        self
    }

    pub fn maybe_market_price(mut self, price: Option<f64>) -> Self {
        self.market_price = price;
        self
    }

    /// Validate and freeze the configuration
    pub fn build(self) -> Result<PartyConfig> {
        for (name, value) in [
            ("target_price", self.target_price),
            ("min_price", self.min_price),
            ("max_price", self.max_price),
            ("concession_rate", self.concession_rate),
        ] {
            if !value.is_finite() {
                return Err(NegotiatorError::InvalidConfig(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }

        if self.min_price > self.max_price {
            return Err(NegotiatorError::InvalidPriceRange {
                min: self.min_price,
                max: self.max_price,
            });
        }

        if self.target_price < self.min_price || self.target_price > self.max_price {
            return Err(NegotiatorError::TargetOutOfRange {
                target: self.target_price,
                min: self.min_price,
                max: self.max_price,
            });
        }

        if self.quantity == 0 {
            return Err(NegotiatorError::InvalidQuantity(self.quantity));
        }

        for (name, value) in [
            ("fairness_weight", self.fairness_weight),
            ("aggressiveness", self.aggressiveness),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(NegotiatorError::WeightOutOfRange { name, value });
            }
        }

        if self.concession_rate < 0.0 {
            return Err(NegotiatorError::InvalidConfig(format!(
                "concession_rate must be non-negative, got {}",
                self.concession_rate
            )));
        }

        let role = if self.target_price < (self.min_price + self.max_price) / 2.0 {
            Role::Buyer
        } else {
            Role::Seller
        };

        Ok(PartyConfig {
            address: self.address,
            role,
            target_price: self.target_price,
            min_price: self.min_price,
            max_price: self.max_price,
            quantity: self.quantity,
            fairness_weight: self.fairness_weight,
            concession_rate: self.concession_rate,
            aggressiveness: self.aggressiveness,
            market_price: self.market_price.filter(|p| p.is_finite()),
        })
    }
}
