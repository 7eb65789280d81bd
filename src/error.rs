//! Error types for fairdeal

use thiserror::Error;

/// Main error type for fairdeal
#[derive(Error, Debug)]
pub enum NegotiatorError {
    // Configuration errors
    #[error("Invalid price range: min {min} exceeds max {max}")]
    InvalidPriceRange { min: f64, max: f64 },

    #[error("Target price {target} outside [{min}, {max}]")]
    TargetOutOfRange { target: f64, min: f64, max: f64 },

    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(u32),

    #[error("max_rounds must be positive, got {0}")]
    InvalidRounds(u32),

    #[error("Weight {name} = {value} outside [0, 1]")]
    WeightOutOfRange { name: &'static str, value: f64 },

    #[error("Invalid configuration value: {0}")]
    InvalidConfig(String),

    // Session errors
    #[error("Negotiation session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    #[error("No offers recorded for session: {0}")]
    NoOffers(String),

    #[error("Ledger transaction hash is required")]
    MissingTxHash,

    // Market errors
    #[error("Market lookup failed: {0}")]
    MarketLookup(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

/// Result type alias for fairdeal operations
pub type Result<T> = std::result::Result<T, NegotiatorError>;
