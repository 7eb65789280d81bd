//! Deterministic receipt hash over settled terms

use crate::error::Result;
use crate::types::Hash;
use serde::{Deserialize, Serialize};

/// Terms covered by a receipt
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgreementTerms {
    pub buyer_address: String,
    pub seller_address: String,
    pub price: f64,
    pub quantity: u32,
    pub delivery_days: u32,
    pub escrow: bool,
}

impl AgreementTerms {
    pub fn new(
        buyer_address: impl Into<String>,
        seller_address: impl Into<String>,
        price: f64,
        quantity: u32,
    ) -> Self {
        Self {
            buyer_address: buyer_address.into(),
            seller_address: seller_address.into(),
            price,
            quantity,
            delivery_days: 0,
            escrow: true,
        }
    }

    /// `buyer|seller|price|qty|delivery_days|escrow` with lowercased
    /// addresses and the price truncated to an integer
    pub fn canonical(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.buyer_address.to_lowercase(),
            self.seller_address.to_lowercase(),
            self.price.trunc() as i64,
            self.quantity,
            self.delivery_days,
            u8::from(self.escrow)
        )
    }
}

/// Hash the canonical form of `terms`
pub fn agreement_hash(terms: &AgreementTerms) -> Hash {
    Hash::from_bytes(terms.canonical().as_bytes())
}

/// Check a `0x`-prefixed receipt against `terms`
pub fn verify_receipt(receipt: &str, terms: &AgreementTerms) -> Result<bool> {
    let claimed = Hash::from_hex(receipt)?;
    Ok(claimed == agreement_hash(terms))
}
