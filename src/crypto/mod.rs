//! Agreement receipts

pub mod receipt;

pub use receipt::{agreement_hash, verify_receipt, AgreementTerms};
