//! CLI command definitions

use crate::negotiation::StrategyKind;
use crate::types::Role;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fairdeal")]
#[command(about = "fairdeal - bilateral price negotiation with explainable agents", long_about = None)]
pub struct Cli {
    /// JSON settings file (stop policy, optimizer and risk weights, exploration)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one negotiation between two automated parties
    Run {
        #[command(flatten)]
        parties: PartyArgs,

        /// Strategy used by both parties
        #[arg(short, long, value_enum, default_value_t = StrategyKind::Concession)]
        strategy: StrategyKind,

        /// Print the timeline and agreement as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run every deterministic strategy on the same parties
    Compare {
        #[command(flatten)]
        parties: PartyArgs,
    },

    /// Train the exploratory strategy against a base-concession seller
    Explore {
        #[command(flatten)]
        parties: PartyArgs,

        /// Number of training episodes
        #[arg(short, long, default_value = "200")]
        episodes: usize,

        /// Seed for reproducible exploration
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Walk one session through create, run, finalize and record
    Session {
        /// Side the user negotiates for
        #[arg(long, value_enum, default_value_t = CliRole::Buyer)]
        role: CliRole,

        /// User target price
        #[arg(short, long, default_value = "85")]
        target: f64,

        /// Lowest acceptable price
        #[arg(long, default_value = "50")]
        min_price: f64,

        /// Highest acceptable price
        #[arg(long, default_value = "100")]
        max_price: f64,

        /// Units traded
        #[arg(short, long, default_value = "1")]
        quantity: u32,

        /// Maximum number of rounds
        #[arg(short = 'r', long, default_value = "8")]
        max_rounds: u32,

        /// Strategy used by both parties
        #[arg(short, long, value_enum, default_value_t = StrategyKind::Concession)]
        strategy: StrategyKind,

        /// Market symbol to anchor on
        #[arg(long)]
        symbol: Option<String>,

        /// Asset type of the symbol (stock, crypto, forex)
        #[arg(long, default_value = "stock")]
        asset_type: String,

        /// Price served for the symbol by the demo market
        #[arg(long)]
        market_price: Option<f64>,

        /// Question for the advisor after the run
        #[arg(long)]
        question: Option<String>,

        /// Ledger transaction hash to record after finalizing
        #[arg(long)]
        tx_hash: Option<String>,

        /// Block number of the ledger transaction
        #[arg(long)]
        block_number: Option<u64>,
    },
}

/// Parameters shared by the buyer and seller
#[derive(Args, Debug, Clone)]
pub struct PartyArgs {
    /// Buyer target price
    #[arg(short, long, default_value = "85")]
    pub buyer_target: f64,

    /// Seller target price
    #[arg(short = 'S', long, default_value = "95")]
    pub seller_target: f64,

    /// Lowest acceptable price for both parties
    #[arg(long, default_value = "50")]
    pub min_price: f64,

    /// Highest acceptable price for both parties
    #[arg(long, default_value = "100")]
    pub max_price: f64,

    /// Units traded
    #[arg(short, long, default_value = "1")]
    pub quantity: u32,

    /// Concession speed dial in [0, 1]
    #[arg(short, long, default_value = "0.5")]
    pub aggressiveness: f64,

    /// Weight on fairness in [0, 1]
    #[arg(short, long, default_value = "0.5")]
    pub fairness_weight: f64,

    /// Known market price used as an anchor
    #[arg(short, long)]
    pub market_price: Option<f64>,

    /// Maximum number of rounds
    #[arg(short = 'r', long, default_value = "8")]
    pub max_rounds: u32,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CliRole {
    Buyer,
    Seller,
}

impl From<CliRole> for Role {
    fn from(role: CliRole) -> Self {
        match role {
            CliRole::Buyer => Role::Buyer,
            CliRole::Seller => Role::Seller,
        }
    }
}
