//! CLI module for fairdeal

pub mod app;
pub mod commands;

pub use app::{AutoRun, NegotiatorApp};
pub use commands::{Cli, CliRole, Commands, PartyArgs};
