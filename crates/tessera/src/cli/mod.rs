//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the tessera binary.

mod commands;
mod run;

pub use commands::{Cli, Commands};
pub use run::{list_tiers, quote, run_chat, run_stream};
