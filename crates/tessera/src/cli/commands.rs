//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tessera::{CapabilityTier, Plan};

/// Tessera - AI gateway with tiered routing, failover and credit metering
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(about = "AI gateway with tiered routing, failover and credit metering", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file to use instead of the standard search path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one prompt and print the complete answer
    Chat {
        /// Capability tier (super-smart, pro-smart, normal, fast)
        #[arg(long, default_value = "fast")]
        tier: CapabilityTier,

        /// Optional system instruction
        #[arg(long)]
        system: Option<String>,

        /// The prompt
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// Send one prompt and print the answer as it streams
    Stream {
        /// Capability tier (super-smart, pro-smart, normal, fast)
        #[arg(long, default_value = "fast")]
        tier: CapabilityTier,

        /// Optional system instruction
        #[arg(long)]
        system: Option<String>,

        /// The prompt
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// Print the binding behind every tier and the fallback
    Tiers,

    /// Check admission for a synthetic account
    Quote {
        /// Account plan (free, pro, unlimited)
        #[arg(long, default_value = "free")]
        plan: Plan,

        /// Capability tier to price
        #[arg(long)]
        tier: CapabilityTier,

        /// Estimated workload in words
        #[arg(long)]
        words: u32,

        /// Credits already consumed in the current window
        #[arg(long, default_value = "0")]
        consumed: u32,
    },
}
