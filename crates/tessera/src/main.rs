//! Tessera CLI binary.
//!
//! This binary provides command-line access to the gateway:
//! - Send chat and streaming requests to a capability tier
//! - Inspect the tier bindings in effect
//! - Price a request against a plan's daily allowance

use anyhow::Context;
use clap::Parser;
use tessera::{ObservabilityConfig, TesseraConfig, init_observability};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use cli::{Cli, Commands, list_tiers, quote, run_chat, run_stream};

    // Credentials may live in a local .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let guard = init_observability(
        ObservabilityConfig::new("tessera")
            .with_log_level(log_level)
            .with_json_logs(cli.json_logs),
    )
    .map_err(|e| anyhow::anyhow!(e))?;

    let config = match &cli.config {
        Some(path) => TesseraConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => TesseraConfig::load().context("Failed to load configuration")?,
    };

    let result = match cli.command {
        Commands::Chat {
            tier,
            system,
            prompt,
        } => run_chat(&config, tier, system, prompt).await,
        Commands::Stream {
            tier,
            system,
            prompt,
        } => run_stream(&config, tier, system, prompt).await,
        Commands::Tiers => {
            list_tiers(&config);
            Ok(())
        }
        Commands::Quote {
            plan,
            tier,
            words,
            consumed,
        } => quote(&config, plan, tier, words, consumed).await,
    };

    guard.shutdown();
    result
}
