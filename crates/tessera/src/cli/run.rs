//! Command handlers.

use anyhow::Context;
use futures_util::StreamExt;
use std::io::Write;
use std::sync::Arc;
use tessera::{
    Account, CapabilityTier, ChatRequest, CreditLedger, Gateway, InMemoryLedgerStore, Message,
    Plan, TesseraConfig, TierResolver,
};
use tracing::info;

fn build_request(tier: CapabilityTier, system: Option<String>, prompt: Vec<String>) -> ChatRequest {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system {
        messages.push(Message::system(system));
    }
    messages.push(Message::user(prompt.join(" ")));
    ChatRequest::new(tier, messages)
}

/// Run one chat request and print the answer.
pub async fn run_chat(
    config: &TesseraConfig,
    tier: CapabilityTier,
    system: Option<String>,
    prompt: Vec<String>,
) -> anyhow::Result<()> {
    let gateway = Gateway::from_config(config).context("Failed to build gateway")?;
    let request = build_request(tier, system, prompt);

    let response = gateway.chat(&request).await.context("Chat request failed")?;
    println!("{}", response.content);
    if let Some(tokens) = response.tokens_used {
        info!(tokens, "Chat completed");
    }
    Ok(())
}

/// Run one streamed request, printing chunks as they arrive.
pub async fn run_stream(
    config: &TesseraConfig,
    tier: CapabilityTier,
    system: Option<String>,
    prompt: Vec<String>,
) -> anyhow::Result<()> {
    let gateway = Gateway::from_config(config).context("Failed to build gateway")?;
    let request = build_request(tier, system, prompt);

    let mut stream = gateway
        .stream(&request)
        .await
        .context("Stream request failed")?;

    let mut stdout = std::io::stdout();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Stream interrupted")?;
        write!(stdout, "{}", chunk.text())?;
        stdout.flush()?;
    }
    writeln!(stdout)?;
    Ok(())
}

/// Print every tier binding and the fallback.
pub fn list_tiers(config: &TesseraConfig) {
    let resolver = TierResolver::from_config(config);
    for (tier, binding) in resolver.bindings() {
        let cost = binding
            .credit_cost_per_request
            .map(|c| format!("fixed {c}"))
            .unwrap_or_else(|| {
                let price = config.ledger.pricing.get(tier);
                format!("floor {}, {} words/credit", price.floor, price.words_per_credit)
            });
        let elevated = if binding.requires_elevated_plan {
            " [elevated]"
        } else {
            ""
        };
        println!(
            "{:<12} {}/{} ({}; {}){}",
            tier.as_ref(),
            binding.backend,
            binding.model_id,
            binding.credential,
            cost,
            elevated
        );
    }
    let fallback = &config.fallback;
    println!(
        "{:<12} {}/{} ({})",
        "fallback", fallback.backend, fallback.model_id, fallback.credential
    );
}

/// Check admission for a synthetic account holding the plan's allowance.
pub async fn quote(
    config: &TesseraConfig,
    plan: Plan,
    tier: CapabilityTier,
    words: u32,
    consumed: u32,
) -> anyhow::Result<()> {
    const ACCOUNT: &str = "quote";

    let store = InMemoryLedgerStore::new();
    let mut account = Account::new(
        ACCOUNT,
        plan,
        config.ledger.allowances.for_plan(plan),
        chrono::Utc::now(),
    );
    account.daily_consumed = consumed;
    store.insert_account(account).await;

    let ledger = CreditLedger::new(
        Arc::new(store),
        TierResolver::from_config(config),
        config.ledger,
    );
    let admission = ledger
        .check_admission(ACCOUNT, tier, words)
        .await
        .context("Admission check failed")?;

    let remaining = if admission.remaining == u32::MAX {
        "unlimited".to_string()
    } else {
        admission.remaining.to_string()
    };
    match admission.reason {
        None => println!(
            "admitted: {} on {} costs {} credits ({} remaining)",
            plan, tier, admission.cost, remaining
        ),
        Some(reason) => println!(
            "denied ({}): {} on {} costs {} credits ({} remaining)",
            reason, plan, tier, admission.cost, remaining
        ),
    }
    Ok(())
}
