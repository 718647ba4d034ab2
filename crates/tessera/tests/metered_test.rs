//! Admission, dispatch and debit through the metered gateway.

mod test_utils;

use futures_util::StreamExt;
use std::sync::Arc;
use tessera::{
    Account, AdapterRegistry, Backend, CapabilityTier, ChatRequest, CreditLedger, Gateway,
    InMemoryLedgerStore, LedgerErrorKind, LedgerStore, Message, MeteredGateway, Plan,
    ProviderAdapter, TesseraConfig, TierResolver, UpstreamErrorKind,
};
use test_utils::{Script, ScriptedAdapter, all_credentials};

struct Fixture {
    metered: MeteredGateway,
    store: InMemoryLedgerStore,
}

async fn fixture(adapters: Vec<Arc<ScriptedAdapter>>, account: Account) -> Fixture {
    let config = TesseraConfig::bundled().unwrap();
    let registry = adapters.into_iter().fold(AdapterRegistry::new(), |registry, adapter| {
        registry.with_adapter(adapter as Arc<dyn ProviderAdapter>)
    });
    let gateway = Gateway::new(&config, registry, all_credentials());

    let store = InMemoryLedgerStore::new();
    store.insert_account(account).await;
    let ledger = CreditLedger::new(
        Arc::new(store.clone()),
        TierResolver::from_config(&config),
        config.ledger,
    );

    Fixture {
        metered: MeteredGateway::new(gateway, ledger),
        store,
    }
}

fn free_account(consumed: u32) -> Account {
    let mut account = Account::new("acct", Plan::Free, 50, chrono::Utc::now());
    account.daily_consumed = consumed;
    account
}

fn request(tier: CapabilityTier, words: usize) -> ChatRequest {
    let prompt = vec!["word"; words].join(" ");
    ChatRequest::new(tier, vec![Message::user(prompt)])
}

async fn consumed(store: &InMemoryLedgerStore) -> u32 {
    store.account("acct").await.unwrap().unwrap().daily_consumed
}

#[tokio::test]
async fn test_fast_request_for_free_account_costs_three() {
    let groq = ScriptedAdapter::answering(Backend::Groq, &["Hello ", "there"]);
    let fx = fixture(vec![groq.clone()], free_account(0)).await;

    let result = fx
        .metered
        .chat("acct", "chat", &request(CapabilityTier::Fast, 1000))
        .await
        .unwrap();

    assert_eq!(result.response.content, "Hello there");
    assert_eq!(result.admission.cost, 3);
    assert_eq!(result.usage.credits_charged, 3);
    assert_eq!(result.usage.feature, "chat");
    assert_eq!(result.usage.tier_used, CapabilityTier::Fast);
    assert_eq!(consumed(&fx.store).await, 3);
    assert_eq!(groq.calls(), 1);
}

#[tokio::test]
async fn test_denied_request_never_dispatches_or_debits() {
    let groq = ScriptedAdapter::answering(Backend::Groq, &["unused"]);
    let fx = fixture(vec![groq.clone()], free_account(49)).await;

    let err = fx
        .metered
        .chat("acct", "chat", &request(CapabilityTier::Fast, 10))
        .await
        .unwrap_err();

    assert!(matches!(
        err.ledger_kind(),
        Some(LedgerErrorKind::InsufficientCredits {
            required: 3,
            remaining: 1
        })
    ));
    assert_eq!(groq.calls(), 0);
    assert_eq!(consumed(&fx.store).await, 49);
    assert!(fx.store.usage_records().await.is_empty());
}

#[tokio::test]
async fn test_plan_restricted_tier_is_rejected_before_dispatch() {
    let anthropic = ScriptedAdapter::answering(Backend::Anthropic, &["unused"]);
    let fx = fixture(vec![anthropic.clone()], free_account(0)).await;

    let err = fx
        .metered
        .stream("acct", "chat", &request(CapabilityTier::ProSmart, 5))
        .await
        .err()
        .unwrap();

    assert!(matches!(
        err.ledger_kind(),
        Some(LedgerErrorKind::PlanRestricted { .. })
    ));
    assert_eq!(anthropic.calls(), 0);
}

#[tokio::test]
async fn test_pro_account_uses_pro_smart_for_free() {
    let anthropic = ScriptedAdapter::answering(Backend::Anthropic, &["detailed answer"]);
    let account = Account::new("acct", Plan::Pro, 500, chrono::Utc::now());
    let fx = fixture(vec![anthropic.clone()], account).await;

    let result = fx
        .metered
        .chat("acct", "quiz", &request(CapabilityTier::ProSmart, 5000))
        .await
        .unwrap();

    assert_eq!(result.usage.credits_charged, 0);
    assert_eq!(consumed(&fx.store).await, 0);
    assert_eq!(fx.store.usage_records().await.len(), 1);
}

#[tokio::test]
async fn test_stream_debits_once_after_completion() {
    let groq = ScriptedAdapter::answering(Backend::Groq, &["one ", "two ", "three"]);
    let fx = fixture(vec![groq], free_account(0)).await;

    let mut stream = fx
        .metered
        .stream("acct", "chat", &request(CapabilityTier::Fast, 100))
        .await
        .unwrap();

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.text(), "one ");
    assert_eq!(consumed(&fx.store).await, 0);

    let mut text = first.into_text();
    while let Some(chunk) = stream.next().await {
        text.push_str(chunk.unwrap().text());
    }

    assert_eq!(text, "one two three");
    assert_eq!(consumed(&fx.store).await, 3);
    assert_eq!(fx.store.usage_records().await.len(), 1);
}

#[tokio::test]
async fn test_dropped_stream_is_not_charged() {
    let groq = ScriptedAdapter::answering(Backend::Groq, &["one ", "two ", "three"]);
    let fx = fixture(vec![groq], free_account(0)).await;

    let mut stream = fx
        .metered
        .stream("acct", "chat", &request(CapabilityTier::Fast, 100))
        .await
        .unwrap();
    stream.next().await.unwrap().unwrap();
    drop(stream);

    assert_eq!(consumed(&fx.store).await, 0);
    assert!(fx.store.usage_records().await.is_empty());
}

#[tokio::test]
async fn test_mid_stream_failure_is_not_charged() {
    let groq = ScriptedAdapter::new(
        Backend::Groq,
        Script::ChunksThenError(
            vec!["partial ".into()],
            UpstreamErrorKind::Unavailable("connection reset".into()),
        ),
    );
    let openai = ScriptedAdapter::answering(Backend::OpenAi, &["fallback"]);
    let fx = fixture(vec![groq, openai.clone()], free_account(0)).await;

    let mut stream = fx
        .metered
        .stream("acct", "chat", &request(CapabilityTier::Fast, 100))
        .await
        .unwrap();

    assert_eq!(stream.next().await.unwrap().unwrap().text(), "partial ");
    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(
        err.upstream_kind(),
        Some(UpstreamErrorKind::Unavailable(_))
    ));
    assert!(stream.next().await.is_none());

    assert_eq!(openai.calls(), 0);
    assert_eq!(consumed(&fx.store).await, 0);
    assert!(fx.store.usage_records().await.is_empty());
}

#[tokio::test]
async fn test_quote_does_not_change_the_account() {
    let groq = ScriptedAdapter::answering(Backend::Groq, &["unused"]);
    let fx = fixture(vec![groq.clone()], free_account(10)).await;

    let admission = fx
        .metered
        .quote("acct", &request(CapabilityTier::Fast, 4500))
        .await
        .unwrap();

    assert!(admission.allowed);
    assert_eq!(admission.cost, 5);
    assert_eq!(admission.remaining, 40);
    assert_eq!(groq.calls(), 0);
    assert_eq!(consumed(&fx.store).await, 10);
}

#[tokio::test]
async fn test_unknown_account_is_an_error() {
    let groq = ScriptedAdapter::answering(Backend::Groq, &["unused"]);
    let fx = fixture(vec![groq.clone()], free_account(0)).await;

    let err = fx
        .metered
        .chat("missing", "chat", &request(CapabilityTier::Fast, 1))
        .await
        .unwrap_err();

    assert!(matches!(
        err.ledger_kind(),
        Some(LedgerErrorKind::AccountNotFound(_))
    ));
    assert_eq!(groq.calls(), 0);
}
