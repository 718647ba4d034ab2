//! Failover controller and gateway behavior against mock adapters.

mod test_utils;

use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tessera_core::{Backend, BackendBinding, CapabilityTier, Message};
use tessera_error::{TesseraErrorKind, UpstreamErrorKind};
use tessera_gateway::{AdapterRegistry, ChatRequest, Gateway};
use tessera_interface::ProviderAdapter;
use tessera_routing::{Credentials, TesseraConfig};
use test_utils::{
    MockAdapter, MockBehavior, MockResponse, all_credentials, rate_limited, unavailable,
};
use tokio::time::Instant;

/// Gateway whose `fast` tier runs on `primary` (Groq) and whose fallback is `fallback` (OpenAI).
fn gateway(primary: Arc<MockAdapter>, fallback: Arc<MockAdapter>) -> Gateway {
    gateway_with(primary, fallback, all_credentials())
}

fn gateway_with(
    primary: Arc<MockAdapter>,
    fallback: Arc<MockAdapter>,
    credentials: Credentials,
) -> Gateway {
    let config = TesseraConfig::bundled().unwrap();
    let registry = AdapterRegistry::new()
        .with_adapter(primary as Arc<dyn ProviderAdapter>)
        .with_adapter(fallback as Arc<dyn ProviderAdapter>);
    Gateway::new(&config, registry, credentials)
}

fn fast_request() -> ChatRequest {
    ChatRequest::new(
        CapabilityTier::Fast,
        vec![Message::system("Be brief."), Message::user("Hello")],
    )
}

#[tokio::test(start_paused = true)]
async fn test_retry_recovers_without_failover() {
    let primary = MockAdapter::new(
        Backend::Groq,
        MockBehavior::FailThenSucceed {
            fail_count: 2,
            error: rate_limited(),
            success_text: "primary answer".into(),
        },
    );
    let fallback = MockAdapter::success(Backend::OpenAi, "fallback answer");
    let gateway = gateway(primary.clone(), fallback.clone());

    let started = Instant::now();
    let response = gateway.chat(&fast_request()).await.unwrap();

    assert_eq!(response.content, "primary answer");
    assert_eq!(primary.call_count(), 3);
    assert_eq!(fallback.call_count(), 0);

    // Two 1ms mock latencies plus a third, on top of 1s + 2s of backoff.
    let backoff = started.elapsed() - Duration::from_millis(3);
    assert_eq!(backoff, Duration::from_secs(1) + Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_rate_limit_fails_over_exactly_once() {
    let primary = MockAdapter::error(Backend::Groq, rate_limited());
    let fallback = MockAdapter::success(Backend::OpenAi, "fallback answer");
    let gateway = gateway(primary.clone(), fallback.clone());

    let response = gateway.chat(&fast_request()).await.unwrap();

    assert_eq!(response.content, "fallback answer");
    assert_eq!(primary.call_count(), 4);
    assert_eq!(fallback.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fallback_is_not_retried() {
    let primary = MockAdapter::error(Backend::Groq, rate_limited());
    let fallback = MockAdapter::error(Backend::OpenAi, rate_limited());
    let gateway = gateway(primary.clone(), fallback.clone());

    let err = gateway.chat(&fast_request()).await.unwrap_err();

    assert_eq!(fallback.call_count(), 1);
    let TesseraErrorKind::ServiceUnavailable(combined) = err.kind() else {
        panic!("expected combined service unavailable error, got {}", err);
    };
    assert_eq!(combined.primary.provider, "groq");
    assert_eq!(combined.fallback.provider, "openai");
}

#[tokio::test(start_paused = true)]
async fn test_auth_error_propagates_unchanged() {
    let primary = MockAdapter::error(Backend::Groq, UpstreamErrorKind::Auth("bad key".into()));
    let fallback = MockAdapter::success(Backend::OpenAi, "fallback answer");
    let gateway = gateway(primary.clone(), fallback.clone());

    let started = Instant::now();
    let err = gateway.chat(&fast_request()).await.unwrap_err();

    assert_eq!(
        err.upstream_kind(),
        Some(&UpstreamErrorKind::Auth("bad key".into()))
    );
    assert_eq!(primary.call_count(), 1);
    assert_eq!(fallback.call_count(), 0);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_protocol_error_is_not_masked() {
    let primary = MockAdapter::error(
        Backend::Groq,
        UpstreamErrorKind::Protocol("missing field `choices`".into()),
    );
    let fallback = MockAdapter::success(Backend::OpenAi, "fallback answer");
    let gateway = gateway(primary.clone(), fallback.clone());

    let err = gateway.chat(&fast_request()).await.unwrap_err();

    assert!(matches!(err.upstream_kind(), Some(UpstreamErrorKind::Protocol(_))));
    assert_eq!(primary.call_count(), 1);
    assert_eq!(fallback.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_fails_over_without_local_retry() {
    let primary = MockAdapter::error(Backend::Groq, unavailable());
    let fallback = MockAdapter::success(Backend::OpenAi, "fallback answer");
    let gateway = gateway(primary.clone(), fallback.clone());

    let response = gateway.chat(&fast_request()).await.unwrap();

    assert_eq!(response.content, "fallback answer");
    assert_eq!(primary.call_count(), 1);
    assert_eq!(fallback.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fallback_auth_error_is_combined_with_primary() {
    let primary = MockAdapter::error(Backend::Groq, unavailable());
    let fallback = MockAdapter::error(Backend::OpenAi, UpstreamErrorKind::Auth("revoked".into()));
    let gateway = gateway(primary, fallback);

    let err = gateway.chat(&fast_request()).await.unwrap_err();
    let TesseraErrorKind::ServiceUnavailable(combined) = err.kind() else {
        panic!("expected combined error, got {err}");
    };
    assert!(matches!(combined.primary.kind, UpstreamErrorKind::Unavailable(_)));
    assert!(matches!(combined.fallback.kind, UpstreamErrorKind::Auth(_)));
}

#[tokio::test(start_paused = true)]
async fn test_fallback_protocol_error_is_combined_with_primary() {
    let primary = MockAdapter::error(Backend::Groq, unavailable());
    let fallback = MockAdapter::error(
        Backend::OpenAi,
        UpstreamErrorKind::Protocol("bad shape".into()),
    );
    let gateway = gateway(primary.clone(), fallback.clone());

    let err = gateway.chat(&fast_request()).await.unwrap_err();
    let TesseraErrorKind::ServiceUnavailable(combined) = err.kind() else {
        panic!("expected combined error, got {err}");
    };
    assert_eq!(combined.primary.provider, "groq");
    assert!(matches!(combined.fallback.kind, UpstreamErrorKind::Protocol(_)));
    assert_eq!(primary.call_count(), 1);
    assert_eq!(fallback.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hung_attempt_times_out_and_fails_over() {
    let primary = MockAdapter::new(Backend::Groq, MockBehavior::Always(MockResponse::Hang));
    let fallback = MockAdapter::success(Backend::OpenAi, "fallback answer");
    let gateway = gateway(primary.clone(), fallback.clone());

    let started = Instant::now();
    let response = gateway.chat(&fast_request()).await.unwrap();

    assert_eq!(response.content, "fallback answer");
    assert_eq!(primary.call_count(), 1);
    assert!(started.elapsed() >= Duration::from_secs(120));
}

#[tokio::test]
async fn test_missing_credential_fails_at_first_use() {
    let primary = MockAdapter::success(Backend::Groq, "primary answer");
    let fallback = MockAdapter::success(Backend::OpenAi, "fallback answer");
    let credentials = Credentials::default().with("OPENAI_API_KEY", "sk-test");
    let gateway = gateway_with(primary.clone(), fallback.clone(), credentials);

    let err = gateway.chat(&fast_request()).await.unwrap_err();

    assert!(matches!(err.kind(), TesseraErrorKind::Config(_)));
    assert!(err.to_string().contains("GROQ_API_KEY"));
    assert_eq!(primary.call_count(), 0);
    assert_eq!(fallback.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_conversation_never_dispatches() {
    let primary = MockAdapter::success(Backend::Groq, "primary answer");
    let fallback = MockAdapter::success(Backend::OpenAi, "fallback answer");
    let gateway = gateway(primary.clone(), fallback);

    let request = ChatRequest::new(
        CapabilityTier::Fast,
        vec![Message::system("a"), Message::system("b"), Message::user("c")],
    );
    let err = gateway.chat(&request).await.unwrap_err();

    assert!(matches!(err.kind(), TesseraErrorKind::InvalidRequest(_)));
    assert_eq!(primary.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_override_on_fallback_backend_has_no_hop() {
    let primary = MockAdapter::success(Backend::Groq, "unused");
    let fallback = MockAdapter::error(Backend::OpenAi, unavailable());
    let gateway = gateway(primary.clone(), fallback.clone());

    let request = fast_request()
        .with_binding_override(BackendBinding::new(Backend::OpenAi, "gpt-4o", "OPENAI_API_KEY"));
    let err = gateway.chat(&request).await.unwrap_err();

    assert!(matches!(err.upstream_kind(), Some(UpstreamErrorKind::Unavailable(_))));
    assert_eq!(fallback.call_count(), 1);
    assert_eq!(primary.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stream_error_after_first_chunk_does_not_fail_over() {
    let primary = MockAdapter::new(
        Backend::Groq,
        MockBehavior::Always(MockResponse::ChunksThenError(
            vec!["Once ".into(), "upon ".into()],
            rate_limited(),
        )),
    );
    let fallback = MockAdapter::success(Backend::OpenAi, "fallback answer");
    let gateway = gateway(primary.clone(), fallback.clone());

    let mut stream = gateway.stream(&fast_request()).await.unwrap();
    let mut text = String::new();
    let mut failure = None;
    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => text.push_str(chunk.text()),
            Err(e) => failure = Some(e),
        }
    }

    assert_eq!(text, "Once upon ");
    let failure = failure.expect("stream should end with an error");
    assert!(failure.mid_stream);
    assert!(matches!(failure.kind, UpstreamErrorKind::RateLimited(_)));
    assert_eq!(primary.call_count(), 1);
    assert_eq!(fallback.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_stream_ends_after_read_timeout() {
    let primary = MockAdapter::new(
        Backend::Groq,
        MockBehavior::Always(MockResponse::ChunksThenStall(vec!["Once ".into()])),
    );
    let fallback = MockAdapter::success(Backend::OpenAi, "fallback answer");
    let gateway = gateway(primary.clone(), fallback.clone());

    let mut stream = gateway.stream(&fast_request()).await.unwrap();
    assert_eq!(stream.next().await.unwrap().unwrap().text(), "Once ");

    let started = Instant::now();
    let failure = stream.next().await.unwrap().unwrap_err();
    let read_timeout = Duration::from_secs(TesseraConfig::bundled().unwrap().http.read_timeout_secs);
    assert!(started.elapsed() >= read_timeout);
    assert!(started.elapsed() < Duration::from_secs(120));
    assert!(failure.mid_stream);
    assert!(matches!(failure.kind, UpstreamErrorKind::Unavailable(_)));
    assert!(stream.next().await.is_none());
    assert_eq!(fallback.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stream_error_before_first_chunk_fails_over() {
    let primary = MockAdapter::new(
        Backend::Groq,
        MockBehavior::Always(MockResponse::ChunksThenError(vec![], unavailable())),
    );
    let fallback = MockAdapter::success(Backend::OpenAi, "the fallback streamed this answer");
    let gateway = gateway(primary.clone(), fallback.clone());

    let stream = gateway.stream(&fast_request()).await.unwrap();
    let text = stream.collect_text().await.unwrap();

    assert_eq!(text, "the fallback streamed this answer");
    assert_eq!(primary.call_count(), 1);
    assert_eq!(fallback.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stream_retries_rate_limit_before_output() {
    let primary = MockAdapter::new(
        Backend::Groq,
        MockBehavior::Sequence(vec![
            MockResponse::Error(rate_limited()),
            MockResponse::Success("second try".into()),
        ]),
    );
    let fallback = MockAdapter::success(Backend::OpenAi, "fallback answer");
    let gateway = gateway(primary.clone(), fallback.clone());

    let text = gateway
        .stream(&fast_request())
        .await
        .unwrap()
        .collect_text()
        .await
        .unwrap();

    assert_eq!(text, "second try");
    assert_eq!(primary.call_count(), 2);
    assert_eq!(fallback.call_count(), 0);
}

#[test]
fn test_override_bypasses_resolver() {
    let gateway = gateway(
        MockAdapter::success(Backend::Groq, ""),
        MockAdapter::success(Backend::OpenAi, ""),
    );
    let binding = BackendBinding::new(Backend::HuggingFace, "gpt2", "HUGGINGFACE_API_KEY");
    let request = fast_request().with_binding_override(binding.clone());

    assert_eq!(gateway.binding_for(&request), &binding);
    assert_eq!(
        gateway.binding_for(&fast_request()).backend,
        Backend::Groq
    );
}
