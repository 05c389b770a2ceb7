use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rstest::rstest;
use serde_json::json;

use sentry_pipeline::protocol::Map;
use sentry_pipeline::test::{test_options, TestTransport};
use sentry_pipeline::{Client, ClientOptions, DropReason, Event, Level};

fn client_with_transport(mut options: ClientOptions) -> (Client, Arc<TestTransport>) {
    let transport = TestTransport::new();
    options.set_transport(transport.clone());
    (Client::with_options(options), transport)
}

#[rstest]
#[case::never(Some(0.0), 0)]
#[case::always(Some(1.0), 1000)]
#[case::unset(None, 1000)]
#[tokio::test]
async fn test_error_sample_rate(#[case] rate: Option<f64>, #[case] expected: usize) {
    let mut options = test_options();
    options.set_sample_rate(rate).unwrap();
    options.set_enable_deduplication(false);
    let (client, transport) = client_with_transport(options);

    for i in 0..1000 {
        client
            .capture_message(&format!("message {}", i), Level::Error, None)
            .await;
    }

    assert_eq!(transport.fetch_and_clear_events().len(), expected);
    let dropped = client
        .discarded_events()
        .get(&DropReason::SampleRate)
        .copied()
        .unwrap_or(0);
    assert_eq!(dropped, 1000 - expected as u64);
}

#[tokio::test]
async fn test_sample_rate_uses_random_source() {
    let draws = Arc::new(Mutex::new(vec![0.9, 0.1, 0.49, 0.5]));
    let mut options = test_options();
    options.set_sample_rate(Some(0.5)).unwrap();
    let source = draws.clone();
    options.set_sample_random(Arc::new(move || source.lock().unwrap().remove(0)));
    let (client, _transport) = client_with_transport(options);

    let mut kept = Vec::new();
    for _ in 0..4 {
        kept.push(
            client
                .capture_message("rolled", Level::Info, None)
                .await
                .is_delivered(),
        );
    }
    assert_eq!(kept, vec![false, true, true, false]);
}

#[tokio::test]
async fn test_tracing_disabled_drops_transactions() {
    let (client, transport) = client_with_transport(test_options());
    assert!(!client.options().is_tracing_enabled());

    let outcome = client
        .capture_transaction(
            Event::new_transaction("GET /", "http.server"),
            None,
            Map::new(),
        )
        .await;
    assert_eq!(outcome.drop_reason(), Some(DropReason::TracingDisabled));
    assert!(transport.fetch_and_clear_events().is_empty());
}

#[tokio::test]
async fn test_traces_sampler_sees_context() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut options = test_options();
    let counter = calls.clone();
    options.set_traces_sampler(move |ctx| {
        counter.fetch_add(1, Ordering::SeqCst);
        if ctx.custom().get("priority") == Some(&json!("high")) {
            return Some(1.0);
        }
        match ctx.name() {
            Some("GET /health") => Some(0.0),
            _ => None,
        }
    });
    options.set_traces_sample_rate(Some(1.0)).unwrap();
    let (client, transport) = client_with_transport(options);

    let mut custom = Map::new();
    custom.insert("priority".to_string(), json!("high"));
    let outcome = client
        .capture_transaction(
            Event::new_transaction("GET /health", "http.server"),
            None,
            custom,
        )
        .await;
    assert!(outcome.is_delivered());

    let outcome = client
        .capture_transaction(
            Event::new_transaction("GET /health", "http.server"),
            None,
            Map::new(),
        )
        .await;
    assert_eq!(outcome.drop_reason(), Some(DropReason::SampleRate));

    // no opinion falls back to the configured rate
    let outcome = client
        .capture_transaction(
            Event::new_transaction("GET /users", "http.server"),
            None,
            Map::new(),
        )
        .await;
    assert!(outcome.is_delivered());

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(transport.fetch_and_clear_events().len(), 2);
}

#[tokio::test]
async fn test_traces_sampler_without_fallback_rejects() {
    let mut options = test_options();
    options.set_traces_sampler(|_| None);
    let (client, _transport) = client_with_transport(options);

    let outcome = client
        .capture_transaction(
            Event::new_transaction("GET /", "http.server"),
            None,
            Map::new(),
        )
        .await;
    assert_eq!(outcome.drop_reason(), Some(DropReason::SampleRate));
}

#[rstest]
#[case::negative(-1.0)]
#[case::too_large(2.0)]
#[tokio::test]
async fn test_invalid_sampler_rate_drops(#[case] rate: f64) {
    let mut options = test_options();
    options.set_traces_sampler(move |_| Some(rate));
    let (client, transport) = client_with_transport(options);

    let outcome = client
        .capture_transaction(
            Event::new_transaction("GET /", "http.server"),
            None,
            Map::new(),
        )
        .await;
    assert_eq!(outcome.drop_reason(), Some(DropReason::SampleRate));
    assert!(transport.fetch_and_clear_events().is_empty());
}

#[tokio::test]
async fn test_parent_sampled_is_exposed() {
    let mut options = test_options();
    options.set_traces_sampler(|ctx| match ctx.parent_sampled() {
        Some(true) => Some(1.0),
        _ => Some(0.0),
    });
    let (client, _transport) = client_with_transport(options);

    let mut transaction = Event::new_transaction("GET /", "http.server");
    transaction.contexts.trace.as_mut().unwrap().sampled = Some(true);
    let outcome = client
        .capture_transaction(transaction, None, Map::new())
        .await;
    assert!(outcome.is_delivered());

    let outcome = client
        .capture_transaction(
            Event::new_transaction("GET /", "http.server"),
            None,
            Map::new(),
        )
        .await;
    assert!(!outcome.is_delivered());
}
