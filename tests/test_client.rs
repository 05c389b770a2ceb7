use std::sync::Arc;

use rstest::rstest;

use sentry_pipeline::protocol::{Attachment, Span};
use sentry_pipeline::test::{test_options, TestTransport};
use sentry_pipeline::{
    CaptureOutcome, Client, ClientOptions, ConfigError, DropReason, Event, Level, ProjectId,
    Scheme, Scope,
};

fn client_with_transport(mut options: ClientOptions) -> (Client, Arc<TestTransport>) {
    let transport = TestTransport::new();
    options.set_transport(transport.clone());
    (Client::with_options(options), transport)
}

#[test]
fn test_into_client() {
    let c = Client::from(ClientOptions::try_from("https://public@example.com/42").unwrap());
    {
        let dsn = c.dsn().unwrap();
        assert_eq!(dsn.public_key(), "public");
        assert_eq!(dsn.host(), "example.com");
        assert_eq!(dsn.scheme(), Scheme::Https);
        assert_eq!(dsn.project_id(), ProjectId::from(42));
    }

    let mut options = ClientOptions::try_from("https://public@example.com/42").unwrap();
    options.set_release(Some("foo@1.0".into()));
    let c = Client::from(options);
    assert_eq!(c.dsn().unwrap().project_id().value(), 42);
    assert_eq!(c.options().release().as_deref(), Some("foo@1.0"));

    assert!(Client::from(ClientOptions::new()).options().dsn().is_none());
    assert!(ClientOptions::try_from("").unwrap().dsn().is_none());
}

#[test]
fn test_invalid_dsn_is_rejected() {
    assert!(matches!(
        ClientOptions::try_from("not a dsn"),
        Err(ConfigError::InvalidDsn(_))
    ));
}

#[rstest]
#[case::negative(-0.1)]
#[case::above_one(1.5)]
#[case::nan(f64::NAN)]
fn test_invalid_rates_are_rejected(#[case] rate: f64) {
    let mut options = ClientOptions::new();
    options.set_sample_rate(Some(0.5)).unwrap();
    options.set_traces_sample_rate(Some(0.25)).unwrap();

    assert!(matches!(
        options.set_sample_rate(Some(rate)),
        Err(ConfigError::RateOutOfRange {
            option: "sample_rate",
            ..
        })
    ));
    assert!(matches!(
        options.set_traces_sample_rate(Some(rate)),
        Err(ConfigError::RateOutOfRange {
            option: "traces_sample_rate",
            ..
        })
    ));
    assert_eq!(options.sample_rate(), Some(0.5));
    assert_eq!(options.traces_sample_rate(), Some(0.25));
}

#[rstest]
#[case::zero(0.0)]
#[case::half(0.5)]
#[case::one(1.0)]
fn test_valid_rates_are_stored(#[case] rate: f64) {
    let mut options = ClientOptions::new();
    options.set_sample_rate(Some(rate)).unwrap();
    assert_eq!(options.sample_rate(), Some(rate));
    options.set_sample_rate(None).unwrap();
    assert_eq!(options.sample_rate(), None);
}

#[test]
fn test_zero_limits_are_rejected() {
    let mut options = ClientOptions::new();
    let attachment_size = options.max_attachment_size();

    assert_eq!(
        options.set_max_attachment_size(0).unwrap_err(),
        ConfigError::NotPositive {
            option: "max_attachment_size"
        }
    );
    assert_eq!(
        options.set_max_spans(0).unwrap_err(),
        ConfigError::NotPositive {
            option: "max_spans"
        }
    );
    assert_eq!(
        options.set_max_deduplication_items(0).unwrap_err(),
        ConfigError::NotPositive {
            option: "max_deduplication_items"
        }
    );
    assert_eq!(options.max_attachment_size(), attachment_size);
    assert_eq!(options.max_spans(), 1000);
    assert_eq!(options.max_deduplication_items(), 5);
}

#[tokio::test]
async fn test_disabled_client_drops_everything() {
    let client = Client::with_options(ClientOptions::new());
    assert!(!client.is_enabled());
    let outcome = client.capture_message("nobody listens", Level::Info, None).await;
    assert_eq!(outcome, CaptureOutcome::Dropped(DropReason::Disabled));
    assert!(client.discarded_events().is_empty());

    let mut options = test_options();
    options.set_dsn(None);
    let (client, transport) = client_with_transport(options);
    assert!(!client.is_enabled());
    client.capture_message("no dsn", Level::Info, None).await;
    assert!(transport.fetch_and_clear_events().is_empty());
}

#[tokio::test]
async fn test_close_disables_client() {
    let (client, transport) = client_with_transport(test_options());
    assert!(client.is_enabled());
    assert!(client.flush(None).await);
    assert!(client.close(None).await);
    assert!(!client.is_enabled());

    let outcome = client.capture_message("too late", Level::Info, None).await;
    assert_eq!(outcome.drop_reason(), Some(DropReason::Disabled));
    assert!(transport.fetch_and_clear_events().is_empty());
    assert!(client.close(None).await);
}

#[tokio::test]
async fn test_transport_failure_still_counts_as_delivered() {
    let (client, transport) = client_with_transport(test_options());
    transport.set_failing(true);
    let outcome = client.capture_message("lost", Level::Info, None).await;
    assert!(outcome.is_delivered());
    assert!(outcome.event_id().is_some());
    assert!(transport.fetch_and_clear_events().is_empty());
}

#[tokio::test]
async fn test_oversized_attachments_are_dropped() {
    let mut options = test_options();
    options.set_max_attachment_size(4).unwrap();
    let (client, transport) = client_with_transport(options);

    let mut scope = Scope::new();
    scope.add_attachment(Attachment {
        buffer: b"tiny".to_vec(),
        filename: "small.txt".into(),
        ..Default::default()
    });
    scope.add_attachment(Attachment {
        buffer: b"much too large".to_vec(),
        filename: "large.txt".into(),
        ..Default::default()
    });
    let outcome = client
        .capture_message("with attachments", Level::Info, Some(&scope))
        .await;
    assert!(outcome.is_delivered());

    let envelopes = transport.fetch_and_clear_envelopes();
    assert_eq!(envelopes.len(), 1);
    let names: Vec<_> = envelopes[0]
        .attachments()
        .iter()
        .map(|a| a.filename.as_str())
        .collect();
    assert_eq!(names, vec!["small.txt"]);
    assert_eq!(envelopes[0].uuid(), outcome.event_id().unwrap());
}

#[tokio::test]
async fn test_spans_are_truncated() {
    let mut options = test_options();
    options.set_traces_sample_rate(Some(1.0)).unwrap();
    options.set_max_spans(3).unwrap();
    let (client, transport) = client_with_transport(options);

    let mut transaction = Event::new_transaction("GET /", "http.server");
    transaction.spans = (0..10)
        .map(|i| Span {
            span_id: i.to_string(),
            ..Default::default()
        })
        .collect();
    let outcome = client
        .capture_transaction(transaction, None, Default::default())
        .await;
    assert!(outcome.is_delivered());

    let events = transport.fetch_and_clear_events();
    let ids: Vec<_> = events[0].spans.iter().map(|s| s.span_id.as_str()).collect();
    assert_eq!(ids, vec!["0", "1", "2"]);
}

#[tokio::test]
async fn test_default_integrations() {
    let mut options = test_options();
    options.set_default_integrations(true);
    let (client, transport) = client_with_transport(options);

    let names: Vec<_> = client
        .options()
        .integrations()
        .iter()
        .map(|i| i.name())
        .collect();
    assert_eq!(names, vec!["process-stacktrace", "contexts"]);

    client.capture_message("hi", Level::Info, None).await;
    let events = transport.fetch_and_clear_events();
    let event = &events[0];
    assert!(event
        .contexts
        .runtimes
        .iter()
        .any(|rt| rt.name.as_deref() == Some("rustc")));
    assert_eq!(
        event.sdk.as_ref().unwrap().integrations,
        vec!["process-stacktrace".to_string(), "contexts".to_string()]
    );
}

#[test]
fn test_capture_blocking() {
    let (client, transport) = client_with_transport(test_options());
    let outcome = client.capture_event_blocking(
        Event {
            message: Some("blocking".into()),
            ..Default::default()
        },
        None,
    );
    assert!(outcome.is_delivered());
    assert_eq!(transport.fetch_and_clear_events().len(), 1);
}
