use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use sentry_pipeline::integrations::contexts::{
    ContextProvider, ContextProviderError, LoadContextsIntegration,
};
use sentry_pipeline::protocol::{ClientSdkInfo, ClientSdkPackage, DeviceContext, RuntimeContext};
use sentry_pipeline::test::{test_options, with_captured_events_options};
use sentry_pipeline::{Client, ClientOptions, Event, Integration, Level, User};

struct NativeProvider(Value);

#[async_trait]
impl ContextProvider for NativeProvider {
    async fn load_contexts(&self) -> Result<Value, ContextProviderError> {
        Ok(self.0.clone())
    }
}

struct Unavailable;

#[async_trait]
impl ContextProvider for Unavailable {
    async fn load_contexts(&self) -> Result<Value, ContextProviderError> {
        Err(ContextProviderError::Unavailable)
    }
}

fn native_snapshot() -> Value {
    json!({
        "integrations": ["NativeIntegration"],
        "package": {"name": "sentry.native", "version": "0.7.0"},
        "contexts": {
            "device": {"name": "Device1"},
            "os": {"name": "NativeOS"},
            "runtime": {"name": "RT1"},
            "native": {"build": "debug"}
        },
        "user": {"id": "native-user"},
        "tags": {"origin": "native", "shared": "native"},
        "extra": {"boot_time": 42},
        "dist": "native-dist",
        "environment": "native-env"
    })
}

fn event_with_own_context() -> Event {
    let mut event = Event::new();
    event.contexts.device = Some(DeviceContext {
        name: Some("eDevice".into()),
        ..Default::default()
    });
    event.contexts.runtimes.push(RuntimeContext {
        name: Some("eRT".into()),
        ..Default::default()
    });
    event.tags.insert("shared".into(), "event".into());
    event.environment = Some("event-env".into());
    event
}

#[tokio::test]
async fn test_event_context_wins() {
    let integration = LoadContextsIntegration::new(NativeProvider(native_snapshot()));
    let options = ClientOptions::new();
    let event = integration
        .process_event(event_with_own_context(), &options)
        .await
        .unwrap();

    assert_eq!(event.contexts.device.unwrap().name.as_deref(), Some("eDevice"));
    assert_eq!(event.contexts.os.unwrap().name.as_deref(), Some("NativeOS"));
    let runtimes: Vec<_> = event
        .contexts
        .runtimes
        .iter()
        .filter_map(|rt| rt.name.as_deref())
        .collect();
    assert!(runtimes.contains(&"eRT"));
    assert!(runtimes.contains(&"RT1"));
    assert_eq!(event.contexts.other["native"], json!({"build": "debug"}));

    assert_eq!(event.tags["shared"], "event");
    assert_eq!(event.tags["origin"], "native");
    assert_eq!(event.extra["boot_time"], json!(42));
    assert_eq!(event.environment.as_deref(), Some("event-env"));
    assert_eq!(event.dist.as_deref(), Some("native-dist"));
    assert_eq!(event.user.unwrap().id.as_deref(), Some("native-user"));
}

#[tokio::test]
async fn test_event_user_is_kept() {
    let integration = LoadContextsIntegration::new(NativeProvider(native_snapshot()));
    let mut event = Event::new();
    event.user = Some(User {
        id: Some("event-user".into()),
        ..Default::default()
    });
    let event = integration
        .process_event(event, &ClientOptions::new())
        .await
        .unwrap();
    assert_eq!(event.user.unwrap().id.as_deref(), Some("event-user"));
}

#[tokio::test]
async fn test_sdk_info_only_grows() {
    let integration = LoadContextsIntegration::new(NativeProvider(native_snapshot()));

    let mut event = Event::new();
    event.sdk = Some(ClientSdkInfo {
        name: "sentry.rust".into(),
        version: "1.0.0".into(),
        integrations: vec!["NativeIntegration".into()],
        packages: vec![ClientSdkPackage {
            name: "sentry.native".into(),
            version: "0.7.0".into(),
        }],
    });
    let event = integration
        .process_event(event, &ClientOptions::new())
        .await
        .unwrap();
    let sdk = event.sdk.unwrap();
    assert_eq!(sdk.integrations, vec!["NativeIntegration".to_string()]);
    assert_eq!(sdk.packages.len(), 1);

    let integration = LoadContextsIntegration::new(NativeProvider(json!({
        "package": {"name": "sentry.native", "version": "0.8.0"}
    })));
    let mut event = Event::new();
    event.sdk = Some(sdk);
    let event = integration
        .process_event(event, &ClientOptions::new())
        .await
        .unwrap();
    let versions: Vec<_> = event
        .sdk
        .unwrap()
        .packages
        .iter()
        .map(|p| p.version.clone())
        .collect();
    assert_eq!(versions, vec!["0.7.0", "0.8.0"]);
}

#[tokio::test]
async fn test_failing_provider_passes_event_through() {
    let integration = LoadContextsIntegration::new(Unavailable);
    let event = event_with_own_context();
    let processed = integration
        .process_event(event.clone(), &ClientOptions::new())
        .await;
    assert_eq!(processed, Some(event));
}

#[tokio::test]
async fn test_malformed_snapshot_passes_event_through() {
    let integration = LoadContextsIntegration::new(NativeProvider(json!("not a map")));
    let event = event_with_own_context();
    let processed = integration
        .process_event(event.clone(), &ClientOptions::new())
        .await;
    assert_eq!(processed, Some(event));
}

#[tokio::test]
async fn test_contexts_through_client() {
    let options = test_options();
    options.add_integration(LoadContextsIntegration::new(NativeProvider(
        native_snapshot(),
    )));

    let events = with_captured_events_options(
        |client: Arc<Client>| async move {
            client.capture_message("native", Level::Info, None).await;
        },
        options,
    )
    .await;

    assert_eq!(events.len(), 1);
    let sdk = events[0].sdk.as_ref().unwrap();
    assert!(sdk.integrations.contains(&"loadContexts".to_string()));
    assert!(sdk.integrations.contains(&"NativeIntegration".to_string()));
    let native_packages = sdk
        .packages
        .iter()
        .filter(|p| p.name == "sentry.native" && p.version == "0.7.0")
        .count();
    assert_eq!(native_packages, 1);
    assert_eq!(
        events[0].contexts.device.as_ref().unwrap().name.as_deref(),
        Some("Device1")
    );
}

#[tokio::test]
async fn test_native_contexts_win_over_rust_defaults() {
    let mut options = test_options();
    options.set_default_integrations(true);
    options.add_integration(LoadContextsIntegration::new(NativeProvider(json!({
        "contexts": {
            "device": {"name": "Device1"},
            "os": {"name": "Android"}
        }
    }))));

    let events = with_captured_events_options(
        |client: Arc<Client>| async move {
            client.capture_message("native", Level::Info, None).await;
        },
        options,
    )
    .await;

    assert_eq!(events.len(), 1);
    let contexts = &events[0].contexts;
    assert_eq!(
        contexts.device.as_ref().unwrap().name.as_deref(),
        Some("Device1")
    );
    assert_eq!(contexts.os.as_ref().unwrap().name.as_deref(), Some("Android"));
    assert!(contexts
        .runtimes
        .iter()
        .any(|rt| rt.name.as_deref() == Some("rustc")));
}

#[tokio::test]
async fn test_event_custom_context_wins() {
    let integration = LoadContextsIntegration::new(NativeProvider(native_snapshot()));
    let mut event = event_with_own_context();
    event
        .contexts
        .other
        .insert("native".into(), json!({"build": "release"}));

    let event = integration
        .process_event(event, &ClientOptions::new())
        .await
        .unwrap();
    assert_eq!(event.contexts.other["native"], json!({"build": "release"}));
    assert_eq!(event.contexts.other.len(), 1);
}
