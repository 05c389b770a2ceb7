//! Adds context supplied by the host platform to events.

use async_trait::async_trait;
use thiserror::Error;

use crate::constants::{ARCH, PLATFORM, RUSTC_CHANNEL, RUSTC_VERSION};
use crate::eventprocessor::BoxError;
use crate::integrations::Integration;
use crate::merge::ContextSnapshot;
use crate::protocol::{Contexts, DeviceContext, Event, Map, OsContext, RuntimeContext, Value};
use crate::{ClientOptions, Level};

/// Raised by a [`ContextProvider`] that cannot supply its snapshot.
#[derive(Debug, Error)]
pub enum ContextProviderError {
    /// The platform layer is not reachable.
    #[error("context provider is unavailable")]
    Unavailable,
    /// Loading the snapshot failed.
    #[error("failed to load contexts: {0}")]
    Failed(#[source] BoxError),
}

/// Supplies a snapshot of platform context.
///
/// The snapshot is a nested map with the keys `integrations`, `package`,
/// `contexts`, `user`, `tags`, `extra`, `dist` and `environment`; all of them
/// optional.
#[async_trait]
pub trait ContextProvider: Send + Sync + 'static {
    /// The name under which the integration is reported.
    fn name(&self) -> &'static str {
        "loadContexts"
    }

    /// Loads the current snapshot.
    async fn load_contexts(&self) -> Result<Value, ContextProviderError>;
}

/// Merges the snapshot of a [`ContextProvider`] into every event.
///
/// Nothing the event already carries is overwritten.  If the provider fails
/// or returns something that is not a snapshot, the event passes unchanged.
#[derive(Debug)]
pub struct LoadContextsIntegration<P> {
    provider: P,
}

impl<P: ContextProvider> LoadContextsIntegration<P> {
    /// Creates the integration for the given provider.
    pub fn new(provider: P) -> Self {
        LoadContextsIntegration { provider }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: ContextProvider> Integration for LoadContextsIntegration<P> {
    fn name(&self) -> &'static str {
        self.provider.name()
    }

    async fn process_event(&self, mut event: Event, options: &ClientOptions) -> Option<Event> {
        let raw = match self.provider.load_contexts().await {
            Ok(raw) => raw,
            Err(err) => {
                sentry_log!(
                    options,
                    Level::Error,
                    "[{}] Skipping context merge for event {}: {}",
                    self.name(),
                    event.event_id,
                    err
                );
                return Some(event);
            }
        };
        let snapshot = match ContextSnapshot::from_value(raw) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                sentry_log!(
                    options,
                    Level::Error,
                    "[{}] Ignoring malformed context snapshot: {}",
                    self.name(),
                    err
                );
                return Some(event);
            }
        };
        sentry_debug!(
            options,
            "[{}] Merging contexts into event {}",
            self.name(),
            event.event_id
        );
        snapshot.merge_into(&mut event);
        Some(event)
    }
}

/// Provides the `rustc` runtime, the OS name and the CPU architecture the
/// crate was compiled for.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustContextProvider;

/// Returns the runtime context of the compiler.
pub fn rust_context() -> RuntimeContext {
    RuntimeContext {
        name: Some("rustc".into()),
        version: RUSTC_VERSION.map(|x| x.into()),
        other: {
            let mut map = Map::default();
            if let Some(channel) = RUSTC_CHANNEL {
                map.insert("channel".to_string(), channel.into());
            }
            map
        },
        ..Default::default()
    }
}

#[async_trait]
impl ContextProvider for RustContextProvider {
    fn name(&self) -> &'static str {
        "contexts"
    }

    async fn load_contexts(&self) -> Result<Value, ContextProviderError> {
        let contexts = Contexts {
            os: Some(OsContext {
                name: Some(PLATFORM.into()),
                ..Default::default()
            }),
            device: Some(DeviceContext {
                arch: Some(ARCH.into()),
                ..Default::default()
            }),
            runtimes: vec![rust_context()],
            ..Default::default()
        };
        let contexts =
            serde_json::to_value(contexts).map_err(|e| ContextProviderError::Failed(e.into()))?;
        Ok(serde_json::json!({ "contexts": contexts }))
    }
}
