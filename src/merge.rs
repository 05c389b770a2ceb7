//! Merging of externally supplied context into events.
//!
//! The merge never overwrites what the event already carries: structured
//! contexts and the user are adopted only when absent, runtimes and custom
//! contexts are added next to existing entries and SDK metadata only ever
//! grows.

use serde::Deserialize;

use crate::constants::SDK_INFO;
use crate::protocol::map::Entry;
use crate::protocol::{
    AppContext, BrowserContext, ClientSdkPackage, Contexts, DeviceContext, Event, GpuContext,
    Map, OsContext, RuntimeContext, User, Value,
};

/// Context data supplied by the host platform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextSnapshot {
    /// Integration names to add to the SDK info.
    pub integrations: Vec<String>,
    /// A package to add to the SDK info.
    pub package: Option<ClientSdkPackage>,
    /// Contexts to merge into the event.
    pub contexts: Contexts,
    /// The user, adopted if the event has none.
    pub user: Option<User>,
    /// Tags, added per key.
    pub tags: Map<String, String>,
    /// Extra data, added per key.
    pub extra: Map<String, Value>,
    /// The distribution, adopted if the event has none.
    pub dist: Option<String>,
    /// The environment, adopted if the event has none.
    pub environment: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawContexts {
    device: Option<DeviceContext>,
    app: Option<AppContext>,
    os: Option<OsContext>,
    gpu: Option<GpuContext>,
    browser: Option<BrowserContext>,
    runtime: Option<RuntimeContext>,
    runtimes: Option<Vec<RuntimeContext>>,
    #[serde(flatten)]
    other: Map<String, Value>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSnapshot {
    integrations: Option<Vec<String>>,
    package: Option<ClientSdkPackage>,
    contexts: Option<RawContexts>,
    user: Option<User>,
    tags: Option<Map<String, String>>,
    extra: Option<Map<String, Value>>,
    dist: Option<String>,
    environment: Option<String>,
}

impl From<RawContexts> for Contexts {
    fn from(raw: RawContexts) -> Contexts {
        let mut runtimes = raw.runtimes.unwrap_or_default();
        runtimes.extend(raw.runtime);
        let other = raw
            .other
            .into_iter()
            .filter(|(key, value)| key != "trace" && !value.is_null())
            .collect();
        Contexts {
            device: raw.device,
            app: raw.app,
            os: raw.os,
            gpu: raw.gpu,
            browser: raw.browser,
            trace: None,
            runtimes,
            other,
        }
    }
}

impl ContextSnapshot {
    /// Decodes a snapshot from the nested map a context provider returns.
    ///
    /// The `contexts` map accepts a single `runtime` object as well as a
    /// `runtimes` list.  Unknown top level keys are ignored.
    pub fn from_value(value: Value) -> Result<ContextSnapshot, serde_json::Error> {
        let raw: RawSnapshot = serde_json::from_value(value)?;
        Ok(ContextSnapshot {
            integrations: raw.integrations.unwrap_or_default(),
            package: raw.package,
            contexts: raw.contexts.map(Contexts::from).unwrap_or_default(),
            user: raw.user,
            tags: raw.tags.unwrap_or_default(),
            extra: raw.extra.unwrap_or_default(),
            dist: raw.dist,
            environment: raw.environment,
        })
    }

    /// Merges the snapshot into the event.
    pub fn merge_into(self, event: &mut Event) {
        merge_contexts(&mut event.contexts, self.contexts);
        fill(&mut event.user, self.user);
        fill(&mut event.dist, self.dist);
        fill(&mut event.environment, self.environment);
        merge_map(&mut event.tags, self.tags);
        merge_map(&mut event.extra, self.extra);

        if self.integrations.is_empty() && self.package.is_none() {
            return;
        }
        let sdk = event.sdk.get_or_insert_with(|| SDK_INFO.clone());
        for integration in &self.integrations {
            sdk.add_integration(integration);
        }
        if let Some(package) = self.package {
            sdk.add_package(package);
        }
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// Adds every entry whose key is not present yet.
pub(crate) fn merge_map<V>(target: &mut Map<String, V>, source: Map<String, V>) {
    for (key, value) in source {
        if let Entry::Vacant(entry) = target.entry(key) {
            entry.insert(value);
        }
    }
}

/// Merges `source` into `target` without replacing anything `target` has.
///
/// Structured categories are adopted wholesale when absent, runtimes are
/// appended and custom entries are added per key.
pub(crate) fn merge_contexts(target: &mut Contexts, source: Contexts) {
    fill(&mut target.device, source.device);
    fill(&mut target.app, source.app);
    fill(&mut target.os, source.os);
    fill(&mut target.gpu, source.gpu);
    fill(&mut target.browser, source.browser);
    fill(&mut target.trace, source.trace);
    target.runtimes.extend(source.runtimes);
    merge_map(&mut target.other, source.other);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_snapshot() {
        let snapshot = ContextSnapshot::from_value(json!({
            "integrations": ["NativeBridge"],
            "package": {"name": "native", "version": "1.0"},
            "contexts": {
                "device": {"name": "Device1"},
                "runtime": {"name": "RT1"},
                "trace": {"trace_id": "x", "span_id": "y"},
                "custom": {"key": "value"},
                "nothing": null
            },
            "user": {"id": "42"},
            "unknown": true
        }))
        .unwrap();

        assert_eq!(snapshot.integrations, vec!["NativeBridge"]);
        assert_eq!(snapshot.package.unwrap().version, "1.0");
        assert_eq!(
            snapshot.contexts.device.unwrap().name.as_deref(),
            Some("Device1")
        );
        assert_eq!(snapshot.contexts.runtimes.len(), 1);
        assert!(snapshot.contexts.trace.is_none());
        assert_eq!(snapshot.contexts.other.len(), 1);
        assert_eq!(snapshot.user.unwrap().id.as_deref(), Some("42"));
    }

    #[test]
    fn test_decode_rejects_malformed_snapshot() {
        assert!(ContextSnapshot::from_value(json!({"integrations": "nope"})).is_err());
        assert!(ContextSnapshot::from_value(json!(null)).is_err());
    }

    #[test]
    fn test_scalars_fill_if_absent() {
        let mut event = Event {
            environment: Some("production".into()),
            ..Default::default()
        };
        event.tags.insert("os".into(), "event".into());

        let mut snapshot = ContextSnapshot {
            environment: Some("staging".into()),
            dist: Some("42".into()),
            ..Default::default()
        };
        snapshot.tags.insert("os".into(), "native".into());
        snapshot.tags.insert("arch".into(), "arm64".into());
        snapshot.merge_into(&mut event);

        assert_eq!(event.environment.as_deref(), Some("production"));
        assert_eq!(event.dist.as_deref(), Some("42"));
        assert_eq!(event.tags["os"], "event");
        assert_eq!(event.tags["arch"], "arm64");
        assert!(event.sdk.is_none());
    }
}
