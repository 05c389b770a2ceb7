use std::any::Any;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures::FutureExt;
use uuid::Uuid;

use crate::constants::SDK_INFO;
use crate::dedupe::{DedupeCheck, DeduplicationCache};
use crate::error::event_from_error;
use crate::eventprocessor::{EventProcessor, HookError};
use crate::integrations::contexts::{LoadContextsIntegration, RustContextProvider};
use crate::integrations::stacktrace::ProcessStacktraceIntegration;
use crate::integrations::Integration;
use crate::protocol::{Attachment, Breadcrumb, ClientSdkInfo, Event, Level, Map, Value};
use crate::sampling::{SampleDecision, Sampler, SamplingContext};
use crate::scope::Scope;
use crate::transport::{Envelope, Transport};
use crate::ClientOptions;

/// Why an event did not reach the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DropReason {
    /// The client has no DSN or no transport.
    Disabled,
    /// A transaction was captured while tracing is disabled.
    TracingDisabled,
    /// An integration or event processor discarded the event.
    EventProcessor,
    /// The before-send hook discarded the event.
    BeforeSend,
    /// The event was not sampled.
    SampleRate,
    /// The error was seen recently.
    Duplicate,
}

impl DropReason {
    const ALL: [DropReason; 6] = [
        DropReason::Disabled,
        DropReason::TracingDisabled,
        DropReason::EventProcessor,
        DropReason::BeforeSend,
        DropReason::SampleRate,
        DropReason::Duplicate,
    ];

    /// The name used in diagnostic output.
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::Disabled => "disabled",
            DropReason::TracingDisabled => "tracing_disabled",
            DropReason::EventProcessor => "event_processor",
            DropReason::BeforeSend => "before_send",
            DropReason::SampleRate => "sample_rate",
            DropReason::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The terminal state of a captured event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The event was handed to the transport.
    Delivered(Uuid),
    /// The event was discarded.
    Dropped(DropReason),
}

impl CaptureOutcome {
    /// Whether the event reached the transport.
    pub fn is_delivered(&self) -> bool {
        matches!(self, CaptureOutcome::Delivered(_))
    }

    /// The id of the delivered event.
    pub fn event_id(&self) -> Option<Uuid> {
        match *self {
            CaptureOutcome::Delivered(id) => Some(id),
            CaptureOutcome::Dropped(_) => None,
        }
    }

    /// The reason the event was discarded.
    pub fn drop_reason(&self) -> Option<DropReason> {
        match *self {
            CaptureOutcome::Delivered(_) => None,
            CaptureOutcome::Dropped(reason) => Some(reason),
        }
    }
}

#[derive(Default)]
struct DiscardCounters([AtomicU64; DropReason::ALL.len()]);

impl DiscardCounters {
    fn record(&self, reason: DropReason) {
        self.0[reason as usize].fetch_add(1, Ordering::Relaxed);
    }

    fn get(&self, reason: DropReason) -> u64 {
        self.0[reason as usize].load(Ordering::Relaxed)
    }
}

/// The Sentry client object.
///
/// The client owns the configuration and runs every captured event through
/// the pipeline: scope data, integrations, scope processors, global
/// processors, the before-send hook, sampling and deduplication.  Survivors
/// are handed to the transport.
///
/// Clients are `Send + Sync` and meant to be shared through an `Arc`;
/// concurrent captures run independently of each other.
pub struct Client {
    options: Arc<ClientOptions>,
    transport: RwLock<Option<Arc<dyn Transport>>>,
    sampler: Sampler,
    dedupe: DeduplicationCache,
    discarded: DiscardCounters,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("dsn", &self.dsn())
            .field("options", &self.options)
            .finish()
    }
}

impl<T: Into<ClientOptions>> From<T> for Client {
    fn from(o: T) -> Client {
        Client::with_options(o.into())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<unknown panic>".to_owned()
    }
}

impl Client {
    /// Creates a new Sentry client from a config.
    ///
    /// With `default_integrations` enabled, the stacktrace integration is
    /// registered in front of the configured ones and the Rust context
    /// integration behind them, so user supplied contexts are merged first.
    /// Every integration gets to set up the options before they are frozen.
    pub fn with_options(mut options: ClientOptions) -> Client {
        if options.default_integrations() {
            options.unshift_integration(Arc::new(ProcessStacktraceIntegration::new()));
            options.add_integration(LoadContextsIntegration::new(RustContextProvider));
        }

        let integrations = options.integrations();
        for integration in integrations.iter() {
            sentry_debug!(
                options,
                "[Client] Setting up integration: {}",
                integration.name()
            );
            integration.setup(&mut options);
        }

        let transport = options.transport().map(|factory| {
            sentry_debug!(options, "[Client] Creating transport");
            factory.create_transport(&options)
        });
        sentry_debug!(
            options,
            "[Client] Client created (dsn: {}, transport: {})",
            options.dsn().is_some(),
            transport.is_some()
        );

        Client {
            sampler: Sampler::new(options.sample_random()),
            dedupe: DeduplicationCache::new(options.max_deduplication_items()),
            transport: RwLock::new(transport),
            discarded: DiscardCounters::default(),
            options: Arc::new(options),
        }
    }

    /// Returns the options of this client.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Returns the DSN that constructed this client.
    pub fn dsn(&self) -> Option<&crate::Dsn> {
        self.options.dsn()
    }

    fn transport(&self) -> Option<Arc<dyn Transport>> {
        self.transport
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Quick check to see if the client is enabled.
    ///
    /// The Client is enabled if it has a valid DSN and Transport configured.
    pub fn is_enabled(&self) -> bool {
        self.options.dsn().is_some() && self.transport().is_some()
    }

    /// How many events were discarded for each reason so far.
    ///
    /// Reasons that never occurred are left out.
    pub fn discarded_events(&self) -> BTreeMap<DropReason, u64> {
        DropReason::ALL
            .iter()
            .map(|&reason| (reason, self.discarded.get(reason)))
            .filter(|&(_, count)| count > 0)
            .collect()
    }

    fn sdk_info(&self, integrations: &[Arc<dyn Integration>]) -> ClientSdkInfo {
        let mut sdk_info = SDK_INFO.clone();
        for integration in integrations.iter() {
            sdk_info.add_integration(integration.name());
        }
        sdk_info
    }

    async fn run_processors<'a, I>(
        &self,
        mut event: Event,
        processors: I,
        kind: &str,
    ) -> Result<Event, DropReason>
    where
        I: IntoIterator<Item = &'a Arc<dyn EventProcessor>>,
    {
        for (i, processor) in processors.into_iter().enumerate() {
            let id = event.event_id;
            event = match processor.process_event(event).await {
                Some(event) => event,
                None => {
                    sentry_debug!(
                        self.options,
                        "[Client] {} event processor {} dropped event {}",
                        kind,
                        i + 1,
                        id
                    );
                    return Err(DropReason::EventProcessor);
                }
            };
        }
        Ok(event)
    }

    async fn run_before_send(&self, event: Event) -> Result<Event, DropReason> {
        let hook = if event.is_transaction() {
            self.options.before_send_transaction()
        } else {
            self.options.before_send()
        };
        let hook = match hook {
            Some(hook) => hook.clone(),
            None => return Ok(event),
        };

        let id = event.event_id;
        let pristine = event.clone();
        let result = AssertUnwindSafe(hook.before_send(event))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(HookError::Panicked(panic_message(&*payload))));

        match result {
            Ok(Some(event)) => Ok(event),
            Ok(None) => {
                sentry_debug!(self.options, "[Client] before_send dropped event {}", id);
                Err(DropReason::BeforeSend)
            }
            Err(err) => {
                sentry_log!(
                    self.options,
                    Level::Error,
                    "[Client] before_send failed for event {}, sending it unchanged: {}",
                    id,
                    err
                );
                Ok(pristine)
            }
        }
    }

    fn sample(&self, event: &Event, custom: &Map<String, Value>) -> Result<(), DropReason> {
        let decision = if event.is_transaction() {
            let ctx = SamplingContext::new(event, custom);
            self.sampler.sample_transaction(&self.options, &ctx)
        } else {
            self.sampler.sample_event(&self.options)
        };
        match decision {
            SampleDecision::Keep => Ok(()),
            SampleDecision::InvalidRate(rate) => {
                sentry_log!(
                    self.options,
                    Level::Warning,
                    "[Client] Traces sampler returned invalid rate {}, dropping {}",
                    rate,
                    event.event_id
                );
                Err(DropReason::SampleRate)
            }
            SampleDecision::Reject => {
                sentry_debug!(
                    self.options,
                    "[Client] Event {} dropped due to sampling",
                    event.event_id
                );
                Err(DropReason::SampleRate)
            }
        }
    }

    /// Prepares an event for transmission to sentry.
    ///
    /// Returns the finished event or the reason it was discarded.  Nothing is
    /// recorded in the discard counters.
    pub async fn prepare_event(
        &self,
        mut event: Event,
        scope: Option<&Scope>,
        custom: &Map<String, Value>,
    ) -> Result<Event, DropReason> {
        let options = &*self.options;
        sentry_debug!(options, "[Client] Preparing event {}", event.event_id);

        if event.is_transaction() && !options.is_tracing_enabled() {
            sentry_debug!(
                options,
                "[Client] Tracing is disabled, dropping transaction {}",
                event.event_id
            );
            return Err(DropReason::TracingDisabled);
        }

        // event_id and sdk_info are set before the processors run so that the
        // processors can poke around in that data.
        if event.event_id.is_nil() {
            event.event_id = Uuid::new_v4();
        }
        // no persistent vector iterator may live across an await point
        let integrations: Vec<_> = options.integrations().iter().cloned().collect();
        if event.sdk.is_none() {
            event.sdk = Some(self.sdk_info(&integrations));
        }
        if event.release.is_none() {
            event.release = options.release().map(|x| x.into_owned());
        }
        if event.environment.is_none() {
            event.environment = options.environment().map(|x| x.into_owned());
        }
        if event.dist.is_none() {
            event.dist = options.dist().map(|x| x.into_owned());
        }
        if event.server_name.is_none() {
            event.server_name = options.server_name().map(|x| x.into_owned());
        }

        if let Some(scope) = scope {
            scope.apply_to_event(&mut event, options);
        }

        for integration in integrations.iter() {
            let id = event.event_id;
            event = match integration.process_event(event, options).await {
                Some(event) => event,
                None => {
                    sentry_debug!(
                        options,
                        "[Client] Integration '{}' dropped event {}",
                        integration.name(),
                        id
                    );
                    return Err(DropReason::EventProcessor);
                }
            };
        }

        if let Some(scope) = scope {
            let processors = scope.event_processors();
            event = self.run_processors(event, processors.iter(), "Scope").await?;
        }
        let processors: Vec<_> = options.event_processors().iter().cloned().collect();
        event = self.run_processors(event, processors.iter(), "Global").await?;

        event = self.run_before_send(event).await?;

        self.sample(&event, custom)?;

        if !event.is_transaction()
            && options.enable_deduplication()
            && self.dedupe.check(&event) == DedupeCheck::Duplicate
        {
            sentry_debug!(
                options,
                "[Client] Event {} is a duplicate, dropping it",
                event.event_id
            );
            return Err(DropReason::Duplicate);
        }

        if event.is_transaction() && event.spans.len() > options.max_spans() {
            sentry_debug!(
                options,
                "[Client] Dropping {} spans of transaction {}",
                event.spans.len() - options.max_spans(),
                event.event_id
            );
            event.spans.truncate(options.max_spans());
        }

        sentry_debug!(options, "[Client] Event {} prepared", event.event_id);
        Ok(event)
    }

    fn collect_attachments(&self, scope: Option<&Scope>) -> Vec<Attachment> {
        let max = self.options.max_attachment_size();
        scope
            .map(|scope| scope.attachments())
            .unwrap_or_default()
            .iter()
            .filter(|attachment| {
                let fits = attachment.len() <= max;
                if !fits {
                    sentry_debug!(
                        self.options,
                        "[Client] Discarding attachment {} ({} bytes)",
                        attachment.filename,
                        attachment.len()
                    );
                }
                fits
            })
            .cloned()
            .collect()
    }

    async fn capture(
        &self,
        event: Event,
        scope: Option<&Scope>,
        custom: &Map<String, Value>,
    ) -> CaptureOutcome {
        let transport = match self.transport() {
            Some(transport) if self.options.dsn().is_some() => transport,
            _ => {
                sentry_debug!(
                    self.options,
                    "[Client] Client is disabled, dropping event {}",
                    event.event_id
                );
                return CaptureOutcome::Dropped(DropReason::Disabled);
            }
        };

        let event = match self.prepare_event(event, scope, custom).await {
            Ok(event) => event,
            Err(reason) => {
                self.discarded.record(reason);
                return CaptureOutcome::Dropped(reason);
            }
        };

        let id = event.event_id;
        let envelope = Envelope::new(event, self.collect_attachments(scope));
        if let Err(err) = transport.send_envelope(envelope).await {
            sentry_log!(
                self.options,
                Level::Error,
                "[Client] Transport failed to send event {}: {}",
                id,
                err
            );
        }
        CaptureOutcome::Delivered(id)
    }

    /// Captures an event and sends it to sentry.
    pub async fn capture_event(&self, event: Event, scope: Option<&Scope>) -> CaptureOutcome {
        self.capture(event, scope, &Map::new()).await
    }

    /// Captures an event, blocking the current thread until it is handed off.
    pub fn capture_event_blocking(&self, event: Event, scope: Option<&Scope>) -> CaptureOutcome {
        futures::executor::block_on(self.capture_event(event, scope))
    }

    /// Captures an arbitrary message.
    pub async fn capture_message(
        &self,
        msg: &str,
        level: Level,
        scope: Option<&Scope>,
    ) -> CaptureOutcome {
        let event = Event {
            message: Some(msg.to_owned()),
            level,
            ..Default::default()
        };
        self.capture_event(event, scope).await
    }

    /// Captures a `std::error::Error` including its chain of sources.
    pub async fn capture_error<E: Error + ?Sized>(
        &self,
        error: &E,
        scope: Option<&Scope>,
    ) -> CaptureOutcome {
        self.capture_event(event_from_error(error), scope).await
    }

    /// Captures a transaction, passing `custom` to the traces sampler.
    pub async fn capture_transaction(
        &self,
        transaction: Event,
        scope: Option<&Scope>,
        custom: Map<String, Value>,
    ) -> CaptureOutcome {
        self.capture(transaction, scope, &custom).await
    }

    /// Records a breadcrumb on the scope.
    ///
    /// The breadcrumb passes the `before_breadcrumb` hook first; only the
    /// last `max_breadcrumbs` are kept.
    pub fn add_breadcrumb(&self, scope: &mut Scope, breadcrumb: Breadcrumb) {
        let max = self.options.max_breadcrumbs();
        if max == 0 {
            return;
        }
        let breadcrumb = match self.options.before_breadcrumb() {
            Some(hook) => match hook.before_breadcrumb(breadcrumb) {
                Some(breadcrumb) => breadcrumb,
                None => {
                    sentry_debug!(self.options, "[Client] before_breadcrumb dropped a breadcrumb");
                    return;
                }
            },
            None => breadcrumb,
        };
        scope.push_breadcrumb(breadcrumb, max);
    }

    /// Drains all pending events without shutting down.
    ///
    /// Waits at most `timeout`, or the configured shutdown timeout.
    pub async fn flush(&self, timeout: Option<Duration>) -> bool {
        match self.transport() {
            Some(transport) => {
                transport
                    .flush(timeout.unwrap_or_else(|| self.options.shutdown_timeout()))
                    .await
            }
            None => true,
        }
    }

    /// Drains all pending events and shuts down the transport behind the
    /// client.  After shutting down the transport is removed.
    ///
    /// This returns `true` if the queue was successfully drained in the
    /// given time or `false` if not (for instance because of a timeout).
    /// If no timeout is provided the client will wait for as long a
    /// `shutdown_timeout` in the client options.
    pub async fn close(&self, timeout: Option<Duration>) -> bool {
        let transport = self
            .transport
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        sentry_debug!(self.options, "[Client] Closing client");
        match transport {
            Some(transport) => {
                transport
                    .shutdown(timeout.unwrap_or_else(|| self.options.shutdown_timeout()))
                    .await
            }
            None => true,
        }
    }
}
