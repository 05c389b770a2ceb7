use std::borrow::Cow;
use std::env;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use im::Vector;
use thiserror::Error;

use crate::dsn::{Dsn, ParseDsnError};
use crate::eventprocessor::{BeforeBreadcrumb, BeforeSend, EventProcessor};
use crate::integrations::Integration;
use crate::logger::DiagnosticLogger;
use crate::protocol::{Breadcrumb, Event, Level};
use crate::sampling::{SampleRandom, SamplingContext, ThreadRandom, TracesSampler};
use crate::transport::TransportFactory;

/// Raised when a configuration value is rejected.
///
/// A rejected value is never stored; the previous value stays in place.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A sample rate outside of `[0, 1]` (or NaN).
    #[error("{option} must be between 0 and 1, got {value}")]
    RateOutOfRange {
        /// The name of the option.
        option: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A limit that must be greater than zero.
    #[error("{option} must be greater than zero")]
    NotPositive {
        /// The name of the option.
        option: &'static str,
    },
    /// The DSN could not be parsed.
    #[error("invalid dsn")]
    InvalidDsn(#[from] ParseDsnError),
}

fn check_rate(option: &'static str, rate: Option<f64>) -> Result<Option<f64>, ConfigError> {
    match rate {
        Some(value) if !(0.0..=1.0).contains(&value) => {
            Err(ConfigError::RateOutOfRange { option, value })
        }
        rate => Ok(rate),
    }
}

fn check_positive(option: &'static str, value: usize) -> Result<usize, ConfigError> {
    if value == 0 {
        Err(ConfigError::NotPositive { option })
    } else {
        Ok(value)
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

/// Configuration settings for the client.
///
/// Scalar options are set through validating setters on `&mut self` before
/// the options are handed to a [`Client`].  The collections (event
/// processors, integrations and in-app prefixes) can still be changed
/// afterwards through `&self`; readers always get a consistent snapshot.
///
/// # Examples
///
/// ```
/// let mut options = sentry_pipeline::ClientOptions::new();
/// options
///     .set_debug(true)
///     .set_sample_rate(Some(0.5))
///     .unwrap()
///     .set_max_breadcrumbs(50);
/// assert_eq!(options.sample_rate(), Some(0.5));
/// ```
///
/// [`Client`]: crate::Client
pub struct ClientOptions {
    dsn: Option<Dsn>,
    debug: bool,
    diagnostic_level: Level,
    logger: DiagnosticLogger,
    release: Option<Cow<'static, str>>,
    environment: Option<Cow<'static, str>>,
    dist: Option<Cow<'static, str>>,
    server_name: Option<Cow<'static, str>>,
    sample_rate: Option<f64>,
    traces_sample_rate: Option<f64>,
    traces_sampler: Option<Arc<dyn TracesSampler>>,
    sample_random: Arc<dyn SampleRandom>,
    max_breadcrumbs: usize,
    max_attachment_size: usize,
    max_spans: usize,
    enable_deduplication: bool,
    max_deduplication_items: usize,
    before_send: Option<Arc<dyn BeforeSend>>,
    before_send_transaction: Option<Arc<dyn BeforeSend>>,
    before_breadcrumb: Option<Arc<dyn BeforeBreadcrumb>>,
    consider_in_app_frames_by_default: bool,
    in_app_includes: RwLock<Vector<String>>,
    in_app_excludes: RwLock<Vector<String>>,
    event_processors: RwLock<Vector<Arc<dyn EventProcessor>>>,
    integrations: RwLock<Vector<Arc<dyn Integration>>>,
    default_integrations: bool,
    transport: Option<Arc<dyn TransportFactory>>,
    shutdown_timeout: Duration,
}

impl ClientOptions {
    /// Creates new Options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates new Options and immediately configures them.
    pub fn configure<F>(f: F) -> Self
    where
        F: FnOnce(&mut ClientOptions) -> &mut ClientOptions,
    {
        let mut opts = Self::new();
        f(&mut opts);
        opts
    }

    /// Fills unset options from the environment.
    ///
    /// `SENTRY_DSN`, `SENTRY_RELEASE` and `SENTRY_ENVIRONMENT` are consulted.
    /// An unparsable `SENTRY_DSN` is ignored.
    pub fn apply_env_defaults(&mut self) -> &mut Self {
        if self.dsn.is_none() {
            self.dsn = env::var("SENTRY_DSN")
                .ok()
                .and_then(|dsn| dsn.parse::<Dsn>().ok());
        }
        if self.release.is_none() {
            self.release = env::var("SENTRY_RELEASE").ok().map(Cow::Owned);
        }
        if self.environment.is_none() {
            self.environment = env::var("SENTRY_ENVIRONMENT").ok().map(Cow::Owned);
        }
        self
    }

    /// Emits a diagnostic message if it passes the diagnostic level.
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if level >= self.diagnostic_level {
            self.logger.log(level, args);
        }
    }

    /// Set a DSN to use.
    ///
    /// If not set the client is effectively disabled.
    pub fn set_dsn(&mut self, dsn: Option<Dsn>) -> &mut Self {
        self.dsn = dsn;
        self
    }
    /// Parses and sets a DSN.  An empty string unsets it.
    pub fn set_dsn_str(&mut self, dsn: &str) -> Result<&mut Self, ConfigError> {
        self.dsn = match dsn.trim() {
            "" => None,
            dsn => Some(dsn.parse()?),
        };
        Ok(self)
    }
    /// The configured DSN.
    pub fn dsn(&self) -> Option<&Dsn> {
        self.dsn.as_ref()
    }

    /// Enables/disables debug mode.
    ///
    /// Switches between the silent and the console logger.  A custom logger
    /// set through [`set_logger`](Self::set_logger) stays in place.
    pub fn set_debug(&mut self, debug: bool) -> &mut Self {
        self.debug = debug;
        if !self.logger.is_custom() {
            self.logger = DiagnosticLogger::for_debug(debug);
        }
        self
    }
    /// Whether debug logging is enabled.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Set the minimum level of diagnostic messages.
    pub fn set_diagnostic_level(&mut self, level: Level) -> &mut Self {
        self.diagnostic_level = level;
        self
    }
    /// The minimum level of diagnostic messages.
    pub fn diagnostic_level(&self) -> Level {
        self.diagnostic_level
    }

    /// Replaces the diagnostic logger.
    ///
    /// `None` restores the default logger for the current debug flag.
    pub fn set_logger(&mut self, logger: Option<DiagnosticLogger>) -> &mut Self {
        self.logger = logger.unwrap_or_else(|| DiagnosticLogger::for_debug(self.debug));
        self
    }
    /// The active diagnostic logger.
    pub fn logger(&self) -> &DiagnosticLogger {
        &self.logger
    }

    /// Set the release to be sent with events.
    pub fn set_release(&mut self, release: Option<Cow<'static, str>>) -> &mut Self {
        self.release = release;
        self
    }
    /// The release to be sent with events.
    pub fn release(&self) -> Option<Cow<'static, str>> {
        self.release.clone()
    }

    /// Set the environment to be sent with events.
    pub fn set_environment(&mut self, environment: Option<Cow<'static, str>>) -> &mut Self {
        self.environment = environment;
        self
    }
    /// The environment to be sent with events.
    pub fn environment(&self) -> Option<Cow<'static, str>> {
        self.environment.clone()
    }

    /// Set the distribution to be sent with events.
    pub fn set_dist(&mut self, dist: Option<Cow<'static, str>>) -> &mut Self {
        self.dist = dist;
        self
    }
    /// The distribution to be sent with events.
    pub fn dist(&self) -> Option<Cow<'static, str>> {
        self.dist.clone()
    }

    /// Set the server name to be reported.
    pub fn set_server_name(&mut self, server_name: Option<Cow<'static, str>>) -> &mut Self {
        self.server_name = server_name;
        self
    }
    /// The server name to be reported.
    pub fn server_name(&self) -> Option<Cow<'static, str>> {
        self.server_name.clone()
    }

    /// Set the sample rate for error events.  `None` sends every event.
    pub fn set_sample_rate(&mut self, sample_rate: Option<f64>) -> Result<&mut Self, ConfigError> {
        self.sample_rate = check_rate("sample_rate", sample_rate)?;
        Ok(self)
    }
    /// The sample rate for error events.
    pub fn sample_rate(&self) -> Option<f64> {
        self.sample_rate
    }

    /// Set the sample rate for transactions.
    pub fn set_traces_sample_rate(
        &mut self,
        traces_sample_rate: Option<f64>,
    ) -> Result<&mut Self, ConfigError> {
        self.traces_sample_rate = check_rate("traces_sample_rate", traces_sample_rate)?;
        Ok(self)
    }
    /// The sample rate for transactions.
    pub fn traces_sample_rate(&self) -> Option<f64> {
        self.traces_sample_rate
    }

    /// Set a function deciding the sample rate of each transaction.
    pub fn set_traces_sampler<F>(&mut self, sampler: F) -> &mut Self
    where
        F: Fn(&SamplingContext<'_>) -> Option<f64> + Send + Sync + 'static,
    {
        self.traces_sampler = Some(Arc::new(sampler));
        self
    }
    /// Set or unset an object deciding the sample rate of each transaction.
    pub fn set_traces_sampler_impl(
        &mut self,
        sampler: Option<Arc<dyn TracesSampler>>,
    ) -> &mut Self {
        self.traces_sampler = sampler;
        self
    }
    /// The configured traces sampler.
    pub fn traces_sampler(&self) -> Option<&Arc<dyn TracesSampler>> {
        self.traces_sampler.as_ref()
    }

    /// Whether transactions are captured at all.
    pub fn is_tracing_enabled(&self) -> bool {
        self.traces_sample_rate.is_some() || self.traces_sampler.is_some()
    }

    /// Replaces the source of random draws used for sampling.
    pub fn set_sample_random(&mut self, random: Arc<dyn SampleRandom>) -> &mut Self {
        self.sample_random = random;
        self
    }
    /// The source of random draws used for sampling.
    pub fn sample_random(&self) -> Arc<dyn SampleRandom> {
        self.sample_random.clone()
    }

    /// Set the maximum number of breadcrumbs. (defaults to 100)
    ///
    /// Zero disables breadcrumbs.
    pub fn set_max_breadcrumbs(&mut self, max_breadcrumbs: usize) -> &mut Self {
        self.max_breadcrumbs = max_breadcrumbs;
        self
    }
    /// Maximum number of breadcrumbs.
    pub fn max_breadcrumbs(&self) -> usize {
        self.max_breadcrumbs
    }

    /// Set the maximum size of a single attachment in bytes. (defaults to 20 MiB)
    pub fn set_max_attachment_size(&mut self, size: usize) -> Result<&mut Self, ConfigError> {
        self.max_attachment_size = check_positive("max_attachment_size", size)?;
        Ok(self)
    }
    /// Maximum size of a single attachment in bytes.
    pub fn max_attachment_size(&self) -> usize {
        self.max_attachment_size
    }

    /// Set the maximum number of spans per transaction. (defaults to 1000)
    pub fn set_max_spans(&mut self, max_spans: usize) -> Result<&mut Self, ConfigError> {
        self.max_spans = check_positive("max_spans", max_spans)?;
        Ok(self)
    }
    /// Maximum number of spans per transaction.
    pub fn max_spans(&self) -> usize {
        self.max_spans
    }

    /// Enables/disables dropping of repeated errors.
    pub fn set_enable_deduplication(&mut self, enable: bool) -> &mut Self {
        self.enable_deduplication = enable;
        self
    }
    /// Whether repeated errors are dropped.
    pub fn enable_deduplication(&self) -> bool {
        self.enable_deduplication
    }

    /// Set how many recent errors are remembered for deduplication. (defaults to 5)
    pub fn set_max_deduplication_items(&mut self, items: usize) -> Result<&mut Self, ConfigError> {
        self.max_deduplication_items = check_positive("max_deduplication_items", items)?;
        Ok(self)
    }
    /// How many recent errors are remembered for deduplication.
    pub fn max_deduplication_items(&self) -> usize {
        self.max_deduplication_items
    }

    /// Set a callback that is executed before event sending.
    pub fn set_before_send<F>(&mut self, before_send: F) -> &mut Self
    where
        F: Fn(Event) -> Option<Event> + Send + Sync + 'static,
    {
        self.before_send = Some(Arc::new(before_send));
        self
    }
    /// Set or unset a fallible hook that is executed before event sending.
    pub fn set_before_send_hook(&mut self, hook: Option<Arc<dyn BeforeSend>>) -> &mut Self {
        self.before_send = hook;
        self
    }
    /// The hook executed before error events are sent.
    pub fn before_send(&self) -> Option<&Arc<dyn BeforeSend>> {
        self.before_send.as_ref()
    }

    /// Set a callback that is executed before a transaction is sent.
    pub fn set_before_send_transaction<F>(&mut self, before_send: F) -> &mut Self
    where
        F: Fn(Event) -> Option<Event> + Send + Sync + 'static,
    {
        self.before_send_transaction = Some(Arc::new(before_send));
        self
    }
    /// Set or unset a fallible hook that is executed before a transaction is sent.
    pub fn set_before_send_transaction_hook(
        &mut self,
        hook: Option<Arc<dyn BeforeSend>>,
    ) -> &mut Self {
        self.before_send_transaction = hook;
        self
    }
    /// The hook executed before transactions are sent.
    pub fn before_send_transaction(&self) -> Option<&Arc<dyn BeforeSend>> {
        self.before_send_transaction.as_ref()
    }

    /// Set a callback that is executed for each Breadcrumb being added.
    pub fn set_before_breadcrumb<F>(&mut self, before_breadcrumb: F) -> &mut Self
    where
        F: Fn(Breadcrumb) -> Option<Breadcrumb> + Send + Sync + 'static,
    {
        self.before_breadcrumb = Some(Arc::new(before_breadcrumb));
        self
    }
    /// The callback executed for each Breadcrumb being added.
    pub fn before_breadcrumb(&self) -> Option<&Arc<dyn BeforeBreadcrumb>> {
        self.before_breadcrumb.as_ref()
    }

    /// Whether frames matching neither includes nor excludes count as in-app.
    pub fn set_consider_in_app_frames_by_default(&mut self, in_app: bool) -> &mut Self {
        self.consider_in_app_frames_by_default = in_app;
        self
    }
    /// Whether frames matching neither includes nor excludes count as in-app.
    pub fn consider_in_app_frames_by_default(&self) -> bool {
        self.consider_in_app_frames_by_default
    }

    /// Add a module prefix that is always considered "in_app".
    pub fn add_in_app_include(&self, prefix: &str) {
        write(&self.in_app_includes).push_back(prefix.to_owned());
    }
    /// Remove a module prefix from the "in_app" includes.
    pub fn remove_in_app_include(&self, prefix: &str) -> bool {
        remove_where(&self.in_app_includes, |x| x == prefix)
    }
    /// Module prefixes that are always considered "in_app".
    pub fn in_app_includes(&self) -> Vector<String> {
        read(&self.in_app_includes).clone()
    }

    /// Add a module prefix that is never "in_app".
    pub fn add_in_app_exclude(&self, prefix: &str) {
        write(&self.in_app_excludes).push_back(prefix.to_owned());
    }
    /// Remove a module prefix from the "in_app" excludes.
    pub fn remove_in_app_exclude(&self, prefix: &str) -> bool {
        remove_where(&self.in_app_excludes, |x| x == prefix)
    }
    /// Module prefixes that are never "in_app".
    pub fn in_app_excludes(&self) -> Vector<String> {
        read(&self.in_app_excludes).clone()
    }

    /// Registers a global event processor.
    pub fn add_event_processor(&self, processor: Arc<dyn EventProcessor>) {
        write(&self.event_processors).push_back(processor);
    }
    /// Registers a closure as global event processor.
    ///
    /// The returned handle can be passed to
    /// [`remove_event_processor`](Self::remove_event_processor).
    pub fn add_event_processor_fn<F>(&self, f: F) -> Arc<dyn EventProcessor>
    where
        F: Fn(Event) -> Option<Event> + Send + Sync + 'static,
    {
        let processor: Arc<dyn EventProcessor> = Arc::new(f);
        self.add_event_processor(processor.clone());
        processor
    }
    /// Removes a previously registered global event processor.
    pub fn remove_event_processor(&self, processor: &Arc<dyn EventProcessor>) -> bool {
        remove_where(&self.event_processors, |x| Arc::ptr_eq(x, processor))
    }
    /// A snapshot of the global event processors.
    pub fn event_processors(&self) -> Vector<Arc<dyn EventProcessor>> {
        read(&self.event_processors).clone()
    }

    /// Adds a configured integration to the options.
    ///
    /// Returns a handle that can be passed to
    /// [`remove_integration`](Self::remove_integration).
    pub fn add_integration<I: Integration>(&self, integration: I) -> Arc<dyn Integration> {
        let integration: Arc<dyn Integration> = Arc::new(integration);
        write(&self.integrations).push_back(integration.clone());
        integration
    }
    /// Adds another integration *in front* of the already registered ones.
    pub(crate) fn unshift_integration(&self, integration: Arc<dyn Integration>) {
        write(&self.integrations).push_front(integration);
    }
    /// Removes a previously added integration.
    pub fn remove_integration(&self, integration: &Arc<dyn Integration>) -> bool {
        remove_where(&self.integrations, |x| Arc::ptr_eq(x, integration))
    }
    /// A snapshot of the configured integrations.
    pub fn integrations(&self) -> Vector<Arc<dyn Integration>> {
        read(&self.integrations).clone()
    }

    /// Enable adding default integrations on init.
    pub fn set_default_integrations(&mut self, default_integrations: bool) -> &mut Self {
        self.default_integrations = default_integrations;
        self
    }
    /// Whether to add default integrations.
    pub fn default_integrations(&self) -> bool {
        self.default_integrations
    }

    /// The transport to use.
    ///
    /// This is either a function taking the client options by reference and
    /// returning a `Transport`, or an `Arc<Transport>`.
    pub fn set_transport<F>(&mut self, transport: F) -> &mut Self
    where
        F: TransportFactory + 'static,
    {
        self.transport = Some(Arc::new(transport));
        self
    }
    /// The configured transport factory.
    pub fn transport(&self) -> Option<&Arc<dyn TransportFactory>> {
        self.transport.as_ref()
    }
    /// Whether a [`TransportFactory`] has been set on these options.
    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    /// Set the timeout on client close for draining events.
    pub fn set_shutdown_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.shutdown_timeout = timeout;
        self
    }
    /// The timeout on client close for draining events.
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

fn remove_where<T: Clone, P>(lock: &RwLock<Vector<T>>, predicate: P) -> bool
where
    P: Fn(&T) -> bool,
{
    let mut items = write(lock);
    match items.iter().position(predicate) {
        Some(index) => {
            items.remove(index);
            true
        }
        None => false,
    }
}

impl Clone for ClientOptions {
    fn clone(&self) -> ClientOptions {
        ClientOptions {
            dsn: self.dsn.clone(),
            debug: self.debug,
            diagnostic_level: self.diagnostic_level,
            logger: self.logger.clone(),
            release: self.release.clone(),
            environment: self.environment.clone(),
            dist: self.dist.clone(),
            server_name: self.server_name.clone(),
            sample_rate: self.sample_rate,
            traces_sample_rate: self.traces_sample_rate,
            traces_sampler: self.traces_sampler.clone(),
            sample_random: self.sample_random.clone(),
            max_breadcrumbs: self.max_breadcrumbs,
            max_attachment_size: self.max_attachment_size,
            max_spans: self.max_spans,
            enable_deduplication: self.enable_deduplication,
            max_deduplication_items: self.max_deduplication_items,
            before_send: self.before_send.clone(),
            before_send_transaction: self.before_send_transaction.clone(),
            before_breadcrumb: self.before_breadcrumb.clone(),
            consider_in_app_frames_by_default: self.consider_in_app_frames_by_default,
            in_app_includes: RwLock::new(self.in_app_includes()),
            in_app_excludes: RwLock::new(self.in_app_excludes()),
            event_processors: RwLock::new(self.event_processors()),
            integrations: RwLock::new(self.integrations()),
            default_integrations: self.default_integrations,
            transport: self.transport.clone(),
            shutdown_timeout: self.shutdown_timeout,
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[derive(Debug)]
        struct BeforeSend;
        let before_send = self.before_send.as_ref().map(|_| BeforeSend);
        let before_send_transaction = self.before_send_transaction.as_ref().map(|_| BeforeSend);
        #[derive(Debug)]
        struct BeforeBreadcrumb;
        let before_breadcrumb = self.before_breadcrumb.as_ref().map(|_| BeforeBreadcrumb);
        #[derive(Debug)]
        struct TracesSampler;
        let traces_sampler = self.traces_sampler.as_ref().map(|_| TracesSampler);
        #[derive(Debug)]
        struct TransportFactory;
        let transport = self.transport.as_ref().map(|_| TransportFactory);

        let integrations: Vec<_> = self.integrations().iter().map(|i| i.name()).collect();

        f.debug_struct("ClientOptions")
            .field("dsn", &self.dsn)
            .field("debug", &self.debug)
            .field("diagnostic_level", &self.diagnostic_level)
            .field("logger", &self.logger)
            .field("release", &self.release)
            .field("environment", &self.environment)
            .field("dist", &self.dist)
            .field("server_name", &self.server_name)
            .field("sample_rate", &self.sample_rate)
            .field("traces_sample_rate", &self.traces_sample_rate)
            .field("traces_sampler", &traces_sampler)
            .field("max_breadcrumbs", &self.max_breadcrumbs)
            .field("max_attachment_size", &self.max_attachment_size)
            .field("max_spans", &self.max_spans)
            .field("enable_deduplication", &self.enable_deduplication)
            .field("max_deduplication_items", &self.max_deduplication_items)
            .field("before_send", &before_send)
            .field("before_send_transaction", &before_send_transaction)
            .field("before_breadcrumb", &before_breadcrumb)
            .field(
                "consider_in_app_frames_by_default",
                &self.consider_in_app_frames_by_default,
            )
            .field("in_app_includes", &self.in_app_includes())
            .field("in_app_excludes", &self.in_app_excludes())
            .field("event_processors", &self.event_processors().len())
            .field("integrations", &integrations)
            .field("default_integrations", &self.default_integrations)
            .field("transport", &transport)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish()
    }
}

impl Default for ClientOptions {
    fn default() -> ClientOptions {
        ClientOptions {
            dsn: None,
            debug: false,
            diagnostic_level: Level::Debug,
            logger: DiagnosticLogger::Silent,
            release: None,
            environment: None,
            dist: None,
            server_name: None,
            sample_rate: None,
            traces_sample_rate: None,
            traces_sampler: None,
            sample_random: Arc::new(ThreadRandom),
            max_breadcrumbs: 100,
            max_attachment_size: 20 * 1024 * 1024,
            max_spans: 1000,
            enable_deduplication: true,
            max_deduplication_items: 5,
            before_send: None,
            before_send_transaction: None,
            before_breadcrumb: None,
            consider_in_app_frames_by_default: true,
            in_app_includes: RwLock::new(Vector::new()),
            in_app_excludes: RwLock::new(Vector::new()),
            event_processors: RwLock::new(Vector::new()),
            integrations: RwLock::new(Vector::new()),
            default_integrations: true,
            transport: None,
            shutdown_timeout: Duration::from_secs(2),
        }
    }
}

impl From<Dsn> for ClientOptions {
    fn from(dsn: Dsn) -> ClientOptions {
        ClientOptions {
            dsn: Some(dsn),
            ..ClientOptions::default()
        }
    }
}

impl From<Option<Dsn>> for ClientOptions {
    fn from(dsn: Option<Dsn>) -> ClientOptions {
        ClientOptions {
            dsn,
            ..ClientOptions::default()
        }
    }
}

impl TryFrom<&str> for ClientOptions {
    type Error = ConfigError;

    fn try_from(dsn: &str) -> Result<ClientOptions, ConfigError> {
        let mut options = ClientOptions::default();
        options.set_dsn_str(dsn)?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::default();
        assert!(options.dsn().is_none());
        assert_eq!(options.max_breadcrumbs(), 100);
        assert_eq!(options.max_attachment_size(), 20 * 1024 * 1024);
        assert_eq!(options.max_spans(), 1000);
        assert!(options.enable_deduplication());
        assert_eq!(options.max_deduplication_items(), 5);
        assert_eq!(options.sample_rate(), None);
        assert!(!options.is_tracing_enabled());
        assert!(options.consider_in_app_frames_by_default());
    }

    #[test]
    fn test_rejected_rate_keeps_previous_value() {
        let mut options = ClientOptions::new();
        options.set_sample_rate(Some(0.25)).unwrap();
        assert_eq!(
            options.set_sample_rate(Some(1.5)).unwrap_err(),
            ConfigError::RateOutOfRange {
                option: "sample_rate",
                value: 1.5
            }
        );
        assert!(options.set_sample_rate(Some(f64::NAN)).is_err());
        assert_eq!(options.sample_rate(), Some(0.25));
    }

    #[test]
    fn test_tracing_enabled() {
        let mut options = ClientOptions::new();
        options.set_traces_sample_rate(Some(0.0)).unwrap();
        assert!(options.is_tracing_enabled());

        let mut options = ClientOptions::new();
        options.set_traces_sampler(|_| None);
        assert!(options.is_tracing_enabled());
    }

    #[test]
    fn test_debug_toggles_default_loggers_only() {
        let mut options = ClientOptions::new();
        options.set_debug(true);
        assert!(matches!(options.logger(), DiagnosticLogger::Console));
        options.set_debug(false);
        assert!(matches!(options.logger(), DiagnosticLogger::Silent));

        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        options.set_logger(Some(DiagnosticLogger::custom(move |_, args| {
            sink.lock().unwrap().push(args.to_string());
        })));
        options.set_debug(true);
        assert!(options.logger().is_custom());

        options.set_diagnostic_level(Level::Warning);
        options.log(Level::Info, format_args!("hidden"));
        options.log(Level::Error, format_args!("shown"));
        assert_eq!(*lines.lock().unwrap(), vec!["shown"]);

        options.set_logger(None);
        assert!(matches!(options.logger(), DiagnosticLogger::Console));
    }

    #[test]
    fn test_collections_are_snapshots() {
        let options = ClientOptions::new();
        options.add_in_app_include("my_app");
        let snapshot = options.in_app_includes();
        options.add_in_app_include("my_lib");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(options.in_app_includes().len(), 2);
        assert!(options.remove_in_app_include("my_app"));
        assert!(!options.remove_in_app_include("my_app"));
        assert_eq!(options.in_app_includes()[0], "my_lib");

        let processor = options.add_event_processor_fn(Some);
        assert_eq!(options.event_processors().len(), 1);
        assert!(options.remove_event_processor(&processor));
        assert!(options.event_processors().is_empty());
    }

    #[test]
    fn test_dsn_conversions() {
        let options = ClientOptions::try_from("").unwrap();
        assert!(options.dsn().is_none());
        let options = ClientOptions::try_from("https://public@example.com/42").unwrap();
        assert_eq!(options.dsn().unwrap().project_id().value(), 42);
        assert!(matches!(
            ClientOptions::try_from("not a dsn"),
            Err(ConfigError::InvalidDsn(_))
        ));
    }
}
