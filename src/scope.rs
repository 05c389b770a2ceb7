use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::eventprocessor::EventProcessor;
use crate::merge::{merge_contexts, merge_map};
use crate::protocol::{Attachment, Breadcrumb, Contexts, Event, Level, Map, User, Value};
use crate::ClientOptions;

/// Holds contextual data for the current scope.
///
/// The scope is an object that can be cloned efficiently and stores data that
/// is locally relevant to an event.  For instance the scope will hold recorded
/// breadcrumbs and similar information.
///
/// Scope data only ever fills in what an event leaves unset; the level and
/// the fingerprint are the only overrides.  Processors registered on a scope
/// run before the global processors of the options.
#[derive(Clone, Default)]
pub struct Scope {
    pub(crate) level: Option<Level>,
    pub(crate) fingerprint: Option<Arc<[String]>>,
    pub(crate) transaction: Option<Arc<str>>,
    pub(crate) breadcrumbs: Arc<VecDeque<Breadcrumb>>,
    pub(crate) user: Option<Arc<User>>,
    pub(crate) extra: Arc<Map<String, Value>>,
    pub(crate) tags: Arc<Map<String, String>>,
    pub(crate) contexts: Arc<Contexts>,
    pub(crate) event_processors: Arc<Vec<Arc<dyn EventProcessor>>>,
    pub(crate) attachments: Arc<Vec<Attachment>>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("level", &self.level)
            .field("fingerprint", &self.fingerprint)
            .field("transaction", &self.transaction)
            .field("breadcrumbs", &self.breadcrumbs)
            .field("user", &self.user)
            .field("extra", &self.extra)
            .field("tags", &self.tags)
            .field("contexts", &self.contexts)
            .field("event_processors", &self.event_processors.len())
            .field("attachments", &self.attachments.len())
            .finish()
    }
}

impl Scope {
    /// Creates an empty scope.
    pub fn new() -> Scope {
        Scope::default()
    }

    /// Clear the scope.
    ///
    /// Calling this method will wipe all data contained within.
    pub fn clear(&mut self) {
        *self = Default::default();
    }

    /// Deletes current breadcrumbs from the scope.
    pub fn clear_breadcrumbs(&mut self) {
        self.breadcrumbs = Default::default();
    }

    /// The breadcrumbs recorded on the scope, oldest first.
    pub fn breadcrumbs(&self) -> impl Iterator<Item = &Breadcrumb> {
        self.breadcrumbs.iter()
    }

    /// Records a breadcrumb, evicting the oldest ones beyond `max`.
    ///
    /// A `max` of zero records nothing.
    pub(crate) fn push_breadcrumb(&mut self, breadcrumb: Breadcrumb, max: usize) {
        if max == 0 {
            return;
        }
        let breadcrumbs = Arc::make_mut(&mut self.breadcrumbs);
        breadcrumbs.push_back(breadcrumb);
        while breadcrumbs.len() > max {
            breadcrumbs.pop_front();
        }
    }

    /// Sets a level override.
    pub fn set_level(&mut self, level: Option<Level>) {
        self.level = level;
    }

    /// Sets the fingerprint.
    pub fn set_fingerprint(&mut self, fingerprint: Option<&[&str]>) {
        self.fingerprint = fingerprint.map(|fp| fp.iter().map(|s| (*s).to_owned()).collect());
    }

    /// Sets the transaction.
    pub fn set_transaction(&mut self, transaction: Option<&str>) {
        self.transaction = transaction.map(Arc::from);
    }

    /// Sets the user for the current scope.
    pub fn set_user(&mut self, user: Option<User>) {
        self.user = user.map(Arc::new);
    }

    /// Retrieves the user of the current scope.
    pub fn user(&self) -> Option<&User> {
        self.user.as_deref()
    }

    /// Sets a tag to a specific value.
    pub fn set_tag<V: ToString>(&mut self, key: &str, value: V) {
        Arc::make_mut(&mut self.tags).insert(key.to_string(), value.to_string());
    }

    /// Removes a tag.
    ///
    /// If the tag is not set, does nothing.
    pub fn remove_tag(&mut self, key: &str) {
        Arc::make_mut(&mut self.tags).remove(key);
    }

    /// Sets a custom context for a key.
    pub fn set_context(&mut self, key: &str, value: Value) {
        Arc::make_mut(&mut self.contexts)
            .other
            .insert(key.to_string(), value);
    }

    /// Removes a custom context for a key.
    pub fn remove_context(&mut self, key: &str) {
        Arc::make_mut(&mut self.contexts).other.remove(key);
    }

    /// Gives mutable access to the structured contexts of the scope.
    pub fn contexts_mut(&mut self) -> &mut Contexts {
        Arc::make_mut(&mut self.contexts)
    }

    /// Sets a extra to a specific value.
    pub fn set_extra(&mut self, key: &str, value: Value) {
        Arc::make_mut(&mut self.extra).insert(key.to_string(), value);
    }

    /// Removes a extra.
    pub fn remove_extra(&mut self, key: &str) {
        Arc::make_mut(&mut self.extra).remove(key);
    }

    /// Add an event processor to the scope.
    pub fn add_event_processor<F>(&mut self, f: F)
    where
        F: Fn(Event) -> Option<Event> + Send + Sync + 'static,
    {
        self.add_processor(Arc::new(f));
    }

    /// Add a possibly asynchronous event processor to the scope.
    pub fn add_processor(&mut self, processor: Arc<dyn EventProcessor>) {
        Arc::make_mut(&mut self.event_processors).push(processor);
    }

    /// The processors registered on this scope, in registration order.
    pub(crate) fn event_processors(&self) -> Arc<Vec<Arc<dyn EventProcessor>>> {
        self.event_processors.clone()
    }

    /// Adds an attachment to the scope
    pub fn add_attachment(&mut self, attachment: Attachment) {
        Arc::make_mut(&mut self.attachments).push(attachment);
    }

    /// Clears attachments from the scope
    pub fn clear_attachments(&mut self) {
        Arc::make_mut(&mut self.attachments).clear();
    }

    /// The attachments of the scope.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Applies the contained scoped data to fill an event.
    ///
    /// Event processors are not run here; the client runs them as part of
    /// its pipeline.
    pub fn apply_to_event(&self, event: &mut Event, options: &ClientOptions) {
        sentry_debug!(options, "[Scope] Applying scope to event {}", event.event_id);

        if let Some(level) = self.level {
            event.level = level;
        }

        if event.user.is_none() {
            event.user = self.user.as_deref().cloned();
        }

        if !self.breadcrumbs.is_empty() {
            let own = std::mem::take(&mut event.breadcrumbs);
            event.breadcrumbs = self.breadcrumbs.iter().cloned().chain(own).collect();
        }
        let max = options.max_breadcrumbs();
        if event.breadcrumbs.len() > max {
            let excess = event.breadcrumbs.len() - max;
            event.breadcrumbs.drain(..excess);
        }

        merge_map(&mut event.extra, (*self.extra).clone());
        merge_map(&mut event.tags, (*self.tags).clone());
        merge_contexts(&mut event.contexts, (*self.contexts).clone());

        if event.transaction.is_none() {
            event.transaction = self.transaction.as_deref().map(str::to_owned);
        }

        if event.fingerprint.is_empty() {
            if let Some(fp) = self.fingerprint.as_deref() {
                event.fingerprint = fp.to_vec();
            }
        }
    }
}
