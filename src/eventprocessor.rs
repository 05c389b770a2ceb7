//! The hooks an event passes through on its way to the transport.

use std::error::Error as StdError;
use std::future::Future;

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::{Breadcrumb, Event};

/// A boxed error returned by user supplied hooks.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A generic Event Processor
///
/// The Event Processor is invoked during different stages of the pipeline.
/// It can add more information to an event, modify existing information, or
/// decide to discard the event altogether, in which case further processing and
/// uploading is skipped.
///
/// Processors may suspend; the pipeline awaits each one before running the
/// next, so mutations are always applied in registration order.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    /// Processes an event.
    async fn process_event(&self, event: Event) -> Option<Event>;
}

#[async_trait]
impl<F> EventProcessor for F
where
    F: Fn(Event) -> Option<Event> + Send + Sync,
{
    async fn process_event(&self, event: Event) -> Option<Event> {
        self(event)
    }
}

/// Adapts an async closure into an [`EventProcessor`].
pub struct AsyncEventProcessor<F>(F);

impl<F> AsyncEventProcessor<F> {
    /// Wraps the given closure.
    pub fn new(f: F) -> AsyncEventProcessor<F> {
        AsyncEventProcessor(f)
    }
}

#[async_trait]
impl<F, Fut> EventProcessor for AsyncEventProcessor<F>
where
    F: Fn(Event) -> Fut + Send + Sync,
    Fut: Future<Output = Option<Event>> + Send,
{
    async fn process_event(&self, event: Event) -> Option<Event> {
        (self.0)(event).await
    }
}

/// The error a failing before-send hook reports.
///
/// A failed hook never drops the event: the pipeline continues with the event
/// as it was before the hook ran.
#[derive(Debug, Error)]
pub enum HookError {
    /// The hook returned an error.
    #[error("hook failed: {0}")]
    Failed(#[source] BoxError),
    /// The hook panicked.
    #[error("hook panicked: {0}")]
    Panicked(String),
}

impl HookError {
    /// Creates a new failure from anything that converts into a boxed error.
    pub fn new<E: Into<BoxError>>(err: E) -> HookError {
        HookError::Failed(err.into())
    }
}

/// The final, single filter an event passes before it is sampled.
///
/// Plain closures returning an `Option<Event>` implement this trait and can
/// never fail.
#[async_trait]
pub trait BeforeSend: Send + Sync {
    /// Modifies the event, or drops it by returning `Ok(None)`.
    async fn before_send(&self, event: Event) -> Result<Option<Event>, HookError>;
}

#[async_trait]
impl<F> BeforeSend for F
where
    F: Fn(Event) -> Option<Event> + Send + Sync,
{
    async fn before_send(&self, event: Event) -> Result<Option<Event>, HookError> {
        Ok(self(event))
    }
}

/// A filter for breadcrumbs before they are recorded on a scope.
pub trait BeforeBreadcrumb: Send + Sync {
    /// Modifies the breadcrumb, or drops it by returning `None`.
    fn before_breadcrumb(&self, breadcrumb: Breadcrumb) -> Option<Breadcrumb>;
}

impl<F> BeforeBreadcrumb for F
where
    F: Fn(Breadcrumb) -> Option<Breadcrumb> + Send + Sync,
{
    fn before_breadcrumb(&self, breadcrumb: Breadcrumb) -> Option<Breadcrumb> {
        self(breadcrumb)
    }
}
