//! The boundary where finished events leave the pipeline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::eventprocessor::BoxError;
use crate::protocol::{Attachment, Event};
use crate::ClientOptions;

/// A finished event together with the attachments that go along with it.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    event: Event,
    attachments: Vec<Attachment>,
}

impl Envelope {
    /// Creates an envelope carrying the event and its attachments.
    pub fn new(event: Event, attachments: Vec<Attachment>) -> Envelope {
        Envelope { event, attachments }
    }

    /// The id of the contained event.
    pub fn uuid(&self) -> Uuid {
        self.event.event_id
    }

    /// The contained event.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// The attachments sent along with the event.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Splits the envelope into its event and attachments.
    pub fn into_parts(self) -> (Event, Vec<Attachment>) {
        (self.event, self.attachments)
    }
}

impl From<Event> for Envelope {
    fn from(event: Event) -> Envelope {
        Envelope::new(event, Vec::new())
    }
}

/// Reported by a transport that failed to accept an envelope.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport no longer accepts envelopes.
    #[error("transport is shut down")]
    Closed,
    /// The envelope could not be delivered.
    #[error("failed to send envelope: {0}")]
    Send(#[source] BoxError),
}

/// The trait for transports.
///
/// A transport is responsible for sending events to Sentry.  Retries and
/// rate limiting are entirely up to the implementation.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends an [`Envelope`].
    async fn send_envelope(&self, envelope: Envelope) -> Result<(), TransportError>;

    /// Flushes the transport queue, returning whether it drained in time.
    async fn flush(&self, timeout: Duration) -> bool {
        let _timeout = timeout;
        true
    }

    /// Instructs the transport to shut down.
    async fn shutdown(&self, timeout: Duration) -> bool {
        self.flush(timeout).await
    }
}

/// A factory creating transport instances.
///
/// Because options are potentially reused between different clients the
/// options do not actually contain a transport but a factory object that
/// can create transports instead.
///
/// The factory has a single method that creates a new arced transport.
/// Because transports can be wrapped in `Arc`s and those are clonable
/// any `Arc<Transport>` is also a valid transport factory.  This for
/// instance lets you put a `Arc<TestTransport>` directly into the options.
pub trait TransportFactory: Send + Sync {
    /// Given some options creates a transport.
    fn create_transport(&self, options: &ClientOptions) -> Arc<dyn Transport>;
}

impl<F> TransportFactory for F
where
    F: Fn(&ClientOptions) -> Arc<dyn Transport> + Send + Sync,
{
    fn create_transport(&self, options: &ClientOptions) -> Arc<dyn Transport> {
        (*self)(options)
    }
}

impl<T: Transport> TransportFactory for Arc<T> {
    fn create_transport(&self, options: &ClientOptions) -> Arc<dyn Transport> {
        let _options = options;
        self.clone()
    }
}
