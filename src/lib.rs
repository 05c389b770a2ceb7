//! This crate provides the event pipeline of a [Sentry] client: the logic
//! that decides, for every captured error, message, transaction or
//! breadcrumb, whether it is sent and in what final shape.
//!
//! # Core Concepts
//!
//! The crate is centered around the [`Client`], which owns its
//! [`ClientOptions`] and runs every captured event through a fixed chain of
//! stages:
//!
//! 1. scope data and client defaults are applied,
//! 2. [`Integration`]s process the event, for instance merging platform
//!    context through a [`ContextProvider`](integrations::contexts::ContextProvider),
//! 3. the event processors of the [`Scope`] run, followed by the global
//!    processors of the options,
//! 4. the before-send hook runs,
//! 5. the event is sampled,
//! 6. repeated errors are dropped,
//!
//! before the survivor is handed to the [`Transport`].  Every stage may drop
//! the event; the [`CaptureOutcome`] tells which one did.
//!
//! There is no global state: the client is shared through an `Arc` and the
//! scope is passed explicitly.
//!
//! ```rust
//! # futures::executor::block_on(async {
//! use sentry_pipeline::test::{test_options, TestTransport};
//! use sentry_pipeline::{Client, Level, Scope};
//!
//! let transport = TestTransport::new();
//! let mut options = test_options();
//! options.set_transport(transport.clone());
//! let client = Client::with_options(options);
//!
//! let mut scope = Scope::new();
//! scope.set_tag("worker", "worker1");
//! let outcome = client
//!     .capture_message("Hello World!", Level::Warning, Some(&scope))
//!     .await;
//!
//! assert!(outcome.is_delivered());
//! assert_eq!(transport.fetch_and_clear_events()[0].tags["worker"], "worker1");
//! # });
//! ```
//!
//! # Features
//!
//! - `feature = "rust-info"`: Embeds the rustc version and channel into the
//!   Rust runtime context (*enabled by default*).
//! - `feature = "debug-logs"`: Uses the `log` crate for console diagnostics,
//!   instead of printing to `stderr`.
//!
//! [Sentry]: https://sentry.io/

#![doc(html_favicon_url = "https://sentry-brand.storage.googleapis.com/favicon.ico")]
#![doc(html_logo_url = "https://sentry-brand.storage.googleapis.com/sentry-glyph-black.png")]
#![warn(missing_docs)]

// macros; these need to be first to be used by other modules
#[macro_use]
mod macros;

mod client;
mod clientoptions;
mod constants;
mod dsn;
mod error;
mod scope;

pub mod dedupe;
pub mod eventprocessor;
pub mod integrations;
pub mod logger;
pub mod merge;
pub mod protocol;
pub mod sampling;
pub mod transport;
pub mod utils;

// public api or exports from this crate
pub use crate::client::{CaptureOutcome, Client, DropReason};
pub use crate::clientoptions::{ClientOptions, ConfigError};
pub use crate::dsn::{Dsn, ParseDsnError, ParseProjectIdError, ProjectId, Scheme};
pub use crate::error::event_from_error;
pub use crate::eventprocessor::{BeforeBreadcrumb, BeforeSend, EventProcessor, HookError};
pub use crate::integrations::Integration;
pub use crate::logger::DiagnosticLogger;
pub use crate::protocol::{Breadcrumb, Event, Level, User};
pub use crate::sampling::{SamplingContext, TracesSampler};
pub use crate::scope::Scope;
pub use crate::transport::{Envelope, Transport, TransportFactory};
