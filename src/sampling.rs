//! Error and transaction sampling.

use std::fmt;
use std::sync::Arc;

use crate::protocol::{Event, Map, Value};
use crate::ClientOptions;

/// The inputs of a trace sampling decision.
#[derive(Debug, Clone, Copy)]
pub struct SamplingContext<'a> {
    transaction: &'a Event,
    custom: &'a Map<String, Value>,
}

impl<'a> SamplingContext<'a> {
    /// Creates a context for the given transaction and caller hints.
    pub fn new(transaction: &'a Event, custom: &'a Map<String, Value>) -> SamplingContext<'a> {
        SamplingContext {
            transaction,
            custom,
        }
    }

    /// The transaction event under consideration.
    pub fn transaction(&self) -> &'a Event {
        self.transaction
    }

    /// The name of the transaction.
    pub fn name(&self) -> Option<&'a str> {
        self.transaction.transaction.as_deref()
    }

    /// The operation of the transaction, taken from its trace context.
    pub fn op(&self) -> Option<&'a str> {
        self.transaction
            .contexts
            .trace
            .as_ref()
            .and_then(|trace| trace.op.as_deref())
    }

    /// The sampling decision of an upstream service, if one was propagated.
    pub fn parent_sampled(&self) -> Option<bool> {
        self.transaction
            .contexts
            .trace
            .as_ref()
            .and_then(|trace| trace.sampled)
    }

    /// Arbitrary hints the caller passed along with the capture.
    pub fn custom(&self) -> &'a Map<String, Value> {
        self.custom
    }
}

/// Decides the sample rate of a single transaction.
///
/// Returning `None` means "no opinion": the configured
/// `traces_sample_rate` is used instead.
pub trait TracesSampler: Send + Sync {
    /// Returns the rate to sample the transaction with.
    fn sample(&self, ctx: &SamplingContext<'_>) -> Option<f64>;
}

impl<F> TracesSampler for F
where
    F: Fn(&SamplingContext<'_>) -> Option<f64> + Send + Sync,
{
    fn sample(&self, ctx: &SamplingContext<'_>) -> Option<f64> {
        self(ctx)
    }
}

/// A source of uniformly distributed draws in `[0, 1)`.
pub trait SampleRandom: Send + Sync {
    /// Draws the next value.
    fn draw(&self) -> f64;
}

impl<F> SampleRandom for F
where
    F: Fn() -> f64 + Send + Sync,
{
    fn draw(&self) -> f64 {
        self()
    }
}

/// The default random source backed by the thread local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl SampleRandom for ThreadRandom {
    fn draw(&self) -> f64 {
        rand::random::<f64>()
    }
}

/// Why a sampling decision rejected an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleDecision {
    /// The event is kept.
    Keep,
    /// The draw was above the rate.
    Reject,
    /// The sampler returned a rate outside of `[0, 1]`.
    InvalidRate(f64),
}

impl SampleDecision {
    /// Whether the event is kept.
    pub fn is_keep(self) -> bool {
        self == SampleDecision::Keep
    }
}

impl fmt::Display for SampleDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleDecision::Keep => write!(f, "keep"),
            SampleDecision::Reject => write!(f, "reject"),
            SampleDecision::InvalidRate(rate) => write!(f, "invalid rate {}", rate),
        }
    }
}

/// Evaluates both sampling decisions against a set of options.
#[derive(Clone)]
pub struct Sampler {
    random: Arc<dyn SampleRandom>,
}

impl Default for Sampler {
    fn default() -> Sampler {
        Sampler::new(Arc::new(ThreadRandom))
    }
}

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sampler").finish_non_exhaustive()
    }
}

impl Sampler {
    /// Creates a sampler drawing from the given source.
    pub fn new(random: Arc<dyn SampleRandom>) -> Sampler {
        Sampler { random }
    }

    fn roll(&self, rate: f64) -> SampleDecision {
        if rate >= 1.0 {
            SampleDecision::Keep
        } else if rate <= 0.0 || self.random.draw() >= rate {
            SampleDecision::Reject
        } else {
            SampleDecision::Keep
        }
    }

    /// Decides whether an error event is sent.
    ///
    /// An unset sample rate always sends.
    pub fn sample_event(&self, options: &ClientOptions) -> SampleDecision {
        match options.sample_rate() {
            None => SampleDecision::Keep,
            Some(rate) => self.roll(rate),
        }
    }

    /// Decides whether a transaction is sent.
    pub fn sample_transaction(
        &self,
        options: &ClientOptions,
        ctx: &SamplingContext<'_>,
    ) -> SampleDecision {
        let rate = options
            .traces_sampler()
            .and_then(|sampler| sampler.sample(ctx))
            .or_else(|| options.traces_sample_rate());
        match rate {
            None => SampleDecision::Reject,
            Some(rate) if !(0.0..=1.0).contains(&rate) => SampleDecision::InvalidRate(rate),
            Some(rate) => self.roll(rate),
        }
    }
}
