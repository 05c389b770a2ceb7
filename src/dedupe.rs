//! Detection of repeated errors.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::protocol::{Event, Exception, Frame};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FrameShape {
    function: Option<String>,
    module: Option<String>,
    filename: Option<String>,
    lineno: Option<u64>,
}

impl From<&Frame> for FrameShape {
    fn from(frame: &Frame) -> FrameShape {
        FrameShape {
            function: frame.function.clone(),
            module: frame.module.clone(),
            filename: frame.filename.clone(),
            lineno: frame.lineno,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ExceptionShape {
    ty: String,
    value: Option<String>,
    frames: Vec<FrameShape>,
}

impl From<&Exception> for ExceptionShape {
    fn from(exc: &Exception) -> ExceptionShape {
        ExceptionShape {
            ty: exc.ty.clone(),
            value: exc.value.clone(),
            frames: exc
                .stacktrace
                .iter()
                .flat_map(|st| st.frames.iter())
                .map(FrameShape::from)
                .collect(),
        }
    }
}

/// The identity of an error used to detect repeats.
///
/// Two events share a fingerprint when their exception chains have the same
/// types, values and stack trace shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(Vec<ExceptionShape>);

impl Fingerprint {
    /// Computes the fingerprint of an event.
    ///
    /// Events without exceptions have no fingerprint.
    pub fn of(event: &Event) -> Option<Fingerprint> {
        if event.exception.is_empty() {
            return None;
        }
        Some(Fingerprint(
            event.exception.iter().map(ExceptionShape::from).collect(),
        ))
    }
}

/// The outcome of a deduplication check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupeCheck {
    /// The event was not seen recently.
    Novel,
    /// An event with the same fingerprint was seen recently.
    Duplicate,
}

/// A bounded window of the most recently seen fingerprints.
#[derive(Debug)]
pub struct DeduplicationCache {
    capacity: usize,
    seen: Mutex<VecDeque<Fingerprint>>,
}

impl DeduplicationCache {
    /// Creates a cache remembering up to `capacity` fingerprints.
    pub fn new(capacity: usize) -> DeduplicationCache {
        DeduplicationCache {
            capacity,
            seen: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Checks the event against the window and records it if novel.
    ///
    /// The lookup and the insertion happen under the same lock, so two
    /// concurrent checks of the same fingerprint never both come back novel.
    pub fn check(&self, event: &Event) -> DedupeCheck {
        let fingerprint = match Fingerprint::of(event) {
            Some(fingerprint) => fingerprint,
            None => return DedupeCheck::Novel,
        };
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        if seen.contains(&fingerprint) {
            return DedupeCheck::Duplicate;
        }
        if self.capacity == 0 {
            return DedupeCheck::Novel;
        }
        while seen.len() >= self.capacity {
            seen.pop_front();
        }
        seen.push_back(fingerprint);
        DedupeCheck::Novel
    }

    /// Number of fingerprints currently remembered.
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether no fingerprint is remembered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets all fingerprints.
    pub fn clear(&self) {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Stacktrace;

    fn error_event(ty: &str, lineno: u64) -> Event {
        Event {
            exception: vec![Exception {
                ty: ty.into(),
                value: Some("boom".into()),
                stacktrace: Some(Stacktrace {
                    frames: vec![Frame {
                        function: Some("main".into()),
                        lineno: Some(lineno),
                        ..Default::default()
                    }],
                }),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_fingerprint_ignores_event_id() {
        let a = error_event("Error", 1);
        let b = error_event("Error", 1);
        assert_ne!(a.event_id, b.event_id);
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&error_event("Error", 2)));
        assert_eq!(Fingerprint::of(&Event::new()), None);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let cache = DeduplicationCache::new(2);
        assert_eq!(cache.check(&error_event("A", 1)), DedupeCheck::Novel);
        assert_eq!(cache.check(&error_event("B", 1)), DedupeCheck::Novel);
        assert_eq!(cache.check(&error_event("A", 1)), DedupeCheck::Duplicate);
        assert_eq!(cache.check(&error_event("C", 1)), DedupeCheck::Novel);
        assert_eq!(cache.len(), 2);
        // A was evicted by C
        assert_eq!(cache.check(&error_event("A", 1)), DedupeCheck::Novel);
    }

    #[test]
    fn test_events_without_exceptions_are_novel() {
        let cache = DeduplicationCache::new(1);
        assert_eq!(cache.check(&Event::new()), DedupeCheck::Novel);
        assert_eq!(cache.check(&Event::new()), DedupeCheck::Novel);
        assert!(cache.is_empty());
    }
}
