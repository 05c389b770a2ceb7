//! Classifies stack frames as in-app.

use async_trait::async_trait;

use crate::integrations::Integration;
use crate::protocol::{Event, Stacktrace};
use crate::utils::frame_in_app;
use crate::ClientOptions;

/// Integration to process Event stacktraces.
///
/// Every frame that is not classified yet is marked according to the
/// `in_app_includes` and `in_app_excludes` options, falling back to
/// `consider_in_app_frames_by_default`.
#[derive(Debug, Default)]
pub struct ProcessStacktraceIntegration;

impl ProcessStacktraceIntegration {
    /// Creates a new Integration to process stacktraces.
    pub fn new() -> Self {
        Self
    }
}

fn process_stacktrace(stacktrace: &mut Stacktrace, options: &ClientOptions) -> usize {
    let includes = options.in_app_includes();
    let excludes = options.in_app_excludes();
    let default = options.consider_in_app_frames_by_default();
    let mut marked = 0;
    for frame in stacktrace.frames.iter_mut().filter(|f| f.in_app.is_none()) {
        frame.in_app = Some(frame_in_app(frame, &includes, &excludes, default));
        marked += 1;
    }
    marked
}

#[async_trait]
impl Integration for ProcessStacktraceIntegration {
    fn name(&self) -> &'static str {
        "process-stacktrace"
    }

    async fn process_event(&self, mut event: Event, options: &ClientOptions) -> Option<Event> {
        let marked: usize = event
            .exception
            .iter_mut()
            .filter_map(|exc| exc.stacktrace.as_mut())
            .map(|stacktrace| process_stacktrace(stacktrace, options))
            .sum();
        if marked > 0 {
            sentry_debug!(
                options,
                "[ProcessStacktraceIntegration] Classified {} frames of event {}",
                marked,
                event.event_id
            );
        }
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Exception, Frame};
    use futures::executor::block_on;

    #[test]
    fn test_marks_unclassified_frames() {
        let mut options = ClientOptions::new();
        options.set_consider_in_app_frames_by_default(false);
        options.add_in_app_include("my_app");

        let frame = |module: &str, in_app: Option<bool>| Frame {
            module: Some(module.into()),
            in_app,
            ..Default::default()
        };
        let event = Event {
            exception: vec![Exception {
                ty: "Error".into(),
                stacktrace: Some(Stacktrace {
                    frames: vec![
                        frame("std::rt", None),
                        frame("my_app::main", None),
                        frame("std::panicking", Some(true)),
                    ],
                }),
                ..Default::default()
            }],
            ..Default::default()
        };

        let event = block_on(ProcessStacktraceIntegration.process_event(event, &options)).unwrap();
        let in_app: Vec<_> = event.exception[0]
            .stacktrace
            .as_ref()
            .unwrap()
            .frames
            .iter()
            .map(|f| f.in_app)
            .collect();
        assert_eq!(in_app, vec![Some(false), Some(true), Some(true)]);
    }
}
