//! Diagnostic output of the SDK itself.
//!
//! The SDK never writes to a global logger on its own.  Every message goes
//! through the [`DiagnosticLogger`] held by the [`ClientOptions`] and is
//! filtered against the configured diagnostic level.
//!
//! [`ClientOptions`]: crate::ClientOptions

use std::fmt;
use std::sync::Arc;

use crate::protocol::Level;

/// A callback receiving the SDK's diagnostic messages.
pub type LogCallback = Arc<dyn Fn(Level, fmt::Arguments<'_>) + Send + Sync>;

/// Where diagnostic messages of the SDK end up.
///
/// `Silent` and `Console` are the two defaults toggled by the `debug` option.
/// A `Custom` logger is only ever replaced explicitly.
#[derive(Clone, Default)]
pub enum DiagnosticLogger {
    /// Drops all messages.
    #[default]
    Silent,
    /// Writes messages to stderr, or to the `log` crate with the `debug-logs`
    /// feature.
    Console,
    /// Hands messages to a user supplied callback.
    Custom(LogCallback),
}

impl DiagnosticLogger {
    /// Returns the default logger for the given debug flag.
    pub fn for_debug(debug: bool) -> DiagnosticLogger {
        if debug {
            DiagnosticLogger::Console
        } else {
            DiagnosticLogger::Silent
        }
    }

    /// Wraps a closure into a custom logger.
    pub fn custom<F>(f: F) -> DiagnosticLogger
    where
        F: Fn(Level, fmt::Arguments<'_>) + Send + Sync + 'static,
    {
        DiagnosticLogger::Custom(Arc::new(f))
    }

    /// Whether this is a user supplied logger.
    pub fn is_custom(&self) -> bool {
        matches!(self, DiagnosticLogger::Custom(_))
    }

    /// Emits a single message.
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        match self {
            DiagnosticLogger::Silent => {}
            DiagnosticLogger::Console => console_log(level, args),
            DiagnosticLogger::Custom(callback) => callback(level, args),
        }
    }
}

impl fmt::Debug for DiagnosticLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticLogger::Silent => "Silent",
            DiagnosticLogger::Console => "Console",
            DiagnosticLogger::Custom(_) => "Custom",
        })
    }
}

#[cfg(feature = "debug-logs")]
fn console_log(level: Level, args: fmt::Arguments<'_>) {
    let level = match level {
        Level::Debug => log::Level::Debug,
        Level::Info => log::Level::Info,
        Level::Warning => log::Level::Warn,
        Level::Error | Level::Fatal => log::Level::Error,
    };
    log::log!(target: "sentry", level, "{}", args);
}

#[cfg(not(feature = "debug-logs"))]
fn console_log(level: Level, args: fmt::Arguments<'_>) {
    eprintln!("[sentry] [{}] {}", level, args);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_custom_logger_receives_messages() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let logger = DiagnosticLogger::custom(move |level, args| {
            sink.lock().unwrap().push(format!("{} {}", level, args));
        });

        logger.log(Level::Warning, format_args!("dropped {}", 1));
        DiagnosticLogger::Silent.log(Level::Error, format_args!("ignored"));

        assert!(logger.is_custom());
        assert_eq!(*lines.lock().unwrap(), vec!["warning dropped 1"]);
    }

    #[test]
    fn test_default_for_debug_flag() {
        assert!(matches!(
            DiagnosticLogger::for_debug(true),
            DiagnosticLogger::Console
        ));
        assert!(matches!(
            DiagnosticLogger::for_debug(false),
            DiagnosticLogger::Silent
        ));
    }
}
