/// Emits a diagnostic message through the logger configured on the options.
///
/// The first argument is anything that derefs to [`ClientOptions`], the second
/// one the [`Level`] of the message.
///
/// [`ClientOptions`]: crate::ClientOptions
/// [`Level`]: crate::Level
#[macro_export]
#[doc(hidden)]
macro_rules! sentry_log {
    ($options:expr, $level:expr, $($arg:tt)*) => {
        $options.log($level, format_args!($($arg)*))
    };
}

/// Emits a debug level diagnostic message.
#[macro_export]
#[doc(hidden)]
macro_rules! sentry_debug {
    ($options:expr, $($arg:tt)*) => {
        $crate::sentry_log!($options, $crate::Level::Debug, $($arg)*)
    };
}
