//! Useful utilities for working with events.

use crate::protocol::Frame;

/// Parse the types name from `Debug` output.
///
/// # Examples
///
/// ```
/// use sentry_pipeline::utils::parse_type_from_debug;
///
/// let err = "NaN".parse::<usize>().unwrap_err();
/// assert_eq!(&parse_type_from_debug(&err), "ParseIntError");
/// ```
pub fn parse_type_from_debug<D: std::fmt::Debug + ?Sized>(d: &D) -> String {
    let dbg = format!("{:#?}", d);

    dbg.split(&[' ', '(', '{', '\r', '\n'][..])
        .next()
        .unwrap_or(&dbg)
        .trim()
        .to_owned()
}

/// Classifies a frame as belonging to the application or not.
///
/// Excludes win over includes; frames matching neither get `default`.
/// The module is matched first, the function name is used when a frame
/// carries no module.
pub fn frame_in_app<S: AsRef<str>>(
    frame: &Frame,
    includes: impl IntoIterator<Item = S>,
    excludes: impl IntoIterator<Item = S>,
    default: bool,
) -> bool {
    let path = match frame.module.as_deref().or(frame.function.as_deref()) {
        Some(path) => path,
        None => return default,
    };
    if excludes.into_iter().any(|p| path.starts_with(p.as_ref())) {
        return false;
    }
    if includes.into_iter().any(|p| path.starts_with(p.as_ref())) {
        return true;
    }
    default
}
