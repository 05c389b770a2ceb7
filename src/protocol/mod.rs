//! This module exposes the types for the Sentry protocol.

pub mod v7;

/// the always latest sentry protocol version
pub mod latest {
    pub use super::v7::*;
}

pub use self::latest::*;
