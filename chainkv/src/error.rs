//! Error taxonomy for chainkv, per spec section 7.
//!
//! `SessionLogic` is the one recoverable error kind surfaced to callers
//! (a session-level invariant was violated, e.g. a double-remove within a
//! single session). Everything else is implementation-defined and, per
//! the propagation policy, should be treated as tainting the `Database`.

use thiserror::Error;

/// The result type used throughout chainkv.
pub type CResult<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A session-level invariant was violated by the caller. The stack
    /// and live state remain consistent; the offending operation was
    /// rejected without side effect.
    #[error("session logic error: {0}")]
    SessionLogic(String),

    /// The persistent store reported a failure outside of plain I/O
    /// (e.g. a corrupt log entry).
    #[error("backend error: {0}")]
    Backend(String),

    /// Wraps I/O failures from the underlying log file or directory.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Encoding/decoding failure at a codec boundary.
    #[error("codec error: {0}")]
    Codec(String),

    /// A catch-all for internal errors that don't fit the categories
    /// above, kept distinct from `Backend` for error paths that have
    /// nothing to do with the storage engine at all.
    #[error("{0}")]
    Internal(String),
}
