//! Upstream Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Callers raise these into their own error kinds as
//! child frames rather than flattening them into strings.

use derive_more::{Display, Error};

/// An upstream error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for upstream operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No access credential configured; nothing was sent upstream.
    #[display("upstream credential is not configured")]
    MissingCredential,
    /// The backend was constructed with settings it cannot use.
    #[display("invalid upstream configuration: {_0}")]
    InvalidConfig(#[error(not(source))] String),
    /// Network failure, timeout, or a non-success status from the host.
    #[display("upstream unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
    /// The host has no release with this tag.
    #[display("release not found: {_0}")]
    ReleaseNotFound(#[error(not(source))] String),
    /// The host has no asset with this identifier.
    #[display("asset not found: {_0}")]
    AssetNotFound(#[error(not(source))] u64),
    /// The host answered, but not with anything we can decode.
    #[display("invalid upstream response: {_0}")]
    InvalidResponse(#[error(not(source))] String),
    /// An asset transfer failed after it had started.
    #[display("asset transfer interrupted")]
    Interrupted,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Interrupted)
    }
}
