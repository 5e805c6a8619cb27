//! Gateway Error Types
//!
//! Every failure a caller of the gateway can observe, named for what the
//! public surface should answer. Upstream errors are raised into these as
//! child frames so the original cause stays in the error tree.

use crate::limit::LimitClass;
use derive_more::{Display, Error};
use vitrine_upstream::error::{Error as UpstreamError, ErrorKind as UpstreamErrorKind};

/// A gateway error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The service isn't configured to reach upstream (no credential).
    #[display("service configuration error")]
    Configuration,
    #[display("upstream unavailable")]
    UpstreamUnavailable,
    #[display("release not found: {_0}")]
    ReleaseNotFound(#[error(not(source))] String),
    #[display("asset not found: {_0}")]
    AssetNotFound(#[error(not(source))] String),
    /// Rejected before anything was sent upstream.
    #[display("only .exe files can be downloaded, not {_0}")]
    InvalidAssetRequest(#[error(not(source))] String),
    /// Rejected before any other work was done.
    #[display("rate limit exceeded for {_0} requests")]
    RateLimitExceeded(#[error(not(source))] LimitClass),
    #[display("malformed upstream data")]
    MalformedUpstreamData,
}

impl ErrorKind {
    /// Convert an upstream error into a gateway error, keeping the upstream
    /// frame as a child.
    #[track_caller]
    pub fn upstream(err: UpstreamError) -> Error {
        let kind = match &*err {
            UpstreamErrorKind::MissingCredential | UpstreamErrorKind::InvalidConfig(_) => Self::Configuration,
            UpstreamErrorKind::Unavailable(_) | UpstreamErrorKind::Interrupted => Self::UpstreamUnavailable,
            UpstreamErrorKind::ReleaseNotFound(tag) => Self::ReleaseNotFound(tag.clone()),
            UpstreamErrorKind::AssetNotFound(id) => Self::AssetNotFound(id.to_string()),
            UpstreamErrorKind::InvalidResponse(_) => Self::MalformedUpstreamData,
        };
        err.raise(kind)
    }

    /// HTTP status the public surface answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAssetRequest(_) => 400,
            Self::ReleaseNotFound(_) | Self::AssetNotFound(_) => 404,
            Self::RateLimitExceeded(_) => 429,
            Self::Configuration | Self::MalformedUpstreamData => 500,
            Self::UpstreamUnavailable => 502,
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable | Self::RateLimitExceeded(_))
    }
}
