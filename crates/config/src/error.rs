//! Config Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configuration file was named explicitly but isn't there.
    #[display("config file not found: {}", _0.display())]
    FileNotFound(#[error(not(source))] PathBuf),
    /// The merged sources could not be extracted into a [`Config`](crate::Config).
    #[display("invalid configuration")]
    Invalid,
    /// A setting is present but unusable.
    #[display("invalid configuration value for `{_0}`")]
    InvalidValue(#[error(not(source))] &'static str),
    /// `GITHUB_TOKEN` is absent or blank.
    #[display("GITHUB_TOKEN is not configured")]
    MissingCredential,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
