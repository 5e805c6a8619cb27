//! Filter Error Types

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An upstream release passed every filter but lacks a field the public
    /// shape cannot do without.
    #[display("release {release} is missing required field `{field}`")]
    MissingField {
        /// Tag name if known, otherwise the release's position in the listing.
        #[error(not(source))]
        release: String,
        #[error(not(source))]
        field: &'static str,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Malformed upstream data stays malformed until someone edits the release.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
