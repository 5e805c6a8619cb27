//! Upstream backend trait and implementations.
//!
//! This module defines the `UpstreamBackend` trait, the only way the rest of
//! the service reaches the private repository. The production implementation
//! talks to the GitHub REST API; the mock keeps everything in memory.

mod github;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::github::{DEFAULT_API_URL, GithubBackend};
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockBackend;
use crate::error::Result;
use crate::models::{AssetStream, RawRelease};
use async_trait::async_trait;

/// Unified interface for the upstream repository host.
///
/// Every operation that sends a request requires a configured credential and
/// fails with [`MissingCredential`](crate::error::ErrorKind::MissingCredential)
/// without touching the network when there isn't one.
///
/// # Examples
///
/// ```
/// use vitrine_upstream::{UpstreamBackend, error::Result};
///
/// async fn installer_count(backend: &dyn UpstreamBackend) -> Result<usize> {
///     let releases = backend.list_releases().await?;
///     Ok(releases
///         .iter()
///         .flat_map(|release| release.assets())
///         .filter(|asset| asset.name.ends_with(".exe"))
///         .count())
/// }
/// ```
#[async_trait]
pub trait UpstreamBackend: Send + Sync {
    /// Repository this backend serves, as `owner/name`. Used for logging and
    /// the health report.
    fn name(&self) -> &str;

    /// All releases of the repository, in upstream order, unfiltered.
    async fn list_releases(&self) -> Result<Vec<RawRelease>>;

    /// A single release by its tag.
    ///
    /// Returns [`ReleaseNotFound`](crate::error::ErrorKind::ReleaseNotFound)
    /// when the host has no release with this tag.
    async fn release_by_tag(&self, tag: &str) -> Result<RawRelease>;

    /// Open a streaming transfer of an asset's binary content.
    ///
    /// Resolves once the upstream host has answered with headers; the body
    /// then arrives incrementally through [`AssetStream::body`]. Returns
    /// [`AssetNotFound`](crate::error::ErrorKind::AssetNotFound) when the
    /// host doesn't know the identifier.
    ///
    /// ```no_run
    /// use futures::TryStreamExt;
    /// # use vitrine_upstream::{UpstreamBackend, error::Result};
    /// # async fn example(backend: &dyn UpstreamBackend) -> Result<()> {
    /// let mut transfer = backend.open_asset_stream(42).await?;
    /// let mut total = 0;
    /// while let Some(chunk) = transfer.body.try_next().await? {
    ///     total += chunk.len();
    /// }
    /// println!("{total} bytes");
    /// # Ok(())
    /// # }
    /// ```
    async fn open_asset_stream(&self, asset_id: u64) -> Result<AssetStream>;

    /// Cheap reachability probe. Never errors: any failure (including a
    /// missing credential) reads as "not connected".
    async fn check_connectivity(&self) -> bool;
}
