use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use tracing::instrument;
use vitrine_filter::is_allowed_asset;
use vitrine_upstream::BackendHandle;
use vitrine_upstream::error::ErrorKind as UpstreamErrorKind;

/// An asset located upstream, ready to be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub id: u64,
    /// Size reported in the release metadata; zero when unknown.
    pub size: u64,
}

/// Maps a public `(tag, file name)` pair onto an upstream asset.
///
/// Always asks upstream for the release directly instead of consulting the
/// listing cache, so a download never depends on a stale listing.
#[derive(Clone)]
pub struct AssetResolver {
    backend: BackendHandle,
}

impl AssetResolver {
    pub fn new(backend: BackendHandle) -> Self {
        Self { backend }
    }

    /// Find the asset named exactly `asset_name` attached to release `tag`.
    ///
    /// Names that aren't installers are rejected before anything is sent
    /// upstream. A release that doesn't exist is reported the same way as an
    /// asset that doesn't exist.
    #[instrument(skip(self))]
    pub async fn resolve(&self, tag: &str, asset_name: &str) -> Result<ResolvedAsset> {
        if !is_allowed_asset(asset_name) {
            exn::bail!(ErrorKind::InvalidAssetRequest(asset_name.to_string()));
        }
        let release = match self.backend.release_by_tag(tag).await {
            Ok(release) => release,
            Err(err) if matches!(*err, UpstreamErrorKind::ReleaseNotFound(_)) => {
                return Err(err).or_raise(|| ErrorKind::AssetNotFound(asset_name.to_string()));
            },
            Err(err) => return Err(ErrorKind::upstream(err)),
        };
        let asset = release.asset_named(asset_name).ok_or_else(|| {
            tracing::info!(assets = release.assets().len(), "No asset with this name in release");
            exn::Exn::from(ErrorKind::AssetNotFound(asset_name.to_string()))
        })?;
        Ok(ResolvedAsset {
            id: asset.id,
            size: asset.size.unwrap_or(0),
        })
    }
}
