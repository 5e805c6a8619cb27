//! Public projection of upstream releases.
//!
//! The upstream host knows about drafts, every attached file, and plenty of
//! metadata we have no business exposing. [`project()`] reduces a raw listing
//! to what a public caller may see: published releases, and of those only
//! the Windows installers.

pub mod error;
mod models;

pub use crate::models::{PublicAsset, PublicRelease};
use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use tracing::instrument;
use vitrine_upstream::{RawAsset, RawRelease};

/// The only file extension that may be listed or downloaded. Compared
/// case-sensitively against the end of the asset name.
pub const ALLOWED_EXTENSION: &str = ".exe";

/// Whether an asset with this file name may be exposed publicly.
///
/// # Examples
///
/// ```
/// use vitrine_filter::is_allowed_asset;
///
/// assert!(is_allowed_asset("setup.exe"));
/// assert!(!is_allowed_asset("setup.EXE"));
/// assert!(!is_allowed_asset("tool.zip"));
/// ```
pub fn is_allowed_asset(name: &str) -> bool {
    name.ends_with(ALLOWED_EXTENSION)
}

/// Project a raw upstream listing into its public shape.
///
/// Drafts are dropped, then every non-installer asset, then every release
/// left with no assets at all. Output order follows input order. Defaults
/// are applied for optional fields (`name` falls back to `tag_name`,
/// `prerelease` to `false`, `body` to empty).
///
/// Fails on the first surviving release (or asset) that is missing a field
/// required by the public shape.
#[instrument(skip_all, fields(releases = raw.len()))]
pub fn project(raw: &[RawRelease]) -> Result<Vec<PublicRelease>> {
    let mut public = Vec::new();
    for (index, release) in raw.iter().enumerate() {
        if release.is_draft() {
            continue;
        }
        let label = || release.tag_name.clone().unwrap_or_else(|| format!("#{index}"));
        let assets = release
            .assets()
            .iter()
            .filter(|asset| is_allowed_asset(&asset.name))
            .map(|asset| project_asset(asset, &label))
            .collect::<Result<Vec<_>>>()?;
        if assets.is_empty() {
            continue;
        }
        let tag_name = release.tag_name.clone().ok_or_raise(|| missing(label(), "tag_name"))?;
        let html_url = release.html_url.clone().ok_or_raise(|| missing(label(), "html_url"))?;
        public.push(PublicRelease {
            name: release.name.clone().unwrap_or_else(|| tag_name.clone()),
            tag_name,
            prerelease: release.prerelease.unwrap_or(false),
            body: release.body.clone().unwrap_or_default(),
            html_url,
            published_at: release.published_at.clone(),
            assets,
        });
    }
    tracing::debug!(public = public.len(), "Projected releases");
    Ok(public)
}

fn project_asset(asset: &RawAsset, label: &impl Fn() -> String) -> Result<PublicAsset> {
    let browser_download_url =
        asset.browser_download_url.clone().ok_or_raise(|| missing(label(), "assets[].browser_download_url"))?;
    Ok(PublicAsset {
        name: asset.name.clone(),
        browser_download_url,
        size: asset.size.unwrap_or(0),
        created_at: asset.created_at.clone(),
    })
}

fn missing(release: String, field: &'static str) -> ErrorKind {
    ErrorKind::MissingField { release, field }
}
