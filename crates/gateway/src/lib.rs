//! The public operations of the release proxy.
//!
//! [`Gateway`] is the application context: it owns the upstream backend, the
//! release cache and the rate limiter, and exposes the three things the HTTP
//! surface can ask for. Each guarded operation checks its rate limit before
//! doing anything else.

pub mod download;
pub mod error;
pub mod health;
pub mod limit;
pub mod resolve;

pub use crate::download::{Download, TransferStream};
pub use crate::health::{ApiStatus, HealthReport};
pub use crate::limit::{LimitClass, RateLimiter};
pub use crate::resolve::{AssetResolver, ResolvedAsset};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::sync::Arc;
use tracing::instrument;
use vitrine_cache::ReleaseCache;
use vitrine_filter::PublicRelease;
use vitrine_upstream::BackendHandle;

/// Shared state behind every request.
pub struct Gateway {
    backend: BackendHandle,
    cache: ReleaseCache,
    limiter: RateLimiter,
    resolver: AssetResolver,
}

impl Gateway {
    /// A gateway with the default cache lifetime and rate limits.
    pub fn new(backend: BackendHandle) -> Self {
        Self::with_parts(backend, ReleaseCache::default(), RateLimiter::default())
    }

    pub fn with_parts(backend: BackendHandle, cache: ReleaseCache, limiter: RateLimiter) -> Self {
        Self {
            resolver: AssetResolver::new(backend.clone()),
            backend,
            cache,
            limiter,
        }
    }

    /// `owner/name` of the repository being proxied.
    pub fn repository(&self) -> &str {
        self.backend.name()
    }

    /// The public release listing, from cache when fresh.
    #[instrument(skip(self), fields(repository = %self.repository()))]
    pub async fn releases(&self) -> Result<Arc<Vec<PublicRelease>>> {
        self.limiter.check(LimitClass::Listing).await?;
        if let Some(entry) = self.cache.get().await {
            return Ok(entry.payload().clone());
        }
        let raw = self.backend.list_releases().await.map_err(ErrorKind::upstream)?;
        let public = vitrine_filter::project(&raw).or_raise(|| ErrorKind::MalformedUpstreamData)?;
        tracing::info!(upstream = raw.len(), public = public.len(), "Refreshed release listing");
        Ok(self.cache.put(public).await)
    }

    /// Open a download of installer `asset` from release `tag`.
    ///
    /// Resolves once upstream has started answering; the bytes follow through
    /// [`Download::into_body()`].
    #[instrument(skip(self), fields(repository = %self.repository()))]
    pub async fn download(&self, tag: &str, asset: &str) -> Result<Download> {
        self.limiter.check(LimitClass::Download).await?;
        let resolved = self.resolver.resolve(tag, asset).await?;
        let stream = self.backend.open_asset_stream(resolved.id).await.map_err(ErrorKind::upstream)?;
        tracing::info!(asset_id = resolved.id, size = resolved.size, "Starting download");
        Ok(Download::new(asset, resolved.size, stream))
    }

    /// Health snapshot. Not rate limited, never fails.
    pub async fn health(&self) -> HealthReport {
        let connected = self.backend.check_connectivity().await;
        HealthReport::new(self.repository(), ApiStatus::from(connected), self.cache.is_valid().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::time::Duration;
    use vitrine_upstream::backend::MockBackend;
    use vitrine_upstream::{RawAsset, RawRelease};

    fn raw_release(tag: &str, draft: bool, assets: &[(u64, &str, u64)]) -> RawRelease {
        RawRelease {
            id: Some(1),
            tag_name: Some(tag.to_string()),
            draft: Some(draft),
            html_url: Some(format!("https://github.com/owner/repo/releases/tag/{tag}")),
            assets: Some(
                assets
                    .iter()
                    .map(|&(id, name, size)| RawAsset {
                        id,
                        name: name.to_string(),
                        browser_download_url: Some(format!("https://example.com/{name}")),
                        size: Some(size),
                        created_at: None,
                    })
                    .collect(),
            ),
            ..Default::default()
        }
    }

    fn mock() -> Arc<MockBackend> {
        Arc::new(
            MockBackend::with_releases([
                raw_release("v1.0", false, &[(10, "setup.exe", 4), (11, "readme.txt", 5)]),
                raw_release("v0.9", true, &[(20, "old.exe", 3)]),
            ])
            .with_asset_data(10, b"MZ\x90\x00".to_vec())
            .with_name("owner/repo"),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_is_filtered() {
        let gateway = Gateway::new(mock());
        let releases = gateway.releases().await.unwrap();
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].tag_name, "v1.0");
        let names: Vec<&str> = releases[0].assets.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["setup.exe"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_is_cached() {
        let mock = mock();
        let gateway = Gateway::new(mock.clone());
        let first = gateway.releases().await.unwrap();
        tokio::time::advance(Duration::from_secs(60)).await;
        let second = gateway.releases().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(mock.list_calls(), 1);

        // Past the TTL upstream is asked again and sees the new state.
        mock.replace_releases([raw_release("v2.0", false, &[(30, "new.exe", 1)])]).await;
        tokio::time::advance(Duration::from_secs(240)).await;
        let third = gateway.releases().await.unwrap();
        assert_eq!(third[0].tag_name, "v2.0");
        assert_eq!(mock.list_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_rate_limit_precedes_upstream() {
        let mock = mock();
        let gateway = Gateway::with_parts(
            mock.clone(),
            ReleaseCache::new(Duration::ZERO),
            RateLimiter::with_limits(30, 10, limit::WINDOW),
        );
        for _ in 0..30 {
            gateway.releases().await.unwrap();
        }
        let err = gateway.releases().await.unwrap_err();
        assert_eq!(*err, ErrorKind::RateLimitExceeded(LimitClass::Listing));
        assert_eq!(mock.list_calls(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_failures() {
        let mock = mock();
        let gateway = Gateway::new(mock.clone());
        mock.set_offline(true);
        assert_eq!(*gateway.releases().await.unwrap_err(), ErrorKind::UpstreamUnavailable);

        let gateway = Gateway::new(Arc::new(MockBackend::default().without_credential()));
        assert_eq!(*gateway.releases().await.unwrap_err(), ErrorKind::Configuration);

        let malformed = RawRelease {
            html_url: None,
            ..raw_release("v1.0", false, &[(1, "a.exe", 1)])
        };
        let gateway = Gateway::new(Arc::new(MockBackend::with_releases([malformed])));
        assert_eq!(*gateway.releases().await.unwrap_err(), ErrorKind::MalformedUpstreamData);
        assert!(!gateway.cache.is_valid().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_streams_asset() {
        let gateway = Gateway::new(mock());
        let download = gateway.download("v1.0", "setup.exe").await.unwrap();
        assert_eq!(download.filename(), "setup.exe");
        assert_eq!(download.content_length(), Some(4));
        let body: Vec<bytes::Bytes> = download.into_body().try_collect().await.unwrap();
        assert_eq!(body.concat(), b"MZ\x90\x00");
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_rejections() {
        let mock = mock();
        let gateway = Gateway::new(mock.clone());
        let err = gateway.download("v1.0", "readme.txt").await.err().unwrap();
        assert_eq!(*err, ErrorKind::InvalidAssetRequest("readme.txt".to_string()));
        assert_eq!(mock.upstream_calls(), 0);

        let err = gateway.download("v1.0", "other.exe").await.err().unwrap();
        assert_eq!(*err, ErrorKind::AssetNotFound("other.exe".to_string()));
        assert_eq!(mock.open_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_rate_limit() {
        let mock = mock();
        let gateway = Gateway::new(mock.clone());
        for _ in 0..10 {
            let _ = gateway.download("v1.0", "tool.zip").await;
        }
        let err = gateway.download("v1.0", "setup.exe").await.err().unwrap();
        assert_eq!(*err, ErrorKind::RateLimitExceeded(LimitClass::Download));
        assert_eq!(mock.upstream_calls(), 0);
        // Listing has its own window.
        assert!(gateway.releases().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_health() {
        let mock = mock();
        let gateway = Gateway::new(mock.clone());
        let report = gateway.health().await;
        assert_eq!(report.github_api, ApiStatus::Connected);
        assert!(!report.cache_valid);
        assert_eq!(report.repository, "owner/repo");

        gateway.releases().await.unwrap();
        mock.set_offline(true);
        let report = gateway.health().await;
        assert_eq!(report.github_api, ApiStatus::Error);
        assert!(report.cache_valid);
        assert_eq!(report.status, "healthy");
    }
}
