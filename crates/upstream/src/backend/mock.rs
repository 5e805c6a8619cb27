//! In-memory upstream backend for testing.

use crate::error::{ErrorKind, Result};
use crate::{AssetStream, RawRelease, UpstreamBackend};
use async_stream::stream;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
enum MockAsset {
    Complete(Bytes),
    /// Yields the bytes, then fails mid-transfer.
    Broken(Bytes),
}

/// In-memory upstream backend for testing.
///
/// Releases and asset bodies are held behind [`RwLock`]s so that tests can
/// change what "upstream" says between calls. Every trait method bumps a
/// counter, which is how tests prove that caching and early rejection
/// actually avoid upstream traffic.
pub struct MockBackend {
    name: String,
    releases: RwLock<Vec<RawRelease>>,
    assets: RwLock<HashMap<u64, MockAsset>>,
    credential: bool,
    offline: AtomicBool,
    list_calls: AtomicUsize,
    tag_calls: AtomicUsize,
    open_calls: AtomicUsize,
}

impl MockBackend {
    /// Create a mock backend that answers with these releases.
    pub fn with_releases(releases: impl IntoIterator<Item = RawRelease>) -> Self {
        Self {
            name: "mock/mock".to_string(),
            releases: RwLock::new(releases.into_iter().collect()),
            assets: RwLock::new(HashMap::new()),
            credential: true,
            offline: AtomicBool::new(false),
            list_calls: AtomicUsize::new(0),
            tag_calls: AtomicUsize::new(0),
            open_calls: AtomicUsize::new(0),
        }
    }

    /// Change the repository name reported by the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Serve `data` as the binary content of asset `id`.
    pub fn with_asset_data(mut self, id: u64, data: impl Into<Bytes>) -> Self {
        self.assets.get_mut().insert(id, MockAsset::Complete(data.into()));
        self
    }

    /// Serve `data` for asset `id`, then fail the transfer.
    pub fn with_broken_asset(mut self, id: u64, data: impl Into<Bytes>) -> Self {
        self.assets.get_mut().insert(id, MockAsset::Broken(data.into()));
        self
    }

    /// Behave as if no credential had been configured.
    pub fn without_credential(mut self) -> Self {
        self.credential = false;
        self
    }

    /// Make every subsequent call fail as if the host were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Replace the releases upstream reports from now on.
    pub async fn replace_releases(&self, releases: impl IntoIterator<Item = RawRelease>) {
        *self.releases.write().await = releases.into_iter().collect();
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn tag_calls(&self) -> usize {
        self.tag_calls.load(Ordering::SeqCst)
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls.load(Ordering::SeqCst)
    }

    /// Total number of calls that would have reached the network.
    pub fn upstream_calls(&self) -> usize {
        self.list_calls() + self.tag_calls() + self.open_calls()
    }

    fn ensure_reachable(&self) -> Result<()> {
        if !self.credential {
            exn::bail!(ErrorKind::MissingCredential);
        }
        if self.offline.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::Unavailable("mock backend is offline".to_string()));
        }
        Ok(())
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        Self::with_releases([])
    }
}

#[async_trait]
impl UpstreamBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_releases(&self) -> Result<Vec<RawRelease>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_reachable()?;
        Ok(self.releases.read().await.clone())
    }

    async fn release_by_tag(&self, tag: &str) -> Result<RawRelease> {
        self.tag_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_reachable()?;
        self.releases
            .read()
            .await
            .iter()
            .find(|release| release.tag_name.as_deref() == Some(tag))
            .cloned()
            .ok_or_else(|| exn::Exn::from(ErrorKind::ReleaseNotFound(tag.to_string())))
    }

    async fn open_asset_stream(&self, asset_id: u64) -> Result<AssetStream> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_reachable()?;
        let asset = self.assets.read().await.get(&asset_id).cloned();
        match asset {
            Some(MockAsset::Complete(data)) => {
                let length = data.len() as u64;
                Ok(AssetStream::new(futures::stream::iter([Ok(data)]), Some(length)))
            },
            Some(MockAsset::Broken(data)) => {
                let body = stream! {
                    yield Ok(data);
                    yield Err(exn::Exn::from(ErrorKind::Interrupted));
                };
                Ok(AssetStream::new(body, None))
            },
            None => exn::bail!(ErrorKind::AssetNotFound(asset_id)),
        }
    }

    async fn check_connectivity(&self) -> bool {
        self.ensure_reachable().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CHUNK_SIZE, RawAsset};
    use futures::StreamExt;

    fn release(tag: &str) -> RawRelease {
        RawRelease {
            tag_name: Some(tag.to_string()),
            assets: Some(vec![RawAsset {
                id: 7,
                name: "setup.exe".to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_counts_calls() {
        let backend = MockBackend::with_releases([release("v1.0")]).with_asset_data(7, b"MZ".to_vec());
        assert_eq!(backend.list_releases().await.unwrap().len(), 1);
        assert_eq!(backend.release_by_tag("v1.0").await.unwrap().tag_name.as_deref(), Some("v1.0"));
        assert!(backend.open_asset_stream(7).await.is_ok());
        assert_eq!((backend.list_calls(), backend.tag_calls(), backend.open_calls()), (1, 1, 1));
        assert_eq!(backend.upstream_calls(), 3);
    }

    #[tokio::test]
    async fn test_not_found() {
        let backend = MockBackend::with_releases([release("v1.0")]);
        assert_eq!(*backend.release_by_tag("v2.0").await.unwrap_err(), ErrorKind::ReleaseNotFound("v2.0".to_string()));
        assert_eq!(*backend.open_asset_stream(99).await.unwrap_err(), ErrorKind::AssetNotFound(99));
    }

    #[tokio::test]
    async fn test_offline_and_credential() {
        let backend = MockBackend::default();
        assert!(backend.check_connectivity().await);
        backend.set_offline(true);
        assert!(!backend.check_connectivity().await);
        assert!(matches!(*backend.list_releases().await.unwrap_err(), ErrorKind::Unavailable(_)));

        let backend = MockBackend::default().without_credential();
        assert_eq!(*backend.list_releases().await.unwrap_err(), ErrorKind::MissingCredential);
    }

    #[tokio::test]
    async fn test_broken_asset() {
        // Only whole chunks make it through before the failure.
        let backend = MockBackend::default().with_broken_asset(1, vec![1u8; CHUNK_SIZE + 10]);
        let mut transfer = backend.open_asset_stream(1).await.unwrap();
        assert_eq!(transfer.content_length, None);
        assert_eq!(transfer.body.next().await.unwrap().unwrap().len(), CHUNK_SIZE);
        assert_eq!(*transfer.body.next().await.unwrap().unwrap_err(), ErrorKind::Interrupted);
        assert!(transfer.body.next().await.is_none());
    }
}
