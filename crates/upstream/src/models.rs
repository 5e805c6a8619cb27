//! Upstream-shaped models.
//!
//! These mirror what the repository host returns, with every field we don't
//! strictly need left optional so that a sloppy upstream object degrades into
//! defaults instead of failing the whole listing. Deciding which fields are
//! *required* is the filter's job, not the decoder's.

use crate::error::Result;
use bytes::Bytes;
use futures::Stream;
use serde::Deserialize;
use std::fmt;
use std::pin::Pin;
use vitrine_asyncutils::Rechunk;

/// Asset bodies are forwarded in chunks of this many bytes.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// A forward-only stream of asset bytes. Consumed once, never restarted.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send + 'static>>;

/// A release as returned by the upstream host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawRelease {
    pub id: Option<u64>,
    pub tag_name: Option<String>,
    pub name: Option<String>,
    pub draft: Option<bool>,
    pub prerelease: Option<bool>,
    pub body: Option<String>,
    pub html_url: Option<String>,
    pub published_at: Option<String>,
    pub assets: Option<Vec<RawAsset>>,
}
impl RawRelease {
    /// Attached assets, unfiltered. Missing and `null` both read as empty.
    pub fn assets(&self) -> &[RawAsset] {
        self.assets.as_deref().unwrap_or_default()
    }

    pub fn is_draft(&self) -> bool {
        self.draft.unwrap_or(false)
    }

    /// Find an attached asset by exact (case-sensitive) file name.
    pub fn asset_named(&self, name: &str) -> Option<&RawAsset> {
        self.assets().iter().find(|asset| asset.name == name)
    }
}

/// A single downloadable file attached to a [`RawRelease`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawAsset {
    /// Upstream identifier, used to fetch the binary.
    pub id: u64,
    pub name: String,
    pub browser_download_url: Option<String>,
    pub size: Option<u64>,
    pub created_at: Option<String>,
}

/// An opened asset transfer.
///
/// The body is re-sliced into [`CHUNK_SIZE`] pieces as it arrives; nothing
/// beyond a single chunk is ever buffered.
pub struct AssetStream {
    /// Length announced by the upstream host, if any.
    pub content_length: Option<u64>,
    pub body: ByteStream,
}
impl AssetStream {
    pub fn new<S>(body: S, content_length: Option<u64>) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            content_length,
            body: Box::pin(Rechunk::new(body, CHUNK_SIZE)),
        }
    }
}
impl fmt::Debug for AssetStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetStream").field("content_length", &self.content_length).finish_non_exhaustive()
    }
}
