//! Access to the upstream repository host.
//!
//! Everything that talks to the private repository lives behind the
//! [`UpstreamBackend`] trait: listing releases, fetching a single release by
//! tag, streaming an asset binary, and a cheap connectivity probe. The types
//! returned are upstream-shaped ([`RawRelease`], [`RawAsset`]) and are never
//! meant to reach a public caller unfiltered.

pub mod backend;
mod credential;
pub mod error;
mod models;

pub use crate::backend::UpstreamBackend;
pub use crate::credential::Credential;
pub use crate::models::{AssetStream, ByteStream, CHUNK_SIZE, RawAsset, RawRelease};
use std::sync::Arc;

pub type BackendHandle = Arc<dyn UpstreamBackend + Send + Sync>;
