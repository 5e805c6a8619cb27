//! In-memory cache for the public release listing.
//!
//! There is exactly one slot: the most recent successful listing and when it
//! was fetched. Nothing survives a restart and nothing is shared between
//! processes. Misses are repopulated by the caller; two concurrent misses
//! both fetch and the last `put()` wins.

mod entry;

pub use crate::entry::CacheEntry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use vitrine_filter::PublicRelease;

/// How long a fetched listing is served before upstream is asked again.
pub const RELEASE_TTL: Duration = Duration::from_secs(5 * 60);

/// Single-slot, time-expiring cache of the projected release list.
///
/// # Examples
///
/// ```
/// use vitrine_cache::ReleaseCache;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache = ReleaseCache::default();
/// assert!(cache.get().await.is_none());
///
/// cache.put(Vec::new()).await;
/// assert!(cache.is_valid().await);
/// assert!(cache.get().await.is_some());
/// # }
/// ```
#[derive(Debug)]
pub struct ReleaseCache {
    ttl: Duration,
    slot: RwLock<Option<CacheEntry>>,
}

impl ReleaseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// The cached entry, if one exists and is younger than the TTL.
    ///
    /// An expired entry is left in place; it is simply not returned.
    pub async fn get(&self) -> Option<CacheEntry> {
        let slot = self.slot.read().await;
        match slot.as_ref() {
            Some(entry) if entry.is_fresh(self.ttl) => {
                tracing::debug!(age = ?entry.age(), "Release cache hit");
                Some(entry.clone())
            },
            Some(entry) => {
                tracing::debug!(age = ?entry.age(), "Release cache expired");
                None
            },
            None => None,
        }
    }

    /// Replace the slot wholesale, stamping it with the current time.
    /// Returns the stored payload.
    pub async fn put(&self, payload: Vec<PublicRelease>) -> Arc<Vec<PublicRelease>> {
        let entry = CacheEntry::new(payload);
        let payload = entry.payload().clone();
        tracing::debug!(releases = payload.len(), "Release cache populated");
        *self.slot.write().await = Some(entry);
        payload
    }

    /// `true` iff there is an entry and it is younger than the TTL.
    pub async fn is_valid(&self) -> bool {
        self.slot.read().await.as_ref().is_some_and(|entry| entry.is_fresh(self.ttl))
    }

    /// When the current entry (fresh or not) was fetched.
    pub async fn fetched_at(&self) -> Option<Instant> {
        self.slot.read().await.as_ref().map(CacheEntry::fetched_at)
    }
}
impl Default for ReleaseCache {
    fn default() -> Self {
        Self::new(RELEASE_TTL)
    }
}
