use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use vitrine_filter::PublicRelease;

/// A cached listing and the moment it was fetched.
///
/// Payload and timestamp only ever exist together. Cloning is cheap; clones
/// share the payload.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    payload: Arc<Vec<PublicRelease>>,
    fetched_at: Instant,
}

impl CacheEntry {
    pub(crate) fn new(payload: Vec<PublicRelease>) -> Self {
        Self {
            payload: Arc::new(payload),
            fetched_at: Instant::now(),
        }
    }

    pub fn payload(&self) -> &Arc<Vec<PublicRelease>> {
        &self.payload
    }

    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    pub(crate) fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}
