//! Sliding-window admission guard.
//!
//! One global window per [`LimitClass`], shared by every caller. Each window
//! remembers when it last admitted requests; a request is admitted while
//! fewer than the class maximum were admitted in the trailing minute.
//! Rejected requests are not recorded.

use crate::error::{ErrorKind, Result};
use derive_more::Display;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Length of the sliding window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Which guarded operation a request belongs to.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitClass {
    #[display("listing")]
    Listing,
    #[display("download")]
    Download,
}

impl LimitClass {
    /// Admissions allowed per [`WINDOW`].
    pub const fn max_per_window(self) -> usize {
        match self {
            Self::Listing => 30,
            Self::Download => 10,
        }
    }
}

#[derive(Debug)]
struct RateWindow {
    max: usize,
    timestamps: VecDeque<Instant>,
}

impl RateWindow {
    fn new(max: usize) -> Self {
        Self {
            max,
            timestamps: VecDeque::with_capacity(max),
        }
    }

    fn admit(&mut self, now: Instant, window: Duration) -> bool {
        while let Some(oldest) = self.timestamps.front() {
            if now.saturating_duration_since(*oldest) < window {
                break;
            }
            self.timestamps.pop_front();
        }
        if self.timestamps.len() >= self.max {
            return false;
        }
        self.timestamps.push_back(now);
        true
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    listing: Mutex<RateWindow>,
    download: Mutex<RateWindow>,
}

impl RateLimiter {
    /// A limiter with the given maximum per class over `window`.
    pub fn with_limits(listing: usize, download: usize, window: Duration) -> Self {
        Self {
            window,
            listing: Mutex::new(RateWindow::new(listing)),
            download: Mutex::new(RateWindow::new(download)),
        }
    }

    /// Record and admit a request of this class, or reject it without
    /// recording anything.
    pub async fn admit(&self, class: LimitClass) -> bool {
        let window = match class {
            LimitClass::Listing => &self.listing,
            LimitClass::Download => &self.download,
        };
        window.lock().await.admit(Instant::now(), self.window)
    }

    /// [`admit()`](Self::admit), as an error.
    pub async fn check(&self, class: LimitClass) -> Result<()> {
        if !self.admit(class).await {
            tracing::warn!(%class, "Rate limit exceeded");
            exn::bail!(ErrorKind::RateLimitExceeded(class));
        }
        Ok(())
    }
}
impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_limits(
            LimitClass::Listing.max_per_window(),
            LimitClass::Download.max_per_window(),
            WINDOW,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LimitClass::Listing, 30)]
    #[case(LimitClass::Download, 10)]
    #[tokio::test(start_paused = true)]
    async fn test_rejects_over_limit(#[case] class: LimitClass, #[case] max: usize) {
        let limiter = RateLimiter::default();
        for _ in 0..max {
            assert!(limiter.admit(class).await);
        }
        assert!(!limiter.admit(class).await);
        assert_eq!(*limiter.check(class).await.unwrap_err(), ErrorKind::RateLimitExceeded(class));
    }

    #[tokio::test(start_paused = true)]
    async fn test_classes_are_independent() {
        let limiter = RateLimiter::with_limits(1, 1, WINDOW);
        assert!(limiter.admit(LimitClass::Listing).await);
        assert!(!limiter.admit(LimitClass::Listing).await);
        assert!(limiter.admit(LimitClass::Download).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides_from_oldest() {
        let limiter = RateLimiter::with_limits(2, 2, WINDOW);
        assert!(limiter.admit(LimitClass::Listing).await);
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(limiter.admit(LimitClass::Listing).await);
        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(!limiter.admit(LimitClass::Listing).await);
        // Exactly 60 s after the first admission its slot frees up.
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(limiter.admit(LimitClass::Listing).await);
        assert!(!limiter.admit(LimitClass::Listing).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejections_not_recorded() {
        let limiter = RateLimiter::with_limits(1, 1, WINDOW);
        assert!(limiter.admit(LimitClass::Download).await);
        for _ in 0..5 {
            tokio::time::advance(Duration::from_secs(10)).await;
            assert!(!limiter.admit(LimitClass::Download).await);
        }
        // Rejections at 10..50 s don't push the window out.
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(limiter.admit(LimitClass::Download).await);
    }

    #[test]
    fn test_zero_limit_rejects_everything() {
        let mut window = RateWindow::new(0);
        assert!(!window.admit(Instant::now(), WINDOW));
    }
}
