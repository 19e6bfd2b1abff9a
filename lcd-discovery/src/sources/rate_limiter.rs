//! Per-source request pacing
//!
//! Two limits hold at the same time:
//! - at most `max_requests` per fixed window (count resets at the window boundary)
//! - at least `min_interval` between consecutive requests
//!
//! [`RateLimiter::acquire`] blocks the caller until both allow another
//! request. Requests are never dropped; waiters are served in arrival order
//! because the window lock (a FIFO tokio mutex) is held across the wait.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter as Gcra};
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Default)]
struct WindowState {
    window_start: Option<Instant>,
    count: u32,
}

/// Rate limiter owned by a single source adapter
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    min_interval: Duration,
    state: Mutex<WindowState>,
    /// GCRA pacer enforcing `min_interval` (burst of one)
    pacer: Option<DefaultDirectRateLimiter>,
}

impl RateLimiter {
    /// Create a limiter
    ///
    /// A zero `max_requests` or zero `window` disables the window limit; a
    /// zero `min_interval` disables pacing.
    pub fn new(max_requests: u32, window: Duration, min_interval: Duration) -> Self {
        let pacer = Quota::with_period(min_interval)
            .map(|quota| Gcra::direct(quota.allow_burst(NonZeroU32::MIN)));

        Self {
            max_requests,
            window,
            min_interval,
            state: Mutex::new(WindowState::default()),
            pacer,
        }
    }

    /// Only a minimum spacing between requests
    pub fn with_min_interval(min_interval: Duration) -> Self {
        Self::new(0, Duration::ZERO, min_interval)
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    fn window_limited(&self) -> bool {
        self.max_requests > 0 && !self.window.is_zero()
    }

    /// Wait until another request is allowed, then record it
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;

        if self.window_limited() {
            let now = Instant::now();
            match state.window_start {
                Some(start) if now.duration_since(start) < self.window => {}
                _ => {
                    state.window_start = Some(now);
                    state.count = 0;
                }
            }

            if state.count >= self.max_requests {
                if let Some(start) = state.window_start {
                    let wait = self.window.saturating_sub(now.duration_since(start));
                    tracing::debug!("Rate limiting: window full, waiting {:?}", wait);
                    tokio::time::sleep(wait).await;
                }
                state.window_start = Some(Instant::now());
                state.count = 0;
            }
        }

        if let Some(pacer) = &self.pacer {
            pacer.until_ready().await;
        }

        state.count += 1;
    }

    /// Requests recorded in the current window
    pub async fn requests_in_window(&self) -> u32 {
        self.state.lock().await.count
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_requests", &self.max_requests)
            .field("window", &self.window)
            .field("min_interval", &self.min_interval)
            .finish()
    }
}
