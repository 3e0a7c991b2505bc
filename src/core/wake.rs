//! Wake signal
//!
//! Single-slot event token connecting the interrupt/timer producers (motion
//! threshold, periodic timer, delayed-retry timer, class-switch confirmation)
//! to the one orchestrator task. The token carries no payload: it only means
//! "re-evaluate state", and every producer firing while a token is already
//! pending coalesces into that token.
//!
//! Built on `embassy_sync::signal::Signal`, which has exactly the required
//! {Empty, Signaled} semantics and is safe to signal from interrupt context.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Coalescing single-slot wake token
///
/// `post()` may be called from any context and never blocks or allocates.
/// `wait()` must only be called from the single orchestrator task.
pub struct WakeSignal {
    inner: Signal<CriticalSectionRawMutex, ()>,
}

impl WakeSignal {
    /// Create a new, empty wake signal (const, suitable for statics)
    pub const fn new() -> Self {
        Self {
            inner: Signal::new(),
        }
    }

    /// Post a wake token
    ///
    /// Empty -> Signaled; posting onto an already-signaled slot is a no-op.
    /// How many producers fired, and why, is intentionally discarded: the
    /// consumer re-reads all context fresh.
    pub fn post(&self) {
        self.inner.signal(());
    }

    /// Wait until a token is available and drain it
    ///
    /// Single consumer, exactly-once drain per token. Only returns a token
    /// posted after the previous drain.
    pub async fn wait(&self) {
        self.inner.wait().await;
    }

    /// Non-blocking drain attempt
    ///
    /// Returns true if a token was pending (and is now consumed). The
    /// orchestrator uses this once after each handled cycle to absorb a
    /// token posted by a completion callback during the handling itself.
    pub fn try_take(&self) -> bool {
        self.inner.try_take().is_some()
    }

    /// True if a token is currently pending
    pub fn pending(&self) -> bool {
        self.inner.signaled()
    }

    /// Wait for a token with an upper bound
    ///
    /// Returns false if the timeout elapsed with no token posted.
    #[cfg(feature = "embassy")]
    pub async fn wait_for(&self, timeout: embassy_time::Duration) -> bool {
        embassy_time::with_timeout(timeout, self.inner.wait())
            .await
            .is_ok()
    }
}

impl Default for WakeSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_then_take() {
        let wake = WakeSignal::new();
        assert!(!wake.pending());

        wake.post();
        assert!(wake.pending());
        assert!(wake.try_take());
        assert!(!wake.pending());
    }

    #[test]
    fn test_posts_coalesce_to_one_token() {
        let wake = WakeSignal::new();

        for _ in 0..5 {
            wake.post();
        }

        // Five posts yield exactly one token
        assert!(wake.try_take());
        assert!(!wake.try_take());
        assert!(!wake.pending());
    }

    #[tokio::test]
    async fn test_wait_returns_posted_token() {
        let wake = WakeSignal::new();
        wake.post();

        wake.wait().await;
        // Drained: a second consumer attempt finds nothing
        assert!(!wake.try_take());
    }

    #[tokio::test]
    async fn test_wait_blocks_when_empty() {
        let wake = WakeSignal::new();
        wake.post();
        wake.wait().await;

        // No further token: wait() must not complete
        let blocked = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            wake.wait(),
        )
        .await;
        assert!(blocked.is_err());
    }

    #[tokio::test]
    async fn test_post_during_handling_is_absorbed_by_extra_drain() {
        let wake = WakeSignal::new();

        wake.post();
        wake.wait().await;

        // A completion callback fires while the previous token is handled
        wake.post();

        // The post-cycle drain absorbs it instead of leaving it to trigger
        // a spurious extra cycle
        assert!(wake.try_take());
        assert!(!wake.pending());
    }
}
