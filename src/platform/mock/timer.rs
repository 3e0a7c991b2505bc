//! Mock timer implementation for testing
//!
//! Simulated monotonic clock. Delays advance the clock instead of sleeping,
//! so deadline behavior (GPS window, duty-cycle spacing) is deterministic
//! and tests run instantly.

use crate::platform::{traits::TimerInterface, Result};
use core::cell::Cell;
use std::rc::Rc;

/// Mock timer backed by a shared simulated clock
///
/// Cloning produces a handle onto the same clock, so a test can hold one
/// clone to advance time while the code under test owns another.
#[derive(Debug, Clone)]
pub struct MockTimer {
    now_us: Rc<Cell<u64>>,
}

impl MockTimer {
    /// Create a new mock timer starting at t=0
    pub fn new() -> Self {
        Self {
            now_us: Rc::new(Cell::new(0)),
        }
    }

    /// Advance the simulated clock by `ms` milliseconds
    pub fn advance_ms(&self, ms: u64) {
        self.now_us.set(self.now_us.get() + ms * 1000);
    }
}

impl Default for MockTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerInterface for MockTimer {
    fn delay_us(&mut self, us: u32) -> Result<()> {
        self.now_us.set(self.now_us.get().wrapping_add(us as u64));
        Ok(())
    }

    fn now_us(&self) -> u64 {
        self.now_us.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_timer_delay_advances_clock() {
        let mut timer = MockTimer::new();
        assert_eq!(timer.now_us(), 0);

        timer.delay_us(1000).unwrap();
        assert_eq!(timer.now_us(), 1000);

        timer.delay_ms(5).unwrap();
        assert_eq!(timer.now_ms(), 6);
    }

    #[test]
    fn test_mock_timer_shared_clock() {
        let mut timer = MockTimer::new();
        let handle = timer.clone();

        handle.advance_ms(250);
        assert_eq!(timer.now_ms(), 250);

        timer.delay_ms(50).unwrap();
        assert_eq!(handle.now_ms(), 300);
    }
}
