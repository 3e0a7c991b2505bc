//! Timer interface trait
//!
//! Monotonic time source plus a cooperative delay. The acquisition window
//! and the duty-cycle gate only ever compare `now_ms` values, so the mock
//! implementation can drive every timing property deterministically.

use crate::platform::Result;

/// Monotonic timer interface
pub trait TimerInterface {
    /// Delay for the given number of microseconds
    fn delay_us(&mut self, us: u32) -> Result<()>;

    /// Delay for the given number of milliseconds
    fn delay_ms(&mut self, ms: u32) -> Result<()> {
        self.delay_us(ms.saturating_mul(1000))
    }

    /// Microseconds since an arbitrary epoch (monotonic, never wraps in practice)
    fn now_us(&self) -> u64;

    /// Milliseconds since an arbitrary epoch
    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }
}
