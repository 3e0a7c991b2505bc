//! GPS acquisition window
//!
//! Bounded-time sampling loop: poll serial bytes through the GPS driver
//! until position, altitude, speed and HDOP have all been observed once, or
//! the deadline elapses. The deadline is a hard ceiling, not a hint; the
//! window returns control at the deadline even with zero fields captured.
//!
//! The window and the radio IRQ pump share one serial resource, so the loop
//! runs entirely under the [`SerialLock`] guard. The guard is scoped to this
//! function and therefore released on every exit path.

use crate::devices::gps::GpsDriver;
use crate::platform::traits::{TimerInterface, UartInterface};
use crate::uplink::radio::SerialLock;

pub use crate::devices::gps::WindowFields as FixFields;

/// Reference acquisition deadline
pub const ACQUISITION_DEADLINE_MS: u64 = 10_000;

/// Idle delay between polls when no complete sentence arrived
const POLL_IDLE_MS: u32 = 10;

/// Result of one acquisition window
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AcquisitionOutcome {
    /// All four tracked fields observed before the deadline
    Complete(FixFields),
    /// Deadline elapsed; carries whatever was observed (possibly nothing)
    Timeout(FixFields),
}

impl AcquisitionOutcome {
    /// Fields observed during the window, complete or not
    pub fn fields(&self) -> &FixFields {
        match self {
            AcquisitionOutcome::Complete(f) | AcquisitionOutcome::Timeout(f) => f,
        }
    }

    /// True if a valid position was observed
    pub fn has_position(&self) -> bool {
        self.fields().has_position()
    }
}

/// Run one GPS acquisition window
///
/// Holds the serial lock for the full duration, suspending the radio IRQ
/// pump. UART errors inside the window are logged and skipped; acquisition
/// failure is expressed through the returned fields, never retried here.
/// Retry cadence belongs to the orchestrator.
pub async fn acquire_fix<U: UartInterface, T: TimerInterface>(
    gps: &mut GpsDriver<U>,
    timer: &mut T,
    lock: &SerialLock,
    deadline_ms: u64,
) -> AcquisitionOutcome {
    // Radio servicing is suspended from here until return
    let _guard = lock.lock().await;

    gps.begin_window();
    let opened_ms = timer.now_ms();

    loop {
        if let Err(_e) = gps.service() {
            crate::log_warn!("GPS: UART error during window: {:?}", _e);
        }

        let fields = gps.window_fields();
        if fields.is_complete() {
            return AcquisitionOutcome::Complete(fields);
        }
        if timer.now_ms().saturating_sub(opened_ms) >= deadline_ms {
            return AcquisitionOutcome::Timeout(fields);
        }

        let _ = timer.delay_ms(POLL_IDLE_MS);
    }
}
