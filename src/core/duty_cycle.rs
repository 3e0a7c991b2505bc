//! Duty-cycle gate
//!
//! Enforces the application-level minimum spacing between uplinks. This is
//! independent of the regulatory duty-cycle limits the radio stack enforces
//! on its own; the gate exists so the tracker does not even attempt to queue
//! frames faster than the backend wants them.

/// Gate verdict for a transmission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateStatus {
    /// Enough time has passed; a transmission may proceed
    Clear,
    /// Inside the minimum interval; arm the delayed retry instead
    Busy,
}

/// Minimum-interval gate between transmissions
///
/// The gate itself never mutates state on a check: `last_send` moves only
/// when the orchestrator records an actual transmission via `mark_sent`, so
/// repeated Busy checks do not reset the window.
#[derive(Debug, Clone)]
pub struct DutyCycleGate {
    /// Timestamp of the last recorded transmission, ms
    last_send_ms: Option<u64>,
    /// Minimum spacing between transmissions, ms
    min_interval_ms: u64,
}

/// Default minimum spacing between position uplinks
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 10_000;

impl DutyCycleGate {
    /// Create a gate with the given minimum interval
    pub const fn new(min_interval_ms: u64) -> Self {
        Self {
            last_send_ms: None,
            min_interval_ms,
        }
    }

    /// Check whether a transmission may proceed at `now_ms`
    ///
    /// A gate that has never recorded a send is Clear.
    pub fn check(&self, now_ms: u64) -> GateStatus {
        match self.last_send_ms {
            None => GateStatus::Clear,
            Some(last) if now_ms.saturating_sub(last) >= self.min_interval_ms => GateStatus::Clear,
            Some(_) => GateStatus::Busy,
        }
    }

    /// Record a transmission at `now_ms`, opening a new minimum-interval window
    pub fn mark_sent(&mut self, now_ms: u64) {
        self.last_send_ms = Some(now_ms);
    }

    /// Timestamp of the last recorded transmission, if any
    pub fn last_send_ms(&self) -> Option<u64> {
        self.last_send_ms
    }

    /// Configured minimum interval
    pub fn min_interval_ms(&self) -> u64 {
        self.min_interval_ms
    }
}

impl Default for DutyCycleGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL_MS)
    }
}
