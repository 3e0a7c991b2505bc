//! Battery level functions
//!
//! The ADC plumbing lives in the board layer; the core only needs a
//! percentage. The millivolt-to-percent curve is the usual LiPo two-segment
//! approximation: flat-dead below 3.3 V, a steep ramp to 3.6 V, then a
//! shallow ramp to full.

use crate::platform::Result;

/// Battery monitor collaborator
pub trait BatteryMonitor {
    /// Current charge as a percentage, 0-100
    fn read_percentage(&mut self) -> Result<u8>;
}

/// Convert a battery voltage in millivolts to a charge percentage (0-100)
pub fn mv_to_percent(mv: f32) -> u8 {
    if mv < 3300.0 {
        return 0;
    }

    if mv < 3600.0 {
        return ((mv - 3300.0) / 30.0) as u8;
    }

    let percent = 10.0 + (mv - 3600.0) * 0.15;
    if percent > 100.0 {
        100
    } else {
        percent as u8
    }
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::BatteryMonitor;
    use crate::platform::{PlatformError, Result};

    /// Mock battery monitor returning a fixed percentage
    #[derive(Debug)]
    pub struct MockBattery {
        percent: u8,
        fail: bool,
    }

    impl MockBattery {
        /// Create a mock reporting `percent`
        pub fn new(percent: u8) -> Self {
            Self {
                percent,
                fail: false,
            }
        }

        /// Make every subsequent read fail
        pub fn set_failing(&mut self, fail: bool) {
            self.fail = fail;
        }
    }

    impl BatteryMonitor for MockBattery {
        fn read_percentage(&mut self) -> Result<u8> {
            if self.fail {
                return Err(PlatformError::ResourceUnavailable);
            }
            Ok(self.percent)
        }
    }
}
