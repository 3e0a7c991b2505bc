//! GPS device driver (NMEA protocol)
//!
//! Feeds serial bytes through the `nmea0183` parser and tracks the four
//! quantities the uplink report needs: position, altitude, speed and HDOP.
//!
//! Freshness is tracked per acquisition window: `begin_window()` clears all
//! four fields, and only sentences that decode as both fresh and valid
//! repopulate them. A GGA without a fix (parser yields no data) or a void
//! RMC is discarded, never accumulated. The sentence grammar itself is the
//! parser crate's problem; this driver only merges field updates.

use crate::platform::{traits::UartInterface, Result};
use nmea0183::{ParseResult, Parser};

/// 1 knot in meters per second
const KNOTS_TO_MPS: f32 = 0.514_444;

/// Fields observed since the current window opened
///
/// `None` means "not seen since `begin_window()`", not "invalid": a field
/// that never arrives within the window simply stays empty and the consumer
/// decides what that means.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowFields {
    /// Position in decimal degrees (latitude, longitude)
    pub position: Option<(f64, f64)>,
    /// Altitude above sea level in meters
    pub altitude_m: Option<f32>,
    /// Ground speed in meters per second
    pub speed_mps: Option<f32>,
    /// Horizontal dilution of precision, raw receiver units
    pub hdop: Option<f32>,
}

impl WindowFields {
    /// True once all four tracked quantities have been observed
    pub fn is_complete(&self) -> bool {
        self.position.is_some()
            && self.altitude_m.is_some()
            && self.speed_mps.is_some()
            && self.hdop.is_some()
    }

    /// True if a valid position was observed this window
    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }
}

/// GPS device driver
///
/// Generic over any `UartInterface`, so host tests drive it from a mock
/// UART with injected sentences.
///
/// Field sources:
/// - **GGA**: position, altitude, HDOP (only when the receiver reports a fix)
/// - **RMC**: speed (only when the sentence is not void)
/// - **VTG**: speed (backup source)
pub struct GpsDriver<U: UartInterface> {
    uart: U,
    parser: Parser,
    window: WindowFields,
}

impl<U: UartInterface> GpsDriver<U> {
    /// Create a new GPS driver
    pub fn new(uart: U) -> Self {
        Self {
            uart,
            parser: Parser::new(),
            window: WindowFields::default(),
        }
    }

    /// Get mutable reference to the UART interface
    ///
    /// Used for vendor-specific initialization commands and for injecting
    /// test data.
    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }

    /// Open a fresh acquisition window, discarding all previously observed fields
    pub fn begin_window(&mut self) {
        self.window = WindowFields::default();
    }

    /// Fields observed since the window opened
    pub fn window_fields(&self) -> WindowFields {
        self.window
    }

    /// Drain pending UART bytes through the sentence parser
    ///
    /// Returns true if at least one tracked field was updated. Reads until
    /// the UART reports no more pending data.
    ///
    /// # Errors
    ///
    /// Returns an error if UART communication fails; fields accumulated so
    /// far remain observed.
    pub fn service(&mut self) -> Result<bool> {
        let mut updated = false;
        let mut buf = [0u8; 64];

        loop {
            let count = self.uart.read(&mut buf)?;
            if count == 0 {
                break;
            }

            for &byte in buf.iter().take(count) {
                if let Some(result) = self.parser.parse_from_byte(byte) {
                    updated |= self.apply(result);
                }
            }
        }

        Ok(updated)
    }

    /// Merge one decoded sentence into the window state
    ///
    /// A sentence that parsed but carries no fix data (e.g. GGA while
    /// searching, void RMC) updates nothing.
    fn apply(&mut self, result: core::result::Result<ParseResult, &'static str>) -> bool {
        match result {
            Ok(ParseResult::GGA(Some(gga))) => {
                self.window.position = Some((gga.latitude.as_f64(), gga.longitude.as_f64()));
                self.window.altitude_m = Some(gga.altitude.meters);
                self.window.hdop = Some(gga.hdop);
                true
            }
            Ok(ParseResult::RMC(Some(rmc))) => {
                self.window.speed_mps = Some(rmc.speed.as_knots() * KNOTS_TO_MPS);
                true
            }
            Ok(ParseResult::VTG(Some(vtg))) => {
                self.window.speed_mps = Some(vtg.speed.as_knots() * KNOTS_TO_MPS);
                true
            }
            // Valid sentence without usable data, other sentence types, or
            // a corrupt sentence: discard
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockUart;
    use crate::platform::traits::UartConfig;

    const GGA: &[u8] = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
    const RMC: &[u8] = b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n";

    fn driver() -> GpsDriver<MockUart> {
        GpsDriver::new(MockUart::new(UartConfig::gps_default()))
    }

    #[test]
    fn test_empty_uart_yields_nothing() {
        let mut gps = driver();
        assert!(!gps.service().unwrap());
        assert_eq!(gps.window_fields(), WindowFields::default());
    }

    #[test]
    fn test_gga_fills_position_altitude_hdop() {
        let mut gps = driver();
        gps.uart_mut().inject_rx_data(GGA);

        assert!(gps.service().unwrap());
        let fields = gps.window_fields();

        let (lat, lon) = fields.position.expect("position");
        assert!((lat - 48.1173).abs() < 0.001);
        assert!((lon - 11.516_666).abs() < 0.001);
        assert!((fields.altitude_m.unwrap() - 545.4).abs() < 0.1);
        assert!((fields.hdop.unwrap() - 0.9).abs() < 0.01);
        // No speed source yet
        assert!(fields.speed_mps.is_none());
        assert!(!fields.is_complete());
    }

    #[test]
    fn test_rmc_fills_speed_completing_window() {
        let mut gps = driver();
        gps.uart_mut().inject_rx_data(GGA);
        gps.uart_mut().inject_rx_data(RMC);

        assert!(gps.service().unwrap());
        let fields = gps.window_fields();

        // 22.4 knots -> ~11.52 m/s
        assert!((fields.speed_mps.unwrap() - 11.52).abs() < 0.1);
        assert!(fields.is_complete());
    }

    #[test]
    fn test_begin_window_discards_previous_fields() {
        let mut gps = driver();
        gps.uart_mut().inject_rx_data(GGA);
        gps.service().unwrap();
        assert!(gps.window_fields().has_position());

        gps.begin_window();
        assert_eq!(gps.window_fields(), WindowFields::default());
    }

    #[test]
    fn test_invalid_sentence_is_discarded() {
        let mut gps = driver();
        gps.uart_mut().inject_rx_data(b"GARBAGE DATA\r\n");

        assert!(!gps.service().unwrap());
        assert!(!gps.window_fields().has_position());
    }

    #[test]
    fn test_vtg_is_backup_speed_source() {
        let mut gps = driver();
        // 15.2 knots -> ~7.82 m/s
        gps.uart_mut()
            .inject_rx_data(b"$GPVTG,089.0,T,,,15.2,N,,,A*12\r\n");

        assert!(gps.service().unwrap());
        assert!((gps.window_fields().speed_mps.unwrap() - 7.82).abs() < 0.1);
    }
}
