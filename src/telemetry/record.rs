//! Tracker record codec
//!
//! Fixed 14-byte uplink payload. The field order is the wire contract with
//! the receiving application and must not change:
//!
//! | bytes | field     | encoding                          |
//! |-------|-----------|-----------------------------------|
//! | 0-3   | latitude  | i32 LE, decimal degrees x 100000  |
//! | 4-7   | longitude | i32 LE, decimal degrees x 100000  |
//! | 8-9   | altitude  | i16 LE, meters                    |
//! | 10    | hdop      | u8, raw receiver units            |
//! | 11    | battery   | u8, percent 0-100                 |
//! | 12-13 | speed     | u16 LE, m/s truncated             |
//!
//! Both directions are total: the payload is always locally produced, so
//! there is no validation or checksum here. Frame integrity is the radio
//! stack's job.

/// Serialized size of a tracker record in bytes
pub const RECORD_LEN: usize = 14;

/// The unit exchanged with the radio layer
///
/// One mutable record lives in the orchestrator and is updated in place at
/// each fix attempt; fields not produced in a given acquisition window keep
/// their previous value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrackerRecord {
    /// Latitude, decimal degrees x 100000 (1e-5 degree, ~1.1 m at the equator)
    pub latitude: i32,
    /// Longitude, decimal degrees x 100000
    pub longitude: i32,
    /// Altitude in meters
    ///
    /// Deliberately narrow: values beyond +/-32767 m wrap on the wire. Kept
    /// for compatibility with the receiving application.
    pub altitude: i16,
    /// Horizontal dilution of precision, raw receiver units
    pub hdop: u8,
    /// Battery charge percentage, 0-100
    pub battery: u8,
    /// Ground speed in m/s, truncated to integer
    pub speed: u16,
}

impl TrackerRecord {
    /// Serialize into the fixed wire layout
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[0..4].copy_from_slice(&self.latitude.to_le_bytes());
        buf[4..8].copy_from_slice(&self.longitude.to_le_bytes());
        buf[8..10].copy_from_slice(&self.altitude.to_le_bytes());
        buf[10] = self.hdop;
        buf[11] = self.battery;
        buf[12..14].copy_from_slice(&self.speed.to_le_bytes());
        buf
    }

    /// Deserialize from the fixed wire layout
    ///
    /// Latitude/longitude sign-extend from byte 3 of their groups; altitude
    /// sign-extends from its high byte (bit 15 of the reconstruction equals
    /// bit 7 of the second byte).
    pub fn decode(buf: &[u8; RECORD_LEN]) -> Self {
        Self {
            latitude: i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            longitude: i32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            altitude: i16::from_le_bytes([buf[8], buf[9]]),
            hdop: buf[10],
            battery: buf[11],
            speed: u16::from_le_bytes([buf[12], buf[13]]),
        }
    }

    /// Store a position given in decimal degrees, quantizing to 1e-5 degree
    ///
    /// Fractional loss from the quantization is accepted; truncation is
    /// toward zero.
    pub fn set_position_degrees(&mut self, lat: f64, lon: f64) {
        self.latitude = (lat * 100_000.0) as i32;
        self.longitude = (lon * 100_000.0) as i32;
    }

    /// Store an altitude in meters, truncating toward zero
    ///
    /// Keeps the low 16 bits of the integer meter count, matching the wire
    /// layout's narrow field.
    pub fn set_altitude_meters(&mut self, meters: f32) {
        self.altitude = (meters as i32) as i16;
    }

    /// Store a ground speed in m/s, truncating toward zero
    pub fn set_speed_mps(&mut self, mps: f32) {
        self.speed = if mps <= 0.0 { 0 } else { mps as u16 };
    }

    /// Latitude in decimal degrees
    pub fn latitude_degrees(&self) -> f64 {
        self.latitude as f64 / 100_000.0
    }

    /// Longitude in decimal degrees
    pub fn longitude_degrees(&self) -> f64 {
        self.longitude as f64 / 100_000.0
    }
}
