//! Device drivers and sensor collaborator traits
//!
//! - `gps`: NMEA GPS driver over a `UartInterface`
//! - `battery`: battery monitor trait plus the voltage-to-percent curve
//! - `motion`: accelerometer wake collaborator (latched interrupt re-arm)

pub mod battery;
pub mod gps;
pub mod motion;

pub use battery::BatteryMonitor;
pub use gps::GpsDriver;
pub use motion::MotionSensor;
