//! UART interface trait
//!
//! The GPS module talks NMEA over a plain serial line; this trait is the
//! seam between the driver and the concrete UART peripheral.

use crate::platform::Result;

/// UART parity setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartParity {
    None,
    Even,
    Odd,
}

/// UART stop bit setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartStopBits {
    One,
    Two,
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baud_rate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: u8,
    /// Parity setting
    pub parity: UartParity,
    /// Stop bits
    pub stop_bits: UartStopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: 8,
            parity: UartParity::None,
            stop_bits: UartStopBits::One,
        }
    }
}

impl UartConfig {
    /// Configuration for the GPS module serial line (9600 8N1)
    pub fn gps_default() -> Self {
        Self {
            baud_rate: 9600,
            ..Self::default()
        }
    }
}

/// UART peripheral interface
///
/// Reads are non-blocking: `read` returns however many bytes are currently
/// buffered, possibly zero.
pub trait UartInterface {
    /// Write bytes, returning the number of bytes accepted
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read into `buffer`, returning the number of bytes read (0 if none pending)
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Change the baud rate
    fn set_baud_rate(&mut self, baud: u32) -> Result<()>;

    /// True if at least one byte is pending in the receive buffer
    fn available(&self) -> bool;

    /// Block until all queued transmit data has left the peripheral
    fn flush(&mut self) -> Result<()>;
}
