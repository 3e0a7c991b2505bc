//! Mock platform implementations for host testing

pub mod timer;
pub mod uart;

pub use timer::MockTimer;
pub use uart::MockUart;
