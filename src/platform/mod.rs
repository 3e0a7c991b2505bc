//! Platform abstraction layer
//!
//! Hardware access used by the tracker core goes through the traits in this
//! module so that every state machine in the crate runs unmodified against
//! the mock implementations in host tests.

pub mod error;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{PlatformError, Result};
pub use traits::{TimerInterface, UartConfig, UartInterface};
