//! Uplink path
//!
//! Everything between a wake token and a frame on the air:
//!
//! - `radio`: the LoRaWAN stack collaborator surface (join state, send,
//!   background IRQ servicing) and the serial exclusion lock
//! - `status`: line-oriented status side-channel (display/BLE mirror)
//! - `acquisition`: the bounded GPS acquisition window
//! - `orchestrator`: the state machine tying it all together

pub mod acquisition;
pub mod orchestrator;
pub mod radio;
pub mod status;

pub use acquisition::{acquire_fix, AcquisitionOutcome, FixFields};
pub use orchestrator::UplinkOrchestrator;
pub use radio::{JoinMode, RadioInterface, SendError, SerialLock};
pub use status::{StatusBuffer, StatusSink};
