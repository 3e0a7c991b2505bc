//! Cross-cutting primitives
//!
//! - `logging`: unified log macros across embedded and host targets
//! - `wake`: the coalescing single-slot wake signal
//! - `duty_cycle`: minimum-spacing gate between uplinks

pub mod duty_cycle;
pub mod logging;
pub mod wake;

pub use duty_cycle::{DutyCycleGate, GateStatus};
pub use wake::WakeSignal;
