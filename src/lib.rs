#![cfg_attr(not(test), no_std)]

//! trail-beacon - battery-powered LoRaWAN GPS tracker firmware core
//!
//! The tracker wakes on motion or a timer, acquires a GPS fix under a bounded
//! time budget and transmits a compact 14-byte report over a duty-cycle
//! constrained LoRaWAN link. This library holds everything with real
//! state-machine or concurrency requirements; the radio stack, the sentence
//! parser internals and board bring-up live behind collaborator traits.

// The mocks use std collections; the crate is otherwise no_std outside of
// cfg(test), so std has to be linked explicitly for hosted mock builds.
#[cfg(any(test, feature = "mock"))]
extern crate std;

// Platform abstraction layer (UART, timer, mocks for host testing)
pub mod platform;

// Cross-cutting primitives (logging, wake signal, duty-cycle gate)
pub mod core;

// Device drivers and sensor collaborator traits
pub mod devices;

// Uplink payload codec
pub mod telemetry;

// Radio collaborator surface, acquisition window and the orchestrator
pub mod uplink;
