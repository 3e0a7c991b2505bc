//! Uplink payload encoding

pub mod record;

pub use record::{TrackerRecord, RECORD_LEN};
