//! Motion sensor collaborator
//!
//! The accelerometer is configured for a latched threshold interrupt: one
//! edge posts the wake signal, and the latch must be cleared once per
//! handled wake or no further motion wakes arrive. Register programming is
//! board-layer code; the orchestrator only needs the re-arm call.

/// Accelerometer wake collaborator
pub trait MotionSensor {
    /// Clear the latched threshold interrupt, re-arming the wake edge
    fn clear_interrupt(&mut self);
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::MotionSensor;

    /// Mock motion sensor counting interrupt clears
    #[derive(Debug, Default)]
    pub struct MockMotion {
        pub clear_count: u32,
    }

    impl MotionSensor for MockMotion {
        fn clear_interrupt(&mut self) {
            self.clear_count += 1;
        }
    }
}
