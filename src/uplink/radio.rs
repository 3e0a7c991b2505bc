//! Radio collaborator surface
//!
//! The LoRaWAN MAC/PHY stack is an external black box. The orchestrator only
//! consumes join state, the device address and a synchronous frame send; a
//! background task keeps the stack's interrupt queue serviced. That pump and
//! the GPS acquisition window share one serial resource, so both contend on
//! [`SerialLock`] and whoever holds it has exclusive use.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

/// Mutual-exclusion token for the shared serial/radio-servicing resource
///
/// Held by the radio IRQ pump for each servicing step and by the GPS
/// acquisition window for its whole duration. Lock guards are RAII: release
/// happens on every exit path, including timeout.
pub type SerialLock = Mutex<CriticalSectionRawMutex, ()>;

/// Network join method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JoinMode {
    /// Over-the-air activation
    Otaa,
    /// Activation by personalization
    Abp,
}

/// Frame transmission failure, as reported by the radio stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// Stack is busy (regulatory duty cycle or pending transaction)
    Busy,
    /// No network session established
    NotJoined,
    /// Any other stack-level failure
    Failed,
}

impl SendError {
    /// Numeric code mirrored to the status channel
    pub fn code(&self) -> u8 {
        match self {
            SendError::Busy => 1,
            SendError::NotJoined => 2,
            SendError::Failed => 3,
        }
    }
}

/// Radio setup failure at boot
///
/// Surfaced once to the status channel. Radio failure is fatal for uplinks;
/// the rest of the system keeps running in a degraded mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioInitError {
    /// Radio chip initialization failed
    HardwareInit,
    /// LoRaWAN stack initialization failed
    StackInit,
    /// Requested sub-band channel plan rejected
    SubBand,
    /// Background servicing task could not start
    TaskStart,
}

impl RadioInitError {
    /// Short human-readable form for the status channel (<= 31 chars)
    pub fn as_status_line(&self) -> &'static str {
        match self {
            RadioInitError::HardwareInit => "HW init failed",
            RadioInitError::StackInit => "LoRaWan failed",
            RadioInitError::SubBand => "Subband error",
            RadioInitError::TaskStart => "LoRa Task error",
        }
    }
}

/// LoRaWAN stack collaborator
///
/// Join/retransmission/channel-plan logic is entirely the stack's own; these
/// operations are consumed as-is.
pub trait RadioInterface {
    /// Start the network join handshake
    ///
    /// Called once at boot; completion is observed through `is_joined`, the
    /// stack retries on its own schedule.
    fn join(&mut self);

    /// True once a network session is established
    fn is_joined(&self) -> bool;

    /// 32-bit network device address (valid once joined)
    fn device_address(&self) -> u32;

    /// Join method this session used
    fn join_mode(&self) -> JoinMode;

    /// Send one frame; bounded by the stack's own timeout
    fn send(&mut self, payload: &[u8], confirmed: bool) -> Result<(), SendError>;

    /// Service one step of the stack's internal interrupt queue
    fn process_irqs(&mut self);
}

/// Background radio IRQ pump
///
/// Runs forever, servicing the stack's interrupt queue every
/// `IRQ_PUMP_PERIOD_MS`. Each step takes the serial lock, so the pump is
/// naturally suspended for the whole of a GPS acquisition window.
#[cfg(feature = "embassy")]
pub async fn radio_pump<R: RadioInterface>(lock: &SerialLock, radio: &mut R) -> ! {
    use embassy_time::{Duration, Timer};

    /// Spacing between servicing steps
    const IRQ_PUMP_PERIOD_MS: u64 = 10;

    loop {
        {
            let _guard = lock.lock().await;
            radio.process_irqs();
        }
        Timer::after(Duration::from_millis(IRQ_PUMP_PERIOD_MS)).await;
    }
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    //! Mock radio stack for host testing

    use super::{JoinMode, RadioInterface, SendError};
    use heapless::Vec;

    /// Frames the mock can hold for verification
    pub const MOCK_FRAME_CAPACITY: usize = 8;

    /// Mock LoRaWAN stack
    ///
    /// Starts un-joined; tests flip `set_joined` to simulate the join
    /// callback and may queue a failure for the next send.
    pub struct MockRadio {
        joined: bool,
        address: u32,
        mode: JoinMode,
        fail_next: Option<SendError>,
        /// Every frame handed to `send`, oldest first
        pub sent: Vec<Vec<u8, 64>, MOCK_FRAME_CAPACITY>,
        /// Number of `process_irqs` calls observed
        pub irq_steps: u32,
    }

    impl MockRadio {
        /// Create an un-joined mock with the given address-to-be
        pub fn new(address: u32) -> Self {
            Self {
                joined: false,
                address,
                mode: JoinMode::Otaa,
                fail_next: None,
                sent: Vec::new(),
                irq_steps: 0,
            }
        }

        /// Simulate join completion (or session loss)
        pub fn set_joined(&mut self, joined: bool) {
            self.joined = joined;
        }

        /// Make the next `send` fail with `err`
        pub fn fail_next_send(&mut self, err: SendError) {
            self.fail_next = Some(err);
        }

        /// Number of frames transmitted
        pub fn sent_count(&self) -> usize {
            self.sent.len()
        }
    }

    impl RadioInterface for MockRadio {
        fn join(&mut self) {
            // The mock network always accepts immediately
            self.joined = true;
        }

        fn is_joined(&self) -> bool {
            self.joined
        }

        fn device_address(&self) -> u32 {
            self.address
        }

        fn join_mode(&self) -> JoinMode {
            self.mode
        }

        fn send(&mut self, payload: &[u8], _confirmed: bool) -> Result<(), SendError> {
            if !self.joined {
                return Err(SendError::NotJoined);
            }
            if let Some(err) = self.fail_next.take() {
                return Err(err);
            }
            let mut frame = Vec::new();
            frame.extend_from_slice(payload).ok();
            self.sent.push(frame).ok();
            Ok(())
        }

        fn process_irqs(&mut self) {
            self.irq_steps += 1;
        }
    }
}
