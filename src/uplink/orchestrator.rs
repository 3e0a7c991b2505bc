//! Uplink orchestrator
//!
//! The perpetual cycle driving the tracker:
//!
//! ```text
//! WaitingForEvent -> CheckingJoin -> CheckingDutyCycle -> AcquiringFix
//!        ^                                                     |
//!        |                                                     v
//!        +---------------- Transmitting <- Encoding <----------+
//! ```
//!
//! The wake signal is the sole driver of work. Each drained token causes one
//! pass: re-check join state, consult the duty-cycle gate, run the bounded
//! GPS window, refresh the battery reading, encode and send. A Busy gate
//! arms the one-shot delayed retry instead of dropping the intent to
//! transmit. Transmission happens even without a fresh fix, carrying the
//! last known position: the tracker always heartbeats, freshness is best
//! effort.

use core::fmt::Write;

use crate::core::duty_cycle::{DutyCycleGate, GateStatus};
use crate::core::wake::WakeSignal;
use crate::devices::battery::BatteryMonitor;
use crate::devices::gps::GpsDriver;
use crate::devices::motion::MotionSensor;
use crate::platform::traits::{TimerInterface, UartInterface};
use crate::telemetry::record::TrackerRecord;
use crate::uplink::acquisition::{acquire_fix, AcquisitionOutcome, ACQUISITION_DEADLINE_MS};
use crate::uplink::radio::{JoinMode, RadioInterface, SerialLock};
use crate::uplink::status::{StatusLine, StatusSink};

/// One-shot delayed-retry timer collaborator
///
/// Armed when the duty-cycle gate is Busy; on firing it posts the wake
/// signal. `restart` has stop-then-start semantics: re-arming while a retry
/// is outstanding restarts the delay, it never stacks a second timer.
pub trait RetryTimer {
    /// Arm the retry, restarting it if already armed
    fn restart(&mut self);
}

/// The uplink state machine
///
/// Owns all mutable tracker state (record, gate, join-announcement flag);
/// nothing here is global, so the whole machine runs against mocks on the
/// host.
pub struct UplinkOrchestrator<'a, R, U, T, B, M, S, RT>
where
    R: RadioInterface,
    U: UartInterface,
    T: TimerInterface,
    B: BatteryMonitor,
    M: MotionSensor,
    S: StatusSink,
    RT: RetryTimer,
{
    radio: R,
    gps: GpsDriver<U>,
    timer: T,
    battery: B,
    motion: M,
    status: S,
    retry: RT,
    wake: &'a WakeSignal,
    serial_lock: &'a SerialLock,
    record: TrackerRecord,
    gate: DutyCycleGate,
    /// Join announcement already emitted for this session
    join_announced: bool,
    /// Bypass the gate once (first-fix bootstrap after join)
    force_send: bool,
    acquisition_deadline_ms: u64,
}

impl<'a, R, U, T, B, M, S, RT> UplinkOrchestrator<'a, R, U, T, B, M, S, RT>
where
    R: RadioInterface,
    U: UartInterface,
    T: TimerInterface,
    B: BatteryMonitor,
    M: MotionSensor,
    S: StatusSink,
    RT: RetryTimer,
{
    /// Create an orchestrator with the reference timing (10 s gate, 10 s window)
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        radio: R,
        gps: GpsDriver<U>,
        timer: T,
        battery: B,
        motion: M,
        status: S,
        retry: RT,
        wake: &'a WakeSignal,
        serial_lock: &'a SerialLock,
    ) -> Self {
        Self {
            radio,
            gps,
            timer,
            battery,
            motion,
            status,
            retry,
            wake,
            serial_lock,
            record: TrackerRecord::default(),
            gate: DutyCycleGate::default(),
            join_announced: false,
            force_send: false,
            acquisition_deadline_ms: ACQUISITION_DEADLINE_MS,
        }
    }

    /// Override the duty-cycle gate (interval tuning)
    pub fn with_gate(mut self, gate: DutyCycleGate) -> Self {
        self.gate = gate;
        self
    }

    /// Override the GPS window deadline
    pub fn with_acquisition_deadline_ms(mut self, deadline_ms: u64) -> Self {
        self.acquisition_deadline_ms = deadline_ms;
        self
    }

    /// Run forever
    pub async fn run(&mut self) -> ! {
        loop {
            self.run_cycle().await;
        }
    }

    /// One full pass: wait for a wake token, handle it, absorb stragglers
    pub async fn run_cycle(&mut self) {
        self.wake.wait().await;
        self.handle_wake().await;

        // A completion callback (e.g. class-switch confirmation) may have
        // posted while we were handling; that intent is covered by the
        // transmission just made, so absorb the token instead of spinning
        // an immediate extra cycle.
        self.wake.try_take();
    }

    /// Current record contents (last encoded state)
    pub fn record(&self) -> &TrackerRecord {
        &self.record
    }

    /// Radio collaborator access (tests drive join state through this)
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// GPS driver access (tests inject NMEA through the mock UART)
    pub fn gps_mut(&mut self) -> &mut GpsDriver<U> {
        &mut self.gps
    }

    /// Status sink access
    pub fn status(&self) -> &S {
        &self.status
    }

    async fn handle_wake(&mut self) {
        // Re-arm the motion edge; required once per handled wake or the
        // latched interrupt never fires again
        self.motion.clear_interrupt();

        if !self.radio.is_joined() {
            crate::log_info!("Did not join network yet");
            self.status.push_line("No network yet");
            return;
        }

        if !self.join_announced {
            self.join_announced = true;
            // First-fix bootstrap: report immediately regardless of the gate
            self.force_send = true;
            self.announce_join();
        }

        let now_ms = self.timer.now_ms();
        if !self.force_send && self.gate.check(now_ms) == GateStatus::Busy {
            crate::log_info!("Less than gate interval since last uplink, send delayed");
            self.status.push_line("Send delayed 10 s");
            self.retry.restart();
            return;
        }
        self.force_send = false;

        let outcome = acquire_fix(
            &mut self.gps,
            &mut self.timer,
            self.serial_lock,
            self.acquisition_deadline_ms,
        )
        .await;
        self.apply_fix(&outcome);

        match self.battery.read_percentage() {
            Ok(percent) => self.record.battery = percent.min(100),
            // Keep the previous reading; battery is best-effort
            Err(_e) => crate::log_warn!("Battery read failed: {:?}", _e),
        }

        let frame = self.record.encode();
        match self.radio.send(&frame, false) {
            Ok(()) => {
                self.gate.mark_sent(self.timer.now_ms());
                crate::log_info!("Uplink sent");
                self.mirror_sent_summary();
            }
            Err(err) => {
                // No send retry here; the next periodic wake tries again
                crate::log_error!("Uplink failed: {:?}", err);
                let mut line = StatusLine::new();
                let _ = write!(line, "UP failed {}", err.code());
                self.status.push_line(&line);
            }
        }
    }

    /// Merge an acquisition outcome into the record
    ///
    /// Only a window with a valid position touches the record, and only the
    /// fields that window actually captured; everything else keeps its
    /// previous value. Without a position the record is left untouched and
    /// the stale contents go out as-is.
    fn apply_fix(&mut self, outcome: &AcquisitionOutcome) {
        let fields = outcome.fields();
        match fields.position {
            Some((lat, lon)) => {
                crate::log_info!("Valid GPS position");
                self.status.push_line("Valid GPS position");

                self.record.set_position_degrees(lat, lon);
                if let Some(alt) = fields.altitude_m {
                    self.record.set_altitude_meters(alt);
                }
                if let Some(speed) = fields.speed_mps {
                    self.record.set_speed_mps(speed);
                }
                if let Some(hdop) = fields.hdop {
                    self.record.hdop = hdop as u8;
                }
            }
            None => {
                crate::log_info!("No valid GPS position");
                self.status.push_line("No valid GPS position");
            }
        }
    }

    /// One-time join announcement (address + join method)
    fn announce_join(&mut self) {
        let mut line = StatusLine::new();
        match self.radio.join_mode() {
            JoinMode::Otaa => {
                let _ = write!(line, "OTAA addr {:08X}", self.radio.device_address());
            }
            JoinMode::Abp => {
                let _ = write!(line, "ABP joined");
            }
        }
        crate::log_info!("Joined, addr {:08X}", self.radio.device_address());
        self.status.push_line(&line);
    }

    /// Mirror the transmitted record to the status channel
    fn mirror_sent_summary(&mut self) {
        let mut line = StatusLine::new();
        write_coord(&mut line, "UP Lat ", self.record.latitude);
        self.status.push_line(&line);

        line.clear();
        write_coord(&mut line, "UP Lon ", self.record.longitude);
        self.status.push_line(&line);

        line.clear();
        let _ = write!(line, "UP Alt {} Pr {}", self.record.altitude, self.record.hdop);
        self.status.push_line(&line);

        line.clear();
        let _ = write!(line, "UP B {}%", self.record.battery);
        self.status.push_line(&line);
    }
}

/// Render a 1e-5-degree fixed-point coordinate as decimal degrees
fn write_coord(line: &mut StatusLine, prefix: &str, value_1e5: i32) {
    let sign = if value_1e5 < 0 { "-" } else { "" };
    let magnitude = value_1e5.unsigned_abs();
    let _ = write!(
        line,
        "{}{}{}.{:05}",
        prefix,
        sign,
        magnitude / 100_000,
        magnitude % 100_000
    );
}

// =============================================================================
// Embedded timer glue
// =============================================================================

#[cfg(feature = "embassy")]
pub mod embassy_ops {
    //! Wake-signal producers for embedded targets
    //!
    //! Plain async functions; the firmware binary wraps them in executor
    //! tasks. Host tests drive the orchestrator directly and never use
    //! these.

    use crate::core::wake::WakeSignal;
    use embassy_futures::select::{select, Either};
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_sync::signal::Signal;
    use embassy_time::{Duration, Ticker, Timer};

    /// Delay between a Busy gate verdict and the retry wake
    pub const RETRY_DELAY_MS: u64 = 10_000;

    /// Cadence of the movement-independent periodic wake
    pub const PERIODIC_WAKE_MS: u64 = 60_000;

    /// Trigger shared between the orchestrator and the retry task
    pub struct DelayedRetry {
        trigger: Signal<CriticalSectionRawMutex, ()>,
    }

    impl DelayedRetry {
        /// Create an un-armed retry trigger (const, suitable for statics)
        pub const fn new() -> Self {
            Self {
                trigger: Signal::new(),
            }
        }
    }

    impl Default for DelayedRetry {
        fn default() -> Self {
            Self::new()
        }
    }

    impl super::RetryTimer for &DelayedRetry {
        fn restart(&mut self) {
            self.trigger.signal(());
        }
    }

    /// One-shot delayed-retry timer task
    ///
    /// Waits for an arm, then posts the wake signal after [`RETRY_DELAY_MS`]
    /// unless re-armed first; a re-arm restarts the delay window
    /// (stop-then-start), so at most one retry is ever outstanding.
    pub async fn retry_task(retry: &DelayedRetry, wake: &WakeSignal) -> ! {
        loop {
            retry.trigger.wait().await;
            loop {
                let delay = Timer::after(Duration::from_millis(RETRY_DELAY_MS));
                match select(delay, retry.trigger.wait()).await {
                    Either::First(()) => {
                        wake.post();
                        break;
                    }
                    // Re-armed while pending: restart the window
                    Either::Second(()) => continue,
                }
            }
        }
    }

    /// Periodic wake producer
    ///
    /// Posts the wake signal every [`PERIODIC_WAKE_MS`] so the tracker
    /// reports even when stationary. Coalescing makes the post harmless if
    /// a motion wake is already pending.
    pub async fn periodic_wake_task(wake: &WakeSignal) -> ! {
        let mut ticker = Ticker::every(Duration::from_millis(PERIODIC_WAKE_MS));
        loop {
            ticker.next().await;
            wake.post();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::battery::mock::MockBattery;
    use crate::devices::motion::mock::MockMotion;
    use crate::platform::mock::{MockTimer, MockUart};
    use crate::platform::traits::UartConfig;
    use crate::uplink::radio::mock::MockRadio;

    const GGA: &[u8] = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
    const RMC: &[u8] = b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n";

    use core::cell::Cell;
    use std::rc::Rc;
    use std::string::{String, ToString};
    use std::vec::Vec;

    /// Unbounded sink so assertions can see every line ever pushed
    #[derive(Default)]
    struct RecordingSink {
        lines: Vec<String>,
    }

    impl StatusSink for RecordingSink {
        fn push_line(&mut self, line: &str) {
            self.lines.push(line.to_string());
        }
    }

    /// Retry handle onto a shared arm counter, cloneable like `MockTimer`
    #[derive(Clone, Default)]
    struct MockRetry {
        arm_count: Rc<Cell<u32>>,
    }

    impl MockRetry {
        fn arm_count(&self) -> u32 {
            self.arm_count.get()
        }
    }

    impl RetryTimer for MockRetry {
        fn restart(&mut self) {
            self.arm_count.set(self.arm_count.get() + 1);
        }
    }

    type TestOrchestrator<'a> = UplinkOrchestrator<
        'a,
        MockRadio,
        MockUart,
        MockTimer,
        MockBattery,
        MockMotion,
        RecordingSink,
        MockRetry,
    >;

    fn orchestrator<'a>(
        wake: &'a WakeSignal,
        lock: &'a SerialLock,
    ) -> (TestOrchestrator<'a>, MockTimer, MockRetry) {
        let timer = MockTimer::new();
        let retry = MockRetry::default();
        let orch = UplinkOrchestrator::new(
            MockRadio::new(0x2602_1FB5),
            GpsDriver::new(MockUart::new(UartConfig::gps_default())),
            timer.clone(),
            MockBattery::new(87),
            MockMotion::default(),
            RecordingSink::default(),
            retry.clone(),
            wake,
            lock,
        );
        (orch, timer, retry)
    }

    #[tokio::test]
    async fn test_unjoined_wake_sends_nothing() {
        let wake = WakeSignal::new();
        let lock = SerialLock::new(());
        let (mut orch, _timer, _retry) = orchestrator(&wake, &lock);

        wake.post();
        orch.run_cycle().await;

        assert_eq!(orch.radio_mut().sent_count(), 0);
        // Gate state untouched: the next joined wake is still a first send
        assert!(orch.gate.last_send_ms().is_none());
        assert_eq!(orch.status().lines, ["No network yet"]);
    }

    #[tokio::test]
    async fn test_join_announced_exactly_once() {
        let wake = WakeSignal::new();
        let lock = SerialLock::new(());
        let (mut orch, timer, _retry) = orchestrator(&wake, &lock);
        orch.radio_mut().set_joined(true);

        wake.post();
        orch.run_cycle().await;

        timer.advance_ms(60_000);
        wake.post();
        orch.run_cycle().await;

        let announcements = orch
            .status()
            .lines
            .iter()
            .filter(|l| l.starts_with("OTAA addr"))
            .count();
        assert_eq!(announcements, 1);
    }

    #[tokio::test]
    async fn test_first_send_forced_despite_gate() {
        let wake = WakeSignal::new();
        let lock = SerialLock::new(());
        let (mut orch, _timer, retry) = orchestrator(&wake, &lock);
        orch.radio_mut().set_joined(true);

        wake.post();
        orch.run_cycle().await;

        // Sent immediately despite no prior last_send recorded
        assert_eq!(orch.radio_mut().sent_count(), 1);
        assert_eq!(retry.arm_count(), 0);
    }

    #[tokio::test]
    async fn test_busy_gate_arms_retry_and_preserves_intent() {
        let wake = WakeSignal::new();
        let lock = SerialLock::new(());
        let (mut orch, timer, retry) = orchestrator(&wake, &lock);
        orch.radio_mut().set_joined(true);

        wake.post();
        orch.run_cycle().await;
        assert_eq!(orch.radio_mut().sent_count(), 1);

        // Second wake 2 s later: inside the 10 s window
        timer.advance_ms(2_000);
        wake.post();
        orch.run_cycle().await;

        assert_eq!(orch.radio_mut().sent_count(), 1);
        assert_eq!(retry.arm_count(), 1);

        // Retry fires 10 s after the Busy verdict
        timer.advance_ms(10_000);
        wake.post();
        orch.run_cycle().await;
        assert_eq!(orch.radio_mut().sent_count(), 2);
    }

    #[tokio::test]
    async fn test_no_fix_keeps_record_bit_identical() {
        let wake = WakeSignal::new();
        let lock = SerialLock::new(());
        let (mut orch, timer, _retry) = orchestrator(&wake, &lock);
        orch.radio_mut().set_joined(true);

        // First cycle gets a fix
        orch.gps_mut().uart_mut().inject_rx_data(GGA);
        orch.gps_mut().uart_mut().inject_rx_data(RMC);
        wake.post();
        orch.run_cycle().await;

        let before = *orch.record();
        assert_ne!(before.latitude, 0);

        // Second cycle: GPS silent, window times out with nothing
        timer.advance_ms(60_000);
        wake.post();
        orch.run_cycle().await;

        let after = *orch.record();
        assert_eq!(after.latitude, before.latitude);
        assert_eq!(after.longitude, before.longitude);
        assert_eq!(after.altitude, before.altitude);

        // The stale position still went out (always-heartbeat policy)
        assert_eq!(orch.radio_mut().sent_count(), 2);
    }

    #[tokio::test]
    async fn test_fix_updates_record_and_summary() {
        let wake = WakeSignal::new();
        let lock = SerialLock::new(());
        let (mut orch, _timer, _retry) = orchestrator(&wake, &lock);
        orch.radio_mut().set_joined(true);

        orch.gps_mut().uart_mut().inject_rx_data(GGA);
        orch.gps_mut().uart_mut().inject_rx_data(RMC);
        wake.post();
        orch.run_cycle().await;

        let record = *orch.record();
        assert!((record.latitude - 4_811_730).abs() <= 1);
        assert!((record.longitude - 1_151_666).abs() <= 1);
        assert_eq!(record.altitude, 545);
        assert_eq!(record.hdop, 0); // 0.9 truncates
        assert_eq!(record.battery, 87);
        assert_eq!(record.speed, 11);

        // Frame on the air matches the record exactly
        let sent = orch.radio_mut().sent.last().unwrap().clone();
        assert_eq!(&sent[..], &record.encode()[..]);

        let lines = &orch.status().lines;
        assert!(lines.iter().any(|l| l.starts_with("UP Lat 48.")));
        assert!(lines.iter().any(|l| l == "UP B 87%"));
    }

    #[tokio::test]
    async fn test_send_failure_mirrors_code_and_keeps_gate_open() {
        let wake = WakeSignal::new();
        let lock = SerialLock::new(());
        let (mut orch, _timer, _retry) = orchestrator(&wake, &lock);
        orch.radio_mut().set_joined(true);
        orch.radio_mut().fail_next_send(crate::uplink::radio::SendError::Failed);

        wake.post();
        orch.run_cycle().await;

        assert_eq!(orch.radio_mut().sent_count(), 0);
        // Failed attempt does not open a duty-cycle window
        assert!(orch.gate.last_send_ms().is_none());
        assert!(orch.status().lines.iter().any(|l| l == "UP failed 3"));
    }

    #[tokio::test]
    async fn test_motion_latch_cleared_every_cycle() {
        let wake = WakeSignal::new();
        let lock = SerialLock::new(());
        let (mut orch, _timer, _retry) = orchestrator(&wake, &lock);

        for _ in 0..3 {
            wake.post();
            orch.run_cycle().await;
        }
        assert_eq!(orch.motion.clear_count, 3);
    }

    /// Drives `retry_task` by hand: poll with a noop waker, advance the mock
    /// clock between polls. Re-arming mid-window must restart the delay and
    /// yield exactly one wake post.
    #[cfg(feature = "embassy")]
    #[test]
    fn test_retry_rearm_restarts_delay_and_posts_once() {
        use super::embassy_ops::{retry_task, DelayedRetry, RETRY_DELAY_MS};
        use embassy_futures::poll_once;
        use embassy_time::{Duration, MockDriver};

        let driver = MockDriver::get();
        let retry = DelayedRetry::new();
        let wake = WakeSignal::new();
        let mut task = core::pin::pin!(retry_task(&retry, &wake));

        // Un-armed: time passing alone never posts
        assert!(poll_once(task.as_mut()).is_pending());
        driver.advance(Duration::from_millis(RETRY_DELAY_MS));
        assert!(poll_once(task.as_mut()).is_pending());
        assert!(!wake.pending());

        // Arm, then re-arm halfway through the delay window
        let mut arm = &retry;
        arm.restart();
        assert!(poll_once(task.as_mut()).is_pending());
        driver.advance(Duration::from_millis(RETRY_DELAY_MS / 2));
        arm.restart();
        assert!(poll_once(task.as_mut()).is_pending());

        // The original deadline passes with no post: the window restarted
        driver.advance(Duration::from_millis(RETRY_DELAY_MS / 2));
        assert!(poll_once(task.as_mut()).is_pending());
        assert!(!wake.pending());

        // The restarted window elapses: exactly one post, then idle again
        driver.advance(Duration::from_millis(RETRY_DELAY_MS / 2));
        assert!(poll_once(task.as_mut()).is_pending());
        assert!(wake.try_take());
        assert!(!wake.pending());
    }

    #[test]
    fn test_write_coord_handles_negative_fractions() {
        let mut line = StatusLine::new();
        write_coord(&mut line, "UP Lat ", -50);
        assert_eq!(line.as_str(), "UP Lat -0.00050");

        line.clear();
        write_coord(&mut line, "UP Lon ", 1_151_666);
        assert_eq!(line.as_str(), "UP Lon 11.51666");
    }
}
