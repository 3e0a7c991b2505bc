//! Status side-channel
//!
//! The tracker mirrors human-readable one-liners (state transitions,
//! transmission outcomes) to a small OLED and, when connected, a BLE UART.
//! Rendering and transport are external; the core only fills a bounded
//! line store. Pushing never blocks and never fails: when the store is
//! full the oldest line is evicted, exactly like the display scrolling up.

use heapless::{HistoryBuffer, String};

/// Maximum characters per status line (one OLED text row)
pub const STATUS_LINE_LEN: usize = 31;

/// Number of retained lines (OLED rows below the header)
pub const STATUS_LINES: usize = 5;

/// One stored status line
pub type StatusLine = String<STATUS_LINE_LEN>;

/// Fire-and-forget status consumer
///
/// Implementations must never block the orchestrator; there is no
/// acknowledgment and no error path.
pub trait StatusSink {
    /// Push one line; input beyond [`STATUS_LINE_LEN`] characters is truncated
    fn push_line(&mut self, line: &str);
}

/// Discarding sink for boards without a status surface
impl StatusSink for () {
    fn push_line(&mut self, _line: &str) {}
}

/// Bounded drop-oldest status line store
///
/// Backing store for the display/BLE mirror: holds the most recent
/// [`STATUS_LINES`] lines in oldest-first order.
pub struct StatusBuffer {
    lines: HistoryBuffer<StatusLine, STATUS_LINES>,
    dropped: u32,
}

impl StatusBuffer {
    /// Create an empty status buffer
    pub const fn new() -> Self {
        Self {
            lines: HistoryBuffer::new(),
            dropped: 0,
        }
    }

    /// Number of retained lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if no lines are retained
    pub fn is_empty(&self) -> bool {
        self.lines.len() == 0
    }

    /// Number of lines evicted due to overflow
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Iterate retained lines, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.oldest_ordered().map(|l| l.as_str())
    }
}

impl StatusSink for StatusBuffer {
    fn push_line(&mut self, line: &str) {
        let mut stored = StatusLine::new();
        for c in line.chars() {
            if stored.push(c).is_err() {
                break;
            }
        }

        if self.lines.len() == STATUS_LINES {
            self.dropped = self.dropped.saturating_add(1);
        }
        self.lines.write(stored);
    }
}

impl Default for StatusBuffer {
    fn default() -> Self {
        Self::new()
    }
}
