use std::time::Duration;
use tokio::time::Instant;

/// Fixed event window for one connection.
/// A window opens on the first event after the previous one lapsed
/// and closes exactly one window length later.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    count: u32,
    resets: Instant,
}

impl Window {
    pub fn open(now: Instant, length: Duration) -> Self {
        Self {
            count: 0,
            resets: now + length,
        }
    }
    /// Counts one event at `now`, returning the count within the current window.
    pub fn hit(&mut self, now: Instant, length: Duration) -> u32 {
        if now >= self.resets {
            *self = Self::open(now, length);
        }
        self.count += 1;
        self.count
    }
    pub fn count(&self) -> u32 {
        self.count
    }
    pub fn resets(&self) -> Instant {
        self.resets
    }
}
