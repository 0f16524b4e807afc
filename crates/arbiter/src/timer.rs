use chrono::DateTime;
use chrono::SubsecRound;
use chrono::Utc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tycoon_core::*;
use tycoon_records::Stamp;

/// Configuration for turn timeouts and the sweeps that back them up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerConfig {
    /// How long a player may idle before the turn is force-ended.
    pub roll: Duration,
    /// Delay before an alarm that lost the lock race rings again.
    pub retry: Duration,
    /// Interval between sweeps over every running game.
    pub patrol: Duration,
    /// Consecutive timeouts that make a player removable by vote.
    pub strikes: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            roll: Duration::from_secs(ROLL_WINDOW_SECS),
            retry: Duration::from_millis(ALARM_RETRY_MILLIS),
            patrol: Duration::from_secs(PATROL_SECS),
            strikes: TIMEOUT_STRIKES,
        }
    }
}

impl From<&Config> for TimerConfig {
    fn from(config: &Config) -> Self {
        Self {
            roll: config.roll_window(),
            ..Self::default()
        }
    }
}

/// Wall-clock now at the store's resolution.
/// Turn stamps are compared for equality after a round trip through
/// persistence, so they never carry sub-microsecond precision.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub fn deadline(from: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|window| from.checked_add_signed(window))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Time left until `at`, zero if already past.
pub fn until(at: DateTime<Utc>) -> Duration {
    (at - Utc::now()).to_std().unwrap_or(Duration::ZERO)
}

/// The single scheduled expiry of a game's current turn.
/// Setting a new alarm supersedes the old one.
#[derive(Debug, Default)]
pub struct Alarm {
    slot: Mutex<Option<(Stamp, JoinHandle<()>)>>,
}

impl Alarm {
    pub fn set(&self, stamp: Stamp, handle: JoinHandle<()>) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((_, old)) = slot.replace((stamp, handle)) {
            old.abort();
        }
    }
    /// Reschedule only if the alarm still belongs to `stamp`.
    /// A newer turn's alarm is never displaced by a retry.
    pub fn retry(&self, stamp: Stamp, handle: JoinHandle<()>) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        match slot.as_ref() {
            Some((current, _)) if *current != stamp => {
                handle.abort();
                false
            }
            _ => {
                *slot = Some((stamp, handle));
                true
            }
        }
    }
    pub fn cancel(&self) {
        if let Some((_, old)) = self.slot.lock().unwrap_or_else(|e| e.into_inner()).take() {
            old.abort();
        }
    }
    /// Turn the pending alarm will ring for, if any.
    pub fn armed(&self) -> Option<Stamp> {
        self.slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(stamp, _)| *stamp)
    }
}

impl Drop for Alarm {
    fn drop(&mut self) {
        self.cancel();
    }
}
