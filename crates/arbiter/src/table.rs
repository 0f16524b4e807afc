use super::*;
use chrono::DateTime;
use chrono::Utc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tycoon_core::*;
use tycoon_records::Stamp;

/// Where one turn stands, as seen by the arbiter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Turn {
    pub stamp: Stamp,
    pub phase: Phase,
    /// Dice have been thrown this turn, so an expiry is not a strike.
    pub rolled: bool,
    pub deadline: DateTime<Utc>,
}

impl Turn {
    pub fn fresh(stamp: Stamp, window: Duration) -> Self {
        Self {
            stamp,
            phase: Phase::AwaitingRoll,
            rolled: false,
            deadline: deadline(stamp.started, window),
        }
    }
}

/// Process-local state of one game: action lock, turn, ballots, alarm.
/// The lock is never persisted; a restart releases it.
#[derive(Debug, Default)]
pub struct Table {
    busy: AtomicBool,
    turn: Mutex<Option<Turn>>,
    ballots: Mutex<Ballots>,
    pilot: Mutex<Option<UserId>>,
    alarm: Alarm,
}

/// Held while one action is being applied. Dropping it releases the game.
#[derive(Debug)]
pub struct Lock<'a> {
    table: &'a Table,
}

impl Drop for Lock<'_> {
    fn drop(&mut self) {
        self.table.busy.store(false, Ordering::Release);
    }
}

impl Table {
    /// Take the action lock without waiting.
    pub fn try_lock(&self) -> Option<Lock<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Lock { table: self })
    }
    pub fn is_locked(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
    /// Turn state for `stamp`, starting afresh if the known turn is older.
    pub fn turn(&self, stamp: Stamp, window: Duration) -> Turn {
        let mut turn = self.lock_turn();
        match *turn {
            Some(known) if known.stamp == stamp => known,
            _ => *turn.insert(Turn::fresh(stamp, window)),
        }
    }
    pub fn current(&self) -> Option<Turn> {
        *self.lock_turn()
    }
    pub fn record(&self, turn: Turn) {
        *self.lock_turn() = Some(turn);
    }
    /// Forget everything about a finished game.
    pub fn close(&self) {
        self.alarm.cancel();
        *self.lock_turn() = None;
        self.ballots(|b| b.reset());
    }
    pub fn ballots<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut Ballots) -> R,
    {
        f(&mut self.ballots.lock().unwrap_or_else(|e| e.into_inner()))
    }
    pub fn alarm(&self) -> &Alarm {
        &self.alarm
    }
    /// Claim the autopilot for `user`. False if it is already driving them.
    pub fn board(&self, user: UserId) -> bool {
        let mut pilot = self.pilot.lock().unwrap_or_else(|e| e.into_inner());
        match *pilot {
            Some(driving) if driving == user => false,
            _ => {
                *pilot = Some(user);
                true
            }
        }
    }
    pub fn disembark(&self, user: UserId) {
        let mut pilot = self.pilot.lock().unwrap_or_else(|e| e.into_inner());
        if *pilot == Some(user) {
            *pilot = None;
        }
    }
    fn lock_turn(&self) -> MutexGuard<'_, Option<Turn>> {
        self.turn.lock().unwrap_or_else(|e| e.into_inner())
    }
}
