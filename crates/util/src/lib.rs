//! Core type aliases, traits, and constants for tycoon.
//!
//! This crate provides the foundational types and configuration parameters
//! used throughout the tycoon workspace.
mod config;

pub use config::*;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Persistent game identifier.
pub type GameId = i64;
/// Persistent user identifier.
pub type UserId = i64;
/// Wallet balances, prices, rents, and salaries.
pub type Money = i64;
/// Square index on the board (0 = GO).
pub type Square = u8;
/// Seat index in turn order; seats 2..=8 can be bound to agents.
pub type Slot = u8;

// ============================================================================
// TRAITS
// ============================================================================
/// Best-effort room notification.
/// Implementors log and swallow their own failures; callers cannot fail on it.
pub trait Broadcast: Send + Sync {
    fn publish(&self, code: &str);
}

/// Discards every signal. Handy for tools and tests that have no viewers.
impl Broadcast for () {
    fn publish(&self, _: &str) {}
}

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Generic ID wrapper providing compile-time type safety over uuid::Uuid.
/// Used for process-local identities (connections, decision requests)
/// that never hit the persistent store.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
    /// Cast ID<T> to ID<U> while preserving the underlying UUID.
    pub fn cast<U>(self) -> ID<U> {
        ID {
            inner: self.inner,
            marker: PhantomData,
        }
    }
}

impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner()
    }
}
impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.inner.serialize(serializer)
    }
}

// ============================================================================
// BOARD PARAMETERS
// ============================================================================
/// Number of squares around the board.
pub const BOARD_SIZE: u8 = 40;
/// Square a jailed player sits on.
pub const JAIL_SQUARE: Square = 10;
/// Salary credited when passing GO.
pub const GO_SALARY: Money = 200;
/// Lowest and highest agent-bindable seat.
pub const MIN_SLOT: Slot = 2;
pub const MAX_SLOT: Slot = 8;

// ============================================================================
// ARBITRATION DEFAULTS
// ============================================================================
/// Seconds a player has to roll before the turn is force-ended.
pub const ROLL_WINDOW_SECS: u64 = 90;
/// Consecutive timeouts after which a player becomes vote-removable.
pub const TIMEOUT_STRIKES: u32 = 3;
/// Delay before an alarm that lost the lock race tries again.
pub const ALARM_RETRY_MILLIS: u64 = 1000;
/// Interval of the background sweep over running games.
pub const PATROL_SECS: u64 = 5;

// ============================================================================
// AGENT DEFAULTS
// ============================================================================
/// Hard deadline on an external agent decision.
pub const AGENT_TIMEOUT_MILLIS: u64 = 8000;

// ============================================================================
// ADMISSION DEFAULTS
// ============================================================================
/// Concurrent sockets allowed per network origin.
pub const MAX_CONNECTIONS_PER_ORIGIN: usize = 5;
/// Socket events allowed per connection per window.
pub const EVENTS_PER_WINDOW: u32 = 60;
/// Length of the fixed rate window.
pub const EVENT_WINDOW_SECS: u64 = 60;

// ============================================================================
// CACHE DEFAULTS
// ============================================================================
/// Lifetime of a cached game snapshot.
pub const CACHE_TTL_SECS: u64 = 60;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register Ctrl+C handler for immediate termination.
/// In-memory registries and timers are process-scoped, so nothing is flushed.
#[cfg(feature = "server")]
pub fn kys() {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
            log::warn!("interrupt received, exiting immediately");
            std::process::exit(0);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    struct Marker;
    #[test]
    fn ids_are_unique() {
        let a = ID::<Marker>::default();
        let b = ID::<Marker>::default();
        assert_ne!(a, b);
    }
    #[test]
    fn ids_serialize_as_uuid_strings() {
        let id = ID::<Marker>::default();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
    #[test]
    fn cast_preserves_uuid() {
        let id = ID::<Marker>::default();
        assert_eq!(id.cast::<()>().inner(), id.inner());
    }
}
