//! Read-through cache of per-game snapshots.
//!
//! Entries are keyed by join code, expire lazily after a fixed TTL, and are
//! invalidated explicitly after every state-mutating action.
mod cache;

pub use cache::*;
