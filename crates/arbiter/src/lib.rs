//! Turn arbitration for live games.
//!
//! The arbiter decides whose action is valid, serializes attempts per game,
//! time-boxes idle players, and runs the vote-to-remove protocol. Every
//! mutation goes through the [`tycoon_records::Store`] as one atomic batch;
//! after a confirmed batch the game's cache entry is invalidated and its room
//! is signalled.
//!
//! ## Turn state
//!
//! - [`Arbiter`] - Entry point: [`Arbiter::attempt`], [`Arbiter::vote`], [`Arbiter::tick`]
//! - [`Phase`] - Where the current turn stands
//! - [`Action`] / [`Outcome`] - What a player asks for and what happened
//! - [`Rejection`] - Typed refusals; nothing is mutated on any of them
//!
//! ## Machinery
//!
//! - [`Table`] - Per-game lock, turn, ballots, and alarm
//! - [`Ballots`] - Vote records per target
//! - [`TimerConfig`] / [`Alarm`] - Roll windows and their scheduled expiry
//! - [`Dice`] - Randomness seam
mod action;
mod arbiter;
mod autopilot;
mod ballot;
mod dice;
mod phase;
mod rejection;
mod table;
mod timer;

pub use action::*;
pub use arbiter::*;
pub use ballot::*;
pub use dice::*;
pub use phase::*;
pub use rejection::*;
pub use table::*;
pub use timer::*;
