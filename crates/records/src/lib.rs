//! Persistent records and the collaborator seams around them.
//!
//! The arbitration core never talks to a database directly. It reads
//! [`GameSession`] and [`Player`] records through a [`Store`] and mutates
//! them only by handing the store an ordered batch of [`Effect`]s, which is
//! applied atomically or not at all. Board semantics (prices, rents, jail
//! squares) sit behind [`Rules`].
//!
//! ## Records
//!
//! - [`GameSession`] - One game, its status, and the current turn [`Stamp`]
//! - [`Player`] - A seat in a game
//! - [`Snapshot`] - What viewers refetch after a `game-update`
//!
//! ## Collaborators
//!
//! - [`Store`] - Authoritative persistence
//! - [`Rules`] - Board and property rules
//! - [`Memory`] - In-process [`Store`] for tests and local play
mod effect;
mod error;
mod landing;
mod memory;
mod player;
mod rules;
mod session;
mod snapshot;
mod store;

pub use effect::*;
pub use error::*;
pub use landing::*;
pub use memory::*;
pub use player::*;
pub use rules::*;
pub use session::*;
pub use snapshot::*;
pub use store::*;
