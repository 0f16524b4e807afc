//! Room fan-out for live games.
//!
//! Viewers join a room per game code over a WebSocket. When a game changes,
//! the room hears a bare `game-update` and refetches the snapshot itself.
//!
//! - [`Broadcaster`] - Room membership and best-effort publishing
//! - [`Member`] - One connection's rooms and admission ticket
//! - [`bridge`] - Pumps frames between a socket and its [`Member`]
//! - [`ClientEvent`] / [`ServerEvent`] - Wire frames
mod bridge;
mod broadcaster;
mod event;
mod member;

pub use bridge::*;
pub use broadcaster::*;
pub use event::*;
pub use member::*;
