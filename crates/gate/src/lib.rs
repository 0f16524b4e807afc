//! Admission control for the real-time channel.
//!
//! - [`Gate`] - Connection counters per origin, rate windows per connection,
//!   and request budgets per origin for HTTP actions
//! - [`Ticket`] - Proof of admission; dropping it is the disconnect
//! - [`Window`] - Fixed event window for one connection
mod gate;
mod ticket;
mod window;

pub use gate::*;
pub use ticket::*;
pub use window::*;
