//! External decision agents.
//!
//! Any seat from 2 to 8 may be bound to an HTTP endpoint that answers
//! decisions for it. Routing is strictly best-effort: a missing binding, a
//! slow agent, or a malformed reply all yield `None`, and the caller plays
//! the seat with built-in logic instead.
//!
//! ## Registry
//!
//! - [`Registry`] - Process-wide bindings, game-specific over global
//! - [`Binding`] - One registered agent
//! - [`Registration`] - Unvalidated registration input
//!
//! ## Routing
//!
//! - [`Router`] - Resolves a [`Decision`] under a hard deadline
//! - [`Courier`] - Outbound transport; [`HttpCourier`] in production
//! - [`DecisionRequest`] - Agent-side wire request
mod binding;
mod courier;
mod registry;
mod router;
mod wire;

pub use binding::*;
pub use courier::*;
pub use registry::*;
pub use router::*;
pub use wire::*;

#[cfg(feature = "server")]
mod handlers;
#[cfg(feature = "server")]
pub use handlers::*;
