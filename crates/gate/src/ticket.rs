use super::*;
use std::net::IpAddr;
use std::sync::Arc;
use tycoon_core::ID;

/// Marker for connection identities.
pub struct Connection;

/// Proof that a connection was admitted.
/// Dropping the ticket releases the origin slot and forgets the rate window,
/// so each admitted connection is counted down exactly once.
pub struct Ticket {
    id: ID<Connection>,
    origin: IpAddr,
    gate: Arc<Gate>,
}

impl Ticket {
    pub(crate) fn new(gate: Arc<Gate>, origin: IpAddr) -> Self {
        Self {
            id: ID::default(),
            origin,
            gate,
        }
    }
    pub fn id(&self) -> ID<Connection> {
        self.id
    }
    pub fn origin(&self) -> IpAddr {
        self.origin
    }
    /// Charges one event against this connection's budget.
    pub fn check(&self) -> Result<(), Throttled> {
        self.gate.allow(self.id)
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        self.gate.release(self.origin, self.id);
    }
}
