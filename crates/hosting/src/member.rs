use super::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use tycoon_core::*;
use tycoon_gate::Connection;
use tycoon_gate::Ticket;

/// One admitted connection and the rooms it has joined.
/// Dropping it leaves every room and releases the admission ticket.
pub struct Member {
    ticket: Ticket,
    tx: Tx,
    rooms: Arc<Broadcaster>,
    joined: BTreeSet<String>,
}

impl Member {
    pub fn new(ticket: Ticket, rooms: Arc<Broadcaster>, tx: Tx) -> Self {
        Self {
            ticket,
            tx,
            rooms,
            joined: BTreeSet::new(),
        }
    }
    pub fn id(&self) -> ID<Connection> {
        self.ticket.id()
    }
    pub fn joined(&self) -> impl Iterator<Item = &str> {
        self.joined.iter().map(String::as_str)
    }
    /// Handle one client frame. Returns a reply for this connection only.
    /// Every frame is charged against the rate budget, including bad ones.
    pub fn hear(&mut self, text: &str) -> Option<ServerEvent> {
        if let Err(throttled) = self.ticket.check() {
            log::debug!("[bridge {}] throttled", self.id());
            return Some(ServerEvent::error(throttled));
        }
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(ClientEvent::JoinGameRoom { code }) => {
                self.rooms.join(&code, self.id(), self.tx.clone());
                self.joined.insert(code);
                None
            }
            Ok(ClientEvent::LeaveGameRoom { code }) => {
                self.rooms.leave(&code, self.id());
                self.joined.remove(&code);
                None
            }
            Err(e) => Some(ServerEvent::error(format!("unrecognized event: {}", e))),
        }
    }
}

impl Drop for Member {
    fn drop(&mut self) {
        let id = self.id();
        for code in std::mem::take(&mut self.joined) {
            self.rooms.leave(&code, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;
    use std::net::Ipv4Addr;
    use std::time::Duration;
    use tokio::sync::mpsc::unbounded_channel;
    use tycoon_gate::Gate;
    use tycoon_gate::GateConfig;

    const ORIGIN: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));

    fn gate(events: u32) -> Arc<Gate> {
        Gate::new(GateConfig {
            max_connections: 5,
            events_per_window: events,
            window: Duration::from_secs(60),
        })
    }

    #[tokio::test]
    async fn join_and_leave_rooms() {
        let gate = gate(10);
        let rooms = Arc::new(Broadcaster::default());
        let (tx, mut rx) = unbounded_channel();
        let mut member = Member::new(gate.admit(ORIGIN).unwrap(), rooms.clone(), tx);
        assert_eq!(member.hear(r#"{"event":"join-game-room","code":"G1"}"#), None);
        assert_eq!(rooms.members("G1"), 1);
        rooms.publish("G1");
        assert!(rx.try_recv().unwrap().contains("game-update"));
        assert_eq!(member.hear(r#"{"event":"leave-game-room","code":"G1"}"#), None);
        assert_eq!(rooms.members("G1"), 0);
        assert_eq!(member.joined().count(), 0);
    }

    #[tokio::test]
    async fn malformed_frames_get_an_error() {
        let gate = gate(10);
        let rooms = Arc::new(Broadcaster::default());
        let (tx, _rx) = unbounded_channel();
        let mut member = Member::new(gate.admit(ORIGIN).unwrap(), rooms, tx);
        assert!(matches!(
            member.hear("roll the dice"),
            Some(ServerEvent::Error { .. })
        ));
    }

    #[tokio::test]
    async fn throttled_frames_are_refused_and_not_applied() {
        let gate = gate(1);
        let rooms = Arc::new(Broadcaster::default());
        let (tx, _rx) = unbounded_channel();
        let mut member = Member::new(gate.admit(ORIGIN).unwrap(), rooms.clone(), tx);
        assert_eq!(member.hear(r#"{"event":"join-game-room","code":"G1"}"#), None);
        let reply = member.hear(r#"{"event":"join-game-room","code":"G2"}"#);
        match reply {
            Some(ServerEvent::Error { message }) => assert!(message.contains("rate limit")),
            other => panic!("expected a throttle error, got {:?}", other),
        }
        assert_eq!(rooms.members("G2"), 0);
    }

    #[tokio::test]
    async fn dropping_leaves_rooms_and_releases_the_origin() {
        let gate = gate(10);
        let rooms = Arc::new(Broadcaster::default());
        let (tx, _rx) = unbounded_channel();
        let mut member = Member::new(gate.admit(ORIGIN).unwrap(), rooms.clone(), tx);
        member.hear(r#"{"event":"join-game-room","code":"G1"}"#);
        member.hear(r#"{"event":"join-game-room","code":"G2"}"#);
        assert_eq!(gate.connections(ORIGIN), 1);
        drop(member);
        assert_eq!(rooms.members("G1"), 0);
        assert_eq!(rooms.members("G2"), 0);
        assert_eq!(gate.connections(ORIGIN), 0);
    }
}
