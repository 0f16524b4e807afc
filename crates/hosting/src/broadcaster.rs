use super::*;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::mpsc::UnboundedSender;
use tycoon_core::*;
use tycoon_gate::Connection;
use tycoon_records::Store;

pub type Tx = UnboundedSender<String>;

/// Room membership keyed by game code.
#[derive(Default)]
pub struct Broadcaster {
    rooms: RwLock<HashMap<String, HashMap<ID<Connection>, Tx>>>,
}

impl Broadcaster {
    pub fn join(&self, code: &str, id: ID<Connection>, tx: Tx) {
        self.rooms
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(code.to_string())
            .or_default()
            .insert(id, tx);
        log::debug!("[rooms] {} joined {}", id, code);
    }
    pub fn leave(&self, code: &str, id: ID<Connection>) {
        let mut rooms = self.rooms.write().unwrap_or_else(|e| e.into_inner());
        if let Some(room) = rooms.get_mut(code) {
            room.remove(&id);
            if room.is_empty() {
                rooms.remove(code);
            }
        }
        log::debug!("[rooms] {} left {}", id, code);
    }
    pub fn members(&self, code: &str) -> usize {
        self.rooms
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(code)
            .map(HashMap::len)
            .unwrap_or(0)
    }
    /// Signal a room by game id, resolving the code through the store.
    pub async fn publish_by_game_id(&self, store: &dyn Store, game: GameId) {
        match store.game(game).await {
            Ok(Some(session)) => self.publish(&session.code),
            Ok(None) => log::debug!("[rooms] no game {} to publish", game),
            Err(e) => log::warn!("[rooms] cannot resolve game {}: {}", game, e),
        }
    }
}

impl Broadcast for Broadcaster {
    /// Members whose socket is gone are dropped from the room.
    fn publish(&self, code: &str) {
        let frame = ServerEvent::update(code).to_json();
        let mut rooms = self.rooms.write().unwrap_or_else(|e| e.into_inner());
        let Some(room) = rooms.get_mut(code) else {
            return;
        };
        room.retain(|id, tx| match tx.send(frame.clone()) {
            Ok(()) => true,
            Err(_) => {
                log::debug!("[rooms] {} gone from {}", id, code);
                false
            }
        });
        log::debug!("[rooms] {} notified {} members", code, room.len());
        if room.is_empty() {
            rooms.remove(code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;
    use tycoon_records::GameSession;
    use tycoon_records::Memory;
    #[test]
    fn publish_reaches_only_the_room() {
        let rooms = Broadcaster::default();
        let (a, mut rx_a) = unbounded_channel();
        let (b, mut rx_b) = unbounded_channel();
        let (c, mut rx_c) = unbounded_channel();
        rooms.join("G1", ID::default(), a);
        rooms.join("G1", ID::default(), b);
        rooms.join("G2", ID::default(), c);
        rooms.publish("G1");
        let frame = r#"{"event":"game-update","gameCode":"G1"}"#;
        assert_eq!(rx_a.try_recv().unwrap(), frame);
        assert_eq!(rx_b.try_recv().unwrap(), frame);
        assert!(rx_c.try_recv().is_err());
    }
    #[test]
    fn closed_members_are_pruned() {
        let rooms = Broadcaster::default();
        let (a, rx_a) = unbounded_channel();
        let (b, _rx_b) = unbounded_channel();
        rooms.join("G1", ID::default(), a);
        rooms.join("G1", ID::default(), b);
        drop(rx_a);
        rooms.publish("G1");
        assert_eq!(rooms.members("G1"), 1);
    }
    #[test]
    fn publishing_to_an_empty_room_is_silent() {
        let rooms = Broadcaster::default();
        rooms.publish("nobody");
        assert_eq!(rooms.members("nobody"), 0);
    }
    #[test]
    fn leaving_empties_rooms() {
        let rooms = Broadcaster::default();
        let id = ID::default();
        let (tx, _rx) = unbounded_channel();
        rooms.join("G1", id, tx);
        rooms.leave("G1", id);
        assert_eq!(rooms.members("G1"), 0);
    }
    #[tokio::test]
    async fn publish_by_game_id_resolves_the_code() {
        let store = Memory::default();
        store.insert(GameSession::running(7, "SEVEN", 1), vec![]).await;
        let rooms = Broadcaster::default();
        let (tx, mut rx) = unbounded_channel();
        rooms.join("SEVEN", ID::default(), tx);
        rooms.publish_by_game_id(&store, 7).await;
        rooms.publish_by_game_id(&store, 8).await;
        assert!(rx.try_recv().unwrap().contains("SEVEN"));
        assert!(rx.try_recv().is_err());
    }
}
