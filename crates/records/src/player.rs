use serde::Deserialize;
use serde::Serialize;
use tycoon_core::*;

/// A seat in a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub user_id: UserId,
    pub seat: Slot,
    pub address: String,
    pub balance: Money,
    pub position: Square,
    pub in_jail: bool,
    pub consecutive_timeouts: u32,
    /// Seat is driven by an external agent or built-in logic.
    pub agent: bool,
    /// Voted out; skipped in turn order.
    pub removed: bool,
}

impl Player {
    pub fn new(user_id: UserId, seat: Slot, balance: Money) -> Self {
        Self {
            user_id,
            seat,
            address: String::new(),
            balance,
            position: 0,
            in_jail: false,
            consecutive_timeouts: 0,
            agent: false,
            removed: false,
        }
    }
    pub fn automated(mut self) -> Self {
        self.agent = true;
        self
    }
    pub fn is_active(&self) -> bool {
        !self.removed
    }
}

/// Next active player after `current` in seat order, wrapping around.
/// Falls back to the first active seat when `current` is not seated.
pub fn successor(players: &[Player], current: UserId) -> Option<&Player> {
    let mut seated = players.iter().collect::<Vec<_>>();
    seated.sort_by_key(|p| p.seat);
    let start = seated
        .iter()
        .position(|p| p.user_id == current)
        .map(|i| i + 1)
        .unwrap_or(0);
    (0..seated.len())
        .map(|k| seated[(start + k) % seated.len()])
        .find(|p| p.is_active() && p.user_id != current)
}

#[cfg(test)]
mod tests {
    use super::*;
    fn table() -> Vec<Player> {
        vec![
            Player::new(10, 1, 1500),
            Player::new(20, 2, 1500),
            Player::new(30, 3, 1500),
        ]
    }
    #[test]
    fn successor_wraps_around() {
        let players = table();
        assert_eq!(successor(&players, 10).unwrap().user_id, 20);
        assert_eq!(successor(&players, 30).unwrap().user_id, 10);
    }
    #[test]
    fn successor_skips_removed() {
        let mut players = table();
        players[1].removed = true;
        assert_eq!(successor(&players, 10).unwrap().user_id, 30);
    }
    #[test]
    fn successor_of_lone_player_is_none() {
        let mut players = table();
        players[1].removed = true;
        players[2].removed = true;
        assert!(successor(&players, 10).is_none());
    }
}
