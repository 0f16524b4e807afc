use super::*;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tycoon_core::*;

/// In-process [`Store`].
/// Each game is one table guarded by a single lock, so a batch either
/// lands entirely or, on the first invalid effect, not at all.
#[derive(Default)]
pub struct Memory {
    games: RwLock<HashMap<GameId, Ledger>>,
}

#[derive(Debug, Clone)]
struct Ledger {
    session: GameSession,
    players: Vec<Player>,
    deeds: HashMap<PropertyId, UserId>,
}

impl Memory {
    pub async fn insert(&self, session: GameSession, players: Vec<Player>) {
        let ledger = Ledger {
            session,
            players,
            deeds: HashMap::new(),
        };
        self.games.write().await.insert(ledger.session.id, ledger);
    }
    /// Rewrites a session in place, bypassing effects. Test and admin use only.
    pub async fn edit<F>(&self, game: GameId, f: F)
    where
        F: FnOnce(&mut GameSession, &mut Vec<Player>),
    {
        if let Some(ledger) = self.games.write().await.get_mut(&game) {
            f(&mut ledger.session, &mut ledger.players);
        }
    }
    pub async fn player(&self, game: GameId, user: UserId) -> Option<Player> {
        self.games
            .read()
            .await
            .get(&game)
            .and_then(|l| l.players.iter().find(|p| p.user_id == user).cloned())
    }
    pub async fn owner(&self, game: GameId, property: PropertyId) -> Option<UserId> {
        self.games
            .read()
            .await
            .get(&game)
            .and_then(|l| l.deeds.get(&property).copied())
    }
}

impl Ledger {
    fn seat(&mut self, user: UserId) -> Result<&mut Player, StoreError> {
        self.players
            .iter_mut()
            .find(|p| p.user_id == user)
            .ok_or_else(|| StoreError::Rejected(format!("no player {}", user)))
    }
    fn apply(&mut self, effect: &Effect) -> Result<(), StoreError> {
        match *effect {
            Effect::Move { user, position } => self.seat(user)?.position = position,
            Effect::Credit { user, amount } => self.seat(user)?.balance += amount,
            Effect::Debit { user, amount } => self.seat(user)?.balance -= amount,
            Effect::Purchase {
                user,
                property,
                price,
            } => {
                if self.deeds.contains_key(&property) {
                    return Err(StoreError::Rejected(format!("P{} already owned", property)));
                }
                self.seat(user)?.balance -= price;
                self.deeds.insert(property, user);
            }
            Effect::Jail { user } => {
                let player = self.seat(user)?;
                player.in_jail = true;
                player.position = JAIL_SQUARE;
            }
            Effect::Release { user } => self.seat(user)?.in_jail = false,
            Effect::Timeout { user } => self.seat(user)?.consecutive_timeouts += 1,
            Effect::Settle { user } => self.seat(user)?.consecutive_timeouts = 0,
            Effect::Surrender { user } => self.deeds.retain(|_, owner| *owner != user),
            Effect::Remove { user } => self.seat(user)?.removed = true,
            Effect::Advance { next, at } => {
                self.seat(next)?;
                self.session.current_turn_player_id = Some(next);
                self.session.turn_started_at = at;
            }
            Effect::Finish { winner } => {
                self.session.status = Status::Finished;
                self.session.winner = winner;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Store for Memory {
    async fn game(&self, id: GameId) -> Result<Option<GameSession>, StoreError> {
        Ok(self.games.read().await.get(&id).map(|l| l.session.clone()))
    }
    async fn game_by_code(&self, code: &str) -> Result<Option<GameSession>, StoreError> {
        Ok(self
            .games
            .read()
            .await
            .values()
            .find(|l| l.session.code == code)
            .map(|l| l.session.clone()))
    }
    async fn running(&self) -> Result<Vec<GameSession>, StoreError> {
        Ok(self
            .games
            .read()
            .await
            .values()
            .filter(|l| l.session.is_running())
            .map(|l| l.session.clone())
            .collect())
    }
    async fn players(&self, game: GameId) -> Result<Vec<Player>, StoreError> {
        Ok(self
            .games
            .read()
            .await
            .get(&game)
            .map(|l| l.players.clone())
            .unwrap_or_default())
    }
    async fn apply(&self, game: GameId, effects: &[Effect]) -> Result<(), StoreError> {
        let mut games = self.games.write().await;
        let ledger = games
            .get_mut(&game)
            .ok_or_else(|| StoreError::Rejected(format!("no game {}", game)))?;
        let mut draft = ledger.clone();
        for effect in effects {
            draft.apply(effect)?;
        }
        *ledger = draft;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    async fn seeded() -> Memory {
        let memory = Memory::default();
        memory
            .insert(
                GameSession::running(1, "G1", 10),
                vec![Player::new(10, 1, 1500), Player::new(20, 2, 1500)],
            )
            .await;
        memory
    }
    #[tokio::test]
    async fn batches_apply_in_order() {
        let memory = seeded().await;
        let effects = [
            Effect::Move {
                user: 10,
                position: 6,
            },
            Effect::Purchase {
                user: 10,
                property: 6,
                price: 100,
            },
        ];
        memory.apply(1, &effects).await.unwrap();
        let player = memory.player(1, 10).await.unwrap();
        assert_eq!(player.position, 6);
        assert_eq!(player.balance, 1400);
        assert_eq!(memory.owner(1, 6).await, Some(10));
    }
    #[tokio::test]
    async fn failed_batch_leaves_no_trace() {
        let memory = seeded().await;
        let effects = [
            Effect::Credit {
                user: 10,
                amount: 50,
            },
            Effect::Remove { user: 99 },
        ];
        assert!(memory.apply(1, &effects).await.is_err());
        assert_eq!(memory.player(1, 10).await.unwrap().balance, 1500);
    }
    #[tokio::test]
    async fn snapshot_is_keyed_by_code() {
        let memory = seeded().await;
        let snapshot = memory.snapshot("G1").await.unwrap().unwrap();
        assert_eq!(snapshot["game"]["code"], "G1");
        assert_eq!(snapshot["players"].as_array().unwrap().len(), 2);
        assert!(memory.snapshot("nope").await.unwrap().is_none());
    }
    #[tokio::test]
    async fn surrender_returns_deeds_to_the_bank() {
        let memory = seeded().await;
        let buy = Effect::Purchase {
            user: 20,
            property: 3,
            price: 60,
        };
        memory.apply(1, &[buy]).await.unwrap();
        memory.apply(1, &[Effect::Surrender { user: 20 }]).await.unwrap();
        assert_eq!(memory.owner(1, 3).await, None);
    }
}
