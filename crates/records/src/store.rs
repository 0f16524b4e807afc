use super::*;
use tycoon_core::*;

/// Authoritative persistence collaborator.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn game(&self, id: GameId) -> Result<Option<GameSession>, StoreError>;
    async fn game_by_code(&self, code: &str) -> Result<Option<GameSession>, StoreError>;
    /// Every game currently in [`Status::Running`].
    async fn running(&self) -> Result<Vec<GameSession>, StoreError>;
    async fn players(&self, game: GameId) -> Result<Vec<Player>, StoreError>;
    /// Apply the batch in order, atomically. `Ok` means every effect is committed.
    async fn apply(&self, game: GameId, effects: &[Effect]) -> Result<(), StoreError>;
    /// Cheap liveness probe.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
    /// Viewer snapshot keyed by join code.
    async fn snapshot(&self, code: &str) -> Result<Option<serde_json::Value>, StoreError> {
        match self.game_by_code(code).await? {
            None => Ok(None),
            Some(game) => {
                let players = self.players(game.id).await?;
                Ok(Some(Snapshot { game, players }.to_value()))
            }
        }
    }
}
