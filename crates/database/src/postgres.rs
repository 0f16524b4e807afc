use super::*;
use const_format::concatcp;
use tokio::sync::Mutex;
use tokio_postgres::Client;
use tokio_postgres::Transaction;
use tokio_postgres::types::ToSql;
use tycoon_core::*;
use tycoon_records::*;

const SELECT_GAME: &str = concatcp!(
    "SELECT ",
    <GameSession as Hydrate>::COLUMNS,
    " FROM ",
    GAMES,
    " WHERE id = $1"
);
const SELECT_GAME_BY_CODE: &str = concatcp!(
    "SELECT ",
    <GameSession as Hydrate>::COLUMNS,
    " FROM ",
    GAMES,
    " WHERE code = $1"
);
const SELECT_RUNNING: &str = concatcp!(
    "SELECT ",
    <GameSession as Hydrate>::COLUMNS,
    " FROM ",
    GAMES,
    " WHERE status = 'RUNNING'"
);
const SELECT_PLAYERS: &str = concatcp!(
    "SELECT ",
    <Player as Hydrate>::COLUMNS,
    " FROM ",
    PLAYERS,
    " WHERE game_id = $1 ORDER BY seat"
);
const SELECT_DEED: &str = concatcp!(
    "SELECT ",
    <Deed as Hydrate>::COLUMNS,
    " FROM ",
    PROPERTIES,
    " WHERE game_id = $1 AND square = $2"
);

/// PostgreSQL-backed [`Store`] and [`Rules`].
/// Batches run inside one transaction; the connection is held for its span.
pub struct Postgres {
    client: Mutex<Client>,
}

impl From<Client> for Postgres {
    fn from(client: Client) -> Self {
        Self {
            client: Mutex::new(client),
        }
    }
}

impl Postgres {
    pub async fn connect(url: &str) -> Result<Self, PgErr> {
        let client = db(url).await?;
        migrate(&client).await?;
        Ok(Self::from(client))
    }
    async fn deed(&self, game: GameId, square: Square) -> Result<Option<Deed>, StoreError> {
        self.client
            .lock()
            .await
            .query_opt(SELECT_DEED, &[&game, &(square as i16)])
            .await
            .map_err(pg)?
            .as_ref()
            .map(Deed::hydrate)
            .transpose()
    }
}

/// Statement executor that insists on touching exactly one row.
async fn one(
    tx: &Transaction<'_>,
    sql: &str,
    params: &[&(dyn ToSql + Sync)],
    effect: &Effect,
) -> Result<(), StoreError> {
    match tx.execute(sql, params).await.map_err(pg)? {
        1 => Ok(()),
        n => Err(StoreError::Rejected(format!("{} touched {} rows", effect, n))),
    }
}

/// Writes one effect inside the batch transaction.
async fn write(tx: &Transaction<'_>, game: GameId, effect: &Effect) -> Result<(), StoreError> {
    match *effect {
        Effect::Move { user, position } => {
            let sql = concatcp!(
                "UPDATE ",
                PLAYERS,
                " SET position = $3 WHERE game_id = $1 AND user_id = $2"
            );
            one(tx, sql, &[&game, &user, &(position as i16)], effect).await
        }
        Effect::Credit { user, amount } => {
            let sql = concatcp!(
                "UPDATE ",
                PLAYERS,
                " SET balance = balance + $3 WHERE game_id = $1 AND user_id = $2"
            );
            one(tx, sql, &[&game, &user, &amount], effect).await
        }
        Effect::Debit { user, amount } => {
            let sql = concatcp!(
                "UPDATE ",
                PLAYERS,
                " SET balance = balance - $3 WHERE game_id = $1 AND user_id = $2"
            );
            one(tx, sql, &[&game, &user, &amount], effect).await
        }
        Effect::Purchase {
            user,
            property,
            price,
        } => {
            let sql = concatcp!(
                "UPDATE ",
                PROPERTIES,
                " SET owner = $2 WHERE game_id = $1 AND id = $3 AND owner IS NULL"
            );
            one(tx, sql, &[&game, &user, &property], effect).await?;
            let sql = concatcp!(
                "UPDATE ",
                PLAYERS,
                " SET balance = balance - $3 WHERE game_id = $1 AND user_id = $2"
            );
            one(tx, sql, &[&game, &user, &price], effect).await
        }
        Effect::Jail { user } => {
            let sql = concatcp!(
                "UPDATE ",
                PLAYERS,
                " SET in_jail = TRUE, position = $3 WHERE game_id = $1 AND user_id = $2"
            );
            one(tx, sql, &[&game, &user, &(JAIL_SQUARE as i16)], effect).await
        }
        Effect::Release { user } => {
            let sql = concatcp!(
                "UPDATE ",
                PLAYERS,
                " SET in_jail = FALSE WHERE game_id = $1 AND user_id = $2"
            );
            one(tx, sql, &[&game, &user], effect).await
        }
        Effect::Timeout { user } => {
            let sql = concatcp!(
                "UPDATE ",
                PLAYERS,
                " SET consecutive_timeouts = consecutive_timeouts + 1 WHERE game_id = $1 AND user_id = $2"
            );
            one(tx, sql, &[&game, &user], effect).await
        }
        Effect::Settle { user } => {
            let sql = concatcp!(
                "UPDATE ",
                PLAYERS,
                " SET consecutive_timeouts = 0 WHERE game_id = $1 AND user_id = $2"
            );
            one(tx, sql, &[&game, &user], effect).await
        }
        Effect::Surrender { user } => {
            let sql = concatcp!(
                "UPDATE ",
                PROPERTIES,
                " SET owner = NULL WHERE game_id = $1 AND owner = $2"
            );
            tx.execute(sql, &[&game, &user]).await.map(|_| ()).map_err(pg)
        }
        Effect::Remove { user } => {
            let sql = concatcp!(
                "UPDATE ",
                PLAYERS,
                " SET removed = TRUE WHERE game_id = $1 AND user_id = $2"
            );
            one(tx, sql, &[&game, &user], effect).await
        }
        Effect::Advance { next, at } => {
            let sql = concatcp!(
                "UPDATE ",
                GAMES,
                " SET current_turn_player_id = $2, turn_started_at = $3 WHERE id = $1"
            );
            one(tx, sql, &[&game, &next, &at], effect).await
        }
        Effect::Finish { winner } => {
            let sql = concatcp!(
                "UPDATE ",
                GAMES,
                " SET status = 'FINISHED', winner = $2 WHERE id = $1"
            );
            one(tx, sql, &[&game, &winner], effect).await
        }
    }
}

#[async_trait::async_trait]
impl Store for Postgres {
    async fn game(&self, id: GameId) -> Result<Option<GameSession>, StoreError> {
        self.client
            .lock()
            .await
            .query_opt(SELECT_GAME, &[&id])
            .await
            .map_err(pg)?
            .as_ref()
            .map(GameSession::hydrate)
            .transpose()
    }
    async fn game_by_code(&self, code: &str) -> Result<Option<GameSession>, StoreError> {
        self.client
            .lock()
            .await
            .query_opt(SELECT_GAME_BY_CODE, &[&code])
            .await
            .map_err(pg)?
            .as_ref()
            .map(GameSession::hydrate)
            .transpose()
    }
    async fn running(&self) -> Result<Vec<GameSession>, StoreError> {
        self.client
            .lock()
            .await
            .query(SELECT_RUNNING, &[])
            .await
            .map_err(pg)?
            .iter()
            .map(GameSession::hydrate)
            .collect()
    }
    async fn players(&self, game: GameId) -> Result<Vec<Player>, StoreError> {
        self.client
            .lock()
            .await
            .query(SELECT_PLAYERS, &[&game])
            .await
            .map_err(pg)?
            .iter()
            .map(Player::hydrate)
            .collect()
    }
    async fn apply(&self, game: GameId, effects: &[Effect]) -> Result<(), StoreError> {
        let mut client = self.client.lock().await;
        let tx = client.transaction().await.map_err(pg)?;
        for effect in effects {
            write(&tx, game, effect).await?;
        }
        tx.commit().await.map_err(pg)?;
        log::debug!("[postgres] game {} committed {} effects", game, effects.len());
        Ok(())
    }
    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .lock()
            .await
            .execute("SELECT 1", &[])
            .await
            .map(|_| ())
            .map_err(pg)
    }
}

#[async_trait::async_trait]
impl Rules for Postgres {
    /// Unowned deeds are for sale; deeds owned by someone else charge rent.
    async fn land(
        &self,
        game: &GameSession,
        player: &Player,
        to: Square,
        passed_go: bool,
    ) -> Result<Landing, StoreError> {
        if to == GO_TO_JAIL {
            return Ok(Landing::GoToJail);
        }
        let mut effects = salary(player, passed_go);
        match self.deed(game.id, to).await? {
            None => Ok(Landing::Settled { effects }),
            Some(deed) => match deed.owner {
                None => Ok(Landing::Purchasable {
                    property: deed.id,
                    price: deed.price,
                    effects,
                }),
                Some(owner) if owner == player.user_id => Ok(Landing::Settled { effects }),
                Some(owner) => {
                    effects.push(Effect::Debit {
                        user: player.user_id,
                        amount: deed.rent,
                    });
                    effects.push(Effect::Credit {
                        user: owner,
                        amount: deed.rent,
                    });
                    Ok(Landing::Settled { effects })
                }
            },
        }
    }
}
