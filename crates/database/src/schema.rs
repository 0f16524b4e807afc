//! Table DDL for the persisted records.
use super::*;
use tokio_postgres::Client;
use tycoon_records::GameSession;
use tycoon_records::Player;

/// Schema metadata for PostgreSQL tables.
/// Pure description; statements are built at compile time.
pub trait Schema {
    fn name() -> &'static str;
    /// `CREATE TABLE IF NOT EXISTS` statement.
    fn creates() -> &'static str;
    /// `CREATE INDEX IF NOT EXISTS` statements.
    fn indices() -> &'static str;
}

/// A purchasable square in one game.
#[derive(Debug, Clone, PartialEq)]
pub struct Deed {
    pub id: i64,
    pub square: i16,
    pub price: i64,
    pub rent: i64,
    pub owner: Option<i64>,
}

impl Schema for GameSession {
    fn name() -> &'static str {
        GAMES
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            GAMES,
            " (
                id                      BIGSERIAL PRIMARY KEY,
                code                    TEXT UNIQUE NOT NULL,
                status                  TEXT NOT NULL DEFAULT 'PENDING',
                current_turn_player_id  BIGINT,
                turn_started_at         TIMESTAMPTZ NOT NULL DEFAULT now(),
                winner                  BIGINT
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_",
            GAMES,
            "_status ON ",
            GAMES,
            " (status);"
        )
    }
}

impl Schema for Player {
    fn name() -> &'static str {
        PLAYERS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            PLAYERS,
            " (
                game_id               BIGINT NOT NULL REFERENCES ",
            GAMES,
            "(id) ON DELETE CASCADE,
                user_id               BIGINT NOT NULL,
                seat                  SMALLINT NOT NULL,
                address               TEXT NOT NULL DEFAULT '',
                balance               BIGINT NOT NULL,
                position              SMALLINT NOT NULL DEFAULT 0,
                in_jail               BOOLEAN NOT NULL DEFAULT FALSE,
                consecutive_timeouts  INTEGER NOT NULL DEFAULT 0,
                agent                 BOOLEAN NOT NULL DEFAULT FALSE,
                removed               BOOLEAN NOT NULL DEFAULT FALSE,
                PRIMARY KEY (game_id, user_id)
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_",
            PLAYERS,
            "_seat ON ",
            PLAYERS,
            " (game_id, seat);"
        )
    }
}

impl Schema for Deed {
    fn name() -> &'static str {
        PROPERTIES
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            PROPERTIES,
            " (
                game_id  BIGINT NOT NULL REFERENCES ",
            GAMES,
            "(id) ON DELETE CASCADE,
                id       BIGINT NOT NULL,
                square   SMALLINT NOT NULL,
                price    BIGINT NOT NULL,
                rent     BIGINT NOT NULL,
                owner    BIGINT,
                PRIMARY KEY (game_id, id)
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_",
            PROPERTIES,
            "_square ON ",
            PROPERTIES,
            " (game_id, square);"
        )
    }
}

/// Creates every table and index, in dependency order.
pub async fn migrate(client: &Client) -> Result<(), PgErr> {
    log::info!("creating tables");
    client.batch_execute(GameSession::creates()).await?;
    client.batch_execute(Player::creates()).await?;
    client.batch_execute(Deed::creates()).await?;
    client.batch_execute(GameSession::indices()).await?;
    client.batch_execute(Player::indices()).await?;
    client.batch_execute(Deed::indices()).await?;
    Ok(())
}
