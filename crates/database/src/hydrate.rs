use super::*;
use tokio_postgres::Row;
use tycoon_records::GameSession;
use tycoon_records::Player;
use tycoon_records::Status;
use tycoon_records::StoreError;

/// Decodes a record from its row.
/// Column order follows [`Hydrate::COLUMNS`].
pub trait Hydrate: Sized {
    const COLUMNS: &'static str;
    fn hydrate(row: &Row) -> Result<Self, StoreError>;
}

fn corrupt(e: PgErr) -> StoreError {
    StoreError::Corrupt(e.to_string())
}

impl Hydrate for GameSession {
    const COLUMNS: &'static str =
        "id, code, status, current_turn_player_id, turn_started_at, winner";
    fn hydrate(row: &Row) -> Result<Self, StoreError> {
        let status = row.try_get::<_, &str>(2).map_err(corrupt)?;
        Ok(Self {
            id: row.try_get(0).map_err(corrupt)?,
            code: row.try_get(1).map_err(corrupt)?,
            status: Status::try_from(status).map_err(StoreError::Corrupt)?,
            current_turn_player_id: row.try_get(3).map_err(corrupt)?,
            turn_started_at: row.try_get(4).map_err(corrupt)?,
            winner: row.try_get(5).map_err(corrupt)?,
        })
    }
}

impl Hydrate for Player {
    const COLUMNS: &'static str =
        "user_id, seat, address, balance, position, in_jail, consecutive_timeouts, agent, removed";
    fn hydrate(row: &Row) -> Result<Self, StoreError> {
        let narrow = |column: &str, n: i64| {
            u8::try_from(n)
                .map_err(|_| StoreError::Corrupt(format!("{} {} out of range", column, n)))
        };
        let seat = row.try_get::<_, i16>(1).map_err(corrupt)?;
        let position = row.try_get::<_, i16>(4).map_err(corrupt)?;
        let timeouts = row.try_get::<_, i32>(6).map_err(corrupt)?;
        Ok(Self {
            user_id: row.try_get(0).map_err(corrupt)?,
            seat: narrow("seat", seat as i64)?,
            address: row.try_get(2).map_err(corrupt)?,
            balance: row.try_get(3).map_err(corrupt)?,
            position: narrow("position", position as i64)?,
            in_jail: row.try_get(5).map_err(corrupt)?,
            consecutive_timeouts: timeouts.max(0) as u32,
            agent: row.try_get(7).map_err(corrupt)?,
            removed: row.try_get(8).map_err(corrupt)?,
        })
    }
}

impl Hydrate for Deed {
    const COLUMNS: &'static str = "id, square, price, rent, owner";
    fn hydrate(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.try_get(0).map_err(corrupt)?,
            square: row.try_get(1).map_err(corrupt)?,
            price: row.try_get(2).map_err(corrupt)?,
            rent: row.try_get(3).map_err(corrupt)?,
            owner: row.try_get(4).map_err(corrupt)?,
        })
    }
}
