//! PostgreSQL persistence for live games.
//!
//! ## Connectivity
//!
//! - [`db()`] - Opens a connection and spawns its driver
//! - [`Postgres`] - [`tycoon_records::Store`] and [`tycoon_records::Rules`] over one connection
//!
//! ## Schema
//!
//! - [`Schema`] - Table DDL per record type
//! - [`Hydrate`] - Row decoding per record type
//! - [`migrate()`] - Creates every table and index
//!
//! ## Table Names
//!
//! Constants for games, their seats, and their properties.
mod hydrate;
mod postgres;
mod schema;

pub use hydrate::*;
pub use postgres::*;
pub use schema::*;

use tokio_postgres::Client;
use tycoon_records::StoreError;

/// Connects to PostgreSQL at `url` and spawns the connection driver.
pub async fn db(url: &str) -> Result<Client, PgErr> {
    log::info!("connecting to database");
    let tls = tokio_postgres::tls::NoTls;
    let (client, connection) = tokio_postgres::connect(url, tls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("database connection closed: {}", e);
        }
    });
    client
        .execute("SET client_min_messages TO WARNING", &[])
        .await?;
    Ok(client)
}

/// PostgreSQL error type alias.
pub type PgErr = tokio_postgres::Error;

/// Server-side refusals are the batch's fault; anything else is the link's.
pub fn pg(e: PgErr) -> StoreError {
    match e.as_db_error() {
        Some(db) => StoreError::Rejected(db.message().to_string()),
        None => StoreError::Unavailable(e.to_string()),
    }
}

/// Table for game sessions.
#[rustfmt::skip]
pub const GAMES:      &str = "games";
/// Table for seats in games.
#[rustfmt::skip]
pub const PLAYERS:    &str = "players";
/// Table for purchasable squares per game.
#[rustfmt::skip]
pub const PROPERTIES: &str = "properties";
