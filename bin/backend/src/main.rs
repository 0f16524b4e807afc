//! Tycoon Backend Binary
//!
//! Serves turn arbitration, agent routing, and game rooms.
//! Runs on BIND_ADDR (e.g. 0.0.0.0:8888) against DB_URL.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tycoon_core::log();
    tycoon_core::kys();
    tycoon_server::run(tycoon_core::Config::from_env()).await
}
