//! Backend Server
//!
//! Wires the turn arbiter, agent registry, snapshot cache, admission gate,
//! and room broadcaster into a single actix-web server.
//!
//! ## Routes
//!
//! - [`handlers`] - Health, snapshots, actions, and votes
//! - [`socket`] - WebSocket room channel
//! - [`tycoon_agents::routes`] - Agent registry

pub mod handlers;
pub mod socket;

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpServer;
use actix_web::middleware::Logger;
use actix_web::web;
use std::sync::Arc;
use tycoon_agents::Registry;
use tycoon_agents::Router;
use tycoon_arbiter::Arbiter;
use tycoon_arbiter::TimerConfig;
use tycoon_cache::SessionCache;
use tycoon_core::Config;
use tycoon_database::Postgres;
use tycoon_gate::Gate;
use tycoon_gate::GateConfig;
use tycoon_hosting::Broadcaster;
use tycoon_records::Rules;
use tycoon_records::Store;

/// Mounts game, health, and socket routes.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/ws", web::get().to(socket::enter))
        .service(
            web::scope("/games")
                .route("/code/{code}", web::get().to(handlers::snapshot))
                .route("/{id}/actions", web::post().to(handlers::act))
                .route("/{id}/votes", web::post().to(handlers::vote)),
        );
}

/// Connects to PostgreSQL and serves until shutdown.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let postgres = Arc::new(Postgres::connect(&config.db_url).await?);
    serve(config, postgres.clone(), postgres).await
}

#[rustfmt::skip]
pub async fn serve(config: Config, store: Arc<dyn Store>, rules: Arc<dyn Rules>) -> anyhow::Result<()> {
    let cache = Arc::new(SessionCache::new(config.cache_ttl()));
    let rooms = Arc::new(Broadcaster::default());
    let registry = Arc::new(Registry::default());
    let router = Arc::new(Router::http(registry.clone(), config.agent_timeout()));
    let gate = Gate::new(GateConfig {
        max_connections: config.max_connections,
        events_per_window: config.events_per_minute,
        window: config.event_window(),
    });
    let arbiter = Arbiter::new(store, rules, cache.clone(), rooms.clone())
        .with_router(router.clone())
        .with_timer(TimerConfig::from(&config));
    let arbiter = Arc::new(arbiter);
    tokio::spawn(arbiter.clone().patrol());
    tokio::spawn(evict(cache.clone()));
    tokio::spawn(prune(gate.clone()));
    let arbiter = web::Data::from(arbiter);
    let cache = web::Data::from(cache);
    let rooms = web::Data::from(rooms);
    let registry = web::Data::from(registry);
    let router = web::Data::from(router);
    let gate = web::Data::from(gate);
    log::info!("starting server on {}", config.bind);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(arbiter.clone())
            .app_data(cache.clone())
            .app_data(rooms.clone())
            .app_data(registry.clone())
            .app_data(router.clone())
            .app_data(gate.clone())
            .configure(routes)
            .configure(tycoon_agents::routes)
    })
    .workers(config.workers)
    .bind(&config.bind)?
    .run()
    .await?;
    Ok(())
}

/// Periodically drops lapsed request budgets.
async fn prune(gate: Arc<Gate>) {
    let mut interval = tokio::time::interval(gate.config().window);
    loop {
        interval.tick().await;
        match gate.prune() {
            0 => {}
            n => log::debug!("[gate] pruned {} request windows", n),
        }
    }
}

/// Periodically drops expired snapshots so idle games do not linger.
async fn evict(cache: Arc<SessionCache>) {
    let mut interval = tokio::time::interval(cache.ttl());
    loop {
        interval.tick().await;
        match cache.purge() {
            0 => {}
            n => log::debug!("[cache] purged {} expired snapshots", n),
        }
    }
}
