//! Realtime Tien Len server binary: the actix-web HTTP/WebSocket surface
//! over the gameroom engine's connection hub. Registration, login, and
//! room-listing HTTP endpoints are deliberately not part of this crate;
//! the only exposed routes are a health check and the WebSocket upgrade.

pub mod config;
pub mod logging;
pub mod ws;

pub use config::Config;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

use tl_auth::Crypto;
use tl_hosting::{BotManager, Hub, MatchmakingService};

pub async fn run() -> std::io::Result<()> {
    let config = Config::from_env();
    let hub = Hub::new();
    let crypto = web::Data::new(Crypto::from_env());

    let (match_tx, match_rx) = tokio::sync::mpsc::unbounded_channel();
    hub.set_matchmaker(match_tx).await;
    let matchmaking = MatchmakingService::new(Arc::clone(&hub), match_rx);
    tokio::spawn(matchmaking.run());

    let bots = BotManager::new(Arc::clone(&hub));
    tokio::spawn(bots.run());

    let hub_data = web::Data::new(hub);
    log::info!("starting tien len server on {}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(hub_data.clone())
            .app_data(crypto.clone())
            .route("/health", web::get().to(ws::health))
            .route("/ws", web::get().to(ws::connect))
    })
    .workers(config.workers)
    .bind(&config.bind_addr)?
    .run()
    .await
}
