use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use futures::StreamExt;

use tl_auth::Crypto;
use tl_core::{WS_MAX_FRAME_BYTES, WS_PING_INTERVAL_SECS, WS_PONG_TIMEOUT_SECS, WS_WRITE_TIMEOUT_SECS};
use tl_hosting::Hub;

pub async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

/// Upgrades to a WebSocket, authenticating via the `token` query param.
/// Every downstream operation routes by `user_id`, so a missing or
/// expired token rejects the upgrade outright rather than admitting an
/// anonymous session with nothing useful to do.
pub async fn connect(
    hub: web::Data<Arc<Hub>>,
    tokens: web::Data<Crypto>,
    query: web::Query<HashMap<String, String>>,
    body: web::Payload,
    req: HttpRequest,
) -> impl Responder {
    let claims = query
        .get("token")
        .and_then(|t| tokens.decode(t).ok())
        .filter(|c| !c.expired());

    let (user_id, username) = match claims {
        Some(c) => (c.user_id(), c.username().to_string()),
        None => {
            log::warn!("ws upgrade with missing or invalid token");
            return HttpResponse::Unauthorized().body("invalid or expired token");
        }
    };

    let (response, mut session, mut stream) = match actix_ws::handle(&req, body) {
        Ok(parts) => parts,
        Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
    };

    let hub = hub.into_inner();
    let mut receiver = tl_hosting::connect(&hub, user_id, username).await;
    log::info!("user {} connected", user_id);

    actix_web::rt::spawn(async move {
        let mut ping_tick = tokio::time::interval(Duration::from_secs(WS_PING_INTERVAL_SECS));
        ping_tick.tick().await;
        let mut last_pong = Instant::now();

        'bridge: loop {
            tokio::select! {
                biased;
                frame = receiver.recv() => match frame {
                    Some(text) => {
                        let write_deadline = Duration::from_secs(WS_WRITE_TIMEOUT_SECS);
                        match tokio::time::timeout(write_deadline, session.text(text)).await {
                            Ok(Ok(())) => {}
                            _ => {
                                log::warn!("user {} write deadline exceeded, closing", user_id);
                                break 'bridge;
                            }
                        }
                    }
                    None => break 'bridge,
                },
                msg = stream.next() => match msg {
                    Some(Ok(actix_ws::Message::Text(text))) => {
                        if text.len() > WS_MAX_FRAME_BYTES {
                            log::warn!("user {} sent an oversized frame, closing", user_id);
                            break 'bridge;
                        }
                        tl_hosting::on_message(&hub, user_id, &text).await;
                    }
                    Some(Ok(actix_ws::Message::Ping(bytes))) => {
                        if session.pong(&bytes).await.is_err() { break 'bridge }
                    }
                    Some(Ok(actix_ws::Message::Pong(_))) => {
                        last_pong = Instant::now();
                    }
                    Some(Ok(actix_ws::Message::Close(_))) | None | Some(Err(_)) => break 'bridge,
                    _ => continue 'bridge,
                },
                _ = ping_tick.tick() => {
                    if last_pong.elapsed() > Duration::from_secs(WS_PONG_TIMEOUT_SECS) {
                        log::warn!("user {} timed out on keepalive, closing", user_id);
                        break 'bridge;
                    }
                    if session.ping(b"").await.is_err() { break 'bridge }
                },
            }
        }
        tl_hosting::on_disconnect(&hub, user_id).await;
        log::info!("user {} disconnected", user_id);
    });

    response
}
