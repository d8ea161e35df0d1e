use actix_web::{error, web, Error, HttpResponse};
use serde_json::json;

use crate::models::AppState;
use crate::server::GetStats;
use crate::timer::{TimeSource, WallTime};

/// Liveness probe with game counts.
pub async fn health(app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let stats = app_state
        .game_server
        .send(GetStats)
        .await
        .map_err(error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": WallTime.epoch_ms(),
        "games": stats.games,
        "active_games": stats.active_games,
    })))
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/health").route(web::get().to(health)));
}
