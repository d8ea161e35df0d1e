use actix::Actor;
use actix_cors::Cors;
use actix_files as fs;
use actix_web::{http, middleware::Logger, web, App, HttpServer};
use clap::Parser;
use log::info;

use antiflag_chess::models::AppState;
use antiflag_chess::routes::configure_routes;
use antiflag_chess::server::GameServer;
use antiflag_chess::timer::WallTime;
use antiflag_chess::ServerConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::parse();
    info!(
        "Starting anti-flag chess server at http://{}:{}",
        config.host, config.port
    );

    let game_server =
        GameServer::new(WallTime, config.base_url.clone(), config.cleanup_after()).start();
    let app_state = web::Data::new(AppState { game_server });

    let cors_origin = config.cors_origin.clone();
    let static_dir = config.static_dir.clone();
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![http::header::CONTENT_TYPE])
            .supports_credentials();
        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .configure(configure_routes)
            .service(fs::Files::new("/", &static_dir).index_file("index.html"))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
