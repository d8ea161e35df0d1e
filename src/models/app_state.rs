use actix::Addr;

use crate::server::GameServer;

/// Application state shared between connections
pub struct AppState {
    pub game_server: Addr<GameServer>,
}
