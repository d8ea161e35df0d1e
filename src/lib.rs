//! Anti-flag chess: a two-player chess server where running out of time on
//! a move plays a random legal move for you instead of losing the game.

pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod routes;
pub mod server;
pub mod timer;
pub mod websocket;

pub use config::ServerConfig;
pub use error::{GameError, RulesError, SettingsError};
