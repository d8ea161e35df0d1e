pub mod game_server;
pub mod messages;

pub use game_server::GameServer;
pub use messages::{ClientRequest, Connect, Disconnect, GetStats, ServerStats};
