use clap::Parser;
use std::time::Duration;

/// Cadence of the per-game store sweep.
pub const CLEANUP_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// How long a created game waits for an opponent before it is dropped.
pub const WAITING_GAME_TTL: Duration = Duration::from_secs(60 * 60);

/// How often each running game broadcasts its timer snapshot.
pub const TIMER_SYNC_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Anti-flag chess game server", long_about = None)]
pub struct ServerConfig {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Public URL of the client, used to build invite links
    #[arg(long, env = "BASE_URL", default_value = "http://localhost:3000")]
    pub base_url: String,

    /// Origin allowed to open connections from a browser
    #[arg(long, env = "CORS_ORIGIN", default_value = "http://localhost:3000")]
    pub cors_origin: String,

    /// Directory served as static files
    #[arg(long, env = "STATIC_DIR", default_value = "./static")]
    pub static_dir: String,

    /// Seconds an ended game stays in memory before it is removed
    #[arg(long, env = "CLEANUP_AFTER_SECS", default_value_t = 300)]
    pub cleanup_after_secs: u64,
}

impl ServerConfig {
    pub fn cleanup_after(&self) -> Duration {
        Duration::from_secs(self.cleanup_after_secs)
    }
}
