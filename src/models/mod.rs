pub mod app_state;
pub mod game_state;
pub mod messages;
pub mod settings;
pub mod side;
pub mod timer_state;

// Re-export important types
pub use app_state::AppState;
pub use game_state::*;
pub use messages::*;
pub use settings::*;
pub use side::Side;
pub use timer_state::TimerState;
