pub mod auto_move;
pub mod end_detector;
pub mod ids;
pub mod orchestrator;
pub mod rules;
pub mod sessions;
pub mod store;

pub use auto_move::select_auto_move;
pub use end_detector::detect;
pub use orchestrator::{Audience, GameOrchestrator, Outbound};
pub use rules::{AppliedMove, ChessPosition, LegalMoves, STARTING_FEN};
pub use sessions::SessionStore;
pub use store::{GameStore, InMemoryGameStore};
