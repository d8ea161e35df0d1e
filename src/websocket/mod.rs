pub mod handler;

pub use handler::{ws_index, ChessWebSocket};
