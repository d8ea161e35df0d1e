use actix::{Message, Recipient};

use crate::models::{ChessWebSocketMessage, ClientMessage};

/// A websocket connection opened for a session.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub connection_id: String,
    pub session_id: String,
    pub addr: Recipient<ChessWebSocketMessage>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub connection_id: String,
}

/// A parsed client message arriving on a connection.
#[derive(Message)]
#[rtype(result = "()")]
pub struct ClientRequest {
    pub connection_id: String,
    pub message: ClientMessage,
}

#[derive(Message)]
#[rtype(result = "ServerStats")]
pub struct GetStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerStats {
    pub games: usize,
    pub active_games: usize,
}
