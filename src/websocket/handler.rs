use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::GameError;
use crate::game::ids::new_session_id;
use crate::models::*;
use crate::server::{ClientRequest, Connect, Disconnect, GameServer};

/// WebSocket handler for chess games
pub struct ChessWebSocket {
    pub id: String,
    pub session_id: String,
    /// Set when the session id was minted for this connection.
    pub announce_session: bool,
    pub server: Addr<GameServer>,
}

impl ChessWebSocket {
    fn reply(&self, message: &ServerMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!("Error serializing message: {}", e),
        }
    }
}

impl Actor for ChessWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        if self.announce_session {
            let session = ServerMessage::Session {
                session_id: self.session_id.clone(),
            };
            self.reply(&session, ctx);
        }
        self.server.do_send(Connect {
            connection_id: self.id.clone(),
            session_id: self.session_id.clone(),
            addr: ctx.address().recipient(),
        });
        info!("WebSocket connection started: {}", self.id);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.server.do_send(Disconnect {
            connection_id: self.id.clone(),
        });
        info!("WebSocket connection closed: {}", self.id);
        Running::Stop
    }
}

impl Handler<ChessWebSocketMessage> for ChessWebSocket {
    type Result = ();

    fn handle(&mut self, msg: ChessWebSocketMessage, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChessWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<ClientMessage>(text.as_ref()) {
                Ok(message) => {
                    self.server.do_send(ClientRequest {
                        connection_id: self.id.clone(),
                        message,
                    });
                }
                Err(e) => {
                    warn!("Error parsing client message: {}", e);
                    let err = GameError::InvalidMessage(e.to_string());
                    self.reply(&ServerMessage::error(&err), ctx);
                }
            },
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                let err = GameError::InvalidMessage("binary messages are not supported".into());
                self.reply(&ServerMessage::error(&err), ctx);
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub session_id: Option<String>,
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<WsQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let (session_id, announce_session) = match query.into_inner().session_id {
        Some(id) if !id.trim().is_empty() => (id, false),
        _ => (new_session_id(), true),
    };

    let ws = ChessWebSocket {
        id: Uuid::new_v4().to_string(),
        session_id,
        announce_session,
        server: app_state.game_server.clone(),
    };
    ws::start(ws, &req, stream)
}
