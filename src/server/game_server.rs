use std::collections::HashMap;
use std::time::Duration;

use actix::prelude::*;
use log::{debug, info, warn};

use crate::config::{CLEANUP_SWEEP_INTERVAL, TIMER_SYNC_INTERVAL, WAITING_GAME_TTL};
use crate::error::GameError;
use crate::game::ids::{game_id_from_link, invite_link, new_game_id};
use crate::game::{Audience, GameOrchestrator, GameStore, InMemoryGameStore, Outbound, SessionStore};
use crate::models::{
    ChessWebSocketMessage, ClientMessage, GameStatus, ServerMessage, SettingsPatch, Side,
};
use crate::server::messages::{ClientRequest, Connect, Disconnect, GetStats, ServerStats};
use crate::timer::{TimeSource, WallTime, TICK_INTERVAL};

/// The two periodic tasks a running game owns.
struct GameTimers {
    ticker: SpawnHandle,
    sync: SpawnHandle,
}

/// Hosts every game on one actor. Requests, clock ticks and snapshot
/// broadcasts are all handled on its mailbox, one at a time.
pub struct GameServer<T: TimeSource + Unpin = WallTime> {
    store: Box<dyn GameStore<T>>,
    sessions: SessionStore,
    connections: HashMap<String, Recipient<ChessWebSocketMessage>>,
    timers: HashMap<String, GameTimers>,
    time: T,
    base_url: String,
    cleanup_after: Duration,
}

impl<T: TimeSource + Unpin> GameServer<T> {
    pub fn new(time: T, base_url: impl Into<String>, cleanup_after: Duration) -> Self {
        let store = Box::new(InMemoryGameStore::new(time.clone()));
        Self::with_store(store, time, base_url, cleanup_after)
    }

    pub fn with_store(
        store: Box<dyn GameStore<T>>,
        time: T,
        base_url: impl Into<String>,
        cleanup_after: Duration,
    ) -> Self {
        Self {
            store,
            sessions: SessionStore::new(),
            connections: HashMap::new(),
            timers: HashMap::new(),
            time,
            base_url: base_url.into(),
            cleanup_after,
        }
    }

    fn handle_request(
        &mut self,
        connection_id: &str,
        session_id: &str,
        message: ClientMessage,
        ctx: &mut Context<Self>,
    ) -> Result<(), GameError> {
        match message {
            ClientMessage::CreateGame { settings } => {
                self.create_game(connection_id, session_id, settings)
            }
            ClientMessage::JoinGame { game_id } => {
                let game_id = game_id_from_link(&game_id).to_string();
                self.with_game(ctx, &game_id, |game| game.join(session_id))?;
                self.store.cancel_cleanup(&game_id);
                self.sessions.set_session_game(session_id, &game_id);
                self.start_game_timers(ctx, &game_id);
                Ok(())
            }
            ClientMessage::RejoinGame { game_id } => {
                self.with_game(ctx, &game_id, |game| game.rejoin(session_id))?;
                self.sessions.set_session_game(session_id, &game_id);
                Ok(())
            }
            ClientMessage::MakeMove { game_id, notation } => {
                self.with_game(ctx, &game_id, |game| game.make_move(session_id, &notation))
            }
            ClientMessage::Resign { game_id } => {
                self.with_game(ctx, &game_id, |game| game.resign(session_id))
            }
            ClientMessage::OfferDraw { game_id } => {
                self.with_game(ctx, &game_id, |game| game.offer_draw(session_id))
            }
            ClientMessage::RespondDraw { game_id, accept } => {
                self.with_game(ctx, &game_id, |game| game.respond_draw(session_id, accept))
            }
            ClientMessage::GetMoves { game_id, square } => {
                let game = self.store.get(&game_id).ok_or(GameError::GameNotFound)?;
                let reply = game.get_moves(session_id, &square)?;
                self.send_to_connection(connection_id, &reply);
                Ok(())
            }
            ClientMessage::TimeSync { game_id } => {
                let game = self.store.get(&game_id).ok_or(GameError::GameNotFound)?;
                let reply = game.time_sync(session_id)?;
                self.send_to_connection(connection_id, &reply);
                Ok(())
            }
        }
    }

    fn create_game(
        &mut self,
        connection_id: &str,
        session_id: &str,
        patch: SettingsPatch,
    ) -> Result<(), GameError> {
        let settings = patch.resolve()?;
        self.drop_waiting_game(session_id);

        let game_id = new_game_id();
        let game = GameOrchestrator::new(game_id.clone(), session_id, settings, self.time.clone());
        self.store.create(game);
        self.store.schedule_cleanup(&game_id, WAITING_GAME_TTL);
        self.sessions.set_session_game(session_id, &game_id);
        info!("game {} created by {}", game_id, session_id);

        let reply = ServerMessage::GameCreated {
            invite_link: invite_link(&self.base_url, &game_id),
            game_id,
            settings,
            host_color: settings.host_color,
        };
        self.send_to_connection(connection_id, &reply);
        Ok(())
    }

    /// A host creating a new game abandons the one still waiting for them.
    fn drop_waiting_game(&mut self, session_id: &str) {
        let Some(game_id) = self.sessions.game_for_session(session_id).map(str::to_string) else {
            return;
        };
        let waiting = self.store.get(&game_id).is_some_and(|g| {
            g.status() == GameStatus::Waiting && g.player_color(session_id).is_some()
        });
        if waiting {
            self.store.delete(&game_id);
            self.sessions.unbind_game(&game_id);
            info!("waiting game {} dropped by {}", game_id, session_id);
        }
    }

    /// Runs one operation on a game, stops its timers if that ended it, then
    /// delivers the resulting messages.
    fn with_game<F>(&mut self, ctx: &mut Context<Self>, game_id: &str, op: F) -> Result<(), GameError>
    where
        F: FnOnce(&mut GameOrchestrator<T>) -> Result<Vec<Outbound>, GameError>,
    {
        let game = self.store.get_mut(game_id).ok_or(GameError::GameNotFound)?;
        let outbound = op(game)?;
        if game.is_ended() {
            self.end_game(ctx, game_id);
        }
        self.deliver(game_id, outbound);
        Ok(())
    }

    fn start_game_timers(&mut self, ctx: &mut Context<Self>, game_id: &str) {
        let running = self
            .store
            .get(game_id)
            .map(|g| g.timers().active_player().is_some())
            .unwrap_or(false);
        if !running || self.timers.contains_key(game_id) {
            return;
        }

        let id = game_id.to_string();
        let ticker = ctx.run_interval(TICK_INTERVAL, move |act, ctx| act.tick_game(ctx, &id));
        let id = game_id.to_string();
        let sync = ctx.run_interval(TIMER_SYNC_INTERVAL, move |act, _| act.sync_game(&id));
        self.timers
            .insert(game_id.to_string(), GameTimers { ticker, sync });
        debug!("timers scheduled for game {}", game_id);
    }

    fn tick_game(&mut self, ctx: &mut Context<Self>, game_id: &str) {
        let Some(game) = self.store.get_mut(game_id) else {
            self.cancel_timers(ctx, game_id);
            return;
        };
        let outbound = game.poll_timers();
        if game.is_ended() {
            self.end_game(ctx, game_id);
        }
        self.deliver(game_id, outbound);
    }

    fn sync_game(&self, game_id: &str) {
        if let Some(snapshot) = self.store.get(game_id).and_then(|g| g.sync_snapshot()) {
            self.broadcast(game_id, &snapshot);
        }
    }

    fn end_game(&mut self, ctx: &mut Context<Self>, game_id: &str) {
        self.cancel_timers(ctx, game_id);
        self.store.schedule_cleanup(game_id, self.cleanup_after);
    }

    fn cancel_timers(&mut self, ctx: &mut Context<Self>, game_id: &str) {
        if let Some(timers) = self.timers.remove(game_id) {
            ctx.cancel_future(timers.ticker);
            ctx.cancel_future(timers.sync);
            debug!("timers cancelled for game {}", game_id);
        }
    }

    fn purge(&mut self, ctx: &mut Context<Self>) {
        for game_id in self.store.purge_expired() {
            self.cancel_timers(ctx, &game_id);
            self.sessions.unbind_game(&game_id);
        }
    }

    fn deliver(&self, game_id: &str, outbound: Vec<Outbound>) {
        for Outbound { audience, message } in outbound {
            match audience {
                Audience::Room => self.broadcast(game_id, &message),
                Audience::Player(side) => self.send_to_player(game_id, side, &message),
            }
        }
    }

    fn broadcast(&self, game_id: &str, message: &ServerMessage) {
        for side in Side::BOTH {
            self.send_to_player(game_id, side, message);
        }
    }

    fn send_to_player(&self, game_id: &str, side: Side, message: &ServerMessage) {
        let Some(session_id) = self.store.get(game_id).and_then(|g| g.session_id(side)) else {
            return;
        };
        let Some(text) = encode(message) else {
            return;
        };
        for connection_id in self.sessions.connections_for_session(session_id) {
            if let Some(addr) = self.connections.get(connection_id) {
                addr.do_send(ChessWebSocketMessage(text.clone()));
            }
        }
    }

    fn send_to_connection(&self, connection_id: &str, message: &ServerMessage) {
        let Some(addr) = self.connections.get(connection_id) else {
            warn!("no connection {} for reply", connection_id);
            return;
        };
        if let Some(text) = encode(message) {
            addr.do_send(ChessWebSocketMessage(text));
        }
    }
}

fn encode(message: &ServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("Error serializing message: {}", e);
            None
        }
    }
}

impl<T: TimeSource + Unpin> Actor for GameServer<T> {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        ctx.run_interval(CLEANUP_SWEEP_INTERVAL, |act, ctx| act.purge(ctx));
        info!("game server started");
    }
}

impl<T: TimeSource + Unpin> Handler<Connect> for GameServer<T> {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) {
        let Connect {
            connection_id,
            session_id,
            addr,
        } = msg;
        self.connections.insert(connection_id.clone(), addr);
        self.sessions.attach(&connection_id, &session_id);
        info!(
            "connection {} opened for session {} ({} connections)",
            connection_id,
            session_id,
            self.connections.len()
        );

        let found = self
            .sessions
            .game_for_session(&session_id)
            .and_then(|game_id| self.store.get(game_id))
            .and_then(|game| game.active_game_found(&session_id));
        if let Some(found) = found {
            self.send_to_connection(&connection_id, &found);
        }
    }
}

impl<T: TimeSource + Unpin> Handler<Disconnect> for GameServer<T> {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        self.connections.remove(&msg.connection_id);
        let Some(session_id) = self.sessions.detach(&msg.connection_id) else {
            return;
        };
        info!("connection {} closed", msg.connection_id);
        if self.sessions.is_connected(&session_id) {
            return;
        }

        let Some(game_id) = self.sessions.game_for_session(&session_id).map(str::to_string) else {
            return;
        };
        if let Some(game) = self.store.get_mut(&game_id) {
            let outbound = game.disconnect(&session_id);
            self.deliver(&game_id, outbound);
        }
    }
}

impl<T: TimeSource + Unpin> Handler<ClientRequest> for GameServer<T> {
    type Result = ();

    fn handle(&mut self, msg: ClientRequest, ctx: &mut Context<Self>) {
        let ClientRequest {
            connection_id,
            message,
        } = msg;
        let Some(session_id) = self
            .sessions
            .session_for_connection(&connection_id)
            .map(str::to_string)
        else {
            self.send_to_connection(&connection_id, &ServerMessage::error(&GameError::NoSession));
            return;
        };

        let action = message.name();
        let is_move = matches!(message, ClientMessage::MakeMove { .. });
        debug!("{} from session {}", action, session_id);
        if let Err(err) = self.handle_request(&connection_id, &session_id, message, ctx) {
            warn!("{} rejected for session {}: {}", action, session_id, err);
            let reply = if is_move {
                ServerMessage::move_rejected(&err)
            } else {
                ServerMessage::error(&err)
            };
            self.send_to_connection(&connection_id, &reply);
        }
    }
}

impl<T: TimeSource + Unpin> Handler<GetStats> for GameServer<T> {
    type Result = MessageResult<GetStats>;

    fn handle(&mut self, _: GetStats, _: &mut Context<Self>) -> Self::Result {
        MessageResult(ServerStats {
            games: self.store.len(),
            active_games: self.store.active_count(),
        })
    }
}
