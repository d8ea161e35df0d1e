use std::collections::{HashMap, HashSet};

/// Which game a session plays in, and which live connections speak for it.
///
/// A session outlives its connections: closing a tab and reopening it keeps
/// the same session id, so the seat in the game survives.
#[derive(Debug, Default)]
pub struct SessionStore {
    session_to_game: HashMap<String, String>,
    connection_to_session: HashMap<String, String>,
    session_to_connections: HashMap<String, HashSet<String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_session_game(&mut self, session_id: &str, game_id: &str) {
        self.session_to_game
            .insert(session_id.to_string(), game_id.to_string());
    }

    pub fn game_for_session(&self, session_id: &str) -> Option<&str> {
        self.session_to_game.get(session_id).map(String::as_str)
    }

    /// Forgets every session's binding to a removed game.
    pub fn unbind_game(&mut self, game_id: &str) {
        self.session_to_game.retain(|_, gid| gid.as_str() != game_id);
    }

    pub fn attach(&mut self, connection_id: &str, session_id: &str) {
        self.connection_to_session
            .insert(connection_id.to_string(), session_id.to_string());
        self.session_to_connections
            .entry(session_id.to_string())
            .or_default()
            .insert(connection_id.to_string());
    }

    /// Returns the session the connection belonged to.
    pub fn detach(&mut self, connection_id: &str) -> Option<String> {
        let session_id = self.connection_to_session.remove(connection_id)?;
        if let Some(connections) = self.session_to_connections.get_mut(&session_id) {
            connections.remove(connection_id);
            if connections.is_empty() {
                self.session_to_connections.remove(&session_id);
            }
        }
        Some(session_id)
    }

    pub fn session_for_connection(&self, connection_id: &str) -> Option<&str> {
        self.connection_to_session
            .get(connection_id)
            .map(String::as_str)
    }

    pub fn connections_for_session(&self, session_id: &str) -> impl Iterator<Item = &str> {
        self.session_to_connections
            .get(session_id)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn is_connected(&self, session_id: &str) -> bool {
        self.session_to_connections.contains_key(session_id)
    }
}
