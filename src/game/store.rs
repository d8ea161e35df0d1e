use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::error::GameError;
use crate::game::GameOrchestrator;
use crate::models::GameStatus;
use crate::timer::TimeSource;

/// Repository of live games. The server owns one and hands out borrows.
pub trait GameStore<T: TimeSource> {
    fn create(&mut self, game: GameOrchestrator<T>);

    fn get(&self, game_id: &str) -> Option<&GameOrchestrator<T>>;

    fn get_mut(&mut self, game_id: &str) -> Option<&mut GameOrchestrator<T>>;

    fn update(
        &mut self,
        game_id: &str,
        apply: &mut dyn FnMut(&mut GameOrchestrator<T>),
    ) -> Result<(), GameError> {
        let game = self.get_mut(game_id).ok_or(GameError::GameNotFound)?;
        apply(game);
        Ok(())
    }

    fn delete(&mut self, game_id: &str) -> Option<GameOrchestrator<T>>;

    /// Marks a game for removal once `after` has passed.
    fn schedule_cleanup(&mut self, game_id: &str, after: Duration);

    /// Withdraws a pending cleanup deadline.
    fn cancel_cleanup(&mut self, game_id: &str);

    /// Removes every game whose cleanup deadline has passed; returns their ids.
    fn purge_expired(&mut self) -> Vec<String>;

    fn active_count(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct InMemoryGameStore<T: TimeSource> {
    games: HashMap<String, GameOrchestrator<T>>,
    cleanup_at: HashMap<String, Instant>,
    time: T,
}

impl<T: TimeSource> InMemoryGameStore<T> {
    pub fn new(time: T) -> Self {
        Self {
            games: HashMap::new(),
            cleanup_at: HashMap::new(),
            time,
        }
    }
}

impl<T: TimeSource> GameStore<T> for InMemoryGameStore<T> {
    fn create(&mut self, game: GameOrchestrator<T>) {
        info!("game {} stored", game.id());
        self.games.insert(game.id().to_string(), game);
    }

    fn get(&self, game_id: &str) -> Option<&GameOrchestrator<T>> {
        self.games.get(game_id)
    }

    fn get_mut(&mut self, game_id: &str) -> Option<&mut GameOrchestrator<T>> {
        self.games.get_mut(game_id)
    }

    fn delete(&mut self, game_id: &str) -> Option<GameOrchestrator<T>> {
        self.cleanup_at.remove(game_id);
        self.games.remove(game_id)
    }

    fn schedule_cleanup(&mut self, game_id: &str, after: Duration) {
        if self.games.contains_key(game_id) {
            debug!("game {} scheduled for cleanup in {:?}", game_id, after);
            self.cleanup_at
                .insert(game_id.to_string(), self.time.now() + after);
        }
    }

    fn cancel_cleanup(&mut self, game_id: &str) {
        if self.cleanup_at.remove(game_id).is_some() {
            debug!("cleanup of game {} cancelled", game_id);
        }
    }

    fn purge_expired(&mut self) -> Vec<String> {
        let now = self.time.now();
        let expired: Vec<String> = self
            .cleanup_at
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            self.delete(id);
            info!("game {} cleaned up", id);
        }
        expired
    }

    fn active_count(&self) -> usize {
        self.games
            .values()
            .filter(|g| g.status() == GameStatus::Active)
            .count()
    }

    fn len(&self) -> usize {
        self.games.len()
    }
}
