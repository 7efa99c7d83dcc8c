//! Per-game resolution locks

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use warroom_core::GameId;

/// Hands out one async mutex per game.
///
/// Holding the guard excludes every other resolution of the same game while
/// other games proceed in parallel.
#[derive(Debug, Default)]
pub struct GameLocks {
    locks: Mutex<HashMap<GameId, Arc<Mutex<()>>>>,
}

impl GameLocks {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a game
    pub async fn acquire(&self, game_id: GameId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(game_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}
