//! Warroom DB - Database layer using native_db
//!
//! Provides persistent storage for:
//! - Games and their lifecycle (open, active, finished)
//! - Nations and players, scoped per game
//! - The pending action queue
//! - The append-only turn log
//!
//! `Store::resolve_turn` ties storage to the engine in `warroom-core`.

mod error;
mod models;
mod queries;
mod store;

pub use error::{Error, Result};
pub use store::{Store, DEFAULT_GAME_NAME};

use serde::Serialize;
use warroom_core::{Game, Nations, Player};

/// A game together with its nations and players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameView {
    #[serde(flatten)]
    pub game: Game,
    pub nations: Nations,
    pub players: Vec<Player>,
}
