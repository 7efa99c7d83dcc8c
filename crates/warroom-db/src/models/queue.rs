//! Action queue and turn log models for database storage.

use crate::error::Result;
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};
use warroom_core::{Action, ActionId, GameId, PlayerId, TurnLogEntry};

/// Stored pending action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 5, version = 1)]
#[native_db]
pub struct StoredAction {
    /// Primary key - action ID, allocated in submission order.
    #[primary_key]
    pub id: u64,
    /// Owning game.
    #[secondary_key]
    pub game_id: u64,
    /// Submitting player.
    pub player_id: u64,
    /// JSON-encoded action kind.
    pub payload: String,
    /// Submission time, RFC 3339.
    pub submitted_at: String,
}

impl StoredAction {
    /// Create from a warroom Action.
    pub fn from_action(game_id: GameId, action: &Action, submitted_at: impl Into<String>) -> Result<Self> {
        Ok(Self {
            id: action.id.raw(),
            game_id: game_id.raw(),
            player_id: action.player_id.raw(),
            payload: serde_json::to_string(&action.kind)?,
            submitted_at: submitted_at.into(),
        })
    }

    /// Convert to a warroom Action.
    pub fn to_action(&self) -> Result<Action> {
        Ok(Action::new(
            ActionId::new(self.id),
            PlayerId::new(self.player_id),
            serde_json::from_str(&self.payload)?,
        ))
    }
}

/// Stored turn log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 6, version = 1)]
#[native_db]
pub struct StoredTurnLog {
    /// Primary key - log ID, allocated in append order.
    #[primary_key]
    pub id: u64,
    /// Owning game.
    #[secondary_key]
    pub game_id: u64,
    /// Turn the entry belongs to.
    pub turn: u32,
    /// Player whose action produced the entry.
    pub player_id: u64,
    /// JSON-encoded log entry.
    pub entry: String,
    /// Append time, RFC 3339.
    pub logged_at: String,
}

impl StoredTurnLog {
    /// Create from a warroom TurnLogEntry.
    pub fn from_entry(id: u64, entry: &TurnLogEntry, logged_at: impl Into<String>) -> Result<Self> {
        Ok(Self {
            id,
            game_id: entry.game_id.raw(),
            turn: entry.turn,
            player_id: entry.player_id.raw(),
            entry: serde_json::to_string(&entry.entry)?,
            logged_at: logged_at.into(),
        })
    }

    /// Convert to a warroom TurnLogEntry.
    pub fn to_entry(&self) -> Result<TurnLogEntry> {
        Ok(TurnLogEntry {
            game_id: GameId::new(self.game_id),
            turn: self.turn,
            player_id: PlayerId::new(self.player_id),
            entry: serde_json::from_str(&self.entry)?,
        })
    }
}
