//! Game and player records

use crate::{Error, GameId, PlayerId, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Accepting players
    #[default]
    Open,
    /// Accepting actions and turn resolution
    Active,
    /// A victory has been declared
    Finished,
}

impl GameStatus {
    /// Lowercase name, as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Open => "open",
            GameStatus::Active => "active",
            GameStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a game was won
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VictoryType {
    /// A nation fielded enough troops
    Troops,
    /// The turn limit passed and the richest nation won
    Economy,
}

/// A declared winner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Victory {
    #[serde(rename = "type")]
    pub kind: VictoryType,
    pub winner_nation: String,
}

/// Root aggregate of one match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    pub name: String,
    pub status: GameStatus,
    pub turn: u32,
    pub victory: Option<Victory>,
}

impl Game {
    /// Create a new open game at turn 0
    pub fn new(id: GameId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status: GameStatus::Open,
            turn: 0,
            victory: None,
        }
    }

    /// Fail with `InvalidState` unless the game is in `expected` status
    pub fn ensure_status(&self, expected: GameStatus) -> Result<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(Error::InvalidState {
                expected,
                actual: self.status,
            })
        }
    }

    /// Mark the game finished with the given winner
    pub fn finish(&mut self, victory: Victory) {
        self.status = GameStatus::Finished;
        self.victory = Some(victory);
    }
}

/// A participant controlling one nation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub nation_name: String,
}
