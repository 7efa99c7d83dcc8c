//! Game, nation and player models for database storage.

use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};
use warroom_core::{
    Game, GameId, GameStatus, Nation, Player, PlayerId, Resources, Victory, VictoryType,
};

/// Stored game record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredGame {
    /// Primary key - game ID.
    #[primary_key]
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Lifecycle status (serialized).
    pub status: u8,
    /// Current turn.
    pub turn: u32,
    /// Victory type (serialized), if finished.
    pub victory_type: Option<u8>,
    /// Winning nation, if finished.
    pub victory_nation: Option<String>,
    /// Creation time, RFC 3339.
    pub created_at: String,
}

impl StoredGame {
    /// Create from a warroom Game.
    pub fn from_game(game: &Game, created_at: impl Into<String>) -> Self {
        let status = match game.status {
            GameStatus::Open => 0,
            GameStatus::Active => 1,
            GameStatus::Finished => 2,
        };
        let victory_type = game.victory.as_ref().map(|v| match v.kind {
            VictoryType::Troops => 0,
            VictoryType::Economy => 1,
        });
        Self {
            id: game.id.raw(),
            name: game.name.clone(),
            status,
            turn: game.turn,
            victory_type,
            victory_nation: game.victory.as_ref().map(|v| v.winner_nation.clone()),
            created_at: created_at.into(),
        }
    }

    /// Convert to a warroom Game.
    pub fn to_game(&self) -> Game {
        let status = match self.status {
            0 => GameStatus::Open,
            1 => GameStatus::Active,
            _ => GameStatus::Finished,
        };
        let victory = match (self.victory_type, &self.victory_nation) {
            (Some(kind), Some(nation)) => Some(Victory {
                kind: if kind == 0 {
                    VictoryType::Troops
                } else {
                    VictoryType::Economy
                },
                winner_nation: nation.clone(),
            }),
            _ => None,
        };
        Game {
            id: GameId::new(self.id),
            name: self.name.clone(),
            status,
            turn: self.turn,
            victory,
        }
    }
}

/// Stored nation row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 2, version = 1)]
#[native_db]
pub struct StoredNation {
    /// Primary key - `"{game_id}/{name}"`.
    #[primary_key]
    pub key: String,
    /// Owning game.
    #[secondary_key]
    pub game_id: u64,
    pub name: String,
    pub owner_player_id: Option<u64>,
    pub steel: u64,
    pub oil: u64,
    pub food: u64,
    pub manpower: u64,
    pub money: u64,
    pub troops: u64,
    pub morale: u32,
    pub color: String,
}

impl StoredNation {
    /// Primary key of a nation within a game.
    pub fn key_for(game_id: GameId, name: &str) -> String {
        format!("{}/{}", game_id.raw(), name)
    }

    /// Create from a warroom Nation.
    pub fn from_nation(game_id: GameId, nation: &Nation) -> Self {
        Self {
            key: Self::key_for(game_id, &nation.name),
            game_id: game_id.raw(),
            name: nation.name.clone(),
            owner_player_id: nation.owner_player_id.map(|p| p.raw()),
            steel: nation.resources.steel,
            oil: nation.resources.oil,
            food: nation.resources.food,
            manpower: nation.resources.manpower,
            money: nation.money,
            troops: nation.troops,
            morale: nation.morale,
            color: nation.color.clone(),
        }
    }

    /// Convert to a warroom Nation.
    pub fn to_nation(&self) -> Nation {
        Nation {
            name: self.name.clone(),
            owner_player_id: self.owner_player_id.map(PlayerId::new),
            resources: Resources {
                steel: self.steel,
                oil: self.oil,
                food: self.food,
                manpower: self.manpower,
            },
            money: self.money,
            troops: self.troops,
            morale: self.morale,
            color: self.color.clone(),
        }
    }
}

/// Stored player row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 3, version = 1)]
#[native_db]
pub struct StoredPlayer {
    /// Primary key - player ID.
    #[primary_key]
    pub id: u64,
    /// Owning game.
    #[secondary_key]
    pub game_id: u64,
    pub name: String,
    /// The nation this player claimed.
    pub nation_name: String,
    /// Join time, RFC 3339.
    pub joined_at: String,
}

impl StoredPlayer {
    /// Create from a warroom Player.
    pub fn from_player(game_id: GameId, player: &Player, joined_at: impl Into<String>) -> Self {
        Self {
            id: player.id.raw(),
            game_id: game_id.raw(),
            name: player.name.clone(),
            nation_name: player.nation_name.clone(),
            joined_at: joined_at.into(),
        }
    }

    /// Convert to a warroom Player.
    pub fn to_player(&self) -> Player {
        Player {
            id: PlayerId::new(self.id),
            name: self.name.clone(),
            nation_name: self.nation_name.clone(),
        }
    }
}

/// Stored id allocator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[native_model(id = 4, version = 1)]
#[native_db]
pub struct StoredSequence {
    /// Always "sequence" - single row.
    #[primary_key]
    pub id: String,
    /// Last game ID handed out.
    pub game: u64,
    /// Last player ID handed out.
    pub player: u64,
    /// Last action ID handed out.
    pub action: u64,
    /// Last turn log ID handed out.
    pub log: u64,
}

impl StoredSequence {
    /// Primary key of the single row.
    pub const KEY: &'static str = "sequence";

    /// A fresh allocator.
    pub fn new() -> Self {
        Self {
            id: Self::KEY.to_string(),
            ..Self::default()
        }
    }

    /// Allocate the next game ID.
    pub fn next_game(&mut self) -> u64 {
        self.game += 1;
        self.game
    }

    /// Allocate the next player ID.
    pub fn next_player(&mut self) -> u64 {
        self.player += 1;
        self.player
    }

    /// Allocate the next action ID.
    pub fn next_action(&mut self) -> u64 {
        self.action += 1;
        self.action
    }

    /// Allocate the next turn log ID.
    pub fn next_log(&mut self) -> u64 {
        self.log += 1;
        self.log
    }
}
