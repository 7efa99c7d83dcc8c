//! Error types for warroom-core
//!
//! Two tiers: [`Error`] aborts a whole operation before anything is mutated,
//! [`ActionError`] is local to one queued action and ends up in the turn log.

use crate::{GameId, GameStatus, PlayerId};
use thiserror::Error;

/// Turn-level and lifecycle error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Game not found: {0}")]
    GameNotFound(GameId),

    #[error("Invalid game state: expected {expected}, got {actual}")]
    InvalidState {
        expected: GameStatus,
        actual: GameStatus,
    },

    #[error("Nation not available: {0}")]
    NationNotFound(String),

    #[error("Nation already taken: {0}")]
    NationTaken(String),

    #[error("Need at least {required} players to start, have {actual}")]
    NotEnoughPlayers { required: usize, actual: usize },
}

impl Error {
    /// Short machine-checkable code for this error
    pub fn kind(&self) -> &'static str {
        match self {
            Error::GameNotFound(_) => "game_not_found",
            Error::InvalidState { .. } => "invalid_state",
            Error::NationNotFound(_) => "nation_not_found",
            Error::NationTaken(_) => "nation_taken",
            Error::NotEnoughPlayers { .. } => "not_enough_players",
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single queued action
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Insufficient resources")]
    InsufficientResources,

    #[error("Insufficient money: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("Insufficient troops: need {needed}, have {available}")]
    InsufficientTroops { needed: u64, available: u64 },

    #[error("Cannot attack self")]
    SelfAttack,

    #[error("Target nation not found: {0}")]
    TargetNotFound(String),

    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),
}

impl ActionError {
    /// Short machine-checkable code for this error
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::InsufficientResources => "insufficient_resources",
            ActionError::InsufficientFunds { .. } => "insufficient_funds",
            ActionError::InsufficientTroops { .. } => "insufficient_troops",
            ActionError::SelfAttack => "self_attack",
            ActionError::TargetNotFound(_) => "target_not_found",
            ActionError::UnknownPlayer(_) => "unknown_player",
        }
    }
}
