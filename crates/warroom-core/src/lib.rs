//! Warroom Core - Domain model and turn resolution engine
//!
//! This crate provides the core types and the deterministic engine for a
//! turn-based multiplayer strategy game:
//! - Games, nations, players and identifiers
//! - Typed player actions (`build`, `research`, `trade`, `attack`)
//! - Typed nation patches for persisting partial updates
//! - Turn log entries and victory declarations
//! - The turn resolution engine
//!
//! The engine is pure. Loading inputs, persisting results and serializing
//! concurrent resolutions of the same game are the caller's job.

mod action;
pub mod engine;
mod error;
mod game;
mod identity;
mod log;
mod nation;
mod patch;

pub use action::{Action, ActionKind, ActionType};
pub use engine::{resolve_turn, Resolution, TurnReport};
pub use error::{ActionError, Error, Result};
pub use game::{Game, GameStatus, Player, Victory, VictoryType};
pub use identity::{ActionId, GameId, PlayerId};
pub use log::{BattleReport, LogEntry, TurnLogEntry};
pub use nation::{nations_by_name, Nation, NationSeed, Nations, Resource, Resources, StartingStock, MAX_MORALE};
pub use patch::NationPatch;
