//! Warroom server - HTTP JSON API for turn-based strategy games
//!
//! - Game lifecycle: create, join, start
//! - Action submission and turn resolution
//! - Turn log history
//! - One resolution at a time per game

pub mod api;
pub mod config;
pub mod http;
pub mod locks;

pub use api::{ApiError, App, Route};
pub use config::{Config, ConfigError};
pub use locks::GameLocks;
