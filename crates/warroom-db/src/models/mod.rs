//! Database models for persistent storage.

mod game;
mod queue;

pub use game::*;
pub use queue::*;
