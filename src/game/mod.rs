//! Core game logic for snake on a wrap-around grid
//!
//! This module contains all the game logic without any I/O or rendering
//! dependencies. [`Board`] is the synchronous rule set; [`GameEngine`] runs a
//! board on its own clock and pushes [`GameEvent`]s to subscribers.

pub mod board;
pub mod config;
pub mod direction;
pub mod engine;
pub mod error;
pub mod state;

// Re-export commonly used types
pub use board::{Board, StepOutcome, TurnOutcome};
pub use config::GameConfig;
pub use direction::Direction;
pub use engine::GameEngine;
pub use error::GameError;
pub use state::{GameEvent, GameOverReason, GameSnapshot, Lifecycle, Position, Snake};
