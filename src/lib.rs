//! Wrap Snake - snake on a wrap-around grid
//!
//! This library provides:
//! - Core game logic with a self-clocked engine (game module)
//! - Keyboard mapping (input module)
//! - TUI rendering (render module)
//! - Session statistics (metrics module)
//! - The interactive terminal game (modes module)

pub mod game;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod modes;
pub mod render;
