use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::direction::Direction;

/// A cell on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move one cell in a direction, wrapping around a `width` x `height` torus
    pub fn wrapped_step(&self, direction: Direction, width: i32, height: i32) -> Self {
        let (dx, dy) = direction.delta();
        let mut x = self.x + dx;
        let mut y = self.y + dy;

        if x < 0 {
            x = width - 1;
        } else if x >= width {
            x = 0;
        }
        if y < 0 {
            y = height - 1;
        } else if y >= height {
            y = 0;
        }

        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The snake body, head first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    body: VecDeque<Position>,
}

impl Snake {
    /// Lay out `length` cells leftwards from `head` on the same row
    pub fn new(head: Position, length: usize) -> Self {
        let body = (0..length as i32)
            .map(|i| Position::new(head.x - i, head.y))
            .collect();
        Self { body }
    }

    /// Build a snake from explicit cells, head first
    pub fn from_cells(cells: impl IntoIterator<Item = Position>) -> Self {
        Self {
            body: cells.into_iter().collect(),
        }
    }

    pub fn head(&self) -> Position {
        self.body[0]
    }

    pub fn tail(&self) -> Option<Position> {
        self.body.back().copied()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    pub(crate) fn push_head(&mut self, pos: Position) {
        self.body.push_front(pos);
    }

    pub(crate) fn pop_tail(&mut self) -> Option<Position> {
        self.body.pop_back()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.body.iter()
    }

    /// Copy of the body for callers outside the engine
    pub fn to_vec(&self) -> Vec<Position> {
        self.body.iter().copied().collect()
    }
}

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Constructed, never started
    Idle,
    Running,
    Paused,
    /// Stopped explicitly or by the game ending
    Stopped,
}

impl Lifecycle {
    /// Whether a stepper belongs to the current game
    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Running | Lifecycle::Paused)
    }
}

/// Why a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    /// The head ran into the body
    Collision,
    /// No free cell was left for a target
    BoardFilled,
}

/// Read-only copy of everything a renderer needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    /// Head first
    pub body: Vec<Position>,
    pub target: Option<Position>,
    pub heading: Direction,
    pub lifecycle: Lifecycle,
    pub tick_interval: Duration,
    pub grid_width: usize,
    pub grid_height: usize,
    /// Targets reached this game
    pub targets_reached: u32,
    /// Steps taken this game
    pub steps: u32,
    /// Why the game ended, if it ended on its own
    pub game_over: Option<GameOverReason>,
}

impl GameSnapshot {
    pub fn head(&self) -> Option<Position> {
        self.body.first().copied()
    }

    pub fn length(&self) -> usize {
        self.body.len()
    }
}

/// Notifications pushed to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The board changed and should be redrawn
    StateChanged(GameSnapshot),
    /// The game ended; fires at most once per game
    GameOver(GameOverReason, GameSnapshot),
}
