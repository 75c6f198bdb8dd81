//! Single-owner game state machine
//!
//! [`Board`] holds the body, heading, target, clock speed and lifecycle of one
//! game and implements every rule of play. It knows nothing about threads or
//! timers; [`GameEngine`](super::GameEngine) keeps one behind a mutex and drives
//! it from the stepper task.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

use super::{
    config::GameConfig,
    direction::Direction,
    error::GameError,
    state::{GameOverReason, GameSnapshot, Lifecycle, Position, Snake},
};

/// What a single step did to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Translated by one cell
    Moved,
    /// Reached the target, grew by one, and a new target was placed
    Grew,
    /// The game ended; the body was left untouched on collision
    GameOver(GameOverReason),
    /// Not running, nothing happened
    Skipped,
}

/// What a call to [`Board::turn`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Heading changed; takes effect on the next step
    Turned,
    /// Same heading as before, so an extra step was taken right away
    Stepped(StepOutcome),
    /// Same heading while paused; the extra step runs on the next unpaused tick
    Queued,
    /// No game in progress
    Ignored,
}

/// Rejection sampling gives up after `cells * this` draws and scans instead
const SAMPLING_ATTEMPTS_PER_CELL: usize = 4;

pub struct Board {
    config: GameConfig,
    width: i32,
    height: i32,
    snake: Snake,
    heading: Direction,
    target: Option<Position>,
    tick_interval: Duration,
    lifecycle: Lifecycle,
    /// Same-direction turns received while paused
    pending_steps: u32,
    /// Bumped by every start so stale steppers can tell they are stale
    generation: u64,
    targets_reached: u32,
    steps: u32,
    /// Set when the game ends on its own, cleared by start
    game_over: Option<GameOverReason>,
    rng: StdRng,
}

impl Board {
    /// Build an idle board; fails if the configuration is out of range
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // validate() guarantees both fit in i32
        let width = config.grid_width as i32;
        let height = config.grid_height as i32;

        Ok(Self {
            snake: initial_snake(&config),
            heading: Direction::Right,
            target: None,
            tick_interval: config.initial_tick(),
            lifecycle: Lifecycle::Idle,
            pending_steps: 0,
            generation: 0,
            targets_reached: 0,
            steps: 0,
            game_over: None,
            width,
            height,
            config,
            rng,
        })
    }

    /// Begin a new game and return its generation number
    ///
    /// Allowed from `Idle` and from `Stopped`; the body, heading and clock are
    /// reset to their initial values either way.
    pub fn start(&mut self) -> Result<u64, GameError> {
        if self.lifecycle.is_active() {
            return Err(GameError::AlreadyRunning);
        }

        self.snake = initial_snake(&self.config);
        self.heading = Direction::Right;
        self.tick_interval = self.config.initial_tick();
        self.pending_steps = 0;
        self.targets_reached = 0;
        self.steps = 0;
        self.target = None;
        self.game_over = None;

        let target = self.place_target().ok_or_else(|| {
            GameError::InvalidConfiguration("no free cell left for a target".to_string())
        })?;
        self.target = Some(target);

        self.generation += 1;
        self.lifecycle = Lifecycle::Running;
        info!(
            generation = self.generation,
            length = self.snake.len(),
            %target,
            "game started"
        );
        Ok(self.generation)
    }

    pub fn pause(&mut self) -> Result<(), GameError> {
        match self.lifecycle {
            Lifecycle::Running => {
                self.lifecycle = Lifecycle::Paused;
                debug!(generation = self.generation, "game paused");
                Ok(())
            }
            Lifecycle::Paused => Ok(()),
            Lifecycle::Idle | Lifecycle::Stopped => Err(GameError::NotRunning),
        }
    }

    pub fn resume(&mut self) -> Result<(), GameError> {
        match self.lifecycle {
            Lifecycle::Paused => {
                self.lifecycle = Lifecycle::Running;
                debug!(generation = self.generation, "game resumed");
                Ok(())
            }
            Lifecycle::Running => Ok(()),
            Lifecycle::Idle | Lifecycle::Stopped => Err(GameError::NotRunning),
        }
    }

    /// Pause when running, resume when paused
    pub fn toggle_pause(&mut self) -> Result<Lifecycle, GameError> {
        match self.lifecycle {
            Lifecycle::Running => self.pause()?,
            Lifecycle::Paused => self.resume()?,
            Lifecycle::Idle | Lifecycle::Stopped => return Err(GameError::NotRunning),
        }
        Ok(self.lifecycle)
    }

    pub fn stop(&mut self) -> Result<(), GameError> {
        if !self.lifecycle.is_active() {
            return Err(GameError::NotRunning);
        }
        self.lifecycle = Lifecycle::Stopped;
        self.pending_steps = 0;
        info!(generation = self.generation, "game stopped");
        Ok(())
    }

    /// Request a heading
    ///
    /// Asking for the current heading takes an extra step immediately. Any other
    /// heading, including a reversal, is simply stored for the next step.
    pub fn turn(&mut self, direction: Direction) -> TurnOutcome {
        match self.lifecycle {
            Lifecycle::Idle | Lifecycle::Stopped => TurnOutcome::Ignored,
            _ if direction != self.heading => {
                trace!(from = %self.heading, to = %direction, "heading changed");
                self.heading = direction;
                TurnOutcome::Turned
            }
            Lifecycle::Paused => {
                self.pending_steps += 1;
                TurnOutcome::Queued
            }
            Lifecycle::Running => TurnOutcome::Stepped(self.step()),
        }
    }

    /// Advance the snake by one cell
    pub fn step(&mut self) -> StepOutcome {
        if self.lifecycle != Lifecycle::Running {
            return StepOutcome::Skipped;
        }

        let next = self
            .snake
            .head()
            .wrapped_step(self.heading, self.width, self.height);

        if self.snake.contains(next) {
            self.lifecycle = Lifecycle::Stopped;
            self.pending_steps = 0;
            self.game_over = Some(GameOverReason::Collision);
            info!(
                generation = self.generation,
                at = %next,
                length = self.snake.len(),
                "snake collided with itself"
            );
            return StepOutcome::GameOver(GameOverReason::Collision);
        }

        self.snake.push_head(next);
        self.steps += 1;

        if self.target != Some(next) {
            self.snake.pop_tail();
            trace!(head = %next, "moved");
            return StepOutcome::Moved;
        }

        self.targets_reached += 1;
        match self.place_target() {
            Some(target) => {
                self.target = Some(target);
                debug!(
                    length = self.snake.len(),
                    %target,
                    tick_ms = self.tick_interval.as_millis() as u64,
                    "target reached"
                );
                StepOutcome::Grew
            }
            None => {
                self.target = None;
                self.lifecycle = Lifecycle::Stopped;
                self.pending_steps = 0;
                self.game_over = Some(GameOverReason::BoardFilled);
                info!(
                    generation = self.generation,
                    length = self.snake.len(),
                    "board filled"
                );
                StepOutcome::GameOver(GameOverReason::BoardFilled)
            }
        }
    }

    /// Hand out the extra steps queued while paused; only drained while running
    pub fn take_pending_steps(&mut self) -> u32 {
        if self.lifecycle != Lifecycle::Running {
            return 0;
        }
        std::mem::take(&mut self.pending_steps)
    }

    /// Whether a stepper started for `generation` should keep running
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && self.lifecycle.is_active()
    }

    /// Pick a free cell for the next target and speed up the clock
    ///
    /// Draws uniformly and rejects occupied cells. When the snake covers most of
    /// the board the draw budget runs out and the free cells are enumerated
    /// instead; `None` means no free cell is left.
    fn place_target(&mut self) -> Option<Position> {
        let cells = (self.width as usize) * (self.height as usize);
        if self.snake.len() >= cells {
            return None;
        }

        let sampled = (0..cells * SAMPLING_ATTEMPTS_PER_CELL).find_map(|_| {
            let pos = Position::new(
                self.rng.gen_range(0..self.width),
                self.rng.gen_range(0..self.height),
            );
            (!self.snake.contains(pos)).then_some(pos)
        });

        let target = match sampled {
            Some(pos) => pos,
            None => {
                let free: Vec<Position> = (0..self.height)
                    .flat_map(|y| (0..self.width).map(move |x| Position::new(x, y)))
                    .filter(|pos| !self.snake.contains(*pos))
                    .collect();
                if free.is_empty() {
                    return None;
                }
                free[self.rng.gen_range(0..free.len())]
            }
        };

        self.speed_up();
        Some(target)
    }

    fn speed_up(&mut self) {
        let floor = Duration::from_millis(self.config.min_tick_ms);
        let decrement = Duration::from_millis(self.config.tick_decrement_ms);
        self.tick_interval = self.tick_interval.saturating_sub(decrement).max(floor);
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            body: self.snake.to_vec(),
            target: self.target,
            heading: self.heading,
            lifecycle: self.lifecycle,
            tick_interval: self.tick_interval,
            grid_width: self.config.grid_width,
            grid_height: self.config.grid_height,
            targets_reached: self.targets_reached,
            steps: self.steps,
            game_over: self.game_over,
        }
    }

    pub fn body(&self) -> Vec<Position> {
        self.snake.to_vec()
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn target(&self) -> Option<Position> {
        self.target
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn width(&self) -> usize {
        self.config.grid_width
    }

    pub fn height(&self) -> usize {
        self.config.grid_height
    }
}

fn initial_snake(config: &GameConfig) -> Snake {
    let head = Position::new(
        (config.grid_width / 2) as i32,
        (config.grid_height / 2) as i32,
    );
    Snake::new(head, config.initial_snake_length)
}

#[cfg(test)]
impl Board {
    pub(crate) fn set_target(&mut self, target: Position) {
        self.target = Some(target);
    }

    pub(crate) fn set_body(&mut self, body: &[Position]) {
        self.snake = Snake::from_cells(body.iter().copied());
    }

    pub(crate) fn set_heading(&mut self, heading: Direction) {
        self.heading = heading;
    }
}
