//! Real-time game engine
//!
//! [`GameEngine`] wraps a [`Board`] in a mutex and advances it from a tokio task
//! (the stepper) that sleeps for the current tick interval between steps. Every
//! step, whether fired by the clock or by a same-direction [`GameEngine::turn`],
//! runs with the lock held from reading the head to emitting the notification,
//! so at most one step is ever in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use super::{
    board::{Board, StepOutcome, TurnOutcome},
    config::GameConfig,
    direction::Direction,
    error::GameError,
    state::{GameEvent, GameSnapshot, Lifecycle, Position},
};

/// Events buffered per subscriber before it starts lagging
const EVENT_CAPACITY: usize = 64;

struct Core {
    board: Board,
    /// Stop signal of the stepper that belongs to the current game
    stop_tx: Option<watch::Sender<bool>>,
}

impl Core {
    fn halt_stepper(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // The stepper may already be gone
            let _ = stop_tx.send(true);
        }
    }
}

struct Shared {
    core: Mutex<Core>,
    events: broadcast::Sender<GameEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: GameEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    /// Apply a finished step and notify; returns whether the game goes on
    fn publish(&self, core: &mut Core, outcome: StepOutcome) -> bool {
        match outcome {
            StepOutcome::Moved | StepOutcome::Grew => {
                self.emit(GameEvent::StateChanged(core.board.snapshot()));
                true
            }
            StepOutcome::GameOver(reason) => {
                core.halt_stepper();
                self.emit(GameEvent::GameOver(reason, core.board.snapshot()));
                false
            }
            StepOutcome::Skipped => core.board.lifecycle().is_active(),
        }
    }

    /// Tick interval for `generation`, or `None` once that game is over
    fn interval_for(&self, generation: u64) -> Option<Duration> {
        let core = self.lock();
        core.board
            .is_current(generation)
            .then(|| core.board.tick_interval())
    }

    /// One clock tick; returns whether the stepper should keep going
    fn tick(&self, generation: u64) -> bool {
        let mut core = self.lock();
        if !core.board.is_current(generation) {
            return false;
        }
        if core.board.lifecycle() == Lifecycle::Paused {
            return true;
        }

        for _ in 0..core.board.take_pending_steps() {
            let outcome = core.board.step();
            if !self.publish(&mut core, outcome) {
                return false;
            }
        }

        let outcome = core.board.step();
        self.publish(&mut core, outcome)
    }
}

async fn run_stepper(shared: Arc<Shared>, generation: u64, mut stop_rx: watch::Receiver<bool>) {
    debug!(generation, "stepper started");
    loop {
        if *stop_rx.borrow() {
            break;
        }
        let Some(interval) = shared.interval_for(generation) else {
            break;
        };

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            // Fires on a stop request and when the engine is dropped
            _ = stop_rx.changed() => break,
        }

        if !shared.tick(generation) {
            break;
        }
    }
    debug!(generation, "stepper exited");
}

/// Snake game driven by its own clock
///
/// All methods take `&self`; wrap the engine in an `Arc` to share it between
/// an input handler and a renderer.
pub struct GameEngine {
    shared: Arc<Shared>,
}

impl GameEngine {
    /// Create an engine for a `width` x `height` board
    pub fn new(width: usize, height: usize, initial_length: usize) -> Result<Self, GameError> {
        Self::with_config(GameConfig::new(width, height, initial_length))
    }

    pub fn with_config(config: GameConfig) -> Result<Self, GameError> {
        let board = Board::new(config)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            shared: Arc::new(Shared {
                core: Mutex::new(Core {
                    board,
                    stop_tx: None,
                }),
                events,
            }),
        })
    }

    /// Reset the board, place a target and launch the stepper
    ///
    /// Must be called from within a tokio runtime. Works on a fresh engine and
    /// on one whose previous game has stopped.
    pub fn start(&self) -> Result<(), GameError> {
        let runtime = Handle::try_current().map_err(|_| GameError::NoRuntime)?;

        let mut core = self.shared.lock();
        let generation = core.board.start()?;

        core.halt_stepper();
        let (stop_tx, stop_rx) = watch::channel(false);
        core.stop_tx = Some(stop_tx);

        runtime.spawn(run_stepper(Arc::clone(&self.shared), generation, stop_rx));
        Ok(())
    }

    pub fn pause(&self) -> Result<(), GameError> {
        self.shared.lock().board.pause()
    }

    pub fn resume(&self) -> Result<(), GameError> {
        self.shared.lock().board.resume()
    }

    /// Pause or resume, returning the lifecycle afterwards
    pub fn toggle_pause(&self) -> Result<Lifecycle, GameError> {
        self.shared.lock().board.toggle_pause()
    }

    /// End the current game; the stepper exits within one tick
    pub fn stop(&self) -> Result<(), GameError> {
        let mut core = self.shared.lock();
        core.board.stop()?;
        core.halt_stepper();
        Ok(())
    }

    /// Steer the snake
    ///
    /// Repeating the current heading takes an extra step right away, which lets
    /// a player hold a key to go faster than the clock.
    pub fn turn(&self, direction: Direction) -> TurnOutcome {
        let mut core = self.shared.lock();
        let outcome = core.board.turn(direction);
        if let TurnOutcome::Stepped(step) = outcome {
            self.shared.publish(&mut core, step);
        }
        outcome
    }

    /// Subscribe to state changes and game over; drop the receiver to unsubscribe
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.shared.events.subscribe()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.shared.lock().board.snapshot()
    }

    /// Copy of the body, head first
    pub fn body(&self) -> Vec<Position> {
        self.shared.lock().board.body()
    }

    pub fn target(&self) -> Option<Position> {
        self.shared.lock().board.target()
    }

    pub fn heading(&self) -> Direction {
        self.shared.lock().board.heading()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.lock().board.lifecycle()
    }

    pub fn tick_interval(&self) -> Duration {
        self.shared.lock().board.tick_interval()
    }

    pub fn width(&self) -> usize {
        self.shared.lock().board.width()
    }

    pub fn height(&self) -> usize {
        self.shared.lock().board.height()
    }

    pub fn config(&self) -> GameConfig {
        self.shared.lock().board.config().clone()
    }
}

impl Drop for GameEngine {
    fn drop(&mut self) {
        let mut core = self.shared.lock();
        if core.board.lifecycle().is_active() {
            warn!("engine dropped mid-game, halting stepper");
        }
        core.halt_stepper();
    }
}
