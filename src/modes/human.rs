use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::game::{GameConfig, GameEngine, GameError, GameEvent, GameOverReason};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::GameMetrics;
use crate::render::Renderer;

/// Keyboard-driven game in the terminal
///
/// The engine runs on its own clock; this loop only forwards keys, listens
/// for engine events and redraws.
pub struct HumanMode {
    engine: GameEngine,
    events: broadcast::Receiver<GameEvent>,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    /// Why the last game ended, if it ended on its own
    ended: Option<GameOverReason>,
    should_quit: bool,
}

impl HumanMode {
    pub fn new(config: GameConfig) -> Result<Self> {
        let engine = GameEngine::with_config(config).context("Invalid game configuration")?;
        let events = engine.subscribe();

        Ok(Self {
            engine,
            events,
            metrics: GameMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            ended: None,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        // Render at 30 FPS (33ms per frame); the engine owns the game clock
        let render_interval = Duration::from_millis(33);
        let mut render_timer = interval(render_interval);

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_event(event)?,
                        Some(Err(e)) => return Err(e).context("Failed to read terminal event"),
                        None => self.should_quit = true,
                    }
                }

                // Engine notifications
                game_event = self.events.recv() => {
                    self.handle_game_event(game_event);
                }

                // Render frame
                _ = render_timer.tick() => {
                    self.metrics.update();
                    let snapshot = self.engine.snapshot();
                    terminal.draw(|frame| {
                        self.renderer.render(frame, &snapshot, &self.metrics, self.ended);
                    }).context("Failed to draw frame")?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        tolerate_lifecycle(self.engine.stop()).context("Failed to stop game")?;
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        if let Event::Key(key) = event {
            // Only process key press events, not release
            if key.kind != KeyEventKind::Press {
                return Ok(());
            }

            let action = self.input_handler.handle_key_event(key);
            self.apply(action)?;
        }

        Ok(())
    }

    /// Act on a key, ignoring keys whose control is disabled in the current state
    fn apply(&mut self, action: KeyAction) -> Result<()> {
        let active = self.engine.lifecycle().is_active();

        let enabled = match action {
            KeyAction::Turn(_) | KeyAction::TogglePause | KeyAction::Stop => active,
            KeyAction::NewGame => !active,
            KeyAction::Quit => true,
            KeyAction::None => false,
        };
        if enabled {
            self.dispatch(action)?;
        }

        Ok(())
    }

    /// Forward a command to the engine
    ///
    /// The stepper can end the game between the lifecycle check in `apply` and
    /// the command, so lifecycle guards coming back here are not failures.
    fn dispatch(&mut self, action: KeyAction) -> Result<()> {
        match action {
            KeyAction::Turn(direction) => {
                self.engine.turn(direction);
            }
            KeyAction::TogglePause => {
                let toggled = tolerate_lifecycle(self.engine.toggle_pause())
                    .context("Failed to toggle pause")?;
                if let Some(lifecycle) = toggled {
                    debug!(?lifecycle, "pause toggled");
                }
            }
            KeyAction::Stop => {
                let stopped =
                    tolerate_lifecycle(self.engine.stop()).context("Failed to stop game")?;
                if stopped.is_some() {
                    self.metrics.on_game_over(self.engine.body().len());
                    self.ended = None;
                }
            }
            KeyAction::NewGame => {
                let started =
                    tolerate_lifecycle(self.engine.start()).context("Failed to start game")?;
                if started.is_some() {
                    self.metrics.on_game_start();
                    self.ended = None;
                }
            }
            KeyAction::Quit => {
                self.should_quit = true;
            }
            KeyAction::None => {}
        }

        Ok(())
    }

    fn handle_game_event(&mut self, event: Result<GameEvent, RecvError>) {
        match event {
            // The render timer picks up the new state
            Ok(GameEvent::StateChanged(_)) => {}
            Ok(GameEvent::GameOver(reason, snapshot)) => {
                self.record_game_over(reason, snapshot.length());
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "renderer fell behind engine events");
                // The skipped events may have included the game over
                let snapshot = self.engine.snapshot();
                if let Some(reason) = snapshot.game_over {
                    if self.metrics.is_timing() {
                        self.record_game_over(reason, snapshot.length());
                    }
                }
            }
            Err(RecvError::Closed) => {
                self.should_quit = true;
            }
        }
    }

    fn record_game_over(&mut self, reason: GameOverReason, length: usize) {
        info!(?reason, length, "game over");
        self.metrics.on_game_over(length);
        self.ended = Some(reason);
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

/// Treat `NotRunning`/`AlreadyRunning` as "nothing to do"
fn tolerate_lifecycle<T>(result: Result<T, GameError>) -> Result<Option<T>, GameError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err @ (GameError::NotRunning | GameError::AlreadyRunning)) => {
            debug!(%err, "lifecycle command skipped");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
