use std::time::{Duration, Instant};

/// Session statistics shown alongside the board
///
/// Score is the snake's length, so the best score is the longest snake seen.
pub struct GameMetrics {
    pub start_time: Instant,
    pub elapsed_time: Duration,
    pub best_length: usize,
    pub games_played: u32,
    /// Whether the game clock is ticking
    timing: bool,
}

impl GameMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            elapsed_time: Duration::ZERO,
            best_length: 0,
            games_played: 0,
            timing: false,
        }
    }

    pub fn update(&mut self) {
        if self.timing {
            self.elapsed_time = self.start_time.elapsed();
        }
    }

    pub fn on_game_start(&mut self) {
        self.start_time = Instant::now();
        self.elapsed_time = Duration::ZERO;
        self.timing = true;
    }

    /// Record a finished game; stopping by hand counts too
    pub fn on_game_over(&mut self, final_length: usize) {
        if !self.timing {
            return;
        }
        self.update();
        self.timing = false;
        self.games_played += 1;
        self.best_length = self.best_length.max(final_length);
    }

    /// Whether a game is being timed and has not been recorded yet
    pub fn is_timing(&self) -> bool {
        self.timing
    }

    pub fn format_time(&self) -> String {
        let total_secs = self.elapsed_time.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }
}

impl Default for GameMetrics {
    fn default() -> Self {
        Self::new()
    }
}
