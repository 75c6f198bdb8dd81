use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::GameError;

/// Smallest accepted board side, in cells
pub const MIN_GRID_SIDE: usize = 10;

/// Configuration for the game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Width of the game grid
    pub grid_width: usize,
    /// Height of the game grid
    pub grid_height: usize,
    /// Initial length of the snake
    pub initial_snake_length: usize,

    // Clock
    /// Tick interval at the start of a game, in milliseconds
    pub initial_tick_ms: u64,
    /// How much the tick interval shrinks each time a target is placed
    pub tick_decrement_ms: u64,
    /// The tick interval never drops below this
    pub min_tick_ms: u64,

    /// Seed for target placement; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 50,
            grid_height: 25,
            initial_snake_length: 5,
            initial_tick_ms: 400,
            tick_decrement_ms: 10,
            min_tick_ms: 50,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with custom grid size and snake length
    pub fn new(width: usize, height: usize, initial_snake_length: usize) -> Self {
        Self {
            grid_width: width,
            grid_height: height,
            initial_snake_length,
            ..Default::default()
        }
    }

    /// Create the smallest legal grid, handy for tests
    pub fn small() -> Self {
        Self::new(MIN_GRID_SIDE, MIN_GRID_SIDE, 3)
    }

    /// Create a large grid
    pub fn large() -> Self {
        Self::new(80, 40, 5)
    }

    /// Fix the RNG seed so target placement is reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn initial_tick(&self) -> Duration {
        Duration::from_millis(self.initial_tick_ms)
    }

    /// Check the constraints the engine relies on
    pub fn validate(&self) -> Result<(), GameError> {
        if self.grid_width < MIN_GRID_SIDE {
            return Err(GameError::InvalidConfiguration(format!(
                "grid width {} is below the minimum of {MIN_GRID_SIDE}",
                self.grid_width
            )));
        }
        if self.grid_height < MIN_GRID_SIDE {
            return Err(GameError::InvalidConfiguration(format!(
                "grid height {} is below the minimum of {MIN_GRID_SIDE}",
                self.grid_height
            )));
        }
        if self.initial_snake_length < 1 {
            return Err(GameError::InvalidConfiguration(
                "initial snake length must be at least 1".to_string(),
            ));
        }
        // The snake is laid out leftwards from the centre column
        let max_length = self.grid_width / 2 + 1;
        if self.initial_snake_length > max_length {
            return Err(GameError::InvalidConfiguration(format!(
                "initial snake length {} is too long: wrap_snake lays the starting snake out \
                 in a straight line from the centre column to the left edge, so a board {} \
                 cells wide takes at most {max_length}",
                self.initial_snake_length, self.grid_width
            )));
        }
        if i32::try_from(self.grid_width).is_err() || i32::try_from(self.grid_height).is_err() {
            return Err(GameError::InvalidConfiguration(
                "grid dimensions exceed the coordinate range".to_string(),
            ));
        }
        if self.min_tick_ms == 0 {
            return Err(GameError::InvalidConfiguration(
                "minimum tick interval must be positive".to_string(),
            ));
        }
        if self.initial_tick_ms < self.min_tick_ms {
            return Err(GameError::InvalidConfiguration(format!(
                "initial tick {}ms is below the floor of {}ms",
                self.initial_tick_ms, self.min_tick_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.grid_width, 50);
        assert_eq!(config.grid_height, 25);
        assert_eq!(config.initial_snake_length, 5);
        assert_eq!(config.initial_tick(), Duration::from_millis(400));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_config() {
        let config = GameConfig::new(15, 12, 4);
        assert_eq!(config.grid_width, 15);
        assert_eq!(config.grid_height, 12);
        assert_eq!(config.initial_snake_length, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_small_board() {
        assert!(matches!(
            GameConfig::new(9, 10, 3).validate(),
            Err(GameError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            GameConfig::new(10, 9, 3).validate(),
            Err(GameError::InvalidConfiguration(_))
        ));
        assert!(GameConfig::new(10, 10, 3).validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_length() {
        assert!(matches!(
            GameConfig::new(10, 10, 0).validate(),
            Err(GameError::InvalidConfiguration(_))
        ));
        // 10 / 2 + 1 = 6 cells from the centre column to x = 0
        assert!(GameConfig::new(10, 10, 6).validate().is_ok());
        assert!(GameConfig::new(10, 10, 7).validate().is_err());
    }

    #[test]
    fn test_length_limit_message_names_the_layout() {
        let Err(GameError::InvalidConfiguration(message)) =
            GameConfig::new(12, 10, 8).validate()
        else {
            panic!("length 8 should not fit on a 12-wide board");
        };
        assert!(message.contains("wrap_snake lays the starting snake out"));
        assert!(message.contains("at most 7"));
    }

    #[test]
    fn test_rejects_bad_timing() {
        let mut config = GameConfig::small();
        config.min_tick_ms = 0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::small();
        config.initial_tick_ms = 20;
        config.min_tick_ms = 50;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{"grid_width": 30, "seed": 7}"#).unwrap();
        assert_eq!(config.grid_width, 30);
        assert_eq!(config.grid_height, 25);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.tick_decrement_ms, 10);
    }
}
